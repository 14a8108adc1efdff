use std::sync::Arc;

use catalog::StoryCatalog;
use foundation::ids::ChapterId;
use foundation::time::Millis;
use narrative::recording::{RecordingPage, RecordingSurface, SurfaceCall};
use narrative::{
    EngineEvent, EngineTuning, InputOutcome, NarrativeEngine, ScrollDirection, SlideKey,
};
use runtime::event_bus::Stamped;
use serde::Deserialize;
use streaming::FeatureCollection;
use tracing::debug;

use crate::demo::demo_factories;

const DEFAULT_SETTLE_MS: u64 = 5_000;

/// One host input, as the scroll detector, keyboard, pointer or window would
/// report it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    Enter {
        chapter: String,
        #[serde(default = "forward")]
        direction: ScrollDirection,
    },
    Exit {
        chapter: String,
        #[serde(default = "forward")]
        direction: ScrollDirection,
    },
    Wheel {
        delta_y: f64,
    },
    Key {
        key: SlideKey,
    },
    Dot {
        index: usize,
    },
    Swipe {
        from: [f64; 2],
        to: [f64; 2],
    },
    Resize,
    Cancel,
    Shutdown,
}

fn forward() -> ScrollDirection {
    ScrollDirection::Forward
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Engine time in milliseconds.
    pub at: u64,
    #[serde(flatten)]
    pub signal: Signal,
}

/// Timed input signals for a headless replay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    /// How long to keep advancing time after the last step so deferred work
    /// (camera settle, safety sweep) is included in the trace.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let script: Script = serde_json::from_str(raw).map_err(|e| format!("parse script: {e}"))?;
        for (i, pair) in script.steps.windows(2).enumerate() {
            if pair[1].at < pair[0].at {
                return Err(format!(
                    "step {} at {}ms is earlier than the step before it ({}ms)",
                    i + 1,
                    pair[1].at,
                    pair[0].at
                ));
            }
        }
        Ok(script)
    }
}

/// Everything a replay produced.
#[derive(Debug)]
pub struct Replay {
    pub trace: Vec<Stamped<EngineEvent>>,
    pub surface_calls: Vec<SurfaceCall>,
    pub counters: Vec<(&'static str, u64)>,
    pub finished_at: Millis,
}

impl Replay {
    pub fn commits(&self) -> impl Iterator<Item = &ChapterId> {
        self.trace.iter().filter_map(|e| match &e.event {
            EngineEvent::TransitionCommitted { to, .. } => Some(to),
            _ => None,
        })
    }
}

/// Runs `script` against an engine backed by recording doubles and the demo
/// controllers.
pub fn replay(
    catalog: StoryCatalog,
    tuning: EngineTuning,
    script: &Script,
    data: Vec<(ChapterId, Arc<FeatureCollection>)>,
) -> Replay {
    let factories = demo_factories(&catalog);
    let mut engine = NarrativeEngine::new(
        catalog,
        RecordingSurface::new(),
        RecordingPage::new(),
        factories,
    )
    .with_tuning(tuning);
    for (chapter, fc) in data {
        engine.provide_chapter_data(chapter, fc);
    }

    let mut last = Millis::ZERO;
    for step in &script.steps {
        let now = Millis(step.at);
        apply(&mut engine, now, &step.signal);
        last = now;
    }

    let finished_at = last.after(script.settle_ms);
    engine.advance(finished_at);

    Replay {
        trace: engine.drain_trace(),
        surface_calls: engine.surface().calls().to_vec(),
        counters: engine.metrics().counters(),
        finished_at,
    }
}

fn apply(engine: &mut NarrativeEngine<RecordingSurface, RecordingPage>, now: Millis, signal: &Signal) {
    let outcome = match signal {
        Signal::Enter { chapter, direction } => {
            engine.on_region_enter(now, chapter, *direction);
            None
        }
        Signal::Exit { chapter, direction } => {
            engine.on_region_exit(now, chapter, *direction);
            None
        }
        Signal::Wheel { delta_y } => Some(engine.on_wheel(now, *delta_y)),
        Signal::Key { key } => Some(engine.on_key(now, *key)),
        Signal::Dot { index } => Some(engine.on_dot_click(now, *index)),
        Signal::Swipe { from, to } => {
            engine.on_touch_start(now, from[0], from[1]);
            Some(engine.on_touch_end(now, to[0], to[1]))
        }
        Signal::Resize => {
            engine.on_viewport_resize(now);
            None
        }
        Signal::Cancel => {
            engine.cancel_pending_transitions(now);
            None
        }
        Signal::Shutdown => {
            engine.shutdown(now);
            None
        }
    };
    if outcome == Some(InputOutcome::PassThrough) {
        debug!("t={} {signal:?} passed through", now.0);
    }
}
