use std::sync::Arc;

use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::timers::TimerSlot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cleanup::SweepKind;
use crate::engine::NarrativeEngine;
use crate::events::{EngineEvent, metric};
use crate::page::StoryPage;
use crate::stage::Wake;
use crate::surface::MapSurface;

/// Identity of one committed transition. Deferred callbacks carry the ticket
/// they were scheduled under and do nothing once it is no longer current.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Forward,
    Backward,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionClass {
    /// Between a parent and one of its sub-chapters, or two siblings.
    SameFamily,
    CrossFamily,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Debouncing,
    Transitioning,
}

#[derive(Debug, Default)]
pub struct TransitionState {
    pub(crate) current: Option<ChapterId>,
    pub(crate) previous: Option<ChapterId>,
    pub(crate) pending: Option<ChapterId>,
    pub(crate) transitioning: bool,
    pub(crate) class: Option<TransitionClass>,
    pub(crate) committed_at: Option<Millis>,
    pub(crate) ticket: Ticket,
    pub(crate) debounce: TimerSlot,
    pub(crate) camera: TimerSlot,
    pub(crate) safety: TimerSlot,
}

impl TransitionState {
    pub fn current(&self) -> Option<&ChapterId> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&ChapterId> {
        self.previous.as_ref()
    }

    pub fn pending(&self) -> Option<&ChapterId> {
        self.pending.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn last_commit_at(&self) -> Option<Millis> {
        self.committed_at
    }

    pub fn phase(&self) -> Phase {
        if self.transitioning {
            Phase::Transitioning
        } else if self.debounce.is_armed() {
            Phase::Debouncing
        } else {
            Phase::Idle
        }
    }

    pub fn is_live(&self, ticket: Ticket) -> bool {
        self.ticket == ticket
    }

    pub(crate) fn is_rapid(&self, now: Millis, window_ms: u64) -> bool {
        self.committed_at
            .is_some_and(|at| now.since(at) < window_ms)
    }

    pub(crate) fn begin(&mut self, target: ChapterId, class: TransitionClass, now: Millis) -> Ticket {
        self.previous = self.current.replace(target);
        self.transitioning = true;
        self.class = Some(class);
        self.committed_at = Some(now);
        self.ticket = Ticket(self.ticket.0 + 1);
        self.ticket
    }
}

impl<S: MapSurface, P: StoryPage> NarrativeEngine<S, P> {
    /// The scroll detector saw `chapter`'s region enter the viewport.
    ///
    /// Ordinary chapters are debounced: a burst of signals commits once, to
    /// the last chapter seen, after the debounce window has passed quietly.
    /// Slide regions take over immediately.
    pub fn on_region_enter(&mut self, now: Millis, chapter: &str, direction: ScrollDirection) {
        self.advance(now);
        let id = ChapterId::new(chapter);
        self.emit(EngineEvent::SignalReceived {
            chapter: id.clone(),
            direction,
        });

        if self
            .catalog
            .get(chapter)
            .is_some_and(|c| c.is_slide_region())
        {
            if self.slides.region() == Some(&id) {
                debug!("already inside slide region {id}");
                return;
            }
            self.enter_slides(id, direction);
            return;
        }

        let settled_here = self.state.current.as_ref() == Some(&id)
            && !self.state.transitioning
            && self.state.pending.is_none();
        if settled_here {
            self.emit(EngineEvent::SignalIgnored { chapter: id });
            return;
        }

        if let Some(dropped) = self.state.pending.replace(id.clone())
            && dropped != id
        {
            self.metrics.inc(metric::SIGNALS_COALESCED);
            self.emit(EngineEvent::SignalSuperseded { dropped, by: id });
        }
        let at = now.after(self.tuning.debounce_ms);
        self.state
            .debounce
            .arm(&mut self.stage.timers, at, Wake::Debounce);
    }

    /// Drops the pending target and every deferred transition callback.
    pub fn cancel_pending_transitions(&mut self, now: Millis) {
        self.advance(now);
        self.cancel_in_flight();
        self.emit(EngineEvent::PendingCancelled);
    }

    pub(crate) fn cancel_in_flight(&mut self) {
        self.state.debounce.cancel(&mut self.stage.timers);
        let camera_moving = self.state.camera.cancel(&mut self.stage.timers);
        self.state.safety.cancel(&mut self.stage.timers);
        self.state.pending = None;
        self.state.transitioning = false;
        if camera_moving {
            self.stage.surface.stop_camera();
        }
    }

    pub(crate) fn fire_debounce(&mut self) {
        let Some(target) = self.state.pending.take() else {
            return;
        };
        if self.state.current.as_ref() == Some(&target) {
            debug!("{target} is already current");
            return;
        }
        self.commit(target, None);
    }

    /// Commits a transition to `target` and runs the chapter lifecycle.
    ///
    /// `force` overrides the family classification, e.g. leaving a slide
    /// region backwards always gets a full sweep.
    pub(crate) fn commit(&mut self, target: ChapterId, force: Option<TransitionClass>) {
        let catalog = Arc::clone(&self.catalog);
        let Some(descriptor) = catalog.get(target.as_str()) else {
            warn!("ignoring transition to unknown chapter {target}");
            // A transition whose camera is still moving stays in flight.
            if !self.state.camera.is_armed() {
                self.state.transitioning = false;
            }
            self.emit(EngineEvent::UnknownChapter { chapter: target });
            return;
        };
        let now = self.now;

        if self.state.is_rapid(now, self.tuning.rapid_scroll_ms) {
            let report = self.stage.light_sweep(SweepKind::RapidGuard);
            self.record_sweep(report);
        }

        let camera_moving = self.state.camera.cancel(&mut self.stage.timers);
        self.state.safety.cancel(&mut self.stage.timers);
        if camera_moving {
            self.stage.surface.stop_camera();
        }
        if self.slides.is_active() {
            self.release_slides();
        }

        let class = force.unwrap_or_else(|| self.classify(&target));
        let from = self.state.current.clone();
        let ticket = self.state.begin(target.clone(), class, now);
        self.metrics.inc(metric::TRANSITIONS_COMMITTED);
        info!(
            "transition {} -> {target} ({class:?})",
            from.as_ref().map_or("none", ChapterId::as_str)
        );
        self.emit(EngineEvent::TransitionCommitted {
            from,
            to: target,
            class,
            ticket,
        });

        self.run_lifecycle(descriptor, class, ticket);
    }

    fn classify(&self, target: &ChapterId) -> TransitionClass {
        match &self.state.current {
            Some(current) if self.catalog.same_family(current.as_str(), target.as_str()) => {
                TransitionClass::SameFamily
            }
            _ => TransitionClass::CrossFamily,
        }
    }
}
