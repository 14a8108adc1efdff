use foundation::ids::ChapterId;
use serde::Serialize;

use crate::cleanup::SweepReport;
use crate::surface::Pane;
use crate::transition::{ScrollDirection, Ticket, TransitionClass};

/// One engine decision, as recorded in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SignalReceived {
        chapter: ChapterId,
        direction: ScrollDirection,
    },
    /// The chapter is already current and settled.
    SignalIgnored {
        chapter: ChapterId,
    },
    SignalSuperseded {
        dropped: ChapterId,
        by: ChapterId,
    },
    PendingCancelled,
    UnknownChapter {
        chapter: ChapterId,
    },
    TransitionCommitted {
        from: Option<ChapterId>,
        to: ChapterId,
        class: TransitionClass,
        ticket: Ticket,
    },
    Swept(SweepReport),
    SplitScreen {
        open: bool,
    },
    CameraRequested {
        target: ChapterId,
        pane: Pane,
        duration_ms: u64,
    },
    ControllerActivated {
        family: ChapterId,
        trigger: Option<String>,
        reused: bool,
    },
    ControllerFailed {
        family: ChapterId,
        error: String,
    },
    /// A deferred callback fired for a transition that is no longer current.
    StaleCallback {
        ticket: Ticket,
        current: Ticket,
    },
    SlidesEntered {
        region: ChapterId,
        from: Option<ChapterId>,
        start: usize,
        direction: ScrollDirection,
        ticket: Ticket,
    },
    SlideChanged {
        region: ChapterId,
        from: usize,
        to: usize,
    },
    /// Scrolled past the first or last slide.
    SlidesExited {
        region: ChapterId,
        direction: ScrollDirection,
    },
    /// Slide state dropped without an exit, e.g. another chapter committed.
    SlidesReleased {
        region: ChapterId,
    },
}

/// Counter names recorded in [`runtime::metrics::Metrics`].
pub mod metric {
    pub const TRANSITIONS_COMMITTED: &str = "transitions.committed";
    pub const SWEEPS_FULL: &str = "sweeps.full";
    pub const SWEEPS_LIGHT: &str = "sweeps.light";
    pub const SWEEPS_SAFETY: &str = "sweeps.safety";
    pub const SWEEPS_RAPID_GUARD: &str = "sweeps.rapid_guard";
    pub const SIGNALS_COALESCED: &str = "signals.coalesced";
    pub const CLEANUP_FAILURES: &str = "cleanup.failures";
    pub const CALLBACKS_STALE: &str = "callbacks.stale";
    pub const CONTROLLERS_FAILED: &str = "controllers.failed";
    pub const SLIDES_CHANGED: &str = "slides.changed";
    /// Commit to camera-settled, in engine milliseconds.
    pub const TRANSITION_MS: &str = "transition";
}
