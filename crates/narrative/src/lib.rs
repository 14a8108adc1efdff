//! Scroll-driven chapter transition engine.
//!
//! The engine listens to "enter region" signals from a scroll detector,
//! debounces bursts, and drives a map surface, the page chrome and
//! per-chapter visual-effect controllers through one consistent lifecycle:
//! cleanup, page update, camera move, controller activation, deferred
//! safety sweep.
//!
//! All timing goes through a deterministic timer queue that the host advances
//! with [`NarrativeEngine::advance`].

pub mod cleanup;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod horizontal;
pub mod lifecycle;
pub mod page;
pub mod recording;
pub mod registry;
pub mod stage;
pub mod surface;
pub mod transition;
pub mod tuning;

#[cfg(test)]
mod scenarios;

pub use cleanup::{SweepKind, SweepReport};
pub use effects::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use horizontal::{InputOutcome, SlideKey, SlideState};
pub use page::*;
pub use registry::*;
pub use surface::*;
pub use stage::Stage;
pub use transition::{Phase, ScrollDirection, Ticket, TransitionClass, TransitionState};
pub use tuning::*;
