use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::timers::TimerQueue;
use streaming::geojson::FeatureCollection;

use crate::effects::{EffectContext, PaneLayout};
use crate::registry::ResourceRegistry;
use crate::surface::MapSurface;
use crate::transition::Ticket;

/// Payload of every timer the engine schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Wake {
    Debounce,
    CameraSettled { ticket: Ticket },
    SafetySweep { ticket: Ticket },
    SlidesSettled { ticket: Ticket, slide: usize },
    SlideUnlock,
    Effect { family: ChapterId, tag: u32 },
}

/// The map side of the engine: the renderer, everything tracked on it, and
/// the timer queue that can still reach it.
///
/// Sweeps and effect contexts borrow the stage as a whole, so at most one of
/// them can be running at any time.
pub struct Stage<S> {
    pub(crate) surface: S,
    pub(crate) registry: ResourceRegistry,
    pub(crate) timers: TimerQueue<Wake>,
    pub(crate) split_open: bool,
}

impl<S: MapSurface> Stage<S> {
    pub(crate) fn new(surface: S) -> Self {
        Self {
            surface,
            registry: ResourceRegistry::new(),
            timers: TimerQueue::new(),
            split_open: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn split_open(&self) -> bool {
        self.split_open
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn context<'a>(
        &'a mut self,
        now: Millis,
        family: &'a ChapterId,
        chapter: &'a ChapterId,
        data: &'a FeatureCollection,
    ) -> EffectContext<'a> {
        let layout = if self.split_open {
            PaneLayout::Split
        } else {
            PaneLayout::Single
        };
        EffectContext {
            now,
            family,
            chapter,
            layout,
            data,
            surface: &mut self.surface,
            registry: &mut self.registry,
            timers: &mut self.timers,
        }
    }
}
