use std::collections::BTreeMap;
use std::sync::Arc;

use catalog::StoryCatalog;
use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::event_bus::{EventBus, Stamped};
use runtime::metrics::Metrics;
use runtime::timers::Fired;
use streaming::geojson::FeatureCollection;
use tracing::debug;

use crate::cleanup::SweepReport;
use crate::effects::ControllerFactories;
use crate::events::EngineEvent;
use crate::horizontal::SlideState;
use crate::page::StoryPage;
use crate::registry::ResourceRegistry;
use crate::stage::{Stage, Wake};
use crate::surface::MapSurface;
use crate::transition::TransitionState;
use crate::tuning::EngineTuning;

/// The scroll narrative engine.
///
/// Owns every piece of mutable engine state; there are no globals. Hosts feed
/// it scroll signals and user input stamped with the current time, and call
/// [`Self::advance`] whenever time moves on so deferred work can run.
pub struct NarrativeEngine<S: MapSurface, P: StoryPage> {
    pub(crate) catalog: Arc<StoryCatalog>,
    pub(crate) tuning: EngineTuning,
    pub(crate) stage: Stage<S>,
    pub(crate) page: P,
    pub(crate) state: TransitionState,
    pub(crate) slides: SlideState,
    pub(crate) factories: ControllerFactories,
    pub(crate) chapter_data: BTreeMap<ChapterId, Arc<FeatureCollection>>,
    pub(crate) empty_data: FeatureCollection,
    pub(crate) trace: EventBus<EngineEvent>,
    pub(crate) metrics: Metrics,
    pub(crate) now: Millis,
}

impl<S: MapSurface, P: StoryPage> NarrativeEngine<S, P> {
    pub fn new(catalog: StoryCatalog, surface: S, page: P, factories: ControllerFactories) -> Self {
        Self {
            catalog: Arc::new(catalog),
            tuning: EngineTuning::default(),
            stage: Stage::new(surface),
            page,
            state: TransitionState::default(),
            slides: SlideState::default(),
            factories,
            chapter_data: BTreeMap::new(),
            empty_data: FeatureCollection::empty(),
            trace: EventBus::new(),
            metrics: Metrics::new(),
            now: Millis::ZERO,
        }
    }

    pub fn with_tuning(mut self, tuning: EngineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn catalog(&self) -> &StoryCatalog {
        &self.catalog
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    pub fn surface(&self) -> &S {
        &self.stage.surface
    }

    /// Direct renderer access for the host. Objects added here carry no
    /// owner unless the host passes one.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.stage.surface
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn current_chapter(&self) -> Option<&ChapterId> {
        self.state.current.as_ref()
    }

    pub fn slides(&self) -> &SlideState {
        &self.slides
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.stage.registry
    }

    pub fn split_open(&self) -> bool {
        self.stage.split_open
    }

    pub fn trace(&self) -> &[Stamped<EngineEvent>] {
        self.trace.events()
    }

    pub fn drain_trace(&mut self) -> Vec<Stamped<EngineEvent>> {
        self.trace.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// When the next deferred callback is due, if any.
    pub fn next_wake(&self) -> Option<Millis> {
        self.stage.timers.next_due()
    }

    /// Makes prefetched data available to `chapter`'s effects.
    pub fn provide_chapter_data(&mut self, chapter: impl Into<ChapterId>, data: Arc<FeatureCollection>) {
        self.chapter_data.insert(chapter.into(), data);
    }

    /// Runs every callback due at or before `now`, in due order.
    pub fn advance(&mut self, now: Millis) {
        while let Some(fired) = self.stage.timers.pop_due(now) {
            if fired.due > self.now {
                self.now = fired.due;
            }
            self.dispatch(fired);
        }
        if now > self.now {
            self.now = now;
        }
    }

    /// The region left the viewport. Leaving the active slide region drops
    /// the slide state; anything else is informational.
    pub fn on_region_exit(
        &mut self,
        now: Millis,
        chapter: &str,
        direction: crate::transition::ScrollDirection,
    ) {
        self.advance(now);
        if self.slides.region().is_some_and(|r| *r == *chapter) {
            self.release_slides();
        } else {
            debug!("region {chapter} exited ({direction:?})");
        }
    }

    /// Layout changed: the scroll detector must re-measure.
    pub fn on_viewport_resize(&mut self, now: Millis) {
        self.advance(now);
        self.page.refresh_scroll_regions();
    }

    /// Cancels everything deferred and runs a full sweep. The engine stays
    /// usable; the next enter signal starts from a clean map.
    pub fn shutdown(&mut self, now: Millis) -> SweepReport {
        self.advance(now);
        self.cancel_in_flight();
        self.release_slides();
        let report = self.stage.full_sweep();
        self.record_sweep(report.clone());
        self.state.current = None;
        report
    }

    fn dispatch(&mut self, fired: Fired<Wake>) {
        match fired.payload {
            Wake::Debounce => {
                if self.state.debounce.take_fired(fired.id) {
                    self.fire_debounce();
                }
            }
            Wake::CameraSettled { ticket } => {
                if self.state.camera.take_fired(fired.id) {
                    self.on_camera_settled(ticket);
                }
            }
            Wake::SlidesSettled { ticket, slide } => {
                if self.state.camera.take_fired(fired.id) {
                    self.on_slides_settled(ticket, slide);
                }
            }
            Wake::SafetySweep { ticket } => {
                if self.state.safety.take_fired(fired.id) {
                    self.on_safety_sweep(ticket);
                }
            }
            Wake::SlideUnlock => {
                if self.slides.lock.take_fired(fired.id) {
                    self.unlock_slides();
                }
            }
            Wake::Effect { family, tag } => self.on_effect_timer(fired.id, family, tag),
        }
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.trace.emit(self.now, event);
    }
}
