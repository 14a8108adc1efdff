use std::collections::BTreeMap;

use catalog::model::ChapterDescriptor;
use foundation::geo::CameraTarget;
use foundation::handles::{OverlayHandle, ResourceId};
use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::timers::TimerQueue;
use streaming::geojson::FeatureCollection;
use tracing::warn;

use crate::error::EffectError;
use crate::registry::{Category, MarkerCategory, ResourceRegistry};
use crate::stage::Wake;
use crate::surface::{LayerSpec, MapSurface, MarkerSpec, Pane, PopupSpec};

/// Result of one teardown capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposal {
    Done,
    /// The object has no such capability.
    Unsupported,
    Failed(String),
}

/// Teardown capabilities of a running animation or effect.
///
/// Every capability defaults to [`Disposal::Unsupported`]; implementors
/// override the ones they have. Disposal tries all of them.
pub trait Animation {
    fn stop(&mut self) -> Disposal {
        Disposal::Unsupported
    }

    fn cleanup(&mut self) -> Disposal {
        Disposal::Unsupported
    }

    fn kill(&mut self) -> Disposal {
        Disposal::Unsupported
    }

    fn clear(&mut self) -> Disposal {
        Disposal::Unsupported
    }
}

/// Outcome of [`dispose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub done: u32,
    pub failures: Vec<String>,
}

/// Runs every teardown capability in order; a failing one does not stop the
/// rest.
pub fn dispose<A: Animation + ?Sized>(target: &mut A) -> DisposeReport {
    let mut report = DisposeReport::default();
    let outcomes = [
        ("stop", target.stop()),
        ("cleanup", target.cleanup()),
        ("kill", target.kill()),
        ("clear", target.clear()),
    ];
    for (name, outcome) in outcomes {
        match outcome {
            Disposal::Done => report.done += 1,
            Disposal::Unsupported => {}
            Disposal::Failed(msg) => report.failures.push(format!("{name}: {msg}")),
        }
    }
    report
}

/// A chapter family's visual-effect controller.
///
/// One instance exists per family at a time. It is built by the family's
/// factory and then driven through named triggers.
pub trait EffectController: Animation {
    fn trigger(&mut self, name: &str, cx: &mut EffectContext<'_>) -> Result<(), EffectError>;

    /// A timer scheduled through [`EffectContext::set_timeout`] or
    /// [`EffectContext::set_interval`] fired.
    fn on_timer(&mut self, _tag: u32, _cx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        Ok(())
    }
}

pub type ControllerFactory = Box<
    dyn Fn(&ChapterDescriptor, &mut EffectContext<'_>) -> Result<Box<dyn EffectController>, EffectError>,
>;

/// Controller factories keyed by family root id.
#[derive(Default)]
pub struct ControllerFactories {
    by_family: BTreeMap<ChapterId, ControllerFactory>,
}

impl ControllerFactories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, family: impl Into<ChapterId>, factory: F)
    where
        F: Fn(&ChapterDescriptor, &mut EffectContext<'_>) -> Result<Box<dyn EffectController>, EffectError>
            + 'static,
    {
        self.by_family.insert(family.into(), Box::new(factory));
    }

    pub fn with<F>(mut self, family: impl Into<ChapterId>, factory: F) -> Self
    where
        F: Fn(&ChapterDescriptor, &mut EffectContext<'_>) -> Result<Box<dyn EffectController>, EffectError>
            + 'static,
    {
        self.register(family, factory);
        self
    }

    pub fn contains(&self, family: &str) -> bool {
        self.by_family.contains_key(family)
    }

    pub fn len(&self) -> usize {
        self.by_family.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_family.is_empty()
    }

    /// Builds the controller for `root`'s family.
    pub fn build(
        &self,
        root: &ChapterDescriptor,
        cx: &mut EffectContext<'_>,
    ) -> Result<Box<dyn EffectController>, EffectError> {
        let family = root.family();
        let factory = self
            .by_family
            .get(family)
            .ok_or_else(|| EffectError::MissingFactory(family.clone()))?;
        factory(root, cx)
    }
}

impl std::fmt::Debug for ControllerFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.by_family.keys()).finish()
    }
}

/// Whether the map currently shows one pane or two.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PaneLayout {
    Single,
    Split,
}

/// Everything a controller may touch while it runs.
///
/// Markers, popups, layers, sources, timers and animations created through
/// the context are tracked in the registry under the controller's family, so
/// the cleanup sweeps can find them again.
pub struct EffectContext<'a> {
    pub(crate) now: Millis,
    pub(crate) family: &'a ChapterId,
    pub(crate) chapter: &'a ChapterId,
    pub(crate) layout: PaneLayout,
    pub(crate) data: &'a FeatureCollection,
    pub(crate) surface: &'a mut dyn MapSurface,
    pub(crate) registry: &'a mut ResourceRegistry,
    pub(crate) timers: &'a mut TimerQueue<Wake>,
}

impl EffectContext<'_> {
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn family(&self) -> &ChapterId {
        self.family
    }

    /// The chapter whose transition is being served.
    pub fn chapter(&self) -> &ChapterId {
        self.chapter
    }

    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    /// Data provided for the chapter (or its family root). Empty when the host
    /// has not provided any.
    pub fn chapter_data(&self) -> &FeatureCollection {
        self.data
    }

    pub fn move_camera(&mut self, pane: Pane, target: &CameraTarget, duration_ms: u64) {
        self.surface.move_camera(pane, target, duration_ms);
    }

    pub fn add_source(&mut self, id: &str, data: &FeatureCollection) -> Result<ResourceId, EffectError> {
        match self.surface.add_source(id, data, Some(self.family)) {
            Ok(()) => Ok(self.registry.track_source(self.family, id)),
            Err(err) => Err(self.creation_failed(Category::Source, err.into())),
        }
    }

    pub fn add_layer(&mut self, spec: &LayerSpec) -> Result<ResourceId, EffectError> {
        match self.surface.add_layer(spec, Some(self.family)) {
            Ok(()) => Ok(self.registry.track_layer(self.family, &spec.id)),
            Err(err) => Err(self.creation_failed(Category::Layer, err.into())),
        }
    }

    pub fn add_marker(
        &mut self,
        spec: &MarkerSpec,
        category: MarkerCategory,
    ) -> Result<OverlayHandle, EffectError> {
        match self.surface.add_marker(spec, self.family) {
            Ok(handle) => {
                self.registry.track_marker(self.family, handle, category);
                Ok(handle)
            }
            Err(err) => Err(self.creation_failed(Category::Marker, err.into())),
        }
    }

    pub fn add_popup(&mut self, spec: &PopupSpec) -> Result<OverlayHandle, EffectError> {
        match self.surface.add_popup(spec, self.family) {
            Ok(handle) => {
                self.registry.track_popup(self.family, handle);
                Ok(handle)
            }
            Err(err) => Err(self.creation_failed(Category::Popup, err.into())),
        }
    }

    /// One-shot timer delivered to [`EffectController::on_timer`] with `tag`.
    pub fn set_timeout(&mut self, delay_ms: u64, tag: u32) -> ResourceId {
        let wake = Wake::Effect {
            family: self.family.clone(),
            tag,
        };
        let timer = self.timers.schedule(self.now.after(delay_ms), wake);
        self.registry.track_timer(self.family, timer)
    }

    pub fn set_interval(&mut self, period_ms: u64, tag: u32) -> ResourceId {
        let wake = Wake::Effect {
            family: self.family.clone(),
            tag,
        };
        let timer = self
            .timers
            .schedule_every(self.now.after(period_ms), period_ms, wake);
        self.registry.track_interval(self.family, timer)
    }

    pub fn track_animation(&mut self, animation: Box<dyn Animation>) -> ResourceId {
        self.registry.track_animation(self.family, animation)
    }

    /// Releases one resource the controller created. Unknown ids are ignored.
    pub fn release(&mut self, id: ResourceId) -> bool {
        self.registry.release(id, &mut *self.surface, &mut *self.timers)
    }

    fn creation_failed(&mut self, category: Category, err: EffectError) -> EffectError {
        warn!("{} could not create {category:?}: {err}", self.family);
        self.registry.record_failure(self.family, category);
        err
    }
}
