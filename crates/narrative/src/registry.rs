use std::collections::BTreeMap;

use foundation::handles::{IdAllocator, OverlayHandle, ResourceId};
use foundation::ids::ChapterId;
use runtime::timers::{TimerId, TimerQueue};
use serde::Serialize;
use tracing::{debug, warn};

use crate::effects::{Animation, EffectController, dispose};
use crate::stage::Wake;
use crate::surface::MapSurface;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    Main,
    Mini,
    Detection,
    Vessel,
    Other,
}

/// Kind of a tracked resource. The declaration order is the release order
/// of [`ResourceRegistry::release_all`]: layers go before the sources they
/// draw from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Timer,
    Interval,
    Animation,
    Controller,
    Popup,
    Marker,
    Layer,
    Source,
}

const RELEASE_ORDER: [Category; 8] = [
    Category::Timer,
    Category::Interval,
    Category::Animation,
    Category::Controller,
    Category::Popup,
    Category::Marker,
    Category::Layer,
    Category::Source,
];

enum Resource {
    Timer(TimerId),
    Interval(TimerId),
    Animation(Box<dyn Animation>),
    /// `None` while the controller is checked out to run a trigger.
    Controller(Option<Box<dyn EffectController>>),
    Marker(OverlayHandle, MarkerCategory),
    Popup(OverlayHandle),
    Layer(String),
    Source(String),
}

impl Resource {
    fn category(&self) -> Category {
        match self {
            Resource::Timer(_) => Category::Timer,
            Resource::Interval(_) => Category::Interval,
            Resource::Animation(_) => Category::Animation,
            Resource::Controller(_) => Category::Controller,
            Resource::Marker(..) => Category::Marker,
            Resource::Popup(_) => Category::Popup,
            Resource::Layer(_) => Category::Layer,
            Resource::Source(_) => Category::Source,
        }
    }
}

struct Tracked {
    id: ResourceId,
    owner: ChapterId,
    resource: Resource,
}

/// Per-category counts of one release pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseCounts {
    pub timers: u32,
    pub intervals: u32,
    pub animations: u32,
    pub controllers: u32,
    pub popups: u32,
    pub markers: u32,
    pub layers: u32,
    pub sources: u32,
    /// Handles whose teardown raised; they are dropped from tracking anyway.
    pub failures: u32,
}

impl ReleaseCounts {
    fn count(&mut self, category: Category) {
        let slot = match category {
            Category::Timer => &mut self.timers,
            Category::Interval => &mut self.intervals,
            Category::Animation => &mut self.animations,
            Category::Controller => &mut self.controllers,
            Category::Popup => &mut self.popups,
            Category::Marker => &mut self.markers,
            Category::Layer => &mut self.layers,
            Category::Source => &mut self.sources,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.timers
            + self.intervals
            + self.animations
            + self.controllers
            + self.popups
            + self.markers
            + self.layers
            + self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: ReleaseCounts) {
        self.timers += other.timers;
        self.intervals += other.intervals;
        self.animations += other.animations;
        self.controllers += other.controllers;
        self.popups += other.popups;
        self.markers += other.markers;
        self.layers += other.layers;
        self.sources += other.sources;
        self.failures += other.failures;
    }
}

/// Everything live that a chapter's effects created, tagged with the owning
/// family.
///
/// `track_*` calls hand back an id and never fail. Release is idempotent:
/// releasing an unknown or already released id does nothing.
#[derive(Default)]
pub struct ResourceRegistry {
    ids: IdAllocator,
    entries: Vec<Tracked>,
    failed_creations: BTreeMap<(ChapterId, Category), u64>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("entries", &self.entries.len())
            .field("failed_creations", &self.failed_creations)
            .finish()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries
            .iter()
            .filter(|e| e.resource.category() == category)
            .count()
    }

    pub fn count_owned(&self, owner: &str) -> usize {
        self.entries.iter().filter(|e| e.owner == *owner).count()
    }

    fn track(&mut self, owner: &ChapterId, resource: Resource) -> ResourceId {
        let id = self.ids.next_resource();
        self.entries.push(Tracked {
            id,
            owner: owner.clone(),
            resource,
        });
        id
    }

    pub(crate) fn track_timer(&mut self, owner: &ChapterId, timer: TimerId) -> ResourceId {
        self.track(owner, Resource::Timer(timer))
    }

    pub(crate) fn track_interval(&mut self, owner: &ChapterId, timer: TimerId) -> ResourceId {
        self.track(owner, Resource::Interval(timer))
    }

    pub fn track_animation(&mut self, owner: &ChapterId, animation: Box<dyn Animation>) -> ResourceId {
        self.track(owner, Resource::Animation(animation))
    }

    pub fn track_controller(
        &mut self,
        owner: &ChapterId,
        controller: Box<dyn EffectController>,
    ) -> ResourceId {
        self.track(owner, Resource::Controller(Some(controller)))
    }

    pub fn track_marker(
        &mut self,
        owner: &ChapterId,
        handle: OverlayHandle,
        category: MarkerCategory,
    ) -> ResourceId {
        self.track(owner, Resource::Marker(handle, category))
    }

    pub fn track_popup(&mut self, owner: &ChapterId, handle: OverlayHandle) -> ResourceId {
        self.track(owner, Resource::Popup(handle))
    }

    pub fn track_layer(&mut self, owner: &ChapterId, layer: &str) -> ResourceId {
        self.track(owner, Resource::Layer(layer.to_string()))
    }

    pub fn track_source(&mut self, owner: &ChapterId, source: &str) -> ResourceId {
        self.track(owner, Resource::Source(source.to_string()))
    }

    /// Records a creation that raised before any handle existed.
    pub fn record_failure(&mut self, owner: &ChapterId, category: Category) {
        *self
            .failed_creations
            .entry((owner.clone(), category))
            .or_default() += 1;
    }

    pub fn failed_creations(&self) -> u64 {
        self.failed_creations.values().sum()
    }

    pub fn failed_creations_of(&self, owner: &str, category: Category) -> u64 {
        self.failed_creations
            .iter()
            .filter(|((o, c), _)| *o == *owner && *c == category)
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn markers(&self, category: MarkerCategory) -> Vec<OverlayHandle> {
        self.entries
            .iter()
            .filter_map(|e| match e.resource {
                Resource::Marker(handle, c) if c == category => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn contains_overlay(&self, handle: OverlayHandle) -> bool {
        self.entries.iter().any(|e| match e.resource {
            Resource::Marker(h, _) | Resource::Popup(h) => h == handle,
            _ => false,
        })
    }

    pub fn contains_layer(&self, layer: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(&e.resource, Resource::Layer(l) if l == layer))
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(&e.resource, Resource::Source(s) if s == source))
    }

    pub fn has_controller(&self, family: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.owner == *family && matches!(e.resource, Resource::Controller(_)))
    }

    /// Takes `family`'s controller out so a trigger can run while the registry
    /// stays usable. Return it with [`Self::checkin_controller`].
    pub fn checkout_controller(
        &mut self,
        family: &str,
    ) -> Option<(ResourceId, Box<dyn EffectController>)> {
        self.entries.iter_mut().find_map(|e| match &mut e.resource {
            Resource::Controller(slot) if e.owner == *family => slot.take().map(|c| (e.id, c)),
            _ => None,
        })
    }

    /// Puts a checked-out controller back. If its entry was released in the
    /// meantime the controller is handed back so the caller can dispose it.
    pub fn checkin_controller(
        &mut self,
        id: ResourceId,
        controller: Box<dyn EffectController>,
    ) -> Result<(), Box<dyn EffectController>> {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(Tracked {
                resource: Resource::Controller(slot @ None),
                ..
            }) => {
                *slot = Some(controller);
                Ok(())
            }
            _ => Err(controller),
        }
    }

    /// Drops a one-shot timer that has fired. Intervals stay tracked.
    pub(crate) fn forget_fired_timer(&mut self, timer: TimerId) {
        self.entries
            .retain(|e| !matches!(e.resource, Resource::Timer(t) if t == timer));
    }

    pub(crate) fn owner_of_timer(&self, timer: TimerId) -> Option<&ChapterId> {
        self.entries.iter().find_map(|e| match e.resource {
            Resource::Timer(t) | Resource::Interval(t) if t == timer => Some(&e.owner),
            _ => None,
        })
    }

    /// Releases one resource. Returns `false` if `id` is not tracked.
    pub(crate) fn release(
        &mut self,
        id: ResourceId,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Wake>,
    ) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        let mut counts = ReleaseCounts::default();
        teardown(entry, surface, timers, &mut counts);
        true
    }

    /// Releases every tracked resource, category by category.
    pub(crate) fn release_all(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Wake>,
    ) -> ReleaseCounts {
        self.release_where(surface, timers, |_| true)
    }

    /// Releases markers and popups only.
    pub(crate) fn release_overlays(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Wake>,
    ) -> ReleaseCounts {
        self.release_where(surface, timers, |e| {
            matches!(e.resource, Resource::Marker(..) | Resource::Popup(_))
        })
    }

    /// Releases markers and popups owned by any family other than `family`.
    pub(crate) fn release_foreign(
        &mut self,
        family: &str,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Wake>,
    ) -> ReleaseCounts {
        self.release_where(surface, timers, |e| {
            e.owner != *family && matches!(e.resource, Resource::Marker(..) | Resource::Popup(_))
        })
    }

    fn release_where(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Wake>,
        select: impl Fn(&Tracked) -> bool,
    ) -> ReleaseCounts {
        let (selected, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| select(e));
        self.entries = kept;

        let mut by_category: BTreeMap<Category, Vec<Tracked>> = BTreeMap::new();
        for entry in selected {
            by_category
                .entry(entry.resource.category())
                .or_default()
                .push(entry);
        }

        let mut counts = ReleaseCounts::default();
        for category in RELEASE_ORDER {
            for entry in by_category.remove(&category).unwrap_or_default() {
                teardown(entry, surface, timers, &mut counts);
            }
        }
        counts
    }
}

fn teardown(
    entry: Tracked,
    surface: &mut dyn MapSurface,
    timers: &mut TimerQueue<Wake>,
    counts: &mut ReleaseCounts,
) {
    let Tracked {
        id,
        owner,
        resource,
    } = entry;
    let category = resource.category();
    counts.count(category);

    let failures = match resource {
        Resource::Timer(timer) | Resource::Interval(timer) => {
            // Already fired or cancelled elsewhere is fine.
            timers.cancel(timer);
            Vec::new()
        }
        Resource::Animation(mut animation) => dispose(animation.as_mut()).failures,
        Resource::Controller(Some(mut controller)) => dispose(controller.as_mut()).failures,
        Resource::Controller(None) => {
            debug!("controller of {owner} released while checked out");
            Vec::new()
        }
        Resource::Marker(handle, _) | Resource::Popup(handle) => surface
            .remove_overlay(handle)
            .err()
            .map(|e| e.to_string())
            .into_iter()
            .collect(),
        Resource::Layer(layer) => surface
            .remove_layer(&layer)
            .err()
            .map(|e| e.to_string())
            .into_iter()
            .collect(),
        Resource::Source(source) => surface
            .remove_source(&source)
            .err()
            .map(|e| e.to_string())
            .into_iter()
            .collect(),
    };

    for failure in &failures {
        warn!("releasing {category:?} {} of {owner} failed: {failure}", id.get());
    }
    if !failures.is_empty() {
        counts.failures += 1;
    }
}
