use std::sync::Arc;

use catalog::model::ChapterDescriptor;
use foundation::geo::CameraTarget;
use foundation::ids::ChapterId;
use foundation::time::Millis;
use runtime::timers::{TimerQueue, TimerSlot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::NarrativeEngine;
use crate::events::{EngineEvent, metric};
use crate::page::{SlideView, StoryPage};
use crate::stage::Wake;
use crate::surface::MapSurface;
use crate::transition::{ScrollDirection, Ticket, TransitionClass};

/// Whether the engine used an input event. The host should suppress native
/// scrolling for consumed events.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOutcome {
    Consumed,
    PassThrough,
}

/// Keyboard navigation, already mapped from concrete keys by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKey {
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSlides {
    pub region: ChapterId,
    pub index: usize,
    pub total: usize,
}

/// State of the horizontal slide region, if one is active.
#[derive(Debug, Default)]
pub struct SlideState {
    pub(crate) active: Option<ActiveSlides>,
    pub(crate) accumulated: f64,
    pub(crate) locked: bool,
    pub(crate) lock: TimerSlot,
    pub(crate) touch_origin: Option<(f64, f64)>,
}

impl SlideState {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn region(&self) -> Option<&ChapterId> {
        self.active.as_ref().map(|a| &a.region)
    }

    pub fn index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.index)
    }

    pub fn total(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.total)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn view(&self) -> Option<SlideView> {
        self.active.as_ref().map(|a| SlideView {
            region: a.region.clone(),
            active: a.index,
            total: a.total,
        })
    }

    /// Adds a wheel delta and returns a step once `threshold` is reached.
    /// A change of direction starts over.
    pub(crate) fn accumulate(&mut self, delta: f64, threshold: f64) -> Option<ScrollDirection> {
        if delta == 0.0 || !delta.is_finite() {
            return None;
        }
        if self.accumulated != 0.0 && self.accumulated.signum() != delta.signum() {
            self.accumulated = 0.0;
        }
        self.accumulated += delta;
        if self.accumulated.abs() < threshold {
            return None;
        }
        let step = if self.accumulated > 0.0 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        self.accumulated = 0.0;
        Some(step)
    }

    fn deactivate(&mut self, timers: &mut TimerQueue<Wake>) -> Option<ActiveSlides> {
        self.lock.cancel(timers);
        self.locked = false;
        self.accumulated = 0.0;
        self.touch_origin = None;
        self.active.take()
    }
}

/// Entering from below starts at the last slide, otherwise at the first.
pub fn start_index(total: usize, direction: ScrollDirection) -> usize {
    match direction {
        ScrollDirection::Backward => total.saturating_sub(1),
        ScrollDirection::Forward => 0,
    }
}

fn slide_camera(catalog: &catalog::StoryCatalog, region: &ChapterDescriptor, index: usize) -> CameraTarget {
    region
        .slides
        .get(index)
        .and_then(|s| s.camera)
        .or_else(|| catalog.get(region.family().as_str()).map(|root| root.camera))
        .unwrap_or(region.camera)
}

impl<S: MapSurface, P: StoryPage> NarrativeEngine<S, P> {
    /// Takes over from vertical scrolling for a slide region.
    pub(crate) fn enter_slides(&mut self, region: ChapterId, reported: ScrollDirection) {
        let catalog = Arc::clone(&self.catalog);
        let Some(descriptor) = catalog.get(region.as_str()) else {
            return;
        };
        self.cancel_in_flight();
        // Leftover lock, wheel delta and touch origin belong to the old region.
        self.release_slides();

        // Re-entering the region that is already current keeps the detector's
        // direction.
        let direction = match (
            self.state.current.as_ref().and_then(|c| catalog.order_of(c.as_str())),
            catalog.order_of(region.as_str()),
        ) {
            (Some(previous), Some(here)) if previous > here => ScrollDirection::Backward,
            (Some(previous), Some(here)) if previous < here => ScrollDirection::Forward,
            _ => reported,
        };
        let total = descriptor.slides.len();
        let start = start_index(total, direction);

        let from = self.state.current.clone();
        let ticket = self
            .state
            .begin(region.clone(), TransitionClass::CrossFamily, self.now);
        self.metrics.inc(metric::TRANSITIONS_COMMITTED);
        info!("entering slide region {region} at slide {start} of {total}");
        self.emit(EngineEvent::SlidesEntered {
            region: region.clone(),
            from,
            start,
            direction,
            ticket,
        });

        let report = self.stage.full_sweep();
        let panes_closed = report.panes_closed;
        self.record_sweep(report);
        self.apply_split(descriptor, panes_closed);
        self.update_page(descriptor);

        self.slides.active = Some(ActiveSlides {
            region: region.clone(),
            index: start,
            total,
        });
        self.show_slide_view();
        self.activate_controller(descriptor, None);

        let camera = slide_camera(&catalog, descriptor, start);
        let duration = camera.capped_duration(self.tuning.camera_cap_ms);
        self.move_primary(&region, &camera, duration);
        let at = self.now.after(duration);
        self.state.camera.arm(
            &mut self.stage.timers,
            at,
            Wake::SlidesSettled {
                ticket,
                slide: start,
            },
        );
    }

    pub(crate) fn on_slides_settled(&mut self, ticket: Ticket, slide: usize) {
        if !self.state.is_live(ticket) {
            self.stale_callback(ticket);
            return;
        }
        // A slide change during the entry move already fired its own trigger.
        if self.slides.index() == Some(slide) {
            self.fire_slide_trigger(slide);
        }
        self.finish_transition(ticket);
    }

    fn fire_slide_trigger(&mut self, index: usize) {
        let catalog = Arc::clone(&self.catalog);
        let Some(region) = self
            .slides
            .region()
            .and_then(|r| catalog.get(r.as_str()))
        else {
            return;
        };
        if let Some(name) = region.slides.get(index).and_then(|s| s.trigger.as_deref()) {
            self.activate_controller(region, Some(name));
        }
    }

    fn show_slide_view(&mut self) {
        let view = self.slides.view();
        self.page.show_slides(view.as_ref());
    }

    fn change_slide(&mut self, to: usize) {
        let Some(active) = self.slides.active.as_mut() else {
            return;
        };
        let from = active.index;
        active.index = to;
        let region = active.region.clone();

        self.slides.accumulated = 0.0;
        self.slides.locked = true;
        let unlock_at = self.now.after(self.tuning.slide_lock_ms);
        self.slides
            .lock
            .arm(&mut self.stage.timers, unlock_at, Wake::SlideUnlock);

        self.metrics.inc(metric::SLIDES_CHANGED);
        self.emit(EngineEvent::SlideChanged {
            region: region.clone(),
            from,
            to,
        });
        self.show_slide_view();

        let catalog = Arc::clone(&self.catalog);
        if let Some(descriptor) = catalog.get(region.as_str()) {
            let camera = slide_camera(&catalog, descriptor, to);
            let duration = self.tuning.slide_camera_ms.min(self.tuning.camera_cap_ms);
            self.move_primary(&region, &camera, duration);
        }
        self.fire_slide_trigger(to);
    }

    fn step_slides(&mut self, direction: ScrollDirection) -> InputOutcome {
        let Some(active) = self.slides.active.as_ref() else {
            return InputOutcome::PassThrough;
        };
        let (index, total) = (active.index, active.total);
        match direction {
            ScrollDirection::Forward if index + 1 < total => {
                self.change_slide(index + 1);
                InputOutcome::Consumed
            }
            ScrollDirection::Backward if index > 0 => {
                self.change_slide(index - 1);
                InputOutcome::Consumed
            }
            _ => {
                self.exit_slides(direction);
                InputOutcome::PassThrough
            }
        }
    }

    /// Leaves the region past its first or last slide and hands control back
    /// to vertical navigation.
    fn exit_slides(&mut self, direction: ScrollDirection) {
        let Some(active) = self.slides.deactivate(&mut self.stage.timers) else {
            return;
        };
        self.page.show_slides(None);
        info!("leaving slide region {} ({direction:?})", active.region);
        self.emit(EngineEvent::SlidesExited {
            region: active.region.clone(),
            direction,
        });
        self.cancel_in_flight();

        let catalog = Arc::clone(&self.catalog);
        let target = match direction {
            ScrollDirection::Backward => catalog.get(active.region.as_str()).and_then(|region| {
                match &region.parent {
                    Some(parent) => Some(parent.clone()),
                    None => catalog
                        .order_of(region.id.as_str())
                        .and_then(|pos| pos.checked_sub(1))
                        .and_then(|pos| catalog.chapters().nth(pos))
                        .map(|c| c.id.clone()),
                }
            }),
            ScrollDirection::Forward => catalog
                .next_after(active.region.as_str())
                .map(|c| c.id.clone()),
        };
        match (target, direction) {
            // Back to the parent always restores its main view from scratch.
            (Some(target), ScrollDirection::Backward) => {
                self.commit(target, Some(TransitionClass::CrossFamily))
            }
            (Some(target), ScrollDirection::Forward) => self.commit(target, None),
            (None, _) => debug!("no chapter beyond slide region {}", active.region),
        }
    }

    /// Drops slide state without navigating anywhere.
    pub(crate) fn release_slides(&mut self) {
        if let Some(active) = self.slides.deactivate(&mut self.stage.timers) {
            self.page.show_slides(None);
            self.emit(EngineEvent::SlidesReleased {
                region: active.region,
            });
        }
    }

    pub(crate) fn unlock_slides(&mut self) {
        self.slides.locked = false;
    }

    /// Wheel input. Deltas accumulate until the slide threshold is crossed;
    /// input during the post-change lock is discarded.
    pub fn on_wheel(&mut self, now: Millis, delta_y: f64) -> InputOutcome {
        self.advance(now);
        if !self.slides.is_active() {
            return InputOutcome::PassThrough;
        }
        if self.slides.locked {
            return InputOutcome::Consumed;
        }
        match self
            .slides
            .accumulate(delta_y, self.tuning.slide_scroll_threshold_px)
        {
            Some(direction) => self.step_slides(direction),
            None => InputOutcome::Consumed,
        }
    }

    pub fn on_key(&mut self, now: Millis, key: SlideKey) -> InputOutcome {
        self.advance(now);
        if !self.slides.is_active() {
            return InputOutcome::PassThrough;
        }
        if self.slides.locked {
            return InputOutcome::Consumed;
        }
        let direction = match key {
            SlideKey::Next => ScrollDirection::Forward,
            SlideKey::Previous => ScrollDirection::Backward,
        };
        self.step_slides(direction)
    }

    /// Progress dot clicked: jump straight to `index`.
    pub fn on_dot_click(&mut self, now: Millis, index: usize) -> InputOutcome {
        self.advance(now);
        let Some(active) = self.slides.active.as_ref() else {
            return InputOutcome::PassThrough;
        };
        if !self.slides.locked && index < active.total && index != active.index {
            self.change_slide(index);
        }
        InputOutcome::Consumed
    }

    pub fn on_touch_start(&mut self, now: Millis, x: f64, y: f64) {
        self.advance(now);
        if self.slides.is_active() {
            self.slides.touch_origin = Some((x, y));
        }
    }

    /// Touch released. Travel along the dominant axis past the swipe
    /// threshold changes slide at once.
    pub fn on_touch_end(&mut self, now: Millis, x: f64, y: f64) -> InputOutcome {
        self.advance(now);
        let Some((x0, y0)) = self.slides.touch_origin.take() else {
            return InputOutcome::PassThrough;
        };
        if !self.slides.is_active() {
            return InputOutcome::PassThrough;
        }
        if self.slides.locked {
            return InputOutcome::Consumed;
        }
        let (dx, dy) = (x0 - x, y0 - y);
        let travel = if dx.abs() >= dy.abs() { dx } else { dy };
        if travel.abs() < self.tuning.swipe_threshold_px {
            return InputOutcome::Consumed;
        }
        let direction = if travel > 0.0 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        self.step_slides(direction)
    }
}
