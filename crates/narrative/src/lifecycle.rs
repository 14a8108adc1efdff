use std::collections::BTreeMap;
use std::sync::Arc;

use catalog::model::ChapterDescriptor;
use foundation::ids::ChapterId;
use runtime::timers::TimerId;
use streaming::geojson::FeatureCollection;
use tracing::{debug, warn};

use crate::cleanup::{SweepKind, SweepReport};
use crate::effects::dispose;
use crate::engine::NarrativeEngine;
use crate::error::EffectError;
use crate::events::{EngineEvent, metric};
use crate::page::StoryPage;
use crate::stage::Wake;
use crate::surface::{MapSurface, Pane};
use crate::transition::{Ticket, TransitionClass};

/// Data for `chapter`, falling back to its family root, then to `empty`.
fn data_for<'a>(
    store: &'a BTreeMap<ChapterId, Arc<FeatureCollection>>,
    empty: &'a FeatureCollection,
    chapter: &str,
    family: &str,
) -> &'a FeatureCollection {
    store
        .get(chapter)
        .or_else(|| store.get(family))
        .map(Arc::as_ref)
        .unwrap_or(empty)
}

impl<S: MapSurface, P: StoryPage> NarrativeEngine<S, P> {
    /// Cleanup, panes, page chrome, then the camera move. The controller is
    /// activated once the camera settles.
    pub(crate) fn run_lifecycle(
        &mut self,
        descriptor: &ChapterDescriptor,
        class: TransitionClass,
        ticket: Ticket,
    ) {
        let report = match class {
            TransitionClass::SameFamily => self.stage.light_sweep(SweepKind::Light),
            TransitionClass::CrossFamily => self.stage.full_sweep(),
        };
        let panes_closed = report.panes_closed;
        self.record_sweep(report);

        self.apply_split(descriptor, panes_closed);
        self.update_page(descriptor);

        let duration = descriptor.camera.capped_duration(self.tuning.camera_cap_ms);
        self.move_primary(&descriptor.id, &descriptor.camera, duration);
        let at = self.now.after(duration);
        self.state
            .camera
            .arm(&mut self.stage.timers, at, Wake::CameraSettled { ticket });
    }

    pub(crate) fn move_primary(
        &mut self,
        target: &ChapterId,
        camera: &foundation::geo::CameraTarget,
        duration_ms: u64,
    ) {
        self.stage.surface.move_camera(Pane::Primary, camera, duration_ms);
        self.emit(EngineEvent::CameraRequested {
            target: target.clone(),
            pane: Pane::Primary,
            duration_ms,
        });
    }

    /// Opens, repositions or closes the split panes to match `descriptor`.
    pub(crate) fn apply_split(&mut self, descriptor: &ChapterDescriptor, panes_closed: bool) {
        let cap = self.tuning.camera_cap_ms;
        match &descriptor.split_screen {
            Some(split) if self.stage.split_open => {
                let surface = &mut self.stage.surface;
                surface.move_camera(Pane::Left, &split.left, split.left.capped_duration(cap));
                surface.move_camera(Pane::Right, &split.right, split.right.capped_duration(cap));
            }
            Some(split) => match self.stage.surface.open_split(&split.left, &split.right) {
                Ok(()) => {
                    self.stage.split_open = true;
                    self.emit(EngineEvent::SplitScreen { open: true });
                    self.page.refresh_scroll_regions();
                }
                Err(err) => warn!("{}: split panes unavailable: {err}", descriptor.id),
            },
            None => {
                let mut closed = panes_closed;
                if self.stage.split_open {
                    if let Err(err) = self.stage.surface.close_split() {
                        warn!("closing split panes failed: {err}");
                    }
                    self.stage.split_open = false;
                    closed = true;
                }
                if closed {
                    self.emit(EngineEvent::SplitScreen { open: false });
                    self.page.refresh_scroll_regions();
                }
            }
        }
    }

    pub(crate) fn update_page(&mut self, descriptor: &ChapterDescriptor) {
        let id = descriptor.id.as_str();
        let page = &mut self.page;
        page.set_intro_overlay(self.catalog.is_intro(id));
        page.set_chapter_info(descriptor, !descriptor.hide_chapter_info);
        page.set_minimap(descriptor.minimap);
        if !descriptor.custom_minimap_track {
            page.recenter_minimap(descriptor.camera.center);
        }
        page.show_vessels(self.catalog.vessels_for(id));
        page.show_legend(&descriptor.legend);
        page.update_timeline(&descriptor.id, descriptor.date_range.as_ref());
    }

    pub(crate) fn on_camera_settled(&mut self, ticket: Ticket) {
        if !self.state.is_live(ticket) {
            self.stale_callback(ticket);
            return;
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(descriptor) = self
            .state
            .current
            .as_ref()
            .and_then(|c| catalog.get(c.as_str()))
        else {
            self.state.transitioning = false;
            return;
        };
        self.activate_controller(descriptor, Some(descriptor.trigger()));
        self.finish_transition(ticket);
    }

    /// Clears the transitioning flag and schedules the safety sweep.
    pub(crate) fn finish_transition(&mut self, ticket: Ticket) {
        self.state.transitioning = false;
        if let Some(at) = self.state.committed_at {
            self.metrics
                .record_duration(metric::TRANSITION_MS, self.now.since(at));
        }
        let at = self.now.after(self.tuning.safety_sweep_delay_ms);
        self.state
            .safety
            .arm(&mut self.stage.timers, at, Wake::SafetySweep { ticket });
    }

    pub(crate) fn on_safety_sweep(&mut self, ticket: Ticket) {
        if !self.state.is_live(ticket) {
            self.stale_callback(ticket);
            return;
        }
        let Some(family) = self
            .state
            .current
            .as_ref()
            .and_then(|c| self.catalog.family_of(c.as_str()))
            .cloned()
        else {
            return;
        };
        let report = self.stage.safety_sweep(family.as_str());
        self.record_sweep(report);
    }

    pub(crate) fn stale_callback(&mut self, ticket: Ticket) {
        debug!(
            "dropping callback for transition {} (current {})",
            ticket.0, self.state.ticket.0
        );
        self.metrics.inc(metric::CALLBACKS_STALE);
        self.emit(EngineEvent::StaleCallback {
            ticket,
            current: self.state.ticket,
        });
    }

    /// Makes sure `descriptor`'s family has a live controller and optionally
    /// fires `trigger` on it.
    ///
    /// An existing controller of the family is reused; after a full sweep
    /// there is none and the family factory builds a fresh one from the
    /// family root descriptor. Failures are logged and counted, never raised.
    pub(crate) fn activate_controller(&mut self, descriptor: &ChapterDescriptor, trigger: Option<&str>) {
        let catalog = Arc::clone(&self.catalog);
        let family = descriptor.family().clone();
        let root = catalog.get(family.as_str()).unwrap_or(descriptor);
        let now = self.now;

        let checked_out = self.stage.registry.checkout_controller(family.as_str());
        let reused = checked_out.is_some();
        let (entry, mut controller) = match checked_out {
            Some((id, controller)) => (Some(id), controller),
            None => {
                let data = data_for(
                    &self.chapter_data,
                    &self.empty_data,
                    descriptor.id.as_str(),
                    family.as_str(),
                );
                let mut cx = self.stage.context(now, &family, &descriptor.id, data);
                match self.factories.build(root, &mut cx) {
                    Ok(controller) => (None, controller),
                    Err(err) => {
                        self.controller_failed(&family, err);
                        return;
                    }
                }
            }
        };

        let fired = match trigger {
            Some(name) => {
                let data = data_for(
                    &self.chapter_data,
                    &self.empty_data,
                    descriptor.id.as_str(),
                    family.as_str(),
                );
                let mut cx = self.stage.context(now, &family, &descriptor.id, data);
                controller.trigger(name, &mut cx)
            }
            None => Ok(()),
        };

        match entry {
            Some(id) => {
                if let Err(mut orphan) = self.stage.registry.checkin_controller(id, controller) {
                    // Released while the trigger ran.
                    dispose(orphan.as_mut());
                }
            }
            None => {
                self.stage.registry.track_controller(&family, controller);
            }
        }

        match fired {
            Ok(()) => self.emit(EngineEvent::ControllerActivated {
                family,
                trigger: trigger.map(str::to_string),
                reused,
            }),
            Err(err) => self.controller_failed(&family, err),
        }
    }

    fn controller_failed(&mut self, family: &ChapterId, err: EffectError) {
        warn!("controller of {family} failed: {err}");
        self.metrics.inc(metric::CONTROLLERS_FAILED);
        self.emit(EngineEvent::ControllerFailed {
            family: family.clone(),
            error: err.to_string(),
        });
    }

    /// Delivers an effect timer to its family's controller.
    pub(crate) fn on_effect_timer(&mut self, timer: TimerId, family: ChapterId, tag: u32) {
        self.stage.registry.forget_fired_timer(timer);
        let Some((id, mut controller)) = self.stage.registry.checkout_controller(family.as_str())
        else {
            debug!("timer {tag} of {family} has no controller to run");
            return;
        };
        let chapter = self.state.current.clone().unwrap_or_else(|| family.clone());
        let now = self.now;
        let result = {
            let data = data_for(
                &self.chapter_data,
                &self.empty_data,
                chapter.as_str(),
                family.as_str(),
            );
            let mut cx = self.stage.context(now, &family, &chapter, data);
            controller.on_timer(tag, &mut cx)
        };
        if let Err(mut orphan) = self.stage.registry.checkin_controller(id, controller) {
            dispose(orphan.as_mut());
        }
        if let Err(err) = result {
            self.controller_failed(&family, err);
        }
    }

    pub(crate) fn record_sweep(&mut self, report: SweepReport) {
        let name = match report.kind {
            SweepKind::Full => metric::SWEEPS_FULL,
            SweepKind::Light => metric::SWEEPS_LIGHT,
            SweepKind::Safety => metric::SWEEPS_SAFETY,
            SweepKind::RapidGuard => metric::SWEEPS_RAPID_GUARD,
        };
        self.metrics.inc(name);
        let failures = report.failures();
        if failures > 0 {
            self.metrics
                .add(metric::CLEANUP_FAILURES, u64::from(failures));
        }
        self.emit(EngineEvent::Swept(report));
    }
}
