use serde::Serialize;
use tracing::{debug, warn};

use crate::registry::ReleaseCounts;
use crate::stage::Stage;
use crate::surface::MapSurface;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Everything a chapter left behind, split panes included.
    Full,
    /// Markers and popups only; keeps the family's controller and layers.
    Light,
    /// Overlays of other families, run after a transition settles.
    Safety,
    /// Extra light sweep before a commit that follows the previous one too closely.
    RapidGuard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub kind: SweepKind,
    pub released: ReleaseCounts,
    /// Renderer objects removed by the inventory scan because nothing tracked them.
    pub orphans: u32,
    pub orphan_failures: u32,
    pub panes_closed: bool,
}

impl SweepReport {
    fn new(kind: SweepKind, released: ReleaseCounts) -> Self {
        Self {
            kind,
            released,
            orphans: 0,
            orphan_failures: 0,
            panes_closed: false,
        }
    }

    pub fn failures(&self) -> u32 {
        self.released.failures + self.orphan_failures
    }
}

impl<S: MapSurface> Stage<S> {
    /// Releases everything tracked, then removes whatever the renderer still
    /// holds that an effect created: any marker or popup, and layers and
    /// sources with an owner. Base-map layers have no owner and stay.
    /// Closes split panes if they are open.
    pub(crate) fn full_sweep(&mut self) -> SweepReport {
        let released = self.registry.release_all(&mut self.surface, &mut self.timers);
        let mut report = SweepReport::new(SweepKind::Full, released);

        self.remove_orphan_overlays(&mut report, |_| true);

        for layer in self.surface.layers() {
            if layer.owner.is_none() || self.registry.contains_layer(&layer.id) {
                continue;
            }
            match self.surface.remove_layer(&layer.id) {
                Ok(()) => report.orphans += 1,
                Err(err) => {
                    warn!("removing orphan layer {} failed: {err}", layer.id);
                    report.orphan_failures += 1;
                }
            }
        }
        for source in self.surface.sources() {
            if source.owner.is_none() || self.registry.contains_source(&source.id) {
                continue;
            }
            match self.surface.remove_source(&source.id) {
                Ok(()) => report.orphans += 1,
                Err(err) => {
                    warn!("removing orphan source {} failed: {err}", source.id);
                    report.orphan_failures += 1;
                }
            }
        }

        if self.split_open {
            if let Err(err) = self.surface.close_split() {
                warn!("closing split panes failed: {err}");
                report.orphan_failures += 1;
            }
            // A pane that failed to close is not reused either way.
            self.split_open = false;
            report.panes_closed = true;
        }

        debug!(
            "full sweep released {} tracked, {} orphans",
            report.released.total(),
            report.orphans
        );
        report
    }

    /// Releases tracked markers and popups, then any overlay the renderer
    /// still shows.
    pub(crate) fn light_sweep(&mut self, kind: SweepKind) -> SweepReport {
        let released = self
            .registry
            .release_overlays(&mut self.surface, &mut self.timers);
        let mut report = SweepReport::new(kind, released);
        self.remove_orphan_overlays(&mut report, |_| true);
        report
    }

    /// Removes markers and popups owned by families other than `family`.
    /// Overlays without an owner are left alone.
    pub(crate) fn safety_sweep(&mut self, family: &str) -> SweepReport {
        let released = self
            .registry
            .release_foreign(family, &mut self.surface, &mut self.timers);
        let mut report = SweepReport::new(SweepKind::Safety, released);
        self.remove_orphan_overlays(&mut report, |owner| {
            owner.is_some_and(|o| *o != *family)
        });
        report
    }

    fn remove_orphan_overlays(
        &mut self,
        report: &mut SweepReport,
        select: impl Fn(Option<&foundation::ids::ChapterId>) -> bool,
    ) {
        for overlay in self.surface.overlays() {
            if self.registry.contains_overlay(overlay.handle) || !select(overlay.owner.as_ref()) {
                continue;
            }
            match self.surface.remove_overlay(overlay.handle) {
                Ok(()) => report.orphans += 1,
                Err(err) => {
                    warn!("removing orphan {:?} {:?} failed: {err}", overlay.kind, overlay.handle);
                    report.orphan_failures += 1;
                }
            }
        }
    }
}
