//! In-memory map surface and page that record every call.
//!
//! Used by the engine's tests and by headless replays, where the call log is
//! the output.

use std::collections::{BTreeMap, BTreeSet};

use catalog::model::{ChapterDescriptor, DateRange, LegendEntry, MinimapMode, VesselInfo};
use foundation::geo::{CameraTarget, LngLat};
use foundation::handles::OverlayHandle;
use foundation::ids::ChapterId;
use serde::Serialize;
use streaming::geojson::FeatureCollection;

use crate::error::MapError;
use crate::page::{SlideView, StoryPage};
use crate::surface::{
    LayerSpec, MapSurface, MarkerSpec, OverlayInfo, OverlayKind, Pane, PopupSpec, TaggedId,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceCall {
    MoveCamera {
        pane: Pane,
        center: LngLat,
        zoom: f64,
        duration_ms: u64,
    },
    StopCamera,
    AddSource(String),
    AddLayer(String),
    RemoveLayer(String),
    RemoveSource(String),
    AddMarker(OverlayHandle),
    AddPopup(OverlayHandle),
    RemoveOverlay(OverlayHandle),
    OpenSplit,
    CloseSplit,
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    layers: Vec<TaggedId>,
    sources: Vec<TaggedId>,
    overlays: BTreeMap<OverlayHandle, OverlayInfo>,
    next_overlay: u64,
    split: bool,
    fail_overlays: bool,
    failing_removals: BTreeSet<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn camera_moves(&self) -> Vec<&SurfaceCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::MoveCamera { .. }))
            .collect()
    }

    /// Marker and popup creation fails while set.
    pub fn fail_overlay_creation(&mut self, fail: bool) {
        self.fail_overlays = fail;
    }

    /// Removing the layer or source `id` fails (and leaves it in place).
    pub fn fail_removal_of(&mut self, id: &str) {
        self.failing_removals.insert(id.to_string());
    }

    /// A base-map layer: no owner, never removed by the engine.
    pub fn add_base_layer(&mut self, id: &str) {
        self.layers.push(TaggedId {
            id: id.to_string(),
            owner: None,
        });
    }

    /// Simulates an overlay created behind the engine's back.
    pub fn inject_overlay(&mut self, kind: OverlayKind, owner: Option<ChapterId>) -> OverlayHandle {
        let handle = self.alloc_overlay();
        self.overlays.insert(
            handle,
            OverlayInfo {
                handle,
                kind,
                owner,
            },
        );
        handle
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn has_overlay(&self, handle: OverlayHandle) -> bool {
        self.overlays.contains_key(&handle)
    }

    pub fn is_split(&self) -> bool {
        self.split
    }

    fn alloc_overlay(&mut self) -> OverlayHandle {
        self.next_overlay += 1;
        OverlayHandle(self.next_overlay)
    }

    fn add_overlay(
        &mut self,
        kind: OverlayKind,
        owner: &ChapterId,
    ) -> Result<OverlayHandle, MapError> {
        if self.fail_overlays {
            return Err(MapError::Rejected(format!("{kind:?} creation disabled")));
        }
        Ok(self.inject_overlay(kind, Some(owner.clone())))
    }

    fn remove_tagged(list: &mut Vec<TaggedId>, id: &str, failing: &BTreeSet<String>) -> Result<(), MapError> {
        if failing.contains(id) {
            return Err(MapError::Rejected(format!("{id} is busy")));
        }
        let Some(pos) = list.iter().position(|t| t.id == id) else {
            return Err(MapError::NotFound(id.to_string()));
        };
        list.remove(pos);
        Ok(())
    }
}

impl MapSurface for RecordingSurface {
    fn move_camera(&mut self, pane: Pane, target: &CameraTarget, duration_ms: u64) {
        self.calls.push(SurfaceCall::MoveCamera {
            pane,
            center: target.center,
            zoom: target.zoom,
            duration_ms,
        });
    }

    fn stop_camera(&mut self) {
        self.calls.push(SurfaceCall::StopCamera);
    }

    fn add_source(
        &mut self,
        id: &str,
        _data: &FeatureCollection,
        owner: Option<&ChapterId>,
    ) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::Rejected(format!("source {id} already exists")));
        }
        self.calls.push(SurfaceCall::AddSource(id.to_string()));
        self.sources.push(TaggedId {
            id: id.to_string(),
            owner: owner.cloned(),
        });
        Ok(())
    }

    fn add_layer(&mut self, spec: &LayerSpec, owner: Option<&ChapterId>) -> Result<(), MapError> {
        if self.has_layer(&spec.id) {
            return Err(MapError::Rejected(format!("layer {} already exists", spec.id)));
        }
        self.calls.push(SurfaceCall::AddLayer(spec.id.clone()));
        self.layers.push(TaggedId {
            id: spec.id.clone(),
            owner: owner.cloned(),
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        self.calls.push(SurfaceCall::RemoveLayer(id.to_string()));
        Self::remove_tagged(&mut self.layers, id, &self.failing_removals)
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        self.calls.push(SurfaceCall::RemoveSource(id.to_string()));
        Self::remove_tagged(&mut self.sources, id, &self.failing_removals)
    }

    fn layers(&self) -> Vec<TaggedId> {
        self.layers.clone()
    }

    fn sources(&self) -> Vec<TaggedId> {
        self.sources.clone()
    }

    fn add_marker(
        &mut self,
        _spec: &MarkerSpec,
        owner: &ChapterId,
    ) -> Result<OverlayHandle, MapError> {
        let handle = self.add_overlay(OverlayKind::Marker, owner)?;
        self.calls.push(SurfaceCall::AddMarker(handle));
        Ok(handle)
    }

    fn add_popup(&mut self, _spec: &PopupSpec, owner: &ChapterId) -> Result<OverlayHandle, MapError> {
        let handle = self.add_overlay(OverlayKind::Popup, owner)?;
        self.calls.push(SurfaceCall::AddPopup(handle));
        Ok(handle)
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) -> Result<(), MapError> {
        self.calls.push(SurfaceCall::RemoveOverlay(handle));
        self.overlays
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| MapError::NotFound(format!("overlay {}", handle.0)))
    }

    fn overlays(&self) -> Vec<OverlayInfo> {
        self.overlays.values().cloned().collect()
    }

    fn open_split(&mut self, _left: &CameraTarget, _right: &CameraTarget) -> Result<(), MapError> {
        self.calls.push(SurfaceCall::OpenSplit);
        self.split = true;
        Ok(())
    }

    fn close_split(&mut self) -> Result<(), MapError> {
        self.calls.push(SurfaceCall::CloseSplit);
        if !self.split {
            return Err(MapError::NotFound("split panes".to_string()));
        }
        self.split = false;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PageCall {
    IntroOverlay { visible: bool },
    ChapterInfo { chapter: ChapterId, visible: bool },
    Minimap { mode: MinimapMode },
    MinimapCenter { center: LngLat },
    Vessels { names: Vec<String> },
    Legend { labels: Vec<String> },
    Timeline { chapter: ChapterId, range: Option<DateRange> },
    Slides { view: Option<SlideView> },
    RefreshRegions,
}

#[derive(Debug, Default)]
pub struct RecordingPage {
    calls: Vec<PageCall>,
}

impl RecordingPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PageCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn last_slides(&self) -> Option<&Option<SlideView>> {
        self.calls.iter().rev().find_map(|c| match c {
            PageCall::Slides { view } => Some(view),
            _ => None,
        })
    }
}

impl StoryPage for RecordingPage {
    fn set_intro_overlay(&mut self, visible: bool) {
        self.calls.push(PageCall::IntroOverlay { visible });
    }

    fn set_chapter_info(&mut self, chapter: &ChapterDescriptor, visible: bool) {
        self.calls.push(PageCall::ChapterInfo {
            chapter: chapter.id.clone(),
            visible,
        });
    }

    fn set_minimap(&mut self, mode: MinimapMode) {
        self.calls.push(PageCall::Minimap { mode });
    }

    fn recenter_minimap(&mut self, center: LngLat) {
        self.calls.push(PageCall::MinimapCenter { center });
    }

    fn show_vessels(&mut self, vessels: &[VesselInfo]) {
        self.calls.push(PageCall::Vessels {
            names: vessels.iter().map(|v| v.name.clone()).collect(),
        });
    }

    fn show_legend(&mut self, entries: &[LegendEntry]) {
        self.calls.push(PageCall::Legend {
            labels: entries.iter().map(|e| e.label.clone()).collect(),
        });
    }

    fn update_timeline(&mut self, chapter: &ChapterId, range: Option<&DateRange>) {
        self.calls.push(PageCall::Timeline {
            chapter: chapter.clone(),
            range: range.cloned(),
        });
    }

    fn show_slides(&mut self, view: Option<&SlideView>) {
        self.calls.push(PageCall::Slides {
            view: view.cloned(),
        });
    }

    fn refresh_scroll_regions(&mut self) {
        self.calls.push(PageCall::RefreshRegions);
    }
}
