use foundation::geo::{CameraTarget, LngLat};
use foundation::handles::OverlayHandle;
use foundation::ids::ChapterId;
use serde::Serialize;
use streaming::geojson::FeatureCollection;

use crate::error::MapError;

/// Which camera a command addresses. `Left`/`Right` exist only while split
/// panes are open.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pane {
    Primary,
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Line,
    Fill,
    Circle,
    Symbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    /// Renderer paint properties, passed through untouched.
    pub paint: serde_json::Value,
    pub pane: Pane,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, source: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
            paint: serde_json::Value::Null,
            pane: Pane::Primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub at: LngLat,
    pub class_name: String,
    pub label: Option<String>,
    pub pane: Pane,
}

impl MarkerSpec {
    pub fn at(at: LngLat) -> Self {
        Self {
            at,
            class_name: String::new(),
            label: None,
            pane: Pane::Primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    pub at: LngLat,
    pub html: String,
    pub pane: Pane,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Marker,
    Popup,
}

/// A marker or popup currently attached to the map.
///
/// `owner` is the family recorded when the overlay was created through the
/// engine; overlays added by anything else carry no owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayInfo {
    pub handle: OverlayHandle,
    pub kind: OverlayKind,
    pub owner: Option<ChapterId>,
}

/// A layer or source id on the map with its owning family. Base-map entries
/// have no owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedId {
    pub id: String,
    pub owner: Option<ChapterId>,
}

/// The map renderer as seen by the engine.
///
/// Creation calls take the owning family so the renderer can report it back
/// through the inventory methods; cleanup relies on that instead of matching
/// id prefixes. Every fallible call may fail independently and the engine
/// treats each failure as local to that one handle.
pub trait MapSurface {
    fn move_camera(&mut self, pane: Pane, target: &CameraTarget, duration_ms: u64);
    fn stop_camera(&mut self);

    fn add_source(
        &mut self,
        id: &str,
        data: &FeatureCollection,
        owner: Option<&ChapterId>,
    ) -> Result<(), MapError>;
    fn add_layer(&mut self, spec: &LayerSpec, owner: Option<&ChapterId>) -> Result<(), MapError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;
    fn remove_source(&mut self, id: &str) -> Result<(), MapError>;
    /// Layers in draw order.
    fn layers(&self) -> Vec<TaggedId>;
    fn sources(&self) -> Vec<TaggedId>;

    fn add_marker(&mut self, spec: &MarkerSpec, owner: &ChapterId)
    -> Result<OverlayHandle, MapError>;
    fn add_popup(&mut self, spec: &PopupSpec, owner: &ChapterId) -> Result<OverlayHandle, MapError>;
    fn remove_overlay(&mut self, handle: OverlayHandle) -> Result<(), MapError>;
    fn overlays(&self) -> Vec<OverlayInfo>;

    /// Creates the two side-by-side panes and points them at `left`/`right`.
    fn open_split(&mut self, left: &CameraTarget, right: &CameraTarget) -> Result<(), MapError>;
    fn close_split(&mut self) -> Result<(), MapError>;
}
