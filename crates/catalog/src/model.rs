use std::collections::BTreeMap;

use foundation::geo::CameraTarget;
use foundation::ids::ChapterId;
use serde::{Deserialize, Serialize};

/// Trigger invoked on a chapter's visual-effect controller when nothing more
/// specific is declared.
pub const DEFAULT_TRIGGER: &str = "showMainView";

/// Static description of one narrative chapter.
///
/// Descriptors are immutable once a [`crate::StoryCatalog`] has validated them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDescriptor {
    pub id: ChapterId,
    /// Present iff this is a sub-chapter.
    #[serde(default, alias = "parent_chapter_id")]
    pub parent: Option<ChapterId>,
    pub camera: CameraTarget,

    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub legend: Vec<LegendEntry>,
    /// At most two blocks.
    #[serde(default)]
    pub vessels: Vec<VesselInfo>,

    #[serde(default)]
    pub hide_chapter_info: bool,
    #[serde(default)]
    pub split_screen: Option<SplitScreen>,
    /// Trigger to invoke on the family controller instead of [`DEFAULT_TRIGGER`].
    #[serde(default)]
    pub sub_chapter_action: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub minimap: MinimapMode,
    /// The chapter drives its own minimap marker trajectory.
    #[serde(default)]
    pub custom_minimap_track: bool,
    /// Non-empty for horizontal sub-scroll regions.
    #[serde(default)]
    pub slides: Vec<SlideDescriptor>,
}

impl ChapterDescriptor {
    pub fn new(id: impl Into<ChapterId>, camera: CameraTarget) -> Self {
        Self {
            id: id.into(),
            parent: None,
            camera,
            title: String::new(),
            subtitle: None,
            region: None,
            date_range: None,
            legend: Vec::new(),
            vessels: Vec::new(),
            hide_chapter_info: false,
            split_screen: None,
            sub_chapter_action: None,
            data_source: None,
            minimap: MinimapMode::default(),
            custom_minimap_track: false,
            slides: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ChapterId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn is_sub_chapter(&self) -> bool {
        self.parent.is_some()
    }

    pub fn is_slide_region(&self) -> bool {
        !self.slides.is_empty()
    }

    /// Id of the family root: the parent for sub-chapters, the chapter itself otherwise.
    pub fn family(&self) -> &ChapterId {
        self.parent.as_ref().unwrap_or(&self.id)
    }

    pub fn trigger(&self) -> &str {
        self.sub_chapter_action.as_deref().unwrap_or(DEFAULT_TRIGGER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendKind {
    Line,
    Area,
    Point,
    Icon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Swatch {
    Color(String),
    Icon(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub kind: LegendKind,
    pub swatch: Swatch,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselInfo {
    pub name: String,
    #[serde(default)]
    pub id_code: String,
    #[serde(default)]
    pub cargo: String,
    #[serde(default)]
    pub operation: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitScreen {
    pub left: CameraTarget,
    pub right: CameraTarget,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinimapMode {
    Hidden,
    #[default]
    Compact,
    Expanded,
}

/// One slide of a horizontal sub-scroll region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDescriptor {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Falls back to the parent chapter's camera.
    #[serde(default)]
    pub camera: Option<CameraTarget>,
    #[serde(default)]
    pub trigger: Option<String>,
}

/// The authored story: chapters in document order plus story-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub title: String,
    /// Chapter that shows the intro-only overlay. Defaults to the first chapter.
    #[serde(default)]
    pub intro: Option<ChapterId>,
    pub chapters: Vec<ChapterDescriptor>,
    /// Vessel blocks shown for chapters of a family that declare none.
    #[serde(default)]
    pub family_vessels: BTreeMap<ChapterId, Vec<VesselInfo>>,
}
