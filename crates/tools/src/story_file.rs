use std::fs;
use std::path::Path;

use catalog::{Story, StoryCatalog};
use narrative::EngineTuning;
use serde::Deserialize;

/// A story as stored on disk: the chapter table plus optional engine tuning.
///
/// Tuning keys that are absent keep their defaults, so a story without a
/// `tuning` table runs with the stock timings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryFile {
    #[serde(flatten)]
    pub story: Story,
    #[serde(default)]
    pub tuning: EngineTuning,
}

impl StoryFile {
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| format!("parse story: {e}"))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
        Self::from_json_str(&raw)
    }

    /// Validates the chapter forest.
    pub fn into_catalog(self) -> Result<(StoryCatalog, EngineTuning), String> {
        let catalog = self
            .story
            .validate()
            .map_err(|e| format!("invalid story: {e}"))?;
        Ok((catalog, self.tuning))
    }
}

/// One line per chapter in document order, sub-chapters indented under their
/// parent.
pub fn outline(catalog: &StoryCatalog) -> Vec<String> {
    catalog
        .chapters()
        .map(|c| {
            let indent = if c.is_sub_chapter() { "  " } else { "" };
            let mut line = format!("{indent}{} [{}]", c.id, c.trigger());
            if !c.slides.is_empty() {
                line.push_str(&format!(" slides={}", c.slides.len()));
            }
            if c.split_screen.is_some() {
                line.push_str(" split");
            }
            if let Some(path) = &c.data_source {
                line.push_str(&format!(" data={path}"));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STORY: &str = r#"{
        "title": "Demo",
        "chapters": [
            {"id": "intro", "camera": {"center": {"lng": 10, "lat": 20}, "zoom": 3}},
            {"id": "jan", "camera": {"center": {"lng": 11, "lat": 21}, "zoom": 5},
             "data_source": "jan/track.geojson"},
            {"id": "jan-h1", "parent_chapter_id": "jan", "sub_chapter_action": "showCourse",
             "camera": {"center": {"lng": 12, "lat": 22}, "zoom": 7}}
        ],
        "tuning": {"debounce_ms": 90}
    }"#;

    #[test]
    fn tuning_table_is_optional_and_partial() {
        let file = StoryFile::from_json_str(STORY).expect("parse");
        assert_eq!(file.tuning.debounce_ms, 90);
        assert_eq!(
            file.tuning.safety_sweep_delay_ms,
            EngineTuning::default().safety_sweep_delay_ms
        );

        let bare = r#"{"chapters": [{"id": "intro", "camera": {"center": {"lng": 0, "lat": 0}, "zoom": 2}}]}"#;
        let file = StoryFile::from_json_str(bare).expect("parse");
        assert_eq!(file.tuning, EngineTuning::default());
    }

    #[test]
    fn outline_lists_the_forest() {
        let (catalog, _) = StoryFile::from_json_str(STORY)
            .and_then(StoryFile::into_catalog)
            .expect("valid");
        assert_eq!(
            outline(&catalog),
            vec![
                "intro [showMainView]".to_string(),
                "jan [showMainView] data=jan/track.geojson".to_string(),
                "  jan-h1 [showCourse]".to_string(),
            ]
        );
    }

    #[test]
    fn invalid_forest_is_reported() {
        let broken = STORY.replace(r#""parent_chapter_id": "jan""#, r#""parent_chapter_id": "feb""#);
        let err = StoryFile::from_json_str(&broken)
            .and_then(StoryFile::into_catalog)
            .unwrap_err();
        assert!(err.starts_with("invalid story:"), "{err}");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("story.json");
        fs::write(&path, STORY).expect("write");
        let file = StoryFile::load(&path).expect("load");
        assert_eq!(file.story.chapters.len(), 3);
        assert!(StoryFile::load(&dir.path().join("missing.json")).is_err());
    }
}
