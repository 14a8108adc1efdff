use std::collections::BTreeMap;

use foundation::ids::ChapterId;

use crate::CatalogError;
use crate::model::{ChapterDescriptor, Story, VesselInfo};

const MAX_VESSEL_BLOCKS: usize = 2;

/// A validated, indexed [`Story`].
///
/// Invariants established by [`Story::validate`]:
/// - chapter ids are unique;
/// - every sub-chapter's parent resolves to a top-level chapter (depth <= 1);
/// - no chapter declares more than two vessel blocks.
#[derive(Debug, Clone)]
pub struct StoryCatalog {
    story: Story,
    index: BTreeMap<ChapterId, usize>,
}

impl Story {
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    pub fn validate(self) -> Result<StoryCatalog, CatalogError> {
        if self.chapters.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = BTreeMap::new();
        for (pos, chapter) in self.chapters.iter().enumerate() {
            if index.insert(chapter.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateChapter(chapter.id.clone()));
            }
        }

        for chapter in &self.chapters {
            if let Some(parent) = &chapter.parent {
                let Some(&parent_pos) = index.get(parent) else {
                    return Err(CatalogError::UnknownParent {
                        chapter: chapter.id.clone(),
                        parent: parent.clone(),
                    });
                };
                if self.chapters[parent_pos].is_sub_chapter() {
                    return Err(CatalogError::NestedSubChapter {
                        chapter: chapter.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            if chapter.vessels.len() > MAX_VESSEL_BLOCKS {
                return Err(CatalogError::TooManyVessels {
                    chapter: chapter.id.clone(),
                    count: chapter.vessels.len(),
                });
            }
            let cameras_valid = std::iter::once(&chapter.camera)
                .chain(chapter.slides.iter().filter_map(|s| s.camera.as_ref()))
                .chain(chapter.split_screen.iter().flat_map(|s| [&s.left, &s.right]))
                .all(|c| c.center.is_valid() && c.zoom.is_finite());
            if !cameras_valid {
                return Err(CatalogError::InvalidCamera(chapter.id.clone()));
            }
        }

        if let Some(intro) = &self.intro
            && !index.contains_key(intro)
        {
            return Err(CatalogError::UnknownIntro(intro.clone()));
        }

        Ok(StoryCatalog { story: self, index })
    }
}

impl StoryCatalog {
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        Story::from_json_str(raw)?.validate()
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn len(&self) -> usize {
        self.story.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.story.chapters.is_empty()
    }

    /// Chapters in document order.
    pub fn chapters(&self) -> impl Iterator<Item = &ChapterDescriptor> {
        self.story.chapters.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ChapterDescriptor> {
        self.index.get(id).map(|&pos| &self.story.chapters[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of `id` in document order.
    pub fn order_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Chapter immediately after `id` in document order.
    pub fn next_after(&self, id: &str) -> Option<&ChapterDescriptor> {
        let pos = self.order_of(id)?;
        self.story.chapters.get(pos + 1)
    }

    pub fn family_of(&self, id: &str) -> Option<&ChapterId> {
        self.get(id).map(ChapterDescriptor::family)
    }

    /// Two distinct chapters are same-family when both are sub-chapters of one
    /// parent, or when one is the other's parent.
    pub fn same_family(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        match (self.family_of(a), self.family_of(b)) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    }

    pub fn intro(&self) -> &ChapterId {
        self.story
            .intro
            .as_ref()
            .unwrap_or(&self.story.chapters[0].id)
    }

    pub fn is_intro(&self, id: &str) -> bool {
        self.intro() == id
    }

    /// Vessel blocks to show for `id`: its own, else its parent's, else the
    /// family defaults.
    pub fn vessels_for(&self, id: &str) -> &[VesselInfo] {
        let Some(chapter) = self.get(id) else {
            return &[];
        };
        if !chapter.vessels.is_empty() {
            return &chapter.vessels;
        }
        if let Some(parent) = chapter.parent.as_ref().and_then(|p| self.get(p.as_str()))
            && !parent.vessels.is_empty()
        {
            return &parent.vessels;
        }
        self.story
            .family_vessels
            .get(chapter.family())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Content hash of the story, used to pin cached chapter data to this version.
    pub fn fingerprint(&self) -> String {
        // Serializing a validated story cannot fail: every field is plain data.
        let bytes = serde_json::to_vec(&self.story).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}
