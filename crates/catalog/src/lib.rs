//! Chapter descriptors and the validated story table.

pub mod model;
pub mod story;

pub use model::*;
pub use story::*;

use foundation::ids::ChapterId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Empty,
    DuplicateChapter(ChapterId),
    UnknownParent { chapter: ChapterId, parent: ChapterId },
    NestedSubChapter { chapter: ChapterId, parent: ChapterId },
    TooManyVessels { chapter: ChapterId, count: usize },
    InvalidCamera(ChapterId),
    UnknownIntro(ChapterId),
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "story has no chapters"),
            CatalogError::DuplicateChapter(id) => write!(f, "duplicate chapter id: {id}"),
            CatalogError::UnknownParent { chapter, parent } => {
                write!(f, "chapter {chapter} references unknown parent {parent}")
            }
            CatalogError::NestedSubChapter { chapter, parent } => write!(
                f,
                "chapter {chapter} has parent {parent}, which is itself a sub-chapter"
            ),
            CatalogError::TooManyVessels { chapter, count } => {
                write!(f, "chapter {chapter} declares {count} vessel blocks (max 2)")
            }
            CatalogError::InvalidCamera(id) => write!(f, "chapter {id} has an invalid camera target"),
            CatalogError::UnknownIntro(id) => write!(f, "intro chapter {id} not found"),
            CatalogError::Parse(msg) => write!(f, "story parse error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}
