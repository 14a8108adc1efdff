//! Support code for the `storyctl` binary: story files, chapter data
//! loading, signal scripts and the demo effect controllers used for headless
//! replays.

pub mod data;
pub mod demo;
pub mod script;
pub mod story_file;

pub use data::*;
pub use demo::*;
pub use script::*;
pub use story_file::*;
