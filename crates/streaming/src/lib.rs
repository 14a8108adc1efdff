//! Chapter data loading: GeoJSON sources, a byte-budgeted cache and a
//! retrying provider that never hands rendering code a missing data set.

pub mod cache;
pub mod geojson;
pub mod provider;
pub mod source;

pub use cache::*;
pub use geojson::*;
pub use provider::*;
pub use source::*;
