use serde::{Deserialize, Serialize};

use crate::source::DataSourceError;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionType {
    #[default]
    FeatureCollection,
}

/// A GeoJSON `FeatureCollection`.
///
/// Features are kept as raw JSON; the engine only moves them between the data
/// provider and map sources and never interprets geometry itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: CollectionType,
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(features: Vec<serde_json::Value>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DataSourceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DataSourceError::with_source("invalid feature collection", e))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureCollection;

    #[test]
    fn empty_collection_serializes_with_type_tag() {
        let json = serde_json::to_value(FeatureCollection::empty()).expect("json");
        assert_eq!(
            json,
            serde_json::json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn rejects_other_geojson_types() {
        let raw = br#"{"type": "Feature", "geometry": null, "properties": {}}"#;
        assert!(FeatureCollection::from_slice(raw).is_err());
    }

    #[test]
    fn parses_features() {
        let raw = br#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [56.1, 26.2]}, "properties": {}}
        ]}"#;
        let fc = FeatureCollection::from_slice(raw).expect("parse");
        assert_eq!(fc.len(), 1);
    }
}
