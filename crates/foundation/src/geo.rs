use serde::{Deserialize, Serialize};

/// Longitude/latitude in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Where the map camera should go and how long it may take to get there.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub center: LngLat,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
    /// Declared animation duration; callers may cap it.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

fn default_duration_ms() -> u64 {
    2000
}

impl CameraTarget {
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
            duration_ms: default_duration_ms(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Duration clamped to `cap_ms`.
    pub fn capped_duration(&self, cap_ms: u64) -> u64 {
        self.duration_ms.min(cap_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraTarget, LngLat};

    #[test]
    fn camera_defaults_when_fields_missing() {
        let cam: CameraTarget =
            serde_json::from_str(r#"{"center":{"lng":55.2,"lat":25.1},"zoom":6.5}"#)
                .expect("parse");
        assert_eq!(cam.pitch, 0.0);
        assert_eq!(cam.duration_ms, 2000);
        assert_eq!(cam.capped_duration(1000), 1000);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LngLat::new(12.0, 45.0).is_valid());
        assert!(!LngLat::new(200.0, 45.0).is_valid());
        assert!(!LngLat::new(f64::NAN, 0.0).is_valid());
    }
}
