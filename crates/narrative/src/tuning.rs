use serde::{Deserialize, Serialize};

/// Quiet period a burst of enter signals must observe before the latest one commits.
pub const DEBOUNCE_MS: u64 = 150;
/// Commits closer together than this force an extra marker/popup sweep.
pub const RAPID_SCROLL_MS: u64 = 500;
/// Delay between a settled camera move and the stray-element sweep.
pub const SAFETY_SWEEP_DELAY_MS: u64 = 800;
/// Upper bound on chapter camera moves, whatever the chapter declares.
pub const CAMERA_CAP_MS: u64 = 1000;
/// Wheel delta to accumulate before a slide change commits.
pub const SLIDE_SCROLL_THRESHOLD_PX: f64 = 100.0;
pub const SLIDE_CAMERA_MS: u64 = 400;
/// Input lock after a slide change.
pub const SLIDE_LOCK_MS: u64 = 400;
/// Minimum touch travel recognised as a swipe.
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;

/// Timing knobs. Missing keys in a story file fall back to the constants above.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub debounce_ms: u64,
    pub rapid_scroll_ms: u64,
    pub safety_sweep_delay_ms: u64,
    pub camera_cap_ms: u64,
    pub slide_scroll_threshold_px: f64,
    pub slide_camera_ms: u64,
    pub slide_lock_ms: u64,
    pub swipe_threshold_px: f64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            rapid_scroll_ms: RAPID_SCROLL_MS,
            safety_sweep_delay_ms: SAFETY_SWEEP_DELAY_MS,
            camera_cap_ms: CAMERA_CAP_MS,
            slide_scroll_threshold_px: SLIDE_SCROLL_THRESHOLD_PX,
            slide_camera_ms: SLIDE_CAMERA_MS,
            slide_lock_ms: SLIDE_LOCK_MS,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EngineTuning;

    #[test]
    fn partial_tables_keep_defaults() {
        let t: EngineTuning = serde_json::from_str(r#"{"debounce_ms": 90}"#).expect("parse");
        assert_eq!(t.debounce_ms, 90);
        assert_eq!(t.safety_sweep_delay_ms, 800);
        assert_eq!(t.slide_scroll_threshold_px, 100.0);
    }
}
