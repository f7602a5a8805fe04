//! Viewer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Zoom bounds and overlay cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Smallest document zoom factor.
    pub min_zoom: f32,
    /// Largest document zoom factor.
    pub max_zoom: f32,
    /// Zoom in/out increment.
    pub zoom_step: f32,
    /// How often the video watermark overlay is redrawn (ms).
    pub overlay_refresh_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 0.25,
            overlay_refresh_ms: 2_000,
        }
    }
}

impl ViewerConfig {
    /// Clamps a zoom factor into the configured bounds.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return 1.0_f32.clamp(self.min_zoom, self.max_zoom);
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn overlay_refresh(&self) -> Duration {
        Duration::from_millis(self.overlay_refresh_ms.max(1))
    }
}
