// THEORY:
// `Settings` is the single, immutable bundle of tunables for the whole engine. It is
// read when a pipeline is built and replaced wholesale between calls; nothing inside
// the pipeline ever mutates it. Every threshold here is a default to be tuned for a
// camera and a viewing distance, not a fixed law of the algorithm.

use crate::core_modules::error::BlinkError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable behaviour of the blink pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mean RGB difference a pixel must strictly exceed to count as motion.
    pub threshold: u32,
    /// Pixels excluded from the blob scan along every image edge.
    pub search_border: u32,
    /// Step cap for a single boundary walk.
    pub trace_repeat_max: u32,
    /// The blob scan stops once this many blobs have been accepted.
    pub max_blobs_to_find: usize,
    /// A traced bounding box must have an area strictly above this to become a blob.
    pub min_blob_area: u32,
    pub min_eye_x_sep: f64,
    pub max_eye_x_sep: f64,
    pub max_eye_y_sep: f64,
    pub min_blobs_found: usize,
    pub max_blobs_found: usize,
    /// Pixels added on each side of a reported eye box.
    pub eye_margin: i32,
    /// How long the debouncer stays disarmed after a blink fires.
    pub rearm_cooldown_ms: u64,
    /// Retain the last motion mask for host-side visualization.
    pub keep_motion_mask: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: 20,
            search_border: 20,
            trace_repeat_max: 300,
            max_blobs_to_find: 30,
            min_blob_area: 10,
            min_eye_x_sep: 40.0,
            max_eye_x_sep: 60.0,
            max_eye_y_sep: 40.0,
            min_blobs_found: 2,
            max_blobs_found: 25,
            eye_margin: 3,
            rearm_cooldown_ms: 1200,
            keep_motion_mask: true,
        }
    }
}

impl Settings {
    /// The looser eye geometry used when the face is closer to the camera.
    pub fn relaxed() -> Self {
        Self {
            max_eye_x_sep: 100.0,
            max_eye_y_sep: 100.0,
            ..Self::default()
        }
    }

    pub fn rearm_cooldown(&self) -> Duration {
        Duration::from_millis(self.rearm_cooldown_ms)
    }

    /// Rejects combinations that could never produce an eye pair.
    pub fn validate(&self) -> Result<(), BlinkError> {
        if self.min_blobs_found < 2 {
            return Err(BlinkError::InvalidSettings(format!(
                "min_blobs_found must be at least 2 to form a pair, got {}",
                self.min_blobs_found
            )));
        }
        if self.min_blobs_found > self.max_blobs_found {
            return Err(BlinkError::InvalidSettings(format!(
                "min_blobs_found ({}) exceeds max_blobs_found ({})",
                self.min_blobs_found, self.max_blobs_found
            )));
        }
        if self.min_eye_x_sep > self.max_eye_x_sep {
            return Err(BlinkError::InvalidSettings(format!(
                "min_eye_x_sep ({}) exceeds max_eye_x_sep ({})",
                self.min_eye_x_sep, self.max_eye_x_sep
            )));
        }
        if self.max_eye_y_sep < 0.0 {
            return Err(BlinkError::InvalidSettings(format!(
                "max_eye_y_sep must not be negative, got {}",
                self.max_eye_y_sep
            )));
        }
        if self.trace_repeat_max == 0 {
            return Err(BlinkError::InvalidSettings("trace_repeat_max must be positive".to_string()));
        }
        if self.eye_margin < 0 {
            return Err(BlinkError::InvalidSettings(format!(
                "eye_margin must not be negative, got {}",
                self.eye_margin
            )));
        }
        Ok(())
    }
}
