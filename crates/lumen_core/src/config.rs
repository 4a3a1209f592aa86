//! Render settings.
//!
//! Every field has a default so a scene file may omit the whole `render`
//! block or any part of it; command line flags override individual values.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Settings controlling image size, sampling and acceleration structure build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Camera rays traced per pixel
    pub samples_per_pixel: u32,
    /// Bounce depth at which indirect lighting stops
    pub max_depth: u32,
    /// Light samples per shading point for area and environment lights
    pub area_light_samples: u32,
    /// BVH leaves stop splitting at or below this many primitives (0 = split until no split helps)
    pub max_leaf_size: usize,
    /// Side length of a render bucket in pixels
    pub bucket_size: u32,
    /// Seed for the per-bucket random number generators
    pub seed: u64,
    /// Worker threads (0 = let rayon decide)
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            samples_per_pixel: 16,
            max_depth: 4,
            area_light_samples: 4,
            max_leaf_size: 4,
            bucket_size: 64,
            seed: 0,
            threads: 0,
        }
    }
}

impl RenderConfig {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Reject settings the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(SceneError::InvalidConfig(
                "samples_per_pixel must be at least 1".to_string(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(SceneError::InvalidConfig(
                "bucket_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
