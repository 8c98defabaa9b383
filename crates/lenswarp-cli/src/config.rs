//! JSON scene configuration.
//!
//! ```json
//! {
//!   "resolution": [2048, 2048],
//!   "camera": { "type": "fisheye_equidistant", "sensor_width": 36, "sensor_height": 36, "fov": 3.14159 },
//!   "frames": [{ "name": "cam0_0001", "transform_matrix": [...] }]
//! }
//! ```
//!
//! Fields other than `resolution`, `camera` and `frames[].name` are kept
//! untouched and written back to the output config.

use anyhow::{Context, Result, bail};
use lenswarp_batch::FrameFilter;
use lenswarp_core::LensModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One frame entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scene document shared by the input and output configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// `[width, height]` in pixels.
    pub resolution: [u32; 2],
    pub camera: LensModel,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SceneConfig {
    /// Reads and validates a scene config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .camera
            .validate()
            .with_context(|| format!("Invalid camera in {}", path.display()))?;
        if config.resolution.contains(&0) {
            bail!(
                "Invalid resolution {:?} in {}",
                config.resolution,
                path.display()
            );
        }
        debug!(frames = config.frames.len(), camera = config.camera.name(), "config loaded");
        Ok(config)
    }

    /// Writes the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// Resolution after scaling by `scale`, rounded towards zero.
    pub fn scaled_resolution(&self, scale: f64) -> [u32; 2] {
        self.resolution.map(|v| (v as f64 * scale).floor() as u32)
    }

    /// Config describing the converted dataset: frames not matching
    /// `filter` removed, camera replaced by `lens`, resolution scaled.
    pub fn output_config(&self, lens: LensModel, filter: &FrameFilter, scale: f64) -> Self {
        Self {
            resolution: self.scaled_resolution(scale),
            camera: lens,
            frames: self
                .frames
                .iter()
                .filter(|f| filter.matches(&f.name))
                .cloned()
                .collect(),
            extra: self.extra.clone(),
        }
    }
}
