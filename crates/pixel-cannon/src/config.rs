//! Runtime configuration, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "window": { "title": "Hello World!", "width": 1024, "height": 768 },
//!   "graphics": { "texture_filter": "nearest" },
//!   "log_filter": "pixel_cannon=debug"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graphics::{DEFAULT_MAX_VERTICES, MAX_VERTICES_LIMIT};

/// Top-level configuration for an [`App`](crate::app::App).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            graphics: GraphicsConfig::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl Config {
    /// Read and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("loaded config from '{}'", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON config string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::invalid_argument(
                "window",
                format!(
                    "size must be at least 1x1, was {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }
        let max = self.graphics.max_vertices;
        if !(4..=MAX_VERTICES_LIMIT).contains(&max) {
            return Err(Error::invalid_argument(
                "max_vertices",
                format!("must be between 4 and {MAX_VERTICES_LIMIT}, was {max}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "PixelCannon".to_owned(),
            width: 1024,
            height: 768,
            resizable: true,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Vertex capacity of one batch.
    pub max_vertices: usize,
    pub texture_filter: TextureFilter,
    pub power_preference: PowerPreference,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            texture_filter: TextureFilter::Linear,
            power_preference: PowerPreference::Default,
        }
    }
}

/// How textures are sampled when scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    /// Blocky; good for pixel art.
    Nearest,
    #[default]
    Linear,
}

impl From<TextureFilter> for wgpu::FilterMode {
    fn from(f: TextureFilter) -> Self {
        match f {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Which GPU to prefer on machines with more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    #[default]
    Default,
    LowPower,
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(p: PowerPreference) -> Self {
        match p {
            PowerPreference::Default => wgpu::PowerPreference::None,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(
            r#"{
                "window": { "title": "Hello World!", "vsync": false },
                "graphics": { "texture_filter": "nearest", "power_preference": "high_performance" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Hello World!");
        assert!(!config.window.vsync);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.graphics.texture_filter, TextureFilter::Nearest);
        assert_eq!(config.graphics.power_preference, PowerPreference::HighPerformance);
        assert_eq!(config.graphics.max_vertices, DEFAULT_MAX_VERTICES);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_json(r#"{ "window": { "width": 0 } }"#),
            Err(Error::InvalidArgument { name: "window", .. })
        ));
        assert!(matches!(
            Config::from_json(r#"{ "graphics": { "max_vertices": 2 } }"#),
            Err(Error::InvalidArgument { name: "max_vertices", .. })
        ));
        assert!(matches!(
            Config::from_json(r#"{ "graphics": { "texture_filter": "cubic" } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_json("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn json_round_trip() {
        let mut config = Config::default();
        config.window.title = "round trip".to_owned();
        config.graphics.texture_filter = TextureFilter::Nearest;
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn filter_maps_to_wgpu() {
        assert_eq!(wgpu::FilterMode::from(TextureFilter::Nearest), wgpu::FilterMode::Nearest);
        assert_eq!(
            wgpu::PowerPreference::from(PowerPreference::Default),
            wgpu::PowerPreference::None
        );
    }
}
