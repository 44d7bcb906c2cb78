use crate::browser;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Game settings, every field falls back to its default when missing from
/// the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_id: String,
    /// prefix for every asset url, empty means "relative to the page"
    pub asset_root: String,
    pub viewport: Viewport,
    pub slingshot: SlingshotConfig,
    pub camera: CameraConfig,
    /// world x the intro pan heads for before play starts
    pub intro_pan_target: f64,
    /// JSON level registry, the built-in levels are used when unset
    pub levels_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlingshotConfig {
    /// top-left corner where the slingshot sprite is drawn
    pub x: f64,
    pub y: f64,
    /// presses within the sprite bounds grown by this margin start firing
    pub grab_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_offset: f64,
    pub max_offset: f64,
    /// max pixels panned per update step
    pub max_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            canvas_id: "gamecanvas".to_string(),
            asset_root: String::new(),
            viewport: Viewport::default(),
            slingshot: SlingshotConfig::default(),
            camera: CameraConfig::default(),
            intro_pan_target: 700.0,
            levels_path: None,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 640.0,
            height: 480.0,
        }
    }
}

impl Default for SlingshotConfig {
    fn default() -> Self {
        SlingshotConfig {
            x: 140.0,
            y: 280.0,
            grab_margin: 10.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            min_offset: 0.0,
            max_offset: 300.0,
            max_speed: 3.0,
        }
    }
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "config.json";

    pub async fn load(path: &str) -> Result<Self> {
        browser::fetch_json::<Config>(path)
            .await
            .with_context(|| format!("Failed to load configuration from : {}", path))
    }

    pub fn asset_url(&self, relative: &str) -> String {
        if self.asset_root.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", self.asset_root.trim_end_matches('/'), relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_the_stock_layout() {
        let config = Config::default();
        assert_eq!(config.canvas_id, "gamecanvas");
        assert_relative_eq!(config.viewport.width, 640.0);
        assert_relative_eq!(config.slingshot.x, 140.0);
        assert_relative_eq!(config.slingshot.y, 280.0);
        assert_relative_eq!(config.slingshot.grab_margin, 10.0);
        assert_relative_eq!(config.camera.max_offset, 300.0);
        assert_relative_eq!(config.camera.max_speed, 3.0);
        assert_relative_eq!(config.intro_pan_target, 700.0);
        assert!(config.levels_path.is_none());
    }

    #[test]
    fn asset_url_joins_root_once() {
        let mut config = Config::default();
        assert_eq!(config.asset_url("images/slingshot.png"), "images/slingshot.png");

        config.asset_root = "https://cdn.example.com/game/".to_string();
        assert_eq!(
            config.asset_url("images/slingshot.png"),
            "https://cdn.example.com/game/images/slingshot.png"
        );
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let json = r#"{ "canvas_id": "stage", "camera": { "max_speed": 5 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.canvas_id, "stage");
        assert_relative_eq!(config.camera.max_speed, 5.0);
        assert_relative_eq!(config.camera.min_offset, 0.0);
        assert_relative_eq!(config.camera.max_offset, 300.0);
        assert_eq!(config.viewport, Viewport::default());
        assert_eq!(config.slingshot, SlingshotConfig::default());
        assert_relative_eq!(config.intro_pan_target, 700.0);
        assert!(config.asset_root.is_empty());
        assert!(config.levels_path.is_none());
    }

    #[test]
    fn empty_json_object_is_the_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
