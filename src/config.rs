//! Runtime configuration for the viewer
//!
//! Every tunable of the camera, controls, grid, picking and lighting lives in
//! [`ViewerConfig`]. The defaults reproduce the behaviour of the stock viewer;
//! a JSON file can override any subset of the fields.
//!
//! ```json
//! {
//!     "controls": { "fast_speed": 1.0 },
//!     "bounds": { "enabled": true }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upper bound for `grid.half_lines`
pub const MAX_GRID_HALF_LINES: u32 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration, grouped by subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub bounds: BoundsConfig,
    pub grid: GridConfig,
    pub picking: PickingConfig,
    pub lighting: LightingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "meshpick".to_string(),
            width: 1300,
            height: 800,
            clear_color: [0.25, 0.25, 0.25],
        }
    }
}

/// Initial camera pose and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y: 45.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

/// Speeds and sensitivities of the interactive camera modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Degrees of yaw/pitch per pixel while orbiting
    pub orbit_sensitivity: f32,
    /// World units per pixel while panning
    pub pan_speed: f32,
    /// Degrees of roll per pixel while rolling
    pub roll_speed: f32,
    /// World units per frame per held movement key
    pub normal_speed: f32,
    /// Movement speed while Shift is held
    pub fast_speed: f32,
    /// World units per scroll line
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.2,
            pan_speed: 0.01,
            roll_speed: 0.1,
            normal_speed: 0.1,
            fast_speed: 0.5,
            zoom_speed: 0.5,
        }
    }
}

/// Axis-aligned box the camera position is clamped to when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub enabled: bool,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min: [-50.0, -50.0, -50.0],
            max: [50.0, 50.0, 50.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub base_scale: f32,
    pub max_scale: f32,
    pub reference_distance: f32,
    /// Number of lines on each side of the origin, per axis
    pub half_lines: u32,
    /// Rebuild the grid whenever the camera distance changes its scale
    pub adaptive: bool,
    pub main_line_color: [f32; 3],
    pub secondary_line_color: [f32; 3],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_scale: 1.0,
            max_scale: 10.0,
            reference_distance: 10.0,
            half_lines: 100,
            adaptive: false,
            main_line_color: [0.0, 0.0, 0.0],
            secondary_line_color: [0.5, 0.5, 0.5],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Skip objects whose bounding box the ray cannot reach before the
    /// per-triangle scan
    pub aabb_prepass: bool,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self { aabb_prepass: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub object_color: [f32; 3],
    pub outline_color: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_position: [10.0, 10.0, 10.0],
            light_color: [1.0, 1.0, 1.0],
            object_color: [0.8, 0.55, 0.35],
            outline_color: [1.0, 1.0, 0.0],
        }
    }
}

impl ViewerConfig {
    /// Loads a config file, filling unspecified fields with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the camera and grid code cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(
                "window",
                format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }

        let controls = &self.controls;
        let speeds = [
            ("controls.orbit_sensitivity", controls.orbit_sensitivity),
            ("controls.pan_speed", controls.pan_speed),
            ("controls.roll_speed", controls.roll_speed),
            ("controls.normal_speed", controls.normal_speed),
            ("controls.fast_speed", controls.fast_speed),
            ("controls.zoom_speed", controls.zoom_speed),
        ];
        for (field, value) in speeds {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }

        if !(self.camera.znear > 0.0 && self.camera.znear < self.camera.zfar) {
            return Err(invalid(
                "camera.znear",
                format!(
                    "must satisfy 0 < znear < zfar, got {} / {}",
                    self.camera.znear, self.camera.zfar
                ),
            ));
        }
        if !(self.camera.fov_y > 0.0 && self.camera.fov_y < 180.0) {
            return Err(invalid(
                "camera.fov_y",
                format!("must be in (0, 180), got {}", self.camera.fov_y),
            ));
        }

        if (0..3).any(|i| self.bounds.min[i] > self.bounds.max[i]) {
            return Err(invalid("bounds", "min must not exceed max".to_string()));
        }

        let grid = &self.grid;
        if !(grid.base_scale > 0.0 && grid.base_scale <= grid.max_scale) {
            return Err(invalid(
                "grid.base_scale",
                format!(
                    "must satisfy 0 < base_scale <= max_scale, got {} / {}",
                    grid.base_scale, grid.max_scale
                ),
            ));
        }
        if grid.reference_distance <= 0.0 {
            return Err(invalid(
                "grid.reference_distance",
                "must be positive".to_string(),
            ));
        }
        if grid.half_lines > MAX_GRID_HALF_LINES {
            return Err(invalid(
                "grid.half_lines",
                format!(
                    "must be at most {}, got {}",
                    MAX_GRID_HALF_LINES, grid.half_lines
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "controls": { "fast_speed": 2.0 }, "bounds": { "enabled": true } }"#,
        )
        .unwrap();

        assert_eq!(config.controls.fast_speed, 2.0);
        assert_eq!(config.controls.normal_speed, 0.1);
        assert!(config.bounds.enabled);
        assert_eq!(config.bounds.max, [50.0, 50.0, 50.0]);
        assert_eq!(config.grid, GridConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let err = ViewerConfig::from_json(r#"{ "controls": { "zoom_speed": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "controls.zoom_speed",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_grid_scale() {
        let err = ViewerConfig::from_json(r#"{ "grid": { "base_scale": 20.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let err = ViewerConfig::from_json(r#"{ "grid": { "half_lines": 4294967295 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "grid.half_lines",
                ..
            }
        ));

        let json = format!(r#"{{ "grid": {{ "half_lines": {} }} }}"#, MAX_GRID_HALF_LINES);
        assert!(ViewerConfig::from_json(&json).is_ok());
    }

    #[test]
    fn test_rejects_zero_window_size() {
        for json in [
            r#"{ "window": { "width": 0 } }"#,
            r#"{ "window": { "height": 0 } }"#,
        ] {
            let err = ViewerConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "window", .. }));
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = ViewerConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ViewerConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
