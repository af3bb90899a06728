//! Session configuration.

use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::GraphError;
use crate::core::{BoundingBox, Rgb};

/// Everything a session needs before the first plot.
///
/// Every field has a default, so a JSON file only lists what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub bounds: BoundingBox,
    pub draw_axes: bool,
    pub draw_labels: bool,
    pub camera: CameraConfig,
    pub zoom: ZoomConfig,
    pub labels: LabelConfig,
    pub controls: ControlsConfig,
    /// Distance the clipping planes sit outside the box.
    pub clip_margin: f64,
    /// Max distance between a pick ray and a line that still counts as a hit.
    pub pick_threshold: f32,
    pub marker_radius: f32,
    pub background: Rgb,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::default(),
            draw_axes: true,
            draw_labels: true,
            camera: CameraConfig::default(),
            zoom: ZoomConfig::default(),
            labels: LabelConfig::default(),
            controls: ControlsConfig::default(),
            clip_margin: 0.5,
            pick_threshold: 1.0,
            marker_radius: 0.2,
            background: Rgb::from_hex(0xfafafa),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub film_gauge: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            film_gauge: 35.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Degrees per zoom step.
    pub step: f32,
    pub min_fov: f32,
    pub max_fov: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            step: 5.0,
            min_fov: 20.0,
            max_fov: 175.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Grid units between tick labels.
    pub tick_spacing: f64,
    /// How far labels sit outside the box.
    pub offset: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            tick_spacing: 10.0,
            offset: 2.0,
        }
    }
}

/// Orbit camera behaviour of the interactive front end.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub damping_factor: f32,
    pub enable_zoom: bool,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.25,
            enable_zoom: true,
            rotate_speed: 0.005,
        }
    }
}

impl GraphConfig {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .change_context(GraphError::ConfigLoad)
            .attach("config is not valid JSON for GraphConfig")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .change_context(GraphError::ConfigLoad)
            .attach(format!("reading {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).change_context(GraphError::ConfigLoad)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.bounds.validate()?;
        let checks = [
            (self.labels.tick_spacing > 0.0, "labels.tick_spacing must be positive"),
            (self.zoom.step > 0.0, "zoom.step must be positive"),
            (
                self.zoom.min_fov <= self.zoom.max_fov,
                "zoom.min_fov must not exceed zoom.max_fov",
            ),
            (
                self.camera.fov > 0.0 && self.camera.fov < 180.0,
                "camera.fov must lie in (0, 180)",
            ),
            (self.camera.aspect > 0.0, "camera.aspect must be positive"),
            (self.pick_threshold >= 0.0, "pick_threshold must not be negative"),
        ];
        for (ok, message) in checks {
            if !ok {
                return Err(Report::new(GraphError::Configuration).attach(message));
            }
        }
        Ok(())
    }
}
