//! Bounds-derived decorations and camera state: axes, labels, clipping, zoom.

use std::f32::consts::PI;

use bevy_math::{Quat, Vec2, Vec3};
use tracing::debug;

use crate::config::{GraphConfig, LabelConfig, ZoomConfig};
use crate::core::{BoundingBox, Rgb};
use crate::pick::PickRay;
use crate::scene::{ObjectHandle, SceneBackend, SceneObject};

/// Axis lines anchored at the `(max_x, min_y, max_z)` corner of the box.
#[derive(Clone, Debug, PartialEq)]
pub struct AxesIndicator {
    pub origin: Vec3,
    /// -180° about Y.
    pub rotation: Quat,
    /// Local `(start, end)` of the x, y and z lines.
    pub segments: [(Vec3, Vec3); 3],
    pub color: Rgb,
}

impl AxesIndicator {
    pub fn for_bounds(bounds: &BoundingBox) -> Self {
        let size = bounds.max_diff_xyz() as f32;
        Self {
            origin: Vec3::new(
                bounds.max_x as f32,
                bounds.min_y as f32,
                bounds.max_z as f32,
            ),
            rotation: Quat::from_rotation_y(-PI),
            segments: [
                (Vec3::ZERO, Vec3::X * size),
                (Vec3::ZERO, Vec3::Y * size),
                // The z line only spans the column range.
                (Vec3::ZERO, Vec3::Z * bounds.diff_z() as f32),
            ],
            color: Rgb::BLACK,
        }
    }

    /// Segment endpoints in graph space, two points per line.
    pub fn world_points(&self) -> Vec<Vec3> {
        // Exact form of the half turn about Y.
        let place = |p: Vec3| Vec3::new(-p.x, p.y, -p.z) + self.origin;
        self.segments
            .iter()
            .flat_map(|&(a, b)| [place(a), place(b)])
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelStyle {
    /// Axis name at the far end of an axis.
    Strong,
    /// Numeric tick.
    Tick,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: Vec3,
    pub style: LabelStyle,
}

impl Label {
    fn strong(text: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            text: text.to_owned(),
            position: Vec3::new(x as f32, y as f32, z as f32),
            style: LabelStyle::Strong,
        }
    }

    fn tick(value: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            text: format_tick(value),
            position: Vec3::new(x as f32, y as f32, z as f32),
            style: LabelStyle::Tick,
        }
    }
}

/// Tick text: rounded to two decimals, no trailing zeros.
///
/// Rounds the exact binary value, so `2.675` (stored just below) prints
/// `2.67`. Exact ties round away from zero.
pub fn format_tick(value: f64) -> String {
    let scaled = value * 100.0;
    // Only multiples of 1/8 can sit exactly halfway between two cents.
    let rounded = if (value * 8.0).fract() == 0.0 && scaled.fract().abs() == 0.5 {
        scaled.round() / 100.0
    } else {
        format!("{value:.2}").parse::<f64>().unwrap_or(value)
    };
    // Avoid printing "-0".
    format!("{}", rounded + 0.0)
}

/// Offsets `0, spacing, 2·spacing, ..` up to and including `span`.
fn tick_offsets(span: f64, spacing: f64) -> impl Iterator<Item = f64> {
    let mut i = 0.0;
    std::iter::from_fn(move || {
        if spacing > 0.0 && i <= span {
            let v = i;
            i += spacing;
            Some(v)
        } else {
            None
        }
    })
}

/// Axis names and ticks for a box.
///
/// `Y` runs along the rows, `U` along the plotted real part and `X` along
/// the columns.
pub fn axis_labels(bounds: &BoundingBox, cfg: &LabelConfig) -> Vec<Label> {
    let b = bounds;
    let off = cfg.offset;
    let mut labels = vec![];

    labels.push(Label::strong("Y", b.max_x, b.min_y + b.diff_y() + off, b.max_z));
    for i in tick_offsets(b.diff_y(), cfg.tick_spacing) {
        labels.push(Label::tick(b.min_y + i, b.max_x + off, b.min_y + i, b.max_z + off));
    }

    labels.push(Label::strong("U", b.max_x - (b.diff_x() + off), b.min_y, b.max_z));
    for i in tick_offsets(b.diff_x(), cfg.tick_spacing) {
        labels.push(Label::tick(b.min_x + i, b.min_x + i, b.min_y, b.max_z + off));
    }

    labels.push(Label::strong("X", b.max_x, b.min_y, b.max_z - (b.diff_z() + off)));
    for i in tick_offsets(b.diff_z(), cfg.tick_spacing) {
        labels.push(Label::tick(b.min_z + i, b.max_x + off, b.min_y, b.min_z + i));
    }

    labels
}

/// Half-space `normal · p + constant >= 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippingPlane {
    pub normal: Vec3,
    pub constant: f32,
}

impl ClippingPlane {
    pub const fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    pub fn distance_to(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.constant
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.distance_to(p) >= 0.0
    }
}

/// `x <= max_x + m`, `x >= min_x - m`, `y <= max_y + m`.
///
/// The remaining three faces stay open.
pub fn clipping_planes(bounds: &BoundingBox, margin: f64) -> [ClippingPlane; 3] {
    [
        ClippingPlane::new(Vec3::NEG_X, (bounds.max_x + margin) as f32),
        ClippingPlane::new(Vec3::X, (-bounds.min_x + margin) as f32),
        ClippingPlane::new(Vec3::NEG_Y, (bounds.max_y + margin) as f32),
    ]
}

/// Clip `a..b` to the intersection of `planes`.
///
/// Segments touching a non-finite point are dropped whole.
pub fn clip_segment(planes: &[ClippingPlane], a: Vec3, b: Vec3) -> Option<(Vec3, Vec3)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let (mut a, mut b) = (a, b);
    for plane in planes {
        let da = plane.distance_to(a);
        let db = plane.distance_to(b);
        match (da >= 0.0, db >= 0.0) {
            (true, true) => {}
            (false, false) => return None,
            (true, false) => b = a + (b - a) * (da / (da - db)),
            (false, true) => a = a + (b - a) * (da / (da - db)),
        }
    }
    Some((a, b))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Pinhole camera the graph is viewed through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Film size in millimetres used to derive focal length.
    pub film_gauge: f32,
}

impl PerspectiveCamera {
    pub fn from_config(cfg: &GraphConfig) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: cfg.camera.fov,
            aspect: cfg.camera.aspect,
            near: cfg.camera.near,
            far: cfg.camera.far,
            film_gauge: cfg.camera.film_gauge,
        };
        camera.frame(&cfg.bounds);
        camera
    }

    pub fn film_height(&self) -> f32 {
        self.film_gauge / self.aspect.max(1.0)
    }

    pub fn focal_length(&self) -> f32 {
        0.5 * self.film_height() / (self.fov.to_radians() * 0.5).tan()
    }

    /// Whole degrees of field of view, recovered from the film geometry.
    pub fn derived_fov(&self) -> f32 {
        let film = f64::from(self.film_height());
        let focal = 0.5 * film / (f64::from(self.fov).to_radians() * 0.5).tan();
        let degrees = (2.0 * (film / 2.0 / focal).atan()).to_degrees();
        // The tan/atan round trip can land a hair under a whole degree.
        (degrees + 1e-9).floor() as f32
    }

    /// Look at the `(max_x, min_y, max_z)` corner from outside the box.
    pub fn frame(&mut self, bounds: &BoundingBox) {
        let d = bounds.max_diff_xyz() as f32;
        self.position = Vec3::new(-d / 2.0, d / 2.0, -(d + 20.0));
        self.target = Vec3::new(
            bounds.max_x as f32,
            bounds.min_y as f32,
            bounds.max_z as f32,
        );
    }

    /// Ray through a point in normalized device coordinates (`-1..=1`, y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> PickRay {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);
        let half = (self.fov.to_radians() * 0.5).tan();
        let dir = forward + right * (ndc.x * half * self.aspect) + up * (ndc.y * half);
        PickRay::new(self.position, dir)
    }

    /// Step the field of view; returns the new value.
    pub fn zoom(&mut self, direction: ZoomDirection, cfg: &ZoomConfig) -> f32 {
        let fov = self.derived_fov();
        self.fov = match direction {
            ZoomDirection::In if fov > cfg.min_fov => (fov - cfg.step).max(cfg.min_fov),
            ZoomDirection::Out if fov < cfg.max_fov => (fov + cfg.step).min(cfg.max_fov),
            _ => fov,
        };
        self.fov
    }
}

/// Owns the axes, label and camera state of a session.
#[derive(Debug)]
pub struct ViewportController {
    labels_cfg: LabelConfig,
    zoom_cfg: ZoomConfig,
    clip_margin: f64,
    axes: Option<ObjectHandle>,
    axes_on: bool,
    labels: Vec<ObjectHandle>,
    labels_on: bool,
    camera: PerspectiveCamera,
}

impl ViewportController {
    pub fn new(cfg: &GraphConfig) -> Self {
        Self {
            labels_cfg: cfg.labels,
            zoom_cfg: cfg.zoom,
            clip_margin: cfg.clip_margin,
            axes: None,
            axes_on: false,
            labels: vec![],
            labels_on: false,
            camera: PerspectiveCamera::from_config(cfg),
        }
    }

    pub fn axes_enabled(&self) -> bool {
        self.axes_on
    }

    pub fn labels_enabled(&self) -> bool {
        self.labels_on
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn axes_handle(&self) -> Option<ObjectHandle> {
        self.axes
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    /// Build or dispose the axis indicator to match `on`.
    pub fn apply_axes<S: SceneBackend + ?Sized>(
        &mut self,
        on: bool,
        bounds: &BoundingBox,
        scene: &mut S,
    ) {
        match (on, self.axes) {
            (true, None) => {
                let axes = AxesIndicator::for_bounds(bounds);
                self.axes = Some(scene.add_object(SceneObject::Axes(&axes)));
            }
            (false, Some(handle)) => {
                scene.remove_object(handle);
                scene.dispose_geometry(handle);
                self.axes = None;
            }
            _ => {}
        }
        self.axes_on = on;
    }

    /// Show or hide the label layer.
    ///
    /// Labels are only created when none exist, so toggling never duplicates
    /// them; hiding keeps them in the scene.
    pub fn apply_labels<S: SceneBackend + ?Sized>(
        &mut self,
        on: bool,
        bounds: &BoundingBox,
        scene: &mut S,
    ) {
        if on && !self.labels_on {
            if self.labels.is_empty() {
                self.labels = axis_labels(bounds, &self.labels_cfg)
                    .iter()
                    .map(|label| scene.add_object(SceneObject::Label(label)))
                    .collect();
            }
            scene.set_label_layer_visible(true);
        } else if !on && self.labels_on {
            scene.set_label_layer_visible(false);
        }
        self.labels_on = on;
    }

    /// Take every label out of the scene.
    pub fn remove_labels<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) {
        for handle in self.labels.drain(..) {
            scene.remove_object(handle);
        }
    }

    pub fn clipping_planes(&self, bounds: &BoundingBox) -> [ClippingPlane; 3] {
        clipping_planes(bounds, self.clip_margin)
    }

    pub fn apply_clipping<S: SceneBackend + ?Sized>(&self, bounds: &BoundingBox, scene: &mut S) {
        scene.set_clipping_planes(&self.clipping_planes(bounds));
    }

    pub fn zoom(&mut self, direction: ZoomDirection) -> f32 {
        let before = self.camera.fov;
        let after = self.camera.zoom(direction, &self.zoom_cfg);
        debug!(?direction, before, after, "zoom");
        after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_point_back_into_the_box() {
        let b = BoundingBox {
            min_z: -5.0,
            max_z: 5.0,
            ..BoundingBox::default()
        };
        let axes = AxesIndicator::for_bounds(&b);
        let pts = axes.world_points();
        assert_eq!(pts[0], Vec3::new(10.0, -10.0, 5.0));
        assert_eq!(pts[1], Vec3::new(-10.0, -10.0, 5.0));
        assert_eq!(pts[3], Vec3::new(10.0, 10.0, 5.0));
        assert_eq!(pts[5], Vec3::new(10.0, -10.0, -5.0));
        for (a, b) in axes.segments {
            assert!((axes.rotation * b + axes.origin)
                .abs_diff_eq(Vec3::new(-b.x, b.y, -b.z) + axes.origin, 1e-4));
            assert_eq!(a, Vec3::ZERO);
        }
    }

    #[test]
    fn default_box_labels() {
        let labels = axis_labels(&BoundingBox::default(), &LabelConfig::default());
        let strong: Vec<_> = labels
            .iter()
            .filter(|l| l.style == LabelStyle::Strong)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(strong, ["Y", "U", "X"]);
        // Three ticks (-10, 0, 10) per axis.
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0].position, Vec3::new(10.0, 12.0, 10.0));
        assert_eq!(labels[1].text, "-10");
        assert_eq!(labels[1].position, Vec3::new(12.0, -10.0, 12.0));
        assert_eq!(labels[4].text, "U");
        assert_eq!(labels[4].position, Vec3::new(-12.0, -10.0, 10.0));
        assert_eq!(labels[8].position, Vec3::new(10.0, -10.0, -12.0));
    }

    #[test]
    fn tick_text_rounds_to_two_decimals() {
        assert_eq!(format_tick(-10.0), "-10");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(1.23456), "1.23");
        assert_eq!(format_tick(-0.001), "0");
        assert_eq!(format_tick(2.675), "2.67");
        assert_eq!(format_tick(0.125), "0.13");
        assert_eq!(format_tick(-0.375), "-0.38");
    }

    #[test]
    fn three_clipping_planes() {
        let planes = clipping_planes(&BoundingBox::default(), 0.5);
        assert!(planes[0].contains(Vec3::new(10.5, 0.0, 0.0)));
        assert!(!planes[0].contains(Vec3::new(10.6, 0.0, 0.0)));
        assert!(planes[1].contains(Vec3::new(-10.5, 0.0, 0.0)));
        assert!(!planes[1].contains(Vec3::new(-10.6, 0.0, 0.0)));
        assert!(!planes[2].contains(Vec3::new(0.0, 10.6, 0.0)));
        // Open faces.
        assert!(planes.iter().all(|p| p.contains(Vec3::new(0.0, -1e6, 1e6))));
    }

    #[test]
    fn segments_are_cut_at_planes() {
        let planes = clipping_planes(&BoundingBox::default(), 0.5);
        let (a, b) =
            clip_segment(&planes, Vec3::new(0.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0)).unwrap();
        assert_eq!(a, Vec3::ZERO);
        assert!((b.x - 10.5).abs() < 1e-4);
        assert!(clip_segment(&planes, Vec3::new(11.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 0.0)).is_none());
        assert!(clip_segment(&planes, Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::ZERO).is_none());
    }

    #[test]
    fn zoom_is_clamped() {
        let cfg = GraphConfig::default();
        let mut cam = PerspectiveCamera::from_config(&cfg);
        assert_eq!(cam.derived_fov(), 75.0);
        assert_eq!(cam.zoom(ZoomDirection::In, &cfg.zoom), 70.0);
        assert_eq!(cam.zoom(ZoomDirection::Out, &cfg.zoom), 75.0);

        cam.fov = 22.0;
        assert_eq!(cam.zoom(ZoomDirection::In, &cfg.zoom), 20.0);
        assert_eq!(cam.zoom(ZoomDirection::In, &cfg.zoom), 20.0);

        cam.fov = 172.0;
        assert_eq!(cam.zoom(ZoomDirection::Out, &cfg.zoom), 175.0);
        assert_eq!(cam.zoom(ZoomDirection::Out, &cfg.zoom), 175.0);
    }

    #[test]
    fn camera_frames_the_corner() {
        let mut cam = PerspectiveCamera::from_config(&GraphConfig::default());
        cam.frame(&BoundingBox::symmetric(20.0));
        assert_eq!(cam.position, Vec3::new(-20.0, 20.0, -60.0));
        assert_eq!(cam.target, Vec3::new(20.0, -20.0, 20.0));
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = PerspectiveCamera::from_config(&GraphConfig::default());
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        let expected = (cam.target - cam.position).normalize();
        assert!(ray.direction.abs_diff_eq(expected, 1e-5));
        assert_eq!(ray.origin, cam.position);
    }
}
