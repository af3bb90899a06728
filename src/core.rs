use bevy_math::{Quat, Vec3};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::GraphError;

/// Name carried by every committed curve so the pick system can recognise it.
pub const CURVE_NAME: &str = "curve";

/// Extent of the sampled grid and of the drawn graph space.
///
/// `x` is the plotted real part, `y` steps over rows (the imaginary part of
/// the input) and `z` steps over columns (the real part of the input).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    /// Row step along `y`. Columns always step by 1.
    pub interval_y: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::symmetric(10.0)
    }
}

impl BoundingBox {
    /// A cube spanning `-half..=half` on every axis with a row step of 1.
    pub const fn symmetric(half: f64) -> Self {
        Self {
            min_x: -half,
            max_x: half,
            min_y: -half,
            max_y: half,
            min_z: -half,
            max_z: half,
            interval_y: 1.0,
        }
    }

    pub const fn with_interval_y(mut self, interval_y: f64) -> Self {
        self.interval_y = interval_y;
        self
    }

    /// Reject boxes that cannot be sampled.
    pub fn validate(&self) -> crate::Result<()> {
        let axes = [
            ("x", self.min_x, self.max_x),
            ("y", self.min_y, self.max_y),
            ("z", self.min_z, self.max_z),
        ];
        for (axis, min, max) in axes {
            if !min.is_finite() || !max.is_finite() {
                return Err(Report::new(GraphError::Configuration)
                    .attach(format!("{axis} bounds must be finite, got [{min}, {max}]")));
            }
            if max < min {
                return Err(Report::new(GraphError::Configuration)
                    .attach(format!("max_{axis} ({max}) is below min_{axis} ({min})")));
            }
        }
        if !(self.interval_y.is_finite() && self.interval_y > 0.0) {
            return Err(Report::new(GraphError::Configuration).attach(format!(
                "interval_y must be a positive number, got {}",
                self.interval_y
            )));
        }
        // Steps accumulate, so a step below the float spacing never advances.
        let steps = [
            ("y", self.min_y, self.max_y, self.interval_y),
            ("z", self.min_z, self.max_z, 1.0),
        ];
        for (axis, min, max, step) in steps {
            if min + step == min || max + step == max {
                return Err(Report::new(GraphError::Configuration).attach(format!(
                    "{axis} step {step} is too small to advance over [{min}, {max}]"
                )));
            }
        }
        Ok(())
    }

    pub fn diff_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn diff_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn diff_z(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn max_diff_xyz(&self) -> f64 {
        self.diff_x().max(self.diff_y()).max(self.diff_z())
    }

    pub fn max_xyz(&self) -> f64 {
        self.max_x.max(self.max_y).max(self.max_z)
    }

    /// Row values, `min_y` upward by `interval_y` while `<= max_y`.
    pub fn rows(&self) -> Steps {
        Steps::new(self.min_y, self.max_y, self.interval_y)
    }

    /// Column values, `min_z` upward by 1 while `<= max_z`.
    pub fn cols(&self) -> Steps {
        Steps::new(self.min_z, self.max_z, 1.0)
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    pub fn col_count(&self) -> usize {
        self.cols().count()
    }
}

/// Inclusive stepping over `start..=end`.
///
/// The value is accumulated (`v += step`) rather than computed from an index,
/// so fractional steps land on the same values on every run.
#[derive(Clone, Debug)]
pub struct Steps {
    next: f64,
    end: f64,
    step: f64,
}

impl Steps {
    fn new(start: f64, end: f64, step: f64) -> Self {
        Self {
            next: start,
            end,
            step,
        }
    }
}

impl Iterator for Steps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.step > 0.0 && self.next <= self.end {
            let v = self.next;
            self.next += self.step;
            Some(v)
        } else {
            None
        }
    }
}

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Used for every vertex when the imaginary range collapses to a point.
    pub const GREEN: Self = Self::new(0, 255, 0);
}

impl From<Rgb> for bevy::prelude::Color {
    #[inline]
    fn from(c: Rgb) -> Self {
        bevy::prelude::Color::srgb_u8(c.r, c.g, c.b)
    }
}

/// One evaluated grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSample {
    pub row: f64,
    pub col: f64,
    pub imaginary: f64,
    /// `(re, col, 0)`, with `re` replaced by `+inf` when it was NaN.
    pub plotted_point: Vec3,
}

/// Imaginary parts of one sampled row, in column order.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRow {
    pub row: f64,
    pub imaginary: Vec<f64>,
}

/// Every imaginary value of one plot call, keyed by row then column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleTable {
    rows: Vec<SampleRow>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: SampleRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[SampleRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&SampleRow> {
        self.rows.get(index)
    }

    /// Look a value up by its row value and column index.
    pub fn imaginary_at(&self, row: f64, col_index: usize) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.row == row)
            .and_then(|r| r.imaginary.get(col_index).copied())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|r| r.imaginary.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Smallest and largest imaginary value of a plot, anchored at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatMapRange {
    pub min: f64,
    pub max: f64,
}

impl HeatMapRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width used for normalisation, `|min| + |max|`.
    pub fn span(&self) -> f64 {
        self.min.abs() + self.max.abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.span() == 0.0
    }

    pub const fn to_array(self) -> [f64; 2] {
        [self.min, self.max]
    }
}

/// A sampled row whose colors are not known yet.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotQueueEntry {
    pub points: Vec<Vec3>,
    pub row: f64,
}

/// A committed, colored polyline.
///
/// `geometry` holds the raw `(re, col, 0)` points; `rotation` and `position`
/// place them in the graph space. `colors[i]` belongs to `geometry[i]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Curve {
    pub name: &'static str,
    pub geometry: Vec<Vec3>,
    pub colors: Vec<Rgb>,
    pub row: f64,
    pub rotation: Quat,
    pub position: Vec3,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    /// Vertices in graph space.
    pub fn world_points(&self) -> Vec<Vec3> {
        self.geometry
            .iter()
            .map(|&p| crate::curve::to_graph_frame(p) + self.position)
            .collect()
    }

    /// Flat `xyz` position buffer of the raw geometry.
    pub fn position_buffer(&self) -> Vec<f32> {
        self.geometry.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Flat `rgb` color buffer, one triple per vertex.
    pub fn color_buffer(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_array()).collect()
    }
}
