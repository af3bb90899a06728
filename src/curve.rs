//! Second pass of a plot: turn a sampled row into a colored curve.

use std::f32::consts::FRAC_PI_2;

use bevy_math::{Quat, Vec3};

use crate::core::{CURVE_NAME, Curve, PlotQueueEntry, SampleRow};
use crate::heatmap::HeatMapColorMapper;

/// Rotation applied to every curve: -270° about X.
pub fn curve_rotation() -> Quat {
    Quat::from_rotation_x(-3.0 * FRAC_PI_2)
}

/// [`curve_rotation`] applied exactly: `(x, y, z) -> (x, -z, y)`.
///
/// Raw curve points may hold `+inf`, which a floating-point quaternion
/// product would turn into NaN.
pub fn to_graph_frame(p: Vec3) -> Vec3 {
    Vec3::new(p.x, -p.z, p.y)
}

pub struct CurveBuilder<'a> {
    mapper: &'a HeatMapColorMapper,
}

impl<'a> CurveBuilder<'a> {
    pub fn new(mapper: &'a HeatMapColorMapper) -> Self {
        Self { mapper }
    }

    /// Color `entry` with `values` and place it at its row.
    ///
    /// `values.imaginary[i]` colors `entry.points[i]`; both are in column order.
    pub fn build(&self, entry: PlotQueueEntry, values: &SampleRow) -> Curve {
        debug_assert_eq!(entry.points.len(), values.imaginary.len());
        let colors = values
            .imaginary
            .iter()
            .map(|&v| self.mapper.color(v))
            .collect();
        Curve {
            name: CURVE_NAME,
            geometry: entry.points,
            colors,
            row: entry.row,
            rotation: curve_rotation(),
            position: Vec3::new(0.0, entry.row as f32, 0.0),
        }
    }
}
