//! Heat-map coloring of imaginary parts.

use crate::core::{HeatMapRange, Rgb, SampleTable};

/// Hue (degrees) of the most negative imaginary value.
pub const COLD_HUE: f64 = 240.0;

/// Maps imaginary parts to colors over a global range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatMapColorMapper {
    range: HeatMapRange,
}

impl HeatMapColorMapper {
    /// Build a mapper from a completely sampled table.
    pub fn from_table(table: &SampleTable) -> Self {
        Self::new(Self::range_of(table))
    }

    pub const fn new(range: HeatMapRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> HeatMapRange {
        self.range
    }

    /// Scan every value; the bounds start at zero and only move outward.
    pub fn range_of(table: &SampleTable) -> HeatMapRange {
        table
            .values()
            .fold(HeatMapRange::default(), |mut range, v| {
                if v < range.min {
                    range.min = v;
                } else if v > range.max {
                    range.max = v;
                }
                range
            })
    }

    pub fn color(&self, value: f64) -> Rgb {
        color_for(value, self.range.min, self.range.max)
    }
}

/// Color of `value` on the blue (low) to red (high) scale spanning `[min, max]`.
///
/// A zero-width range colors everything [`Rgb::GREEN`]. A non-finite position
/// on the scale comes out black.
pub fn color_for(value: f64, min: f64, max: f64) -> Rgb {
    let abs_min = min.abs();
    let diff = abs_min + max.abs();
    if diff == 0.0 {
        return Rgb::GREEN;
    }
    let t = (value + abs_min) / diff;
    if !t.is_finite() {
        return Rgb::BLACK;
    }
    hsl_to_rgb((1.0 - t) * COLD_HUE, 1.0, 0.5)
}

/// Convert HSL (hue in degrees, saturation and lightness in `0..=1`) to 8-bit RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r), to_u8(g), to_u8(b))
}
