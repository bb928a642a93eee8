//! Hue arithmetic and HSL swatch colors.

use serde::{Serialize, Deserialize};

/// Degrees in a full turn of the color wheel.
pub const FULL_TURN: f64 = 360.0;

/// Swatch saturation (percent).
pub const SWATCH_SATURATION: u8 = 80;

/// Swatch lightness (percent).
pub const SWATCH_LIGHTNESS: u8 = 50;

/// Perceptual sensitivity buckets: (lowest hue, highest hue, multiplier).
///
/// Human hue discrimination is weakest in greens, then cyans, then
/// blue/violet. Hues outside every bucket use 1.0.
pub const SENSITIVITY_BUCKETS: [(f64, f64, f64); 3] = [
    (80.0, 165.0, 1.8),
    (166.0, 210.0, 1.3),
    (211.0, 280.0, 1.2),
];

/// Multiplier applied to the difficulty delta for a given base hue.
pub fn sensitivity_factor(hue: f64) -> f64 {
    SENSITIVITY_BUCKETS
        .iter()
        .find(|(lo, hi, _)| hue >= *lo && hue <= *hi)
        .map(|(_, _, factor)| *factor)
        .unwrap_or(1.0)
}

/// Wrap any angle into [0, 360).
#[inline]
pub fn wrap_hue(hue: f64) -> f64 {
    let wrapped = hue.rem_euclid(FULL_TURN);
    // rem_euclid can round up to exactly 360.0 for tiny negatives
    if wrapped >= FULL_TURN { 0.0 } else { wrapped }
}

/// An HSL color as shown on a swatch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees, [0, 360).
    pub hue: f64,
    /// Saturation percent.
    pub saturation: u8,
    /// Lightness percent.
    pub lightness: u8,
}

impl Hsl {
    /// Swatch color with the board's fixed saturation and lightness.
    pub fn swatch(hue: f64) -> Self {
        Self {
            hue: wrap_hue(hue),
            saturation: SWATCH_SATURATION,
            lightness: SWATCH_LIGHTNESS,
        }
    }

    /// CSS color string, e.g. `hsl(120,80%,50%)`.
    pub fn to_css(&self) -> String {
        format!("hsl({},{}%,{}%)", self.hue, self.saturation, self.lightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(sensitivity_factor(79.0), 1.0);
        assert_eq!(sensitivity_factor(80.0), 1.8);
        assert_eq!(sensitivity_factor(165.0), 1.8);
        assert_eq!(sensitivity_factor(166.0), 1.3);
        assert_eq!(sensitivity_factor(210.0), 1.3);
        assert_eq!(sensitivity_factor(211.0), 1.2);
        assert_eq!(sensitivity_factor(280.0), 1.2);
        assert_eq!(sensitivity_factor(281.0), 1.0);
        assert_eq!(sensitivity_factor(0.0), 1.0);
        assert_eq!(sensitivity_factor(359.0), 1.0);
    }

    #[test]
    fn test_wrap_hue() {
        assert_eq!(wrap_hue(0.0), 0.0);
        assert_eq!(wrap_hue(360.0), 0.0);
        assert_eq!(wrap_hue(365.5), 5.5);
        assert_eq!(wrap_hue(-15.0), 345.0);
        assert!(wrap_hue(-1e-15) < FULL_TURN);
    }

    #[test]
    fn test_css_format() {
        assert_eq!(Hsl::swatch(120.0).to_css(), "hsl(120,80%,50%)");
        assert_eq!(Hsl::swatch(-27.0).to_css(), "hsl(333,80%,50%)");
        assert_eq!(Hsl::swatch(12.5).to_css(), "hsl(12.5,80%,50%)");
    }
}
