//! Chart colors.

use crate::stats::SatisfactionLevel;
use plotters::style::RGBColor;

/// Primary bar color.
pub const PINK: RGBColor = RGBColor(255, 119, 192);
/// Faculty mean bars.
pub const HOT_PINK: RGBColor = RGBColor(255, 105, 180);
/// Highlights: gauge value, mean lines, radar outline.
pub const CYAN: RGBColor = RGBColor(0, 190, 200);
pub const GRID: RGBColor = RGBColor(200, 200, 200);
pub const MISSING: RGBColor = RGBColor(220, 220, 220);

/// Gauge bands, low to high.
pub const LEVEL_LOW: RGBColor = RGBColor(255, 77, 77);
pub const LEVEL_MODERATE: RGBColor = RGBColor(255, 184, 77);
pub const LEVEL_HIGH: RGBColor = RGBColor(0, 204, 122);

/// Categorical series colors.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

// Red-yellow-green diverging scale endpoints
const HEAT_NEG: (f64, f64, f64) = (215.0, 48.0, 39.0);
const HEAT_MID: (f64, f64, f64) = (255.0, 255.0, 191.0);
const HEAT_POS: (f64, f64, f64) = (26.0, 152.0, 80.0);

pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

pub fn level_color(level: SatisfactionLevel) -> RGBColor {
    match level {
        SatisfactionLevel::Low => LEVEL_LOW,
        SatisfactionLevel::Moderate => LEVEL_MODERATE,
        SatisfactionLevel::High => LEVEL_HIGH,
    }
}

/// Heatmap cell color for a coefficient in [-1, 1]; NaN is grey.
pub fn heat_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return MISSING;
    }
    let r = r.clamp(-1.0, 1.0);
    let (from, to, t) = if r < 0.0 {
        (HEAT_NEG, HEAT_MID, r + 1.0)
    } else {
        (HEAT_MID, HEAT_POS, r)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
