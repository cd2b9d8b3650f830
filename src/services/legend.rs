//! DWD radar color legend.
//!
//! Maps the exact RGB values the `Radar_rv_product_1x1km_ger` layer paints
//! into a representative precipitation intensity in mm/h. Entry order is
//! significant: it is the tie-break order for nearest-color matching.

use std::fmt;

/// An 8-bit RGB triple as read from a radar tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space (ΔR² + ΔG² + ΔB²).
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Renders as `"r,g,b"`, the form used in API responses.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// One legend bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub rgb: Rgb,
    pub mm_per_hour: f64,
}

const fn entry(r: u8, g: u8, b: u8, mm_per_hour: f64) -> LegendEntry {
    LegendEntry {
        rgb: Rgb::new(r, g, b),
        mm_per_hour,
    }
}

/// Representative intensities (bucket midpoints) per legend color.
pub const COLOR_LEGEND: [LegendEntry; 16] = [
    entry(255, 255, 255, 0.0),
    entry(51, 255, 255, 0.1),
    entry(26, 204, 154, 0.2),
    entry(1, 153, 52, 0.4),
    entry(77, 179, 27, 1.0),
    entry(153, 204, 1, 2.0),
    entry(204, 230, 1, 3.0),
    entry(255, 255, 1, 5.0),
    entry(255, 196, 1, 7.5),
    entry(255, 137, 1, 10.0),
    entry(255, 69, 1, 15.0),
    entry(254, 0, 0, 30.0),
    entry(229, 0, 76, 45.0),
    entry(204, 0, 152, 75.5),
    entry(102, 0, 203, 100.0),
    entry(0, 0, 254, 150.0),
];
