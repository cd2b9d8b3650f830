//! Radar color → precipitation classification.
//!
//! Exact legend lookup first, then nearest legend color by squared Euclidean
//! distance, accepted only within [`NEAREST_COLOR_TOLERANCE`]. Anything
//! further away is reported as `unknown_color` with a value of 0.0.

use serde::Serialize;
use utoipa::ToSchema;

use crate::services::legend::{LegendEntry, Rgb, COLOR_LEGEND};

/// Maximum squared RGB distance accepted for a nearest-color match.
pub const NEAREST_COLOR_TOLERANCE: u32 = 1000;

/// Outcome status of a single forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// Pixel color is a legend color
    Ok,
    /// Pixel color is within tolerance of a legend color
    OkNearest,
    /// Pixel color is too far from every legend color; value is 0.0
    UnknownColor,
    /// Tile could not be fetched or decoded
    Error,
}

/// Result of classifying one decoded pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: SampleStatus,
    pub value: f64,
    /// Closest legend color, set for `OkNearest` and `UnknownColor`.
    pub nearest_color: Option<Rgb>,
    /// Squared distance to `nearest_color`.
    pub distance: Option<u32>,
}

/// Classify a pixel against the DWD radar legend.
pub fn classify(rgb: Rgb) -> Classification {
    classify_with(rgb, &COLOR_LEGEND)
}

/// Classify a pixel against an explicit legend.
pub fn classify_with(rgb: Rgb, legend: &[LegendEntry]) -> Classification {
    if let Some(exact) = legend.iter().find(|e| e.rgb == rgb) {
        return Classification {
            status: SampleStatus::Ok,
            value: exact.mm_per_hour,
            nearest_color: None,
            distance: None,
        };
    }

    // Strict `<` keeps the first entry on ties.
    let mut nearest: Option<(&LegendEntry, u32)> = None;
    for entry in legend {
        let dist = rgb.distance_sq(entry.rgb);
        if nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((entry, dist));
        }
    }

    match nearest {
        Some((entry, dist)) if dist <= NEAREST_COLOR_TOLERANCE => Classification {
            status: SampleStatus::OkNearest,
            value: entry.mm_per_hour,
            nearest_color: Some(entry.rgb),
            distance: Some(dist),
        },
        Some((entry, dist)) => Classification {
            status: SampleStatus::UnknownColor,
            value: 0.0,
            nearest_color: Some(entry.rgb),
            distance: Some(dist),
        },
        None => Classification {
            status: SampleStatus::UnknownColor,
            value: 0.0,
            nearest_color: None,
            distance: None,
        },
    }
}
