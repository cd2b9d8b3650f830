use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::classifier::NEAREST_COLOR_TOLERANCE;
use crate::services::legend::COLOR_LEGEND;

/// One legend color and the intensity it stands for.
#[derive(Debug, Serialize, ToSchema)]
pub struct LegendEntryResponse {
    /// Radar color as "r,g,b"
    pub color: String,
    /// Representative precipitation in mm/h
    pub mm_per_hour: f64,
}

/// The color legend used to classify radar pixels.
#[derive(Debug, Serialize, ToSchema)]
pub struct LegendResponse {
    /// Maximum squared RGB distance accepted for a nearest-color match
    pub nearest_color_tolerance: u32,
    /// Legend entries, in classification order
    pub entries: Vec<LegendEntryResponse>,
}

/// Radar color legend.
#[utoipa::path(
    get,
    path = "/api/v1/legend",
    tag = "Nowcast",
    responses(
        (status = 200, description = "Color legend", body = LegendResponse),
    )
)]
pub async fn get_legend() -> Json<LegendResponse> {
    Json(LegendResponse {
        nearest_color_tolerance: NEAREST_COLOR_TOLERANCE,
        entries: COLOR_LEGEND
            .iter()
            .map(|e| LegendEntryResponse {
                color: e.rgb.to_string(),
                mm_per_hour: e.mm_per_hour,
            })
            .collect(),
    })
}
