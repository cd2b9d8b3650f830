//! Nowcast assembly.
//!
//! For each of the 12 forecast steps: build the GetMap URL, fetch and decode
//! the tile, classify the pixel. Steps run concurrently (bounded) and are
//! fully isolated: a failed step is recorded as `error` and the others carry
//! on. Output order is always the step order.

use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Url;

use crate::services::classifier::{classify, SampleStatus};
use crate::services::legend::Rgb;
use crate::services::radar::RadarClient;
use crate::services::timeline::{forecast_instants, ForecastInstant};
use crate::services::wms::{build_bbox, build_getmap_url, BoundingBox, GeoPoint};

/// Parameters for one nowcast run.
pub struct NowcastRequest<'a, Tz: TimeZone> {
    pub location: GeoPoint,
    pub now: DateTime<Tz>,
    pub wms_url: &'a Url,
    pub layer: &'a str,
    pub max_concurrent_fetches: usize,
    /// Source of the completion timestamp (`Utc::now` in the service).
    pub clock: fn() -> DateTime<Utc>,
}

/// Outcome of one forecast step.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome<Tz: TimeZone> {
    pub instant: ForecastInstant<Tz>,
    pub request_url: Url,
    pub status: SampleStatus,
    pub value: Option<f64>,
    pub color: Option<Rgb>,
    pub nearest_color: Option<Rgb>,
    pub distance: Option<u32>,
    pub error_message: Option<String>,
}

/// The 12-step nowcast for one location.
#[derive(Debug, Clone)]
pub struct Report<Tz: TimeZone> {
    pub location: GeoPoint,
    pub generated_at: DateTime<Tz>,
    pub entries: Vec<SampleOutcome<Tz>>,
}

impl<Tz: TimeZone> Report<Tz> {
    pub fn count_by_status(&self, status: SampleStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

/// Fetch, decode and classify a single step. Never fails.
pub async fn sample_step<Tz: TimeZone>(
    client: &RadarClient,
    wms_url: &Url,
    layer: &str,
    bbox: &BoundingBox,
    instant: ForecastInstant<Tz>,
) -> SampleOutcome<Tz> {
    let request_url = build_getmap_url(wms_url, layer, bbox, instant.utc);

    match client.sample_pixel(&request_url).await {
        Ok(rgb) => {
            let c = classify(rgb);
            SampleOutcome {
                instant,
                request_url,
                status: c.status,
                value: Some(c.value),
                color: Some(rgb),
                nearest_color: c.nearest_color,
                distance: c.distance,
                error_message: None,
            }
        }
        Err(e) => {
            tracing::warn!(url = %request_url, error = %e, "Radar sample failed");
            SampleOutcome {
                instant,
                request_url,
                status: SampleStatus::Error,
                value: None,
                color: None,
                nearest_color: None,
                distance: None,
                error_message: Some(e.to_string()),
            }
        }
    }
}

/// Run all forecast steps for a location and assemble the report.
///
/// `generated_at` is read from `request.clock` after the last step completes,
/// in the timezone of `request.now`.
pub async fn build_report<Tz: TimeZone>(
    client: &RadarClient,
    request: NowcastRequest<'_, Tz>,
) -> Report<Tz> {
    let bbox = build_bbox(request.location);
    let instants = forecast_instants(&request.now);
    let (wms_url, layer, bbox) = (request.wms_url, request.layer, &bbox);

    // `buffered` preserves input order regardless of completion order.
    let entries: Vec<SampleOutcome<Tz>> = stream::iter(instants)
        .map(move |instant| sample_step(client, wms_url, layer, bbox, instant))
        .buffered(request.max_concurrent_fetches.max(1))
        .collect()
        .await;

    let tz = request.now.timezone();
    let report = Report {
        location: request.location,
        generated_at: (request.clock)().with_timezone(&tz),
        entries,
    };

    tracing::debug!(
        lat = report.location.latitude,
        lng = report.location.longitude,
        ok = report.count_by_status(SampleStatus::Ok),
        ok_nearest = report.count_by_status(SampleStatus::OkNearest),
        unknown_color = report.count_by_status(SampleStatus::UnknownColor),
        error = report.count_by_status(SampleStatus::Error),
        "Nowcast assembled"
    );

    report
}
