//! WMS GetMap request construction for single-pixel radar samples.

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::services::timeline::format_wms_time;

/// Default DWD GeoServer OWS endpoint.
pub const DEFAULT_WMS_URL: &str = "https://maps.dwd.de/geoserver/dwd/ows";

/// Default 1km radar precipitation layer.
pub const DEFAULT_RADAR_LAYER: &str = "Radar_rv_product_1x1km_ger";

/// Half-size of the sampling box in degrees.
const BBOX_HALF_SIZE_DEG: f64 = 0.001;

/// Fractional digits kept when rendering BBOX coordinates.
const BBOX_MAX_DECIMALS: usize = 10;

/// A geographic point in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A small lon/lat box around a sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Coordinates in the order the radar WMS expects:
    /// top-left lng, bottom-right lat, bottom-right lng, top-left lat.
    pub fn to_wms_order(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }

    /// Comma-joined BBOX parameter value.
    pub fn to_param(&self) -> String {
        self.to_wms_order()
            .iter()
            .map(|v| format_coordinate(*v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Build the ±0.001° sampling box around a point.
pub fn build_bbox(point: GeoPoint) -> BoundingBox {
    BoundingBox {
        min_lng: point.longitude - BBOX_HALF_SIZE_DEG,
        min_lat: point.latitude - BBOX_HALF_SIZE_DEG,
        max_lng: point.longitude + BBOX_HALF_SIZE_DEG,
        max_lat: point.latitude + BBOX_HALF_SIZE_DEG,
    }
}

/// Render a coordinate without float noise (`13.403953999999999` → `13.403954`).
fn format_coordinate(v: f64) -> String {
    let s = format!("{:.*}", BBOX_MAX_DECIMALS, v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// Build the GetMap URL for a 1×1 PNG of `layer` at `time` over `bbox`.
pub fn build_getmap_url(base: &Url, layer: &str, bbox: &BoundingBox, time: DateTime<Utc>) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("SERVICE", "WMS")
        .append_pair("VERSION", "1.3.0")
        .append_pair("REQUEST", "GetMap")
        .append_pair("FORMAT", "image/png")
        .append_pair("TRANSPARENT", "true")
        .append_pair("LAYERS", layer)
        .append_pair("TIME", &format_wms_time(&time))
        .append_pair("WIDTH", "1")
        .append_pair("HEIGHT", "1")
        .append_pair("STYLES", "")
        .append_pair("BBOX", &bbox.to_param());
    url
}
