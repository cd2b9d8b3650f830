//! Rain radar nowcast endpoint.
//!
//! - GET /api/v1/rain-radar?lat=<deg>&lng=<deg>

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::AppConfig;
use crate::errors::{AppError, ErrorResponse};
use crate::services::classifier::SampleStatus;
use crate::services::nowcast::{build_report, NowcastRequest, Report, SampleOutcome};
use crate::services::radar::RadarClient;
use crate::services::timeline::{format_generated, format_local, format_utc};
use crate::services::wms::GeoPoint;

/// Shared application state for the nowcast endpoint.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) radar_client: RadarClient,
    pub(crate) config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RainRadarQuery {
    /// Latitude in decimal degrees (e.g. 52.520008)
    pub lat: Option<String>,
    /// Longitude in decimal degrees (e.g. 13.404954)
    pub lng: Option<String>,
}

/// Echo of the requested location.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    pub lat: f64,
    pub lng: f64,
}

/// One 5-minute forecast step.
#[derive(Debug, Serialize, ToSchema)]
pub struct RadarEntry {
    /// Step time in the service timezone, with offset
    pub time_local: String,
    /// Step time in UTC
    pub time_utc: String,
    /// Precipitation in mm/h. Null when the tile could not be read.
    pub value: Option<f64>,
    /// Decoded pixel color as "r,g,b". Null when the tile could not be read.
    pub color: Option<String>,
    /// The exact GetMap URL queried for this step
    pub url: String,
    pub status: SampleStatus,
    /// Failure reason ("fetch_failed: ..." or "invalid_image")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Closest legend color as "r,g,b" (non-exact matches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_color: Option<String>,
    /// Squared RGB distance to `nearest_color`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
}

impl From<&SampleOutcome<Tz>> for RadarEntry {
    fn from(o: &SampleOutcome<Tz>) -> Self {
        Self {
            time_local: format_local(&o.instant.local),
            time_utc: format_utc(&o.instant.utc),
            value: o.value,
            color: o.color.map(|c| c.to_string()),
            url: o.request_url.to_string(),
            status: o.status,
            error: o.error_message.clone(),
            nearest_color: o.nearest_color.map(|c| c.to_string()),
            distance: o.distance,
        }
    }
}

/// Nowcast for the next hour at one location.
#[derive(Debug, Serialize, ToSchema)]
pub struct RainRadarResponse {
    pub location: LocationResponse,
    /// Completion time of the nowcast (service timezone, second precision)
    pub generated: String,
    /// 12 steps, 5 minutes apart, ascending
    pub entries: Vec<RadarEntry>,
}

impl From<&Report<Tz>> for RainRadarResponse {
    fn from(r: &Report<Tz>) -> Self {
        Self {
            location: LocationResponse {
                lat: r.location.latitude,
                lng: r.location.longitude,
            },
            generated: format_generated(&r.generated_at),
            entries: r.entries.iter().map(RadarEntry::from).collect(),
        }
    }
}

/// Parse a coordinate query value.
///
/// Lenient mode reads the leading decimal number and ignores the rest
/// ("52.5abc" is 52.5); values with no numeric prefix become 0. Strict mode
/// requires the whole trimmed value to be a finite number.
fn parse_coordinate(name: &str, raw: Option<&str>, strict: bool) -> Result<f64, AppError> {
    let trimmed = raw.map(str::trim);

    if strict {
        return trimmed
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "{} must be a finite number, got {:?}",
                    name,
                    raw.unwrap_or("")
                ))
            });
    }

    match trimmed.and_then(|s| leading_number(s).map(|(v, len)| (v, len == s.len()))) {
        Some((v, true)) => Ok(v),
        Some((v, false)) => {
            tracing::warn!("Trailing characters in {} {:?}, using {}", name, raw, v);
            Ok(v)
        }
        None => {
            tracing::warn!("Missing or invalid {} {:?}, defaulting to 0", name, raw);
            Ok(0.0)
        }
    }
}

/// Longest prefix of `s` of the form `[+-]digits[.digits][(e|E)[+-]digits]`,
/// with its value and byte length. Needs at least one mantissa digit.
fn leading_number(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v, end))
}

/// Get the precipitation nowcast for a location.
///
/// Samples the DWD radar product at the location for 12 steps of 5 minutes,
/// starting at the most recent 5-minute mark, and classifies each pixel
/// color into mm/h. Steps that fail are reported with status `error`; the
/// request itself still succeeds.
#[utoipa::path(
    get,
    path = "/api/v1/rain-radar",
    tag = "Nowcast",
    params(RainRadarQuery),
    responses(
        (status = 200, description = "12-step precipitation nowcast", body = RainRadarResponse),
        (status = 400, description = "Invalid coordinates (strict mode only)", body = ErrorResponse),
    )
)]
pub async fn get_rain_radar(
    State(state): State<AppState>,
    Query(params): Query<RainRadarQuery>,
) -> Result<Json<RainRadarResponse>, AppError> {
    let strict = state.config.strict_coordinates;
    let location = GeoPoint {
        latitude: parse_coordinate("lat", params.lat.as_deref(), strict)?,
        longitude: parse_coordinate("lng", params.lng.as_deref(), strict)?,
    };

    let report = build_report(
        &state.radar_client,
        NowcastRequest {
            location,
            now: Utc::now().with_timezone(&state.config.timezone),
            wms_url: &state.config.wms_url,
            layer: &state.config.radar_layer,
            max_concurrent_fetches: state.config.max_concurrent_fetches,
            clock: Utc::now,
        },
    )
    .await;

    Ok(Json(RainRadarResponse::from(&report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::legend::Rgb;
    use crate::services::timeline::ForecastInstant;
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;
    use reqwest::Url;

    fn outcome(status: SampleStatus) -> SampleOutcome<Tz> {
        let local = Berlin.with_ymd_and_hms(2025, 12, 8, 18, 40, 0).single().unwrap();
        SampleOutcome {
            instant: ForecastInstant {
                utc: local.with_timezone(&Utc),
                local,
            },
            request_url: Url::parse("https://maps.dwd.de/geoserver/dwd/ows?SERVICE=WMS").unwrap(),
            status,
            value: None,
            color: None,
            nearest_color: None,
            distance: None,
            error_message: None,
        }
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("lat", Some("52.520008"), true).unwrap(), 52.520008);
        assert_eq!(parse_coordinate("lat", Some(" -7.5 "), true).unwrap(), -7.5);
    }

    #[test]
    fn test_parse_coordinate_defaults_to_zero() {
        assert_eq!(parse_coordinate("lat", None, false).unwrap(), 0.0);
        assert_eq!(parse_coordinate("lat", Some("north"), false).unwrap(), 0.0);
        assert_eq!(parse_coordinate("lat", Some("NaN"), false).unwrap(), 0.0);
        assert_eq!(parse_coordinate("lat", Some("inf"), false).unwrap(), 0.0);
        assert_eq!(parse_coordinate("lat", Some(""), false).unwrap(), 0.0);
        assert_eq!(parse_coordinate("lat", Some("."), false).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_coordinate_uses_leading_number() {
        assert_eq!(parse_coordinate("lat", Some("52.5abc"), false).unwrap(), 52.5);
        assert_eq!(parse_coordinate("lng", Some(" 13.4°E"), false).unwrap(), 13.4);
        assert_eq!(parse_coordinate("lat", Some("-7,5"), false).unwrap(), -7.0);
        assert_eq!(parse_coordinate("lat", Some(".5x"), false).unwrap(), 0.5);
        assert_eq!(parse_coordinate("lat", Some("5e1z"), false).unwrap(), 50.0);
        assert_eq!(parse_coordinate("lat", Some("5e"), false).unwrap(), 5.0);
        assert_eq!(parse_coordinate("lat", Some("1e999"), false).unwrap(), 0.0);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("52.5abc"), Some((52.5, 4)));
        assert_eq!(leading_number("+3."), Some((3.0, 3)));
        assert_eq!(leading_number("1.5E-2"), Some((0.015, 6)));
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("abc"), None);
    }

    #[test]
    fn test_parse_coordinate_strict_rejects() {
        assert!(matches!(
            parse_coordinate("lng", None, true),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_coordinate("lng", Some("inf"), true),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_coordinate("lat", Some("52.5abc"), true),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_ok_entry_omits_optional_fields() {
        let mut o = outcome(SampleStatus::Ok);
        o.value = Some(0.4);
        o.color = Some(Rgb::new(1, 153, 52));

        let json = serde_json::to_value(RadarEntry::from(&o)).unwrap();
        assert_eq!(json["time_local"], "2025-12-08T18:40:00+01:00");
        assert_eq!(json["time_utc"], "2025-12-08T17:40:00Z");
        assert_eq!(json["value"], 0.4);
        assert_eq!(json["color"], "1,153,52");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["url"], "https://maps.dwd.de/geoserver/dwd/ows?SERVICE=WMS");
        assert!(json.get("error").is_none());
        assert!(json.get("nearest_color").is_none());
        assert!(json.get("distance").is_none());
    }

    #[test]
    fn test_nearest_entry_reports_distance() {
        let mut o = outcome(SampleStatus::OkNearest);
        o.value = Some(30.0);
        o.color = Some(Rgb::new(250, 0, 0));
        o.nearest_color = Some(Rgb::new(254, 0, 0));
        o.distance = Some(16);

        let json = serde_json::to_value(RadarEntry::from(&o)).unwrap();
        assert_eq!(json["status"], "ok_nearest");
        assert_eq!(json["nearest_color"], "254,0,0");
        assert_eq!(json["distance"], 16);
    }

    #[test]
    fn test_error_entry_has_null_value_and_color() {
        let mut o = outcome(SampleStatus::Error);
        o.error_message = Some("fetch_failed: HTTP 500".to_string());

        let json = serde_json::to_value(RadarEntry::from(&o)).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["value"].is_null());
        assert!(json["color"].is_null());
        assert_eq!(json["error"], "fetch_failed: HTTP 500");
    }
}
