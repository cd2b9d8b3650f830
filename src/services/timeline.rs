//! Forecast step generation.
//!
//! A nowcast covers the next hour in 5-minute steps, starting at the most
//! recent 5-minute boundary of the local clock.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

/// Number of forecast steps per nowcast (one hour).
pub const FORECAST_STEPS: usize = 12;

/// Spacing between forecast steps, in minutes.
pub const STEP_MINUTES: i64 = 5;

/// One forecast step, in both the local timezone and UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInstant<Tz: TimeZone> {
    pub local: DateTime<Tz>,
    pub utc: DateTime<Utc>,
}

/// Floor a timestamp to the previous 5-minute mark, dropping seconds.
///
/// Works in absolute time, so a DST shift never produces a non-existent
/// local time.
pub fn floor_to_step<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let excess_minutes = i64::from(now.minute()) % STEP_MINUTES;
    now.clone()
        - Duration::minutes(excess_minutes)
        - Duration::seconds(i64::from(now.second()))
        - Duration::nanoseconds(i64::from(now.nanosecond()))
}

/// Generate the 12 forecast instants starting at the floored `now`.
pub fn forecast_instants<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<ForecastInstant<Tz>> {
    let start = floor_to_step(now);
    (0..FORECAST_STEPS as i64)
        .map(|i| {
            let local = start.clone() + Duration::minutes(STEP_MINUTES * i);
            let utc = local.with_timezone(&Utc);
            ForecastInstant { local, utc }
        })
        .collect()
}

/// Local step time with offset, e.g. `2025-12-08T18:40:00+01:00`.
pub fn format_local<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:00%:z").to_string()
}

/// UTC step time, e.g. `2025-12-08T17:40:00Z`.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

/// WMS `TIME` parameter, e.g. `2025-12-08T17:40:00.000Z`.
pub fn format_wms_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:00.000Z").to_string()
}

/// Report generation time with seconds and offset.
pub fn format_generated<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
