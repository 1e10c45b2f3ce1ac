//! Time-dependent trip features: timezone resolution, holiday, time of
//! day, lighting, school season, and the merge rules across a trip window.
//!
//! Each sub-derivation evaluates at a single instant; trip-level values
//! come from evaluating at both window endpoints and merging.

use bdays::calendars::us::USSettlement;
use bdays::HolidayCalendar;
use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tzf_rs::DefaultFinder;

use crate::error::RiskError;
use crate::models::{Coordinate, TripWindow};

const DIM_BEFORE_SUNRISE_SECS: i64 = 30 * 60;
const DIM_AFTER_SUNRISE_SECS: i64 = 60 * 60;
const DIM_BEFORE_SUNSET_SECS: i64 = 60 * 60;
const DIM_AFTER_SUNSET_SECS: i64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Dim,
    Daylight,
    Night,
}

impl Lighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lighting::Dim => "dim",
            Lighting::Daylight => "daylight",
            Lighting::Night => "night",
        }
    }
}

/// Resolves IANA timezones from coordinates.
///
/// The embedded zone dataset makes construction expensive; build one at
/// startup and share it. Lookups are read-only and thread-safe.
pub struct TimezoneResolver {
    finder: DefaultFinder,
}

impl TimezoneResolver {
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }

    /// Zone for a point. Falls back to the first candidate from the
    /// multi-match lookup when the primary name does not parse, and to UTC
    /// when nothing resolves at all.
    pub fn resolve(&self, point: Coordinate) -> Tz {
        if let Ok(tz) = self.finder.get_tz_name(point.lon, point.lat).parse::<Tz>() {
            return tz;
        }
        self.finder
            .get_tz_names(point.lon, point.lat)
            .iter()
            .find_map(|candidate| candidate.parse::<Tz>().ok())
            .unwrap_or(chrono_tz::UTC)
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an optional ISO-8601 departure string into the trip origin's zone.
///
/// A missing or empty string means "now". Wall-clock strings without an
/// offset are interpreted in `tz`; strings carrying an offset are converted
/// into it.
pub fn parse_departure(date_str: Option<&str>, tz: Tz) -> Result<DateTime<Tz>, RiskError> {
    let raw = match date_str.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(Utc::now().with_timezone(&tz)),
    };

    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(fixed.with_timezone(&tz));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| RiskError::InvalidInput(format!("unparseable timestamp: {raw}")))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => Err(RiskError::InvalidInput(format!(
            "timestamp does not exist in zone {tz}: {raw}"
        ))),
    }
}

/// True when the calendar date is a recognized US federal holiday
/// (observed dates included).
pub fn is_holiday(date: NaiveDate) -> bool {
    USSettlement.is_holiday(date)
}

/// Coarse bucket: morning [4, 12), afternoon [12, 20), evening otherwise.
pub fn time_of_day(ts: DateTime<Tz>) -> TimeOfDay {
    match ts.hour() {
        4..=11 => TimeOfDay::Morning,
        12..=19 => TimeOfDay::Afternoon,
        _ => TimeOfDay::Evening,
    }
}

/// Lighting bucket at `point` for the given local instant.
///
/// Dim spans (sunrise − 30 min, sunrise + 60 min) and (sunset − 60 min,
/// sunset + 30 min), exclusive; strictly between the dim windows is
/// daylight; everything else is night.
pub fn lighting(point: Coordinate, ts: DateTime<Tz>) -> Lighting {
    let date = ts.date_naive();
    let (sunrise_ts, sunset_ts) =
        sunrise::sunrise_sunset(point.lat, point.lon, date.year(), date.month(), date.day());

    let t = ts.timestamp();
    let first_light = (
        sunrise_ts - DIM_BEFORE_SUNRISE_SECS,
        sunrise_ts + DIM_AFTER_SUNRISE_SECS,
    );
    let last_light = (
        sunset_ts - DIM_BEFORE_SUNSET_SECS,
        sunset_ts + DIM_AFTER_SUNSET_SECS,
    );

    if (t > first_light.0 && t < first_light.1) || (t > last_light.0 && t < last_light.1) {
        Lighting::Dim
    } else if t > first_light.1 && t < last_light.0 {
        Lighting::Daylight
    } else {
        Lighting::Night
    }
}

/// True outside the June–August break.
pub fn is_school_season(ts: DateTime<Tz>) -> bool {
    let month = ts.month();
    month <= 5 || month >= 9
}

/// Holiday flag over the window: either endpoint on a holiday counts.
pub fn trip_holiday(window: &TripWindow) -> bool {
    is_holiday(window.start.date_naive()) || is_holiday(window.end.date_naive())
}

/// Time-of-day over the window. Evening at either endpoint wins; otherwise
/// the start bucket is used and the end's morning/afternoon value is
/// ignored. The asymmetry is part of the trained-model contract.
pub fn trip_time_of_day(window: &TripWindow) -> TimeOfDay {
    let start = time_of_day(window.start);
    let end = time_of_day(window.end);
    if start == TimeOfDay::Evening || end == TimeOfDay::Evening {
        return TimeOfDay::Evening;
    }
    start
}

/// Lighting over the window: dim beats night beats daylight.
pub fn trip_lighting(point: Coordinate, window: &TripWindow) -> Lighting {
    let start = lighting(point, window.start);
    let end = lighting(point, window.end);
    if start == Lighting::Dim || end == Lighting::Dim {
        return Lighting::Dim;
    }
    if start == Lighting::Night || end == Lighting::Night {
        return Lighting::Night;
    }
    Lighting::Daylight
}

/// School season over the window: both endpoints must be in season.
pub fn trip_school_season(window: &TripWindow) -> bool {
    is_school_season(window.start) && is_school_season(window.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn local(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn dc() -> Coordinate {
        Coordinate::new(38.8977, -77.0365).unwrap()
    }

    #[test]
    fn time_of_day_buckets() {
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 4, 0)), TimeOfDay::Morning);
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 11, 59)), TimeOfDay::Morning);
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 12, 0)), TimeOfDay::Afternoon);
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 19, 59)), TimeOfDay::Afternoon);
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 20, 0)), TimeOfDay::Evening);
        assert_eq!(time_of_day(local(New_York, 2024, 3, 1, 3, 59)), TimeOfDay::Evening);
    }

    #[test]
    fn time_of_day_merge_favors_evening_else_start() {
        let evening_end = TripWindow {
            start: local(New_York, 2024, 3, 1, 19, 30),
            end: local(New_York, 2024, 3, 1, 20, 30),
        };
        assert_eq!(trip_time_of_day(&evening_end), TimeOfDay::Evening);

        // Morning start rolling into the afternoon still reads morning.
        let morning_into_afternoon = TripWindow {
            start: local(New_York, 2024, 3, 1, 11, 30),
            end: local(New_York, 2024, 3, 1, 12, 30),
        };
        assert_eq!(trip_time_of_day(&morning_into_afternoon), TimeOfDay::Morning);
    }

    #[test]
    fn july_fourth_is_a_holiday() {
        assert!(is_holiday(NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()));
        assert!(!is_holiday(NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()));
    }

    #[test]
    fn holiday_merge_catches_a_trip_ending_on_the_holiday() {
        let window = TripWindow::from_duration(local(New_York, 2024, 12, 31, 23, 50), 1200.0);
        assert_eq!(window.end.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(trip_holiday(&window));
    }

    #[test]
    fn school_season_excludes_summer_only() {
        assert!(is_school_season(local(New_York, 2024, 5, 15, 9, 0)));
        assert!(is_school_season(local(New_York, 2024, 9, 1, 9, 0)));
        assert!(!is_school_season(local(New_York, 2024, 6, 1, 9, 0)));
        assert!(!is_school_season(local(New_York, 2024, 7, 4, 9, 0)));
        assert!(!is_school_season(local(New_York, 2024, 8, 31, 9, 0)));
    }

    #[test]
    fn school_season_merge_requires_both_endpoints() {
        // May 31 23:55 rolling into June 1 drops out of season.
        let window = TripWindow::from_duration(local(New_York, 2024, 5, 31, 23, 55), 600.0);
        assert!(!trip_school_season(&window));
    }

    #[test]
    fn midday_is_daylight_and_midnight_is_night() {
        assert_eq!(lighting(dc(), local(New_York, 2024, 7, 4, 13, 0)), Lighting::Daylight);
        assert_eq!(lighting(dc(), local(New_York, 2024, 7, 4, 1, 0)), Lighting::Night);
    }

    #[test]
    fn just_after_sunrise_is_dim() {
        let (sunrise_ts, _) = sunrise::sunrise_sunset(38.8977, -77.0365, 2024, 7, 4);
        let ts = Utc
            .timestamp_opt(sunrise_ts + 600, 0)
            .unwrap()
            .with_timezone(&New_York);
        assert_eq!(lighting(dc(), ts), Lighting::Dim);
    }

    #[test]
    fn lighting_merge_precedence() {
        // A daylight start with a dim end reads dim.
        let (_, sunset_ts) = sunrise::sunrise_sunset(38.8977, -77.0365, 2024, 7, 4);
        let start = Utc
            .timestamp_opt(sunset_ts - 2 * 3600, 0)
            .unwrap()
            .with_timezone(&New_York);
        let window = TripWindow::from_duration(start, 5400.0);
        assert_eq!(lighting(dc(), window.start), Lighting::Daylight);
        assert_eq!(lighting(dc(), window.end), Lighting::Dim);
        assert_eq!(trip_lighting(dc(), &window), Lighting::Dim);
    }

    #[test]
    fn timezone_resolution_with_utc_fallback() {
        let resolver = TimezoneResolver::new();
        assert_eq!(resolver.resolve(dc()), New_York);
        // Mid-ocean points resolve to an Etc zone rather than failing.
        let ocean = Coordinate::new(0.0, -140.0).unwrap();
        let tz = resolver.resolve(ocean);
        assert!(tz.name().starts_with("Etc/") || tz == chrono_tz::UTC);
    }

    #[test]
    fn departure_parsing() {
        let parsed = parse_departure(Some("2024-07-04T09:00:00"), New_York).unwrap();
        assert_eq!(parsed, local(New_York, 2024, 7, 4, 9, 0));

        let offset = parse_departure(Some("2024-07-04T13:00:00Z"), New_York).unwrap();
        assert_eq!(offset, local(New_York, 2024, 7, 4, 9, 0));

        assert!(parse_departure(Some("not-a-date"), New_York).is_err());
        assert!(parse_departure(Some(""), New_York).is_ok());
        assert!(parse_departure(None, New_York).is_ok());
    }
}
