//! Time handling for point observations.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A closed time window centred on an observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window spanning `t - delta ..= t + delta`.
    pub fn centred(t: DateTime<Utc>, delta: Duration) -> Self {
        Self {
            start: t - delta,
            end: t + delta,
        }
    }

    /// Check whether `t` falls inside the window (inclusive).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Parse an ISO 8601 timestamp.
///
/// Timestamps with an offset are converted to UTC. Timestamps without one
/// are taken to be UTC already. A bare date means midnight UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_offset_converts_to_utc() {
        let dt = parse_datetime("2022-07-28T10:00:00+10:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_datetime("2022-07-28T00:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap());

        let dt = parse_datetime("2022-07-28").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(TimeParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_centred_window() {
        let t = Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap();
        let w = TimeWindow::centred(t, Duration::days(3));
        assert_eq!(w.start, Utc.with_ymd_and_hms(2022, 7, 25, 0, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2022, 7, 31, 0, 0, 0).unwrap());
        assert!(w.contains(t));
        assert!(w.contains(w.end));
        assert!(!w.contains(w.end + Duration::seconds(1)));
    }
}
