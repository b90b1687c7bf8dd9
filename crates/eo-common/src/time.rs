//! Time interval handling for acquisition queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed time interval used when querying acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Parse an interval specification.
    ///
    /// Supports:
    /// - Range: "2020-05-01/2020-06-01" or with full timestamps
    /// - Single date: "2020-05-01" (expands to the whole day)
    /// - Single timestamp: "2020-05-01T10:00:00Z" (degenerate interval)
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        if let Some((start, end)) = s.split_once('/') {
            return Ok(Self::new(parse_instant(start)?, parse_instant(end)?));
        }

        // Bare date expands to a day-long interval
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            let from = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
            return Ok(Self::new(from, from + Duration::days(1) - Duration::seconds(1)));
        }

        let instant = parse_instant(s)?;
        Ok(Self::new(instant, instant))
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.from && dt <= &self.to
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

/// Parse a single instant from ISO 8601 forms.
fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    // Full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Without timezone (assume UTC)
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    // Date only
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
