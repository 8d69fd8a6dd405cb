//! Conversion of EFA timestamps into offset-aware datetimes

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

use super::parser::ParseError;

const DEFAULT_OFFSET_HOURS: i32 = 2;

/// Formats accepted for timestamps without an explicit offset
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Turns upstream timestamps into datetimes in a fixed local offset
///
/// The RVV endpoint sends wall-clock strings that are two hours behind local
/// time. They are read as UTC and shown in the configured offset, which moves
/// the displayed time forward by that many hours.
#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    offset: FixedOffset,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        let offset =
            FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix());
        Self::new(offset)
    }
}

impl TimeNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// `None` if the offset is outside ±24h
    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn normalize(&self, raw: &str) -> Result<DateTime<FixedOffset>, ParseError> {
        let raw = raw.trim();

        // Offset-qualified strings ("...Z", "...+01:00") are already absolute
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&self.offset));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| self.offset.from_utc_datetime(&naive))
            .ok_or_else(|| ParseError::MalformedTimestamp(raw.to_string()))
    }
}
