use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike};

/// Date-time as sent by the platform.
///
/// Upstream mixes RFC 3339 values with naive local timestamps and bare dates.
/// The offset is kept only when the wire value carried one, so that encoding
/// reproduces the same flavour of string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    naive: NaiveDateTime,
    offset: Option<FixedOffset>,
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl Timestamp {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() { return None; }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self { naive: dt.naive_local(), offset: Some(*dt.offset()) });
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self { naive, offset: None });
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Self { naive, offset: None })
    }

    pub fn from_naive(naive: NaiveDateTime) -> Self { Self { naive, offset: None } }

    pub fn from_fixed(dt: DateTime<FixedOffset>) -> Self { Self { naive: dt.naive_local(), offset: Some(*dt.offset()) } }

    /// Wall-clock time as written on the wire.
    pub fn naive(&self) -> NaiveDateTime { self.naive }

    pub fn offset(&self) -> Option<FixedOffset> { self.offset }

    pub fn date(&self) -> NaiveDate { self.naive.date() }

    /// Canonical wire form: RFC 3339 when an offset is known, naive ISO-8601 otherwise.
    pub fn to_wire_string(&self) -> String {
        if let Some(off) = self.offset {
            if let Some(dt) = off.from_local_datetime(&self.naive).single() {
                return dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
            }
        }
        if self.naive.nanosecond() == 0 {
            self.naive.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_wire_string()) }
}
