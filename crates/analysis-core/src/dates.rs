//! Calendar normalization for joins across series.
//!
//! Price bars arrive as UTC instants, split events carry the exchange's
//! local offset, and statement periods are plain calendar dates. Every
//! comparison between those series goes through [`SessionDate`], which
//! reduces each representation to the calendar date it denotes in its own
//! frame.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::AnalysisError;

pub trait SessionDate {
    fn session_date(&self) -> NaiveDate;
}

impl SessionDate for NaiveDate {
    fn session_date(&self) -> NaiveDate {
        *self
    }
}

impl SessionDate for NaiveDateTime {
    fn session_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> SessionDate for DateTime<Tz> {
    fn session_date(&self) -> NaiveDate {
        self.naive_local().date()
    }
}

/// Parse a date the way providers hand them out: RFC 3339 with an offset,
/// a naive `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD`.
pub fn parse_session_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(raw) {
        return Ok(dt.session_date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.session_date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AnalysisError::MalformedDate(format!("{raw:?}: {e}")))
}

/// Midnight UTC on `date`, for building bars and splits from calendar dates.
pub fn utc_midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)).fixed_offset()
}
