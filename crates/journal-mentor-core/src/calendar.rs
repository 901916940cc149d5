//! Calendar arithmetic in the journal's fixed timezone.
//!
//! Every "today" decision is made in a single configured timezone rather
//! than the host's local time, so a run scheduled at 23:30 UTC still
//! lands on the correct journal day in Kyiv.
//!
//! # Cutoff
//!
//! The [`Cutoff`] is a calendar date interpreted as local midnight in the
//! journal timezone. Runs before it do nothing, and entries dated before it
//! are never modified.
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use journal_mentor_core::calendar::{should_proceed, Cutoff};
//!
//! let cutoff = Cutoff::new(
//!     NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
//!     chrono_tz::Europe::Kyiv,
//! )
//! .unwrap();
//! // 2025-08-14 21:00 UTC is already midnight of the 15th in Kyiv.
//! assert!(should_proceed(Utc.with_ymd_and_hms(2025, 8, 14, 21, 0, 0).unwrap(), &cutoff));
//! assert!(!should_proceed(Utc.with_ymd_and_hms(2025, 8, 14, 20, 59, 59).unwrap(), &cutoff));
//! ```

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

const MONTHS_GENITIVE: [&str; 12] = [
    "січня",
    "лютого",
    "березня",
    "квітня",
    "травня",
    "червня",
    "липня",
    "серпня",
    "вересня",
    "жовтня",
    "листопада",
    "грудня",
];

/// Fixed point in time before which the workflow never writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    date: NaiveDate,
    timezone: Tz,
    instant: DateTime<Utc>,
}

impl Cutoff {
    /// Build a cutoff at local midnight of `date` in `timezone`.
    ///
    /// Fails if that local midnight does not exist (a DST gap at 00:00).
    pub fn new(date: NaiveDate, timezone: Tz) -> Result<Self> {
        let instant = local_midnight(date, timezone)
            .ok_or_else(|| anyhow!("midnight of {} does not exist in {}", date, timezone))?;
        Ok(Self {
            date,
            timezone,
            instant,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Time gate: `true` iff `now` is at or after the cutoff instant.
pub fn should_proceed(now: DateTime<Utc>, cutoff: &Cutoff) -> bool {
    now >= cutoff.instant
}

/// Calendar day of `now` in `tz`.
pub fn local_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Today's and tomorrow's `YYYY-MM-DD` strings for `day`.
pub fn day_strings(day: NaiveDate) -> (String, String) {
    let tomorrow = day.succ_opt().unwrap_or(day);
    (
        day.format("%Y-%m-%d").to_string(),
        tomorrow.format("%Y-%m-%d").to_string(),
    )
}

/// Long display form used in entry titles, e.g. `"20 серпня 2025"`.
pub fn format_long_date(day: NaiveDate) -> String {
    format!(
        "{} {} {}",
        day.day(),
        MONTHS_GENITIVE[day.month0() as usize],
        day.year()
    )
}

/// Minute-precision stamp of `now` in `tz`, e.g. `"2025-08-20 21:05"`.
pub fn format_stamp(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Parse a date property value into an instant.
///
/// Accepts a bare `YYYY-MM-DD` (taken as local midnight in `tz`) or an
/// RFC 3339 date-time. Returns `None` for anything else.
pub fn parse_property_date(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return local_midnight(day, tz);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn local_midnight(day: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
