//! Historical guard: never touch entries dated before the cutoff.
//!
//! Reading the date is allowed to fail. Instead of swallowing the failure,
//! [`check_historical`] reports it as [`HistoricalCheck::Unknown`] and the
//! caller applies the policy via [`HistoricalCheck::allows_write`].

use crate::calendar::{parse_property_date, Cutoff};
use crate::models::{Page, PropertyValue};

/// Outcome of inspecting a page's own date against the cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoricalCheck {
    /// Dated strictly before the cutoff.
    Historical,
    /// Dated on or after the cutoff.
    Writable,
    /// No usable date; carries the reason.
    Unknown(String),
}

impl HistoricalCheck {
    /// Write policy: unknown dates proceed, historical ones do not.
    pub fn allows_write(&self) -> bool {
        !matches!(self, HistoricalCheck::Historical)
    }
}

/// Compare the page's `date_property` with the cutoff.
pub fn check_historical(page: &Page, date_property: &str, cutoff: &Cutoff) -> HistoricalCheck {
    let raw = match page.property(date_property) {
        Some(PropertyValue::Date(Some(value))) => &value.start,
        Some(PropertyValue::Date(None)) => {
            return HistoricalCheck::Unknown(format!("'{}' is empty", date_property))
        }
        Some(_) => {
            return HistoricalCheck::Unknown(format!("'{}' is not a date", date_property))
        }
        None => return HistoricalCheck::Unknown(format!("'{}' is missing", date_property)),
    };

    match parse_property_date(raw, cutoff.timezone()) {
        Some(at) if at < cutoff.instant() => HistoricalCheck::Historical,
        Some(_) => HistoricalCheck::Writable,
        None => HistoricalCheck::Unknown(format!("unparsable date '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateValue;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn cutoff() -> Cutoff {
        Cutoff::new(
            NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            chrono_tz::Europe::Kyiv,
        )
        .unwrap()
    }

    fn page_with(value: Option<PropertyValue>) -> Page {
        let mut properties = BTreeMap::new();
        if let Some(v) = value {
            properties.insert("Дата".to_string(), v);
        }
        Page {
            id: "p".to_string(),
            properties,
            created_time: None,
        }
    }

    fn dated(start: &str) -> Page {
        page_with(Some(PropertyValue::Date(Some(DateValue::on(start)))))
    }

    #[test]
    fn test_cutoff_day_is_writable() {
        assert_eq!(
            check_historical(&dated("2025-08-15"), "Дата", &cutoff()),
            HistoricalCheck::Writable
        );
    }

    #[test]
    fn test_day_before_is_historical() {
        let check = check_historical(&dated("2025-08-14"), "Дата", &cutoff());
        assert_eq!(check, HistoricalCheck::Historical);
        assert!(!check.allows_write());
    }

    #[test]
    fn test_datetime_just_before_midnight() {
        let check = check_historical(&dated("2025-08-14T23:59:00+03:00"), "Дата", &cutoff());
        assert_eq!(check, HistoricalCheck::Historical);
    }

    #[test]
    fn test_unknown_states_allow_write() {
        let cases = [
            page_with(None),
            page_with(Some(PropertyValue::Date(None))),
            page_with(Some(PropertyValue::CreatedTime(
                "2020-01-01T00:00:00Z".to_string(),
            ))),
            dated("not a date"),
        ];
        for page in &cases {
            let check = check_historical(page, "Дата", &cutoff());
            assert!(matches!(check, HistoricalCheck::Unknown(_)), "{:?}", check);
            assert!(check.allows_write());
        }
    }
}
