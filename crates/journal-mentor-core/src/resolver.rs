//! Entry resolution: find or create the page representing "today".
//!
//! The journal database may mark an entry's day either with an explicit
//! date property or implicitly through the page's creation time. The
//! schema is read once per run to pick a [`DateStrategy`], which then
//! drives both the lookup filter and the properties of a newly created
//! entry.
//!
//! # Algorithm
//!
//! 1. Fetch the database schema and read the type of the date property.
//! 2. Explicit date → filter `date == today`.
//!    Creation time → filter `today <= created_time < tomorrow`.
//!    Anything else → [`ResolveError::UnsupportedPropertyType`].
//! 3. Query with page size 1; existence is all that matters.
//! 4. Return the match, or create a page titled
//!    `"Анкета дня — {day}"` (plus the date property for explicit dates).
//!
//! Two overlapping runs can both miss and both create. There is no lock;
//! at one run per day the duplicate window is accepted.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::calendar::{day_strings, format_long_date};
use crate::error::ResolveError;
use crate::models::{
    DatabaseSchema, DateValue, Page, PageProperties, PropertyKind, PropertyValue, QueryFilter,
};
use crate::store::DocumentStore;

/// Title prefix of every journal entry created by the resolver.
pub const ENTRY_TITLE_PREFIX: &str = "Анкета дня";

/// How the configured date property identifies an entry's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStrategy {
    /// Stored calendar date, matched by equality.
    ExplicitDate,
    /// Implicit creation timestamp, matched by a one-day window.
    CreationTime,
}

impl DateStrategy {
    /// Pick the strategy for `property` from the database schema.
    pub fn from_schema(schema: &DatabaseSchema, property: &str) -> Result<Self, ResolveError> {
        match schema.kind_of(property) {
            Some(PropertyKind::Date) => Ok(DateStrategy::ExplicitDate),
            Some(PropertyKind::CreatedTime) => Ok(DateStrategy::CreationTime),
            Some(other) => Err(ResolveError::UnsupportedPropertyType {
                property: property.to_string(),
                kind: other.type_name().to_string(),
            }),
            None => Err(ResolveError::UnsupportedPropertyType {
                property: property.to_string(),
                kind: "missing".to_string(),
            }),
        }
    }

    /// Whether entries carry their day in a stored date the guard can read.
    pub fn stores_date(&self) -> bool {
        matches!(self, DateStrategy::ExplicitDate)
    }

    /// Query filter selecting entries for `day`.
    pub fn filter(&self, property: &str, day: NaiveDate) -> QueryFilter {
        let (today, tomorrow) = day_strings(day);
        match self {
            DateStrategy::ExplicitDate => QueryFilter::DateEquals {
                property: property.to_string(),
                date: today,
            },
            DateStrategy::CreationTime => QueryFilter::CreatedWithin {
                on_or_after: today,
                before: tomorrow,
            },
        }
    }
}

/// Title of the entry for `day`, e.g. `"Анкета дня — 20 серпня 2025"`.
pub fn entry_title(day: NaiveDate) -> String {
    format!("{} — {}", ENTRY_TITLE_PREFIX, format_long_date(day))
}

/// Properties of a freshly created entry for `day`.
///
/// Creation-time databases get only the title; the store stamps the day.
pub fn new_entry_properties(
    strategy: DateStrategy,
    date_property: &str,
    title_property: &str,
    day: NaiveDate,
) -> PageProperties {
    let mut properties = PageProperties::new();
    properties.insert(
        title_property.to_string(),
        PropertyValue::Title(entry_title(day)),
    );
    if strategy == DateStrategy::ExplicitDate {
        let (today, _) = day_strings(day);
        properties.insert(
            date_property.to_string(),
            PropertyValue::Date(Some(DateValue::on(today))),
        );
    }
    properties
}

/// Result of looking up today's entry without creating one.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub strategy: DateStrategy,
    pub page: Option<Page>,
}

/// Today's entry and whether this run created it.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub strategy: DateStrategy,
    pub page: Page,
    pub created: bool,
}

/// Look up the entry for `day` without mutating the store.
pub async fn find_today(
    store: &dyn DocumentStore,
    database_id: &str,
    date_property: &str,
    day: NaiveDate,
) -> Result<Lookup> {
    let schema = store.retrieve_schema(database_id).await?;
    let strategy = DateStrategy::from_schema(&schema, date_property)?;
    let filter = strategy.filter(date_property, day);
    debug!(?strategy, ?filter, "querying for today's entry");

    let page = store
        .query_database(database_id, &filter, 1)
        .await?
        .into_iter()
        .next();
    Ok(Lookup { strategy, page })
}

/// Return the entry for `day`, creating it when none exists.
pub async fn find_or_create_today(
    store: &dyn DocumentStore,
    database_id: &str,
    date_property: &str,
    title_property: &str,
    day: NaiveDate,
) -> Result<ResolvedEntry> {
    let lookup = find_today(store, database_id, date_property, day).await?;
    if let Some(page) = lookup.page {
        debug!(page_id = %page.id, "found today's entry");
        return Ok(ResolvedEntry {
            strategy: lookup.strategy,
            page,
            created: false,
        });
    }

    let properties = new_entry_properties(lookup.strategy, date_property, title_property, day);
    let page = store.create_page(database_id, &properties).await?;
    info!(page_id = %page.id, title = %entry_title(day), "created today's entry");
    Ok(ResolvedEntry {
        strategy: lookup.strategy,
        page,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(kind: PropertyKind) -> DatabaseSchema {
        let mut schema = DatabaseSchema::default();
        schema.properties.insert("Дата".to_string(), kind);
        schema.properties.insert("Name".to_string(), PropertyKind::Title);
        schema
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    #[test]
    fn test_strategy_from_date_type() {
        assert_eq!(
            DateStrategy::from_schema(&schema(PropertyKind::Date), "Дата"),
            Ok(DateStrategy::ExplicitDate)
        );
        assert_eq!(
            DateStrategy::from_schema(&schema(PropertyKind::CreatedTime), "Дата"),
            Ok(DateStrategy::CreationTime)
        );
    }

    #[test]
    fn test_strategy_rejects_text() {
        let err = DateStrategy::from_schema(
            &schema(PropertyKind::Other("rich_text".to_string())),
            "Дата",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedPropertyType {
                property: "Дата".to_string(),
                kind: "rich_text".to_string(),
            }
        );
    }

    #[test]
    fn test_strategy_missing_property() {
        let err = DateStrategy::from_schema(&schema(PropertyKind::Date), "Day").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_only_explicit_dates_are_stored() {
        assert!(DateStrategy::ExplicitDate.stores_date());
        assert!(!DateStrategy::CreationTime.stores_date());
    }

    #[test]
    fn test_filters() {
        assert_eq!(
            DateStrategy::ExplicitDate.filter("Дата", day()),
            QueryFilter::DateEquals {
                property: "Дата".to_string(),
                date: "2025-08-20".to_string(),
            }
        );
        assert_eq!(
            DateStrategy::CreationTime.filter("Дата", day()),
            QueryFilter::CreatedWithin {
                on_or_after: "2025-08-20".to_string(),
                before: "2025-08-21".to_string(),
            }
        );
    }

    #[test]
    fn test_new_entry_properties() {
        let explicit = new_entry_properties(DateStrategy::ExplicitDate, "Дата", "Name", day());
        assert_eq!(
            explicit.get("Name"),
            Some(&PropertyValue::Title("Анкета дня — 20 серпня 2025".to_string()))
        );
        assert_eq!(
            explicit.get("Дата"),
            Some(&PropertyValue::Date(Some(DateValue::on("2025-08-20"))))
        );

        let implicit = new_entry_properties(DateStrategy::CreationTime, "Дата", "Name", day());
        assert_eq!(implicit.len(), 1);
        assert!(implicit.get("Дата").is_none());
    }
}
