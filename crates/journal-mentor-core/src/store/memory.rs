//! In-memory collaborators for tests and offline runs.
//!
//! [`InMemoryStore`] implements both [`DocumentStore`] and [`PageConverter`]
//! over `HashMap`/`Vec` behind `std::sync::RwLock`, and records every call
//! it receives so tests can assert on what the workflow did (or did not)
//! touch. [`ScriptedCompletion`] returns a fixed reply.
//!
//! Pages created through [`DocumentStore::create_page`] are stamped with
//! the store's clock, which tests pin with [`InMemoryStore::with_clock`]
//! so creation-time lookups see the same day as the run.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Block, CompletionRequest, DatabaseSchema, Page, PageProperties, PropertyValue, QueryFilter,
};

use super::{CompletionService, DocumentStore, PageConverter};

/// A call received by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    RetrieveSchema {
        database_id: String,
    },
    Query {
        database_id: String,
        filter: QueryFilter,
        page_size: u32,
    },
    CreatePage {
        database_id: String,
        properties: PageProperties,
    },
    AppendChildren {
        block_id: String,
        children: Vec<Block>,
    },
}

impl StoreCall {
    /// Whether this call changes stored state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StoreCall::CreatePage { .. } | StoreCall::AppendChildren { .. }
        )
    }
}

struct StoredPage {
    database_id: Option<String>,
    page: Page,
    blocks: Vec<Block>,
}

/// In-memory document store for tests.
pub struct InMemoryStore {
    schemas: RwLock<HashMap<String, DatabaseSchema>>,
    pages: RwLock<Vec<StoredPage>>,
    calls: RwLock<Vec<StoreCall>>,
    clock: Option<DateTime<Utc>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            pages: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            clock: None,
        }
    }

    /// Stamp created pages with `now` instead of the wall clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Register a database and its schema.
    pub fn add_database(&self, database_id: &str, schema: DatabaseSchema) {
        self.schemas
            .write()
            .unwrap()
            .insert(database_id.to_string(), schema);
    }

    /// Seed a page. `database_id = None` stores a standalone page.
    pub fn insert_page(&self, database_id: Option<&str>, page: Page, blocks: Vec<Block>) {
        self.pages.write().unwrap().push(StoredPage {
            database_id: database_id.map(str::to_string),
            page,
            blocks,
        });
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of create/append calls received.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.is_mutation())
            .count()
    }

    /// Current child blocks of a page.
    pub fn blocks(&self, page_id: &str) -> Vec<Block> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .find(|p| p.page.id == page_id)
            .map(|p| p.blocks.clone())
            .unwrap_or_default()
    }

    /// All pages stored in a database.
    pub fn pages_in(&self, database_id: &str) -> Vec<Page> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.database_id.as_deref() == Some(database_id))
            .map(|p| p.page.clone())
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.write().unwrap().push(call);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn day_prefix(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}

fn matches_filter(page: &Page, filter: &QueryFilter) -> bool {
    match filter {
        QueryFilter::DateEquals { property, date } => match page.property(property) {
            Some(PropertyValue::Date(Some(value))) => day_prefix(&value.start) == date,
            _ => false,
        },
        QueryFilter::CreatedWithin {
            on_or_after,
            before,
        } => match &page.created_time {
            Some(created) => {
                let day = day_prefix(created);
                day >= on_or_after.as_str() && day < before.as_str()
            }
            None => false,
        },
    }
}

fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph { text } => text.clone(),
            Block::Toggle { title, children } => format!(
                "<details>\n<summary>{}</summary>\n\n{}\n</details>",
                title,
                render_blocks(children)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn retrieve_schema(&self, database_id: &str) -> Result<DatabaseSchema> {
        self.record(StoreCall::RetrieveSchema {
            database_id: database_id.to_string(),
        });
        match self.schemas.read().unwrap().get(database_id) {
            Some(schema) => Ok(schema.clone()),
            None => bail!("database not found: {}", database_id),
        }
    }

    async fn query_database(
        &self,
        database_id: &str,
        filter: &QueryFilter,
        page_size: u32,
    ) -> Result<Vec<Page>> {
        self.record(StoreCall::Query {
            database_id: database_id.to_string(),
            filter: filter.clone(),
            page_size,
        });
        if !self.schemas.read().unwrap().contains_key(database_id) {
            bail!("database not found: {}", database_id);
        }
        Ok(self
            .pages
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.database_id.as_deref() == Some(database_id))
            .filter(|p| matches_filter(&p.page, filter))
            .take(page_size as usize)
            .map(|p| p.page.clone())
            .collect())
    }

    async fn create_page(&self, database_id: &str, properties: &PageProperties) -> Result<Page> {
        self.record(StoreCall::CreatePage {
            database_id: database_id.to_string(),
            properties: properties.clone(),
        });
        if !self.schemas.read().unwrap().contains_key(database_id) {
            bail!("database not found: {}", database_id);
        }
        let page = Page {
            id: Uuid::new_v4().to_string(),
            properties: properties.clone(),
            created_time: Some(self.clock.unwrap_or_else(Utc::now).to_rfc3339()),
        };
        self.insert_page(Some(database_id), page.clone(), Vec::new());
        Ok(page)
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        self.record(StoreCall::AppendChildren {
            block_id: block_id.to_string(),
            children: children.to_vec(),
        });
        let mut pages = self.pages.write().unwrap();
        match pages.iter_mut().find(|p| p.page.id == block_id) {
            Some(stored) => {
                stored.blocks.extend_from_slice(children);
                Ok(())
            }
            None => bail!("block not found: {}", block_id),
        }
    }
}

#[async_trait]
impl PageConverter for InMemoryStore {
    async fn page_to_markdown(&self, page_id: &str) -> Result<String> {
        let pages = self.pages.read().unwrap();
        match pages.iter().find(|p| p.page.id == page_id) {
            Some(stored) => Ok(render_blocks(&stored.blocks).trim().to_string()),
            None => bail!("page not found: {}", page_id),
        }
    }
}

/// Completion service that answers every request with a fixed reply.
pub struct ScriptedCompletion {
    reply: String,
    failure: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: String::new(),
            failure: Some(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(message) => bail!("{}", message),
            None => Ok(self.reply.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateValue, PropertyKind};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn page(id: &str, date: Option<&str>, created: Option<&str>) -> Page {
        let mut properties = BTreeMap::new();
        if let Some(d) = date {
            properties.insert("Дата".to_string(), PropertyValue::Date(Some(DateValue::on(d))));
        }
        Page {
            id: id.to_string(),
            properties,
            created_time: created.map(str::to_string),
        }
    }

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut schema = DatabaseSchema::default();
        schema.properties.insert("Дата".to_string(), PropertyKind::Date);
        store.add_database("db", schema);
        store
    }

    #[tokio::test]
    async fn test_query_date_equals() {
        let s = store();
        s.insert_page(Some("db"), page("a", Some("2025-08-19"), None), vec![]);
        s.insert_page(Some("db"), page("b", Some("2025-08-20"), None), vec![]);
        let filter = QueryFilter::DateEquals {
            property: "Дата".to_string(),
            date: "2025-08-20".to_string(),
        };
        let found = s.query_database("db", &filter, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
    }

    #[tokio::test]
    async fn test_query_created_window_is_half_open() {
        let s = store();
        s.insert_page(Some("db"), page("a", None, Some("2025-08-20T00:00:00Z")), vec![]);
        s.insert_page(Some("db"), page("b", None, Some("2025-08-21T00:00:00Z")), vec![]);
        let filter = QueryFilter::CreatedWithin {
            on_or_after: "2025-08-20".to_string(),
            before: "2025-08-21".to_string(),
        };
        let found = s.query_database("db", &filter, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[tokio::test]
    async fn test_append_records_and_extends() {
        let s = store();
        s.insert_page(Some("db"), page("a", None, None), vec![Block::paragraph("one")]);
        s.append_children("a", &[Block::paragraph("two")]).await.unwrap();
        assert_eq!(s.blocks("a").len(), 2);
        assert_eq!(s.mutation_count(), 1);
        assert_eq!(s.page_to_markdown("a").await.unwrap(), "one\n\ntwo");
    }

    #[tokio::test]
    async fn test_created_pages_use_pinned_clock() {
        let now = Utc.with_ymd_and_hms(2025, 8, 20, 9, 0, 0).unwrap();
        let s = store().with_clock(now);
        let page = s.create_page("db", &PageProperties::new()).await.unwrap();
        assert_eq!(page.created_time.as_deref(), Some("2025-08-20T09:00:00+00:00"));

        let filter = QueryFilter::CreatedWithin {
            on_or_after: "2025-08-20".to_string(),
            before: "2025-08-21".to_string(),
        };
        let found = s.query_database("db", &filter, 1).await.unwrap();
        assert_eq!(found[0].id, page.id);
    }

    #[tokio::test]
    async fn test_append_to_unknown_block_fails() {
        let s = store();
        assert!(s.append_children("nope", &[]).await.is_err());
    }
}
