//! Collaborator abstractions for Journal Mentor.
//!
//! The workflow never talks to the network directly. It consumes three
//! traits, so the same logic runs against the Notion and OpenAI clients
//! in production and against [`memory`] implementations in tests.
//!
//! | Trait | Backs |
//! |-------|-------|
//! | [`DocumentStore`] | Schema lookup, database query, page creation, block append |
//! | [`PageConverter`] | Page content rendered as Markdown |
//! | [`CompletionService`] | Language-model text completion |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Block, CompletionRequest, DatabaseSchema, Page, PageProperties, QueryFilter};

/// Structured document store holding the journal database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the property schema of a database.
    async fn retrieve_schema(&self, database_id: &str) -> Result<DatabaseSchema>;

    /// Query a database, returning at most `page_size` pages in store order.
    async fn query_database(
        &self,
        database_id: &str,
        filter: &QueryFilter,
        page_size: u32,
    ) -> Result<Vec<Page>>;

    /// Create a page in a database with the given properties.
    async fn create_page(&self, database_id: &str, properties: &PageProperties) -> Result<Page>;

    /// Append blocks after the existing children of `block_id`.
    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()>;
}

/// Renders a page's content tree as Markdown.
#[async_trait]
pub trait PageConverter: Send + Sync {
    async fn page_to_markdown(&self, page_id: &str) -> Result<String>;
}

/// Language-model completion endpoint.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run a single completion and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
