//! `mentor schema`: show the journal database's properties.
//!
//! Read-only. Useful for checking which date strategy the configured
//! date property selects before the first scheduled run.

use anyhow::Result;

use journal_mentor_core::models::DatabaseSchema;
use journal_mentor_core::resolver::DateStrategy;
use journal_mentor_core::store::DocumentStore;

use crate::config::Config;
use crate::notion::NotionClient;

pub async fn run_schema(config: &Config) -> Result<()> {
    let notion = NotionClient::new(&config.notion)?;
    let schema = notion.retrieve_schema(&config.notion.database_id).await?;
    print!("{}", describe_schema(&schema, &config.notion.date_property));
    Ok(())
}

/// Property table followed by the strategy line.
pub fn describe_schema(schema: &DatabaseSchema, date_property: &str) -> String {
    let mut out = format!("{:<24} TYPE\n", "PROPERTY");
    for (name, kind) in &schema.properties {
        out.push_str(&format!("{:<24} {}\n", name, kind.type_name()));
    }

    let strategy = match DateStrategy::from_schema(schema, date_property) {
        Ok(DateStrategy::ExplicitDate) => "explicit date (equals today)".to_string(),
        Ok(DateStrategy::CreationTime) => "creation time (today's window)".to_string(),
        Err(e) => format!("unsupported ({})", e),
    };
    out.push_str(&format!("\ndate property '{}': {}\n", date_property, strategy));
    out
}
