//! Notion REST client implementing [`DocumentStore`].
//!
//! Talks to the public Notion API directly with `reqwest`. Every request
//! carries the integration token and a pinned `Notion-Version` header.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Schema | `GET /databases/{id}` |
//! | Query | `POST /databases/{id}/query` |
//! | Create page | `POST /pages` |
//! | Append blocks | `PATCH /blocks/{id}/children` |
//! | List blocks | `GET /blocks/{id}/children` (paginated) |
//!
//! # Environment Variables
//!
//! - `NOTION_TOKEN` (required): the internal integration secret.
//!
//! Requests are not retried; a non-2xx response becomes an error carrying
//! the status and response body.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use journal_mentor_core::models::{
    Block, DatabaseSchema, DateValue, Page, PageProperties, PropertyKind, PropertyValue,
    QueryFilter,
};
use journal_mentor_core::store::DocumentStore;

use crate::config::NotionConfig;

/// Page size used when listing block children.
const CHILDREN_PAGE_SIZE: u32 = 100;

/// Authenticated Notion API client.
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    api_base: String,
    api_version: String,
    token: String,
}

impl NotionClient {
    /// Create a client, reading the token from `NOTION_TOKEN`.
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let token = std::env::var("NOTION_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("NOTION_TOKEN environment variable not set"))?;
        Ok(Self::with_token(config, token))
    }

    pub fn with_token(config: &NotionConfig, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.api_version)
            .send()
            .await
            .context("Notion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Notion API error {}: {}", status, body_text);
        }
        Ok(response.json().await?)
    }

    /// List every direct child block of `block_id`, following pagination.
    pub async fn list_children(&self, block_id: &str) -> Result<Vec<Value>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", CHILDREN_PAGE_SIZE.to_string())];
            if let Some(c) = &cursor {
                query.push(("start_cursor", c.clone()));
            }
            let request = self
                .client
                .get(self.url(&format!("blocks/{}/children", block_id)))
                .query(&query);
            let json = self.send(request).await?;

            if let Some(results) = json.get("results").and_then(|r| r.as_array()) {
                blocks.extend(results.iter().cloned());
            }

            let has_more = json
                .get("has_more")
                .and_then(|h| h.as_bool())
                .unwrap_or(false);
            cursor = json
                .get("next_cursor")
                .and_then(|c| c.as_str())
                .map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }

        Ok(blocks)
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn retrieve_schema(&self, database_id: &str) -> Result<DatabaseSchema> {
        let json = self
            .send(self.client.get(self.url(&format!("databases/{}", database_id))))
            .await
            .with_context(|| format!("Failed to retrieve database {}", database_id))?;
        parse_schema(&json)
    }

    async fn query_database(
        &self,
        database_id: &str,
        filter: &QueryFilter,
        page_size: u32,
    ) -> Result<Vec<Page>> {
        let body = json!({
            "filter": filter_json(filter),
            "page_size": page_size,
        });
        let json = self
            .send(
                self.client
                    .post(self.url(&format!("databases/{}/query", database_id)))
                    .json(&body),
            )
            .await
            .with_context(|| format!("Failed to query database {}", database_id))?;

        json.get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| anyhow!("Invalid Notion response: missing results array"))?
            .iter()
            .map(parse_page)
            .collect()
    }

    async fn create_page(&self, database_id: &str, properties: &PageProperties) -> Result<Page> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties_json(properties),
        });
        let json = self
            .send(self.client.post(self.url("pages")).json(&body))
            .await
            .with_context(|| format!("Failed to create page in database {}", database_id))?;
        parse_page(&json)
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        let body = json!({
            "children": children.iter().map(block_json).collect::<Vec<_>>(),
        });
        self.send(
            self.client
                .patch(self.url(&format!("blocks/{}/children", block_id)))
                .json(&body),
        )
        .await
        .with_context(|| format!("Failed to append blocks to {}", block_id))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// JSON mapping
// ═══════════════════════════════════════════════════════════════════════

fn kind_from_type(type_name: &str) -> PropertyKind {
    match type_name {
        "title" => PropertyKind::Title,
        "date" => PropertyKind::Date,
        "created_time" => PropertyKind::CreatedTime,
        other => PropertyKind::Other(other.to_string()),
    }
}

/// Parse a `GET /databases/{id}` response into a schema.
pub fn parse_schema(json: &Value) -> Result<DatabaseSchema> {
    let properties = json
        .get("properties")
        .and_then(|p| p.as_object())
        .ok_or_else(|| anyhow!("Invalid Notion response: missing properties"))?;

    let properties = properties
        .iter()
        .map(|(name, prop)| {
            let type_name = prop.get("type").and_then(|t| t.as_str()).unwrap_or("");
            (name.clone(), kind_from_type(type_name))
        })
        .collect();
    Ok(DatabaseSchema { properties })
}

/// Concatenated `plain_text` of a rich-text array.
pub fn plain_text(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn parse_property(prop: &Value) -> PropertyValue {
    let type_name = prop.get("type").and_then(|t| t.as_str()).unwrap_or("");
    match type_name {
        "title" => PropertyValue::Title(plain_text(&prop["title"])),
        "date" => {
            let date = prop.get("date").filter(|d| !d.is_null()).and_then(|d| {
                d.get("start").and_then(|s| s.as_str()).map(|start| DateValue {
                    start: start.to_string(),
                    end: d.get("end").and_then(|e| e.as_str()).map(str::to_string),
                })
            });
            PropertyValue::Date(date)
        }
        "created_time" => PropertyValue::CreatedTime(
            prop.get("created_time")
                .and_then(|c| c.as_str())
                .unwrap_or_default()
                .to_string(),
        ),
        other => PropertyValue::Other {
            kind: other.to_string(),
        },
    }
}

/// Parse a page object.
pub fn parse_page(json: &Value) -> Result<Page> {
    let id = json
        .get("id")
        .and_then(|i| i.as_str())
        .ok_or_else(|| anyhow!("Invalid Notion response: page without id"))?;

    let properties: BTreeMap<String, PropertyValue> = json
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), parse_property(prop)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Page {
        id: id.to_string(),
        properties,
        created_time: json
            .get("created_time")
            .and_then(|c| c.as_str())
            .map(str::to_string),
    })
}

/// Encode a query filter.
pub fn filter_json(filter: &QueryFilter) -> Value {
    match filter {
        QueryFilter::DateEquals { property, date } => json!({
            "property": property,
            "date": { "equals": date },
        }),
        QueryFilter::CreatedWithin {
            on_or_after,
            before,
        } => json!({
            "and": [
                { "timestamp": "created_time", "created_time": { "on_or_after": on_or_after } },
                { "timestamp": "created_time", "created_time": { "before": before } },
            ]
        }),
    }
}

fn rich_text_json(text: &str) -> Value {
    json!([{ "type": "text", "text": { "content": text } }])
}

/// Encode page properties for `POST /pages`.
///
/// Read-only property types (creation time, unknown kinds) are skipped.
pub fn properties_json(properties: &PageProperties) -> Value {
    let mut map = Map::new();
    for (name, value) in properties {
        let encoded = match value {
            PropertyValue::Title(text) => json!({ "title": rich_text_json(text) }),
            PropertyValue::Date(Some(date)) => match &date.end {
                Some(end) => json!({ "date": { "start": date.start, "end": end } }),
                None => json!({ "date": { "start": date.start } }),
            },
            PropertyValue::Date(None) => json!({ "date": null }),
            PropertyValue::CreatedTime(_) | PropertyValue::Other { .. } => continue,
        };
        map.insert(name.clone(), encoded);
    }
    Value::Object(map)
}

/// Encode a block for `PATCH /blocks/{id}/children`.
pub fn block_json(block: &Block) -> Value {
    match block {
        Block::Paragraph { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": { "rich_text": rich_text_json(text) },
        }),
        Block::Toggle { title, children } => json!({
            "object": "block",
            "type": "toggle",
            "toggle": {
                "rich_text": rich_text_json(title),
                "children": children.iter().map(block_json).collect::<Vec<_>>(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        let json = json!({
            "object": "database",
            "properties": {
                "Name": { "id": "title", "type": "title", "title": {} },
                "Дата": { "id": "abc", "type": "date", "date": {} },
                "Created": { "id": "def", "type": "created_time", "created_time": {} },
                "Notes": { "id": "ghi", "type": "rich_text", "rich_text": {} }
            }
        });
        let schema = parse_schema(&json).unwrap();
        assert_eq!(schema.kind_of("Name"), Some(&PropertyKind::Title));
        assert_eq!(schema.kind_of("Дата"), Some(&PropertyKind::Date));
        assert_eq!(schema.kind_of("Created"), Some(&PropertyKind::CreatedTime));
        assert_eq!(
            schema.kind_of("Notes"),
            Some(&PropertyKind::Other("rich_text".to_string()))
        );
    }

    #[test]
    fn test_parse_schema_requires_properties() {
        assert!(parse_schema(&json!({ "object": "error" })).is_err());
    }

    #[test]
    fn test_parse_page() {
        let json = json!({
            "object": "page",
            "id": "page-1",
            "created_time": "2025-08-20T06:00:00.000Z",
            "properties": {
                "Name": {
                    "type": "title",
                    "title": [
                        { "plain_text": "Анкета дня — " },
                        { "plain_text": "20 серпня 2025" }
                    ]
                },
                "Дата": { "type": "date", "date": { "start": "2025-08-20", "end": null } },
                "Empty": { "type": "date", "date": null },
                "Tags": { "type": "multi_select", "multi_select": [] }
            }
        });
        let page = parse_page(&json).unwrap();
        assert_eq!(page.id, "page-1");
        assert_eq!(page.title("Name"), Some("Анкета дня — 20 серпня 2025"));
        assert_eq!(
            page.property("Дата"),
            Some(&PropertyValue::Date(Some(DateValue::on("2025-08-20"))))
        );
        assert_eq!(page.property("Empty"), Some(&PropertyValue::Date(None)));
        assert_eq!(
            page.property("Tags"),
            Some(&PropertyValue::Other {
                kind: "multi_select".to_string()
            })
        );
        assert_eq!(page.created_time.as_deref(), Some("2025-08-20T06:00:00.000Z"));
    }

    #[test]
    fn test_filter_json_date() {
        let filter = QueryFilter::DateEquals {
            property: "Дата".to_string(),
            date: "2025-08-20".to_string(),
        };
        assert_eq!(
            filter_json(&filter),
            json!({ "property": "Дата", "date": { "equals": "2025-08-20" } })
        );
    }

    #[test]
    fn test_filter_json_created_window() {
        let filter = QueryFilter::CreatedWithin {
            on_or_after: "2025-08-20".to_string(),
            before: "2025-08-21".to_string(),
        };
        let encoded = filter_json(&filter);
        assert_eq!(
            encoded["and"][0],
            json!({ "timestamp": "created_time", "created_time": { "on_or_after": "2025-08-20" } })
        );
        assert_eq!(
            encoded["and"][1]["created_time"]["before"],
            json!("2025-08-21")
        );
    }

    #[test]
    fn test_properties_json() {
        let mut props = PageProperties::new();
        props.insert(
            "Name".to_string(),
            PropertyValue::Title("Анкета дня — 20 серпня 2025".to_string()),
        );
        props.insert(
            "Дата".to_string(),
            PropertyValue::Date(Some(DateValue::on("2025-08-20"))),
        );
        props.insert(
            "Created".to_string(),
            PropertyValue::CreatedTime("2025-08-20T00:00:00Z".to_string()),
        );
        let encoded = properties_json(&props);
        assert_eq!(
            encoded["Name"]["title"][0]["text"]["content"],
            json!("Анкета дня — 20 серпня 2025")
        );
        assert_eq!(encoded["Дата"], json!({ "date": { "start": "2025-08-20" } }));
        assert!(encoded.get("Created").is_none());
    }

    #[test]
    fn test_block_json_toggle() {
        let block = Block::Toggle {
            title: "Фідбек ментора — 2025-08-20 21:05".to_string(),
            children: vec![Block::paragraph("one"), Block::paragraph("two")],
        };
        let encoded = block_json(&block);
        assert_eq!(encoded["type"], json!("toggle"));
        assert_eq!(
            encoded["toggle"]["rich_text"][0]["text"]["content"],
            json!("Фідбек ментора — 2025-08-20 21:05")
        );
        let children = encoded["toggle"]["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1]["paragraph"]["rich_text"][0]["text"]["content"], json!("two"));
    }
}
