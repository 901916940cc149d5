//! Notion page → Markdown conversion, implementing [`PageConverter`].
//!
//! The page's block tree is fetched depth-first (every block with
//! `has_children` is expanded, except nested pages and databases) and then
//! rendered by the pure [`render_markdown`] function.
//!
//! # Supported blocks
//!
//! | Block | Markdown |
//! |-------|----------|
//! | `paragraph` | text |
//! | `heading_1..3` | `#`, `##`, `###` |
//! | `bulleted_list_item` | `- text` |
//! | `numbered_list_item` | `1. text` (numbering restarts per list) |
//! | `to_do` | `- [ ]` / `- [x]` |
//! | `quote`, `callout` | `> text` |
//! | `code` | fenced block with language |
//! | `divider` | `---` |
//! | `toggle` | `<details><summary>` |
//! | `child_page` | `# title` |
//! | `column_list`, `column`, `synced_block` | children, unindented |
//! | `table` / `table_row` | `| a | b |` rows, header rule when flagged |
//!
//! Nested children are indented by four spaces. Other block types are
//! skipped.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use journal_mentor_core::store::PageConverter;

use crate::notion::{plain_text, NotionClient};

/// A fetched block and its fetched children.
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub block: Value,
    pub children: Vec<BlockNode>,
}

/// Converter backed by the Notion blocks API.
pub struct NotionMarkdown {
    client: NotionClient,
}

impl NotionMarkdown {
    pub fn new(client: NotionClient) -> Self {
        Self { client }
    }

    fn fetch_tree<'a>(
        &'a self,
        block_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BlockNode>>> + Send + 'a>> {
        Box::pin(async move {
            let blocks = self.client.list_children(block_id).await?;
            let mut nodes = Vec::with_capacity(blocks.len());

            for block in blocks {
                let has_children = block
                    .get("has_children")
                    .and_then(|h| h.as_bool())
                    .unwrap_or(false);
                let kind = block_type(&block);
                let children = if has_children && kind != "child_page" && kind != "child_database"
                {
                    let id = block
                        .get("id")
                        .and_then(|i| i.as_str())
                        .unwrap_or_default()
                        .to_string();
                    self.fetch_tree(&id).await?
                } else {
                    Vec::new()
                };
                nodes.push(BlockNode { block, children });
            }

            Ok(nodes)
        })
    }
}

#[async_trait]
impl PageConverter for NotionMarkdown {
    async fn page_to_markdown(&self, page_id: &str) -> Result<String> {
        let tree = self.fetch_tree(page_id).await?;
        Ok(render_markdown(&tree))
    }
}

fn block_type(block: &Value) -> &str {
    block.get("type").and_then(|t| t.as_str()).unwrap_or("")
}

/// Render a block tree as trimmed Markdown.
pub fn render_markdown(nodes: &[BlockNode]) -> String {
    render_nodes(nodes).trim().to_string()
}

fn render_nodes(nodes: &[BlockNode]) -> String {
    let mut parts = Vec::with_capacity(nodes.len());
    let mut number = 0;

    for node in nodes {
        if block_type(&node.block) == "numbered_list_item" {
            number += 1;
        } else {
            number = 0;
        }
        if let Some(rendered) = render_block(node, number) {
            if !rendered.trim().is_empty() {
                parts.push(rendered);
            }
        }
    }

    parts.join("\n\n")
}

fn render_block(node: &BlockNode, number: usize) -> Option<String> {
    let kind = block_type(&node.block);
    match kind {
        "column_list" | "column" | "synced_block" => return Some(render_nodes(&node.children)),
        "table" => return Some(render_table(node)),
        "table_row" => return Some(table_row(&node.block)),
        _ => {}
    }

    let data = &node.block[kind];
    let text = rich_text_markdown(&data["rich_text"]);

    let line = match kind {
        "paragraph" => text,
        "heading_1" => format!("# {}", text),
        "heading_2" => format!("## {}", text),
        "heading_3" => format!("### {}", text),
        "bulleted_list_item" => format!("- {}", text),
        "numbered_list_item" => format!("{}. {}", number, text),
        "to_do" => {
            let checked = data["checked"].as_bool().unwrap_or(false);
            format!("- [{}] {}", if checked { "x" } else { " " }, text)
        }
        "quote" => quote(&text),
        "callout" => match data["icon"]["emoji"].as_str() {
            Some(emoji) => quote(&format!("{} {}", emoji, text)),
            None => quote(&text),
        },
        "code" => format!(
            "```{}\n{}\n```",
            data["language"].as_str().unwrap_or(""),
            plain_text(&data["rich_text"])
        ),
        "divider" => "---".to_string(),
        "toggle" => {
            return Some(format!(
                "<details>\n<summary>{}</summary>\n\n{}\n</details>",
                text,
                render_nodes(&node.children)
            ))
        }
        "child_page" => format!("# {}", data["title"].as_str().unwrap_or("")),
        other => {
            debug!(kind = other, "skipping unsupported block");
            return None;
        }
    };

    let children = render_nodes(&node.children);
    if children.is_empty() {
        Some(line)
    } else {
        Some(format!("{}\n{}", line, indent(&children)))
    }
}

fn render_table(node: &BlockNode) -> String {
    let mut rows: Vec<String> = node
        .children
        .iter()
        .filter(|row| block_type(&row.block) == "table_row")
        .map(|row| table_row(&row.block))
        .collect();

    let has_header = node.block["table"]["has_column_header"]
        .as_bool()
        .unwrap_or(false);
    if has_header && !rows.is_empty() {
        let width = node.block["table"]["table_width"]
            .as_u64()
            .map(|w| w as usize)
            .or_else(|| {
                node.children
                    .first()
                    .and_then(|row| row.block["table_row"]["cells"].as_array())
                    .map(Vec::len)
            })
            .unwrap_or(1);
        rows.insert(1, format!("| {} |", vec!["---"; width].join(" | ")));
    }

    rows.join("\n")
}

fn table_row(block: &Value) -> String {
    let cells: Vec<String> = block["table_row"]["cells"]
        .as_array()
        .map(|cells| cells.iter().map(rich_text_markdown).collect())
        .unwrap_or_default();
    format!("| {} |", cells.join(" | "))
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|l| format!("> {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("    {}", l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a rich-text array with its annotations.
fn rich_text_markdown(rich_text: &Value) -> String {
    let Some(items) = rich_text.as_array() else {
        return String::new();
    };

    items
        .iter()
        .map(|item| {
            let text = item["plain_text"].as_str().unwrap_or("").to_string();
            if text.trim().is_empty() {
                return text;
            }
            if item["type"].as_str() == Some("equation") {
                return format!("${}$", text);
            }

            let ann = &item["annotations"];
            let flag = |name: &str| ann[name].as_bool().unwrap_or(false);
            let mut text = text;
            if flag("code") {
                text = format!("`{}`", text);
            }
            if flag("bold") {
                text = format!("**{}**", text);
            }
            if flag("italic") {
                text = format!("_{}_", text);
            }
            if flag("strikethrough") {
                text = format!("~~{}~~", text);
            }
            if let Some(href) = item["href"].as_str() {
                text = format!("[{}]({})", text, href);
            }
            text
        })
        .collect()
}
