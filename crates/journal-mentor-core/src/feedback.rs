//! Feedback generation and the append-only feedback block.
//!
//! [`generate`] sends the assembled context to the completion service.
//! [`append_feedback`] writes the reply back to the entry as one new
//! collapsible block:
//!
//! ```text
//! ▸ Фідбек ментора — 2025-08-20 21:05
//!     <fragment 1>
//!     <fragment 2>
//!     ...
//! ```
//!
//! Existing content is never edited. Every successful run adds exactly
//! one block, so re-running on the same day accumulates feedback history.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::calendar::format_stamp;
use crate::fragment::split_fragments;
use crate::models::{Block, CompletionRequest};
use crate::store::{CompletionService, DocumentStore};

/// Sampling temperature for feedback requests.
pub const FEEDBACK_TEMPERATURE: f32 = 0.35;

/// Title prefix of every feedback block.
pub const FEEDBACK_TITLE_PREFIX: &str = "Фідбек ментора";

/// Ask the model for feedback on `context`.
///
/// Returns the trimmed reply, or `None` when the model answered with
/// nothing but whitespace.
pub async fn generate(
    completion: &dyn CompletionService,
    model: &str,
    instructions: &str,
    context: &str,
) -> Result<Option<String>> {
    let request = CompletionRequest {
        model: model.to_string(),
        instructions: instructions.to_string(),
        input: context.to_string(),
        temperature: FEEDBACK_TEMPERATURE,
    };
    let reply = completion.complete(&request).await?;
    let reply = reply.trim();
    debug!(model, reply_chars = reply.chars().count(), "completion finished");

    if reply.is_empty() {
        Ok(None)
    } else {
        Ok(Some(reply.to_string()))
    }
}

/// Title of a feedback block written at `now`.
pub fn feedback_title(now: DateTime<Utc>, tz: Tz) -> String {
    format!("{} — {}", FEEDBACK_TITLE_PREFIX, format_stamp(now, tz))
}

/// Build the collapsible feedback block: one paragraph per fragment.
pub fn feedback_block(text: &str, now: DateTime<Utc>, tz: Tz, fragment_size: usize) -> Block {
    Block::Toggle {
        title: feedback_title(now, tz),
        children: split_fragments(text, fragment_size)
            .into_iter()
            .map(|text| Block::Paragraph { text })
            .collect(),
    }
}

/// Append `text` to `page_id` as a single new feedback block.
///
/// Returns the number of fragments written.
pub async fn append_feedback(
    store: &dyn DocumentStore,
    page_id: &str,
    text: &str,
    now: DateTime<Utc>,
    tz: Tz,
    fragment_size: usize,
) -> Result<usize> {
    let block = feedback_block(text, now, tz, fragment_size);
    let fragments = match &block {
        Block::Toggle { children, .. } => children.len(),
        Block::Paragraph { .. } => 1,
    };
    store.append_children(page_id, &[block]).await?;
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::ScriptedCompletion;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;

    #[tokio::test]
    async fn test_generate_trims_and_sets_temperature() {
        let service = ScriptedCompletion::new("  **Сильні сторони**\n- ok \n\n");
        let reply = generate(&service, "gpt-4", "be kind", "# Анкета дня\nA")
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("**Сильні сторони**\n- ok"));

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].instructions, "be kind");
        assert_eq!(requests[0].input, "# Анкета дня\nA");
        assert_eq!(requests[0].temperature, FEEDBACK_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_generate_blank_reply_is_none() {
        let service = ScriptedCompletion::new(" \n ");
        let reply = generate(&service, "gpt-4", "x", "y").await.unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn test_feedback_block_shape() {
        let now = Utc.with_ymd_and_hms(2025, 8, 20, 18, 5, 0).unwrap();
        let text = "x".repeat(2000);
        match feedback_block(&text, now, Kyiv, 1800) {
            Block::Toggle { title, children } => {
                assert_eq!(title, "Фідбек ментора — 2025-08-20 21:05");
                assert_eq!(children.len(), 2);
                assert_eq!(children[1], Block::paragraph("x".repeat(200)));
            }
            other => panic!("expected toggle, got {:?}", other),
        }
    }
}
