//! Context assembly: the text the model is asked to review.
//!
//! The entry page comes first, the optional auxiliary page second, each
//! under its own heading and separated by a horizontal rule:
//!
//! ```text
//! # Анкета дня
//! <entry markdown>
//!
//! ---
//!
//! # Менті (контекст)
//! <auxiliary markdown>
//! ```
//!
//! Empty pages contribute no section. When nothing remains the caller
//! gets `None` and the run stops without calling the model.

use anyhow::Result;
use tracing::debug;

use crate::store::PageConverter;

/// Heading above the entry page's text.
pub const ENTRY_HEADING: &str = "# Анкета дня";

/// Heading above the auxiliary page's text.
pub const AUXILIARY_HEADING: &str = "# Менті (контекст)";

/// Separator placed between sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Join already-converted page texts into the model input.
///
/// Returns `None` when the result is empty.
pub fn assemble(primary: &str, auxiliary: Option<&str>) -> Option<String> {
    let mut sections = Vec::with_capacity(2);

    let primary = primary.trim();
    if !primary.is_empty() {
        sections.push(format!("{}\n{}", ENTRY_HEADING, primary));
    }
    if let Some(aux) = auxiliary.map(str::trim).filter(|a| !a.is_empty()) {
        sections.push(format!("{}\n{}", AUXILIARY_HEADING, aux));
    }

    let joined = sections.join(SECTION_SEPARATOR).trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Convert the entry page and, if configured, the auxiliary page, then
/// [`assemble`] them.
///
/// An empty `auxiliary_page_id` is treated as not configured.
pub async fn build_context(
    converter: &dyn PageConverter,
    primary_page_id: &str,
    auxiliary_page_id: Option<&str>,
) -> Result<Option<String>> {
    let primary = converter.page_to_markdown(primary_page_id).await?;

    let auxiliary = match auxiliary_page_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => Some(converter.page_to_markdown(id).await?),
        None => None,
    };

    let context = assemble(&primary, auxiliary.as_deref());
    debug!(
        primary_chars = primary.chars().count(),
        auxiliary = auxiliary.is_some(),
        empty = context.is_none(),
        "assembled context"
    );
    Ok(context)
}
