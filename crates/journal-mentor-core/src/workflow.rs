//! The daily feedback workflow.
//!
//! One strictly sequential pass per invocation:
//!
//! ```text
//! time gate ─▶ resolve entry ─▶ historical guard ─▶ assemble context
//!                                                          │
//!                      append feedback ◀─ generate feedback┘
//! ```
//!
//! Every "nothing to do" condition ends the run with a [`RunOutcome`]
//! rather than an error. Errors are reserved for configuration problems
//! ([`ResolveError`](crate::error::ResolveError)) and collaborator
//! failures, which propagate unchanged.
//!
//! The only store mutations are the entry creation inside the resolver
//! and the final append, each the last step of its stage, so a failure
//! never leaves a half-written feedback block behind.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::calendar::{local_day, should_proceed, Cutoff};
use crate::context::build_context;
use crate::feedback::{append_feedback, generate};
use crate::guard::{check_historical, HistoricalCheck};
use crate::resolver::{find_or_create_today, find_today};
use crate::store::{CompletionService, DocumentStore, PageConverter};

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Journal database to resolve today's entry in.
    pub database_id: String,
    /// Property that carries an entry's day.
    pub date_property: String,
    /// Title property set on newly created entries.
    pub title_property: String,
    /// Optional page folded into the context after the entry.
    pub auxiliary_page_id: Option<String>,
    pub model: String,
    /// System instructions for the completion service.
    pub instructions: String,
    pub cutoff: Cutoff,
    /// Maximum characters per feedback paragraph.
    pub fragment_size: usize,
}

/// Whether the run may write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    /// Resolve and generate, but never create or append.
    DryRun,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `now` is before the cutoff; nothing was read or written.
    BeforeCutoff,
    /// Dry run found no entry for today.
    NoEntry,
    /// Today's entry is dated before the cutoff.
    HistoricalEntry { page_id: String },
    /// Neither the entry nor the auxiliary page had any text.
    EmptySource { page_id: String },
    /// The model returned an empty reply.
    EmptyFeedback { page_id: String },
    /// Dry run produced feedback without writing it.
    Previewed { page_id: String, feedback: String },
    /// Feedback was appended to the entry.
    Appended {
        page_id: String,
        /// Whether this run created the entry.
        created: bool,
        fragments: usize,
    },
}

impl RunOutcome {
    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::BeforeCutoff => "skipped: before cutoff".to_string(),
            RunOutcome::NoEntry => "skipped: no entry for today".to_string(),
            RunOutcome::HistoricalEntry { page_id } => {
                format!("skipped: entry {} predates cutoff", page_id)
            }
            RunOutcome::EmptySource { page_id } => {
                format!("skipped: nothing to review in {}", page_id)
            }
            RunOutcome::EmptyFeedback { page_id } => {
                format!("skipped: empty model reply for {}", page_id)
            }
            RunOutcome::Previewed { page_id, .. } => {
                format!("dry run: feedback for {} not written", page_id)
            }
            RunOutcome::Appended {
                page_id,
                created,
                fragments,
            } => format!(
                "feedback appended to {}{} ({} fragment{})",
                page_id,
                if *created { " (new entry)" } else { "" },
                fragments,
                if *fragments == 1 { "" } else { "s" }
            ),
        }
    }
}

/// The feedback workflow, parameterised by its settings.
#[derive(Debug, Clone)]
pub struct Workflow {
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Execute one run at `now`.
    pub async fn run(
        &self,
        store: &dyn DocumentStore,
        converter: &dyn PageConverter,
        completion: &dyn CompletionService,
        now: DateTime<Utc>,
        mode: RunMode,
    ) -> Result<RunOutcome> {
        let s = &self.settings;

        if !should_proceed(now, &s.cutoff) {
            info!(cutoff = %s.cutoff.date(), "before cutoff, not writing feedback");
            return Ok(RunOutcome::BeforeCutoff);
        }

        let day = local_day(now, s.cutoff.timezone());
        let (strategy, page, created) = match mode {
            RunMode::Apply => {
                let entry = find_or_create_today(
                    store,
                    &s.database_id,
                    &s.date_property,
                    &s.title_property,
                    day,
                )
                .await?;
                (entry.strategy, entry.page, entry.created)
            }
            RunMode::DryRun => {
                let lookup = find_today(store, &s.database_id, &s.date_property, day).await?;
                match lookup.page {
                    Some(page) => (lookup.strategy, page, false),
                    None => {
                        info!(%day, "no entry for today");
                        return Ok(RunOutcome::NoEntry);
                    }
                }
            }
        };

        let check = check_historical(&page, &s.date_property, &s.cutoff);
        if let HistoricalCheck::Unknown(reason) = &check {
            if strategy.stores_date() {
                warn!(page_id = %page.id, %reason, "entry date unknown, proceeding");
            } else {
                debug!(page_id = %page.id, %reason, "creation-time entry, no stored date");
            }
        }
        if !check.allows_write() {
            info!(page_id = %page.id, "entry predates cutoff, not modifying");
            return Ok(RunOutcome::HistoricalEntry { page_id: page.id });
        }

        let context =
            match build_context(converter, &page.id, s.auxiliary_page_id.as_deref()).await? {
                Some(context) => context,
                None => {
                    info!(page_id = %page.id, "empty source, nothing to review");
                    return Ok(RunOutcome::EmptySource { page_id: page.id });
                }
            };

        let feedback = match generate(completion, &s.model, &s.instructions, &context).await? {
            Some(feedback) => feedback,
            None => {
                info!(page_id = %page.id, "empty model reply");
                return Ok(RunOutcome::EmptyFeedback { page_id: page.id });
            }
        };

        if mode == RunMode::DryRun {
            return Ok(RunOutcome::Previewed {
                page_id: page.id,
                feedback,
            });
        }

        let fragments = append_feedback(
            store,
            &page.id,
            &feedback,
            now,
            s.cutoff.timezone(),
            s.fragment_size,
        )
        .await?;
        info!(page_id = %page.id, fragments, "feedback appended");

        Ok(RunOutcome::Appended {
            page_id: page.id,
            created,
            fragments,
        })
    }
}
