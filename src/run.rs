//! `mentor run`: wire the real clients into the workflow and report.

use anyhow::Result;
use chrono::Utc;

use journal_mentor_core::workflow::{RunMode, RunOutcome, Workflow};

use crate::config::Config;
use crate::markdown::NotionMarkdown;
use crate::notion::NotionClient;
use crate::openai::OpenAIClient;

/// Execute one workflow run against Notion and OpenAI.
///
/// All clients are built before the time gate is checked, so missing
/// credentials fail the run even on days when nothing would be written.
pub async fn run_feedback(config: &Config, dry_run: bool) -> Result<RunOutcome> {
    let settings = config.workflow_settings()?;
    let notion = NotionClient::new(&config.notion)?;
    let converter = NotionMarkdown::new(notion.clone());
    let openai = OpenAIClient::new(&config.openai)?;

    let mode = if dry_run {
        RunMode::DryRun
    } else {
        RunMode::Apply
    };

    let workflow = Workflow::new(settings);
    let outcome = workflow
        .run(&notion, &converter, &openai, Utc::now(), mode)
        .await?;

    println!("{}", outcome.summary());
    if let RunOutcome::Previewed { feedback, .. } = &outcome {
        println!();
        println!("{}", feedback);
    }
    Ok(outcome)
}
