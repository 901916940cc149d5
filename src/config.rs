//! Configuration loading: TOML file, environment overrides, validation.
//!
//! Settings are read from an optional TOML file and then overridden by
//! environment variables, so a scheduled job can run with environment
//! variables alone. Credentials (`NOTION_TOKEN`, `OPENAI_API_KEY`) are
//! never read from the file; the clients pick them up from the
//! environment.
//!
//! # Environment overrides
//!
//! | Variable | Key |
//! |----------|-----|
//! | `REFLECTION_DB_ID` | `notion.database_id` |
//! | `REFLECTION_DATE_PROP` | `notion.date_property` |
//! | `REFLECTION_TITLE_PROP` | `notion.title_property` |
//! | `MENTEE_PAGE_ID` | `notion.auxiliary_page_id` |
//! | `OPENAI_MODEL` | `openai.model` |
//!
//! Empty values are ignored.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use journal_mentor_core::calendar::Cutoff;
use journal_mentor_core::fragment::DEFAULT_FRAGMENT_SIZE;
use journal_mentor_core::prompt::InstructionTemplate;
use journal_mentor_core::workflow::WorkflowSettings;

/// Largest fragment the Notion API accepts in one rich-text item.
const MAX_FRAGMENT_SIZE: usize = 2000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    #[serde(default)]
    pub database_id: String,
    #[serde(default = "default_date_property")]
    pub date_property: String,
    #[serde(default = "default_title_property")]
    pub title_property: String,
    #[serde(default)]
    pub auxiliary_page_id: Option<String>,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    #[serde(default = "default_notion_api_version")]
    pub api_version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            database_id: String::new(),
            date_property: default_date_property(),
            title_property: default_title_property(),
            auxiliary_page_id: None,
            api_base: default_notion_api_base(),
            api_version: default_notion_api_version(),
        }
    }
}

fn default_date_property() -> String {
    "Дата".to_string()
}
fn default_title_property() -> String {
    "Name".to_string()
}
fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_notion_api_version() -> String {
    "2022-06-28".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_openai_api_base(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// First day (`YYYY-MM-DD`) on which feedback may be written.
    #[serde(default = "default_cutoff")]
    pub cutoff: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            cutoff: default_cutoff(),
        }
    }
}

fn default_timezone() -> String {
    "Europe/Kyiv".to_string()
}
fn default_cutoff() -> String {
    "2025-08-15".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    #[serde(default = "default_template")]
    pub template: String,
    /// File whose contents replace the named template.
    #[serde(default)]
    pub instructions_path: Option<PathBuf>,
    #[serde(default = "default_fragment_size")]
    pub fragment_size: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            instructions_path: None,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
        }
    }
}

fn default_template() -> String {
    InstructionTemplate::default().name().to_string()
}
fn default_fragment_size() -> usize {
    DEFAULT_FRAGMENT_SIZE
}

impl Config {
    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REFLECTION_DB_ID") {
            self.notion.database_id = v;
        }
        if let Some(v) = get("REFLECTION_DATE_PROP") {
            self.notion.date_property = v;
        }
        if let Some(v) = get("REFLECTION_TITLE_PROP") {
            self.notion.title_property = v;
        }
        if let Some(v) = get("MENTEE_PAGE_ID") {
            self.notion.auxiliary_page_id = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.openai.model = v;
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.schedule
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("schedule.timezone is invalid: {}", e))
    }

    pub fn cutoff(&self) -> Result<Cutoff> {
        let date = NaiveDate::parse_from_str(self.schedule.cutoff.trim(), "%Y-%m-%d")
            .with_context(|| {
                format!(
                    "schedule.cutoff must be YYYY-MM-DD, got '{}'",
                    self.schedule.cutoff
                )
            })?;
        Cutoff::new(date, self.timezone()?)
    }

    /// The configured auxiliary page, if any.
    pub fn auxiliary_page_id(&self) -> Option<&str> {
        self.notion
            .auxiliary_page_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Resolve the instruction text: file contents win over the template.
    pub fn instructions(&self) -> Result<String> {
        match &self.feedback.instructions_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read instructions file: {}", path.display())
                })?;
                if text.trim().is_empty() {
                    bail!("instructions file is empty: {}", path.display());
                }
                Ok(text)
            }
            None => {
                let template: InstructionTemplate = self.feedback.template.parse()?;
                Ok(template.text().to_string())
            }
        }
    }

    /// Check every setting that can be checked without I/O.
    pub fn validate(&self) -> Result<()> {
        if self.notion.database_id.trim().is_empty() {
            bail!("notion.database_id must be set (or REFLECTION_DB_ID)");
        }
        if self.notion.date_property.trim().is_empty() {
            bail!("notion.date_property must not be empty");
        }
        if self.notion.title_property.trim().is_empty() {
            bail!("notion.title_property must not be empty");
        }
        if self.openai.model.trim().is_empty() {
            bail!("openai.model must not be empty");
        }
        if !(1..=MAX_FRAGMENT_SIZE).contains(&self.feedback.fragment_size) {
            bail!(
                "feedback.fragment_size must be in [1, {}]",
                MAX_FRAGMENT_SIZE
            );
        }
        if self.feedback.instructions_path.is_none() {
            self.feedback.template.parse::<InstructionTemplate>()?;
        }
        self.cutoff()?;
        Ok(())
    }

    /// Build the workflow settings, reading the instructions file if set.
    pub fn workflow_settings(&self) -> Result<WorkflowSettings> {
        Ok(WorkflowSettings {
            database_id: self.notion.database_id.trim().to_string(),
            date_property: self.notion.date_property.clone(),
            title_property: self.notion.title_property.clone(),
            auxiliary_page_id: self.auxiliary_page_id().map(str::to_string),
            model: self.openai.model.clone(),
            instructions: self.instructions()?,
            cutoff: self.cutoff()?,
            fragment_size: self.feedback.fragment_size,
        })
    }
}

/// Read and parse the TOML file at `path` without touching the environment.
///
/// When `required` is false a missing file falls back to defaults; an
/// explicitly requested file must exist.
pub fn read_config_file(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// [`read_config_file`], then environment overrides read through `lookup`,
/// then validation.
pub fn load_config_with<F>(path: &Path, required: bool, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = read_config_file(path, required)?;
    config.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// Load configuration using the process environment for overrides.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    load_config_with(path, required, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(content: &str) -> Config {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.notion.date_property, "Дата");
        assert_eq!(cfg.notion.title_property, "Name");
        assert_eq!(cfg.openai.model, "gpt-4");
        assert_eq!(cfg.feedback.fragment_size, 1800);
        assert_eq!(cfg.schedule.timezone, "Europe/Kyiv");
        assert!(cfg.auxiliary_page_id().is_none());
    }

    #[test]
    fn test_database_id_required() {
        let err = parse("").validate().unwrap_err();
        assert!(err.to_string().contains("notion.database_id"));
    }

    #[test]
    fn test_env_overrides_and_ignores_empty() {
        let mut cfg = parse(
            r#"
[notion]
database_id = "from-file"
title_property = "Title"
"#,
        );
        let env: HashMap<&str, &str> = [
            ("REFLECTION_DB_ID", "from-env"),
            ("REFLECTION_TITLE_PROP", ""),
            ("MENTEE_PAGE_ID", "mentee"),
            ("OPENAI_MODEL", "gpt-4o"),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.notion.database_id, "from-env");
        assert_eq!(cfg.notion.title_property, "Title");
        assert_eq!(cfg.auxiliary_page_id(), Some("mentee"));
        assert_eq!(cfg.openai.model, "gpt-4o");
        cfg.validate().unwrap();
    }

    #[test]
    fn test_blank_auxiliary_is_none() {
        let cfg = parse("[notion]\nauxiliary_page_id = \"  \"\n");
        assert!(cfg.auxiliary_page_id().is_none());
    }

    #[test]
    fn test_fragment_size_bounds() {
        let mut cfg = parse("[notion]\ndatabase_id = \"db\"\n");
        cfg.feedback.fragment_size = 0;
        assert!(cfg.validate().is_err());
        cfg.feedback.fragment_size = 2001;
        assert!(cfg.validate().is_err());
        cfg.feedback.fragment_size = 2000;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_bad_schedule() {
        let mut cfg = parse("[notion]\ndatabase_id = \"db\"\n");
        cfg.schedule.timezone = "Mars/Olympus".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = parse("[notion]\ndatabase_id = \"db\"\n");
        cfg.schedule.cutoff = "15.08.2025".to_string();
        assert!(cfg.validate().unwrap_err().to_string().contains("schedule.cutoff"));
    }

    #[test]
    fn test_unknown_template() {
        let cfg = parse("[notion]\ndatabase_id = \"db\"\n[feedback]\ntemplate = \"weekly\"\n");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_instructions_file_overrides_template() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("prompt.md");
        std::fs::write(&path, "Custom instructions").unwrap();

        let mut cfg = parse("[notion]\ndatabase_id = \"db\"\n");
        cfg.feedback.instructions_path = Some(path);
        let settings = cfg.workflow_settings().unwrap();
        assert_eq!(settings.instructions, "Custom instructions");
        assert_eq!(settings.cutoff.date().to_string(), "2025-08-15");
    }

    #[test]
    fn test_load_missing_optional_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("mentor.toml");

        let cfg = read_config_file(&missing, false).unwrap();
        assert!(cfg.notion.database_id.is_empty());
        assert_eq!(cfg.schedule.cutoff, "2025-08-15");

        let err = load_config_with(&missing, false, |_| None).unwrap_err();
        assert!(err.to_string().contains("notion.database_id"));

        let cfg = load_config_with(&missing, false, |k| {
            (k == "REFLECTION_DB_ID").then(|| "db-from-env".to_string())
        })
        .unwrap();
        assert_eq!(cfg.notion.database_id, "db-from-env");
    }

    #[test]
    fn test_load_required_file_must_exist() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("mentor.toml");
        assert!(read_config_file(&missing, true)
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_load_file_then_env() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mentor.toml");
        std::fs::write(&path, "[notion]\ndatabase_id = \"from-file\"\n").unwrap();

        let cfg = load_config_with(&path, true, |_| None).unwrap();
        assert_eq!(cfg.notion.database_id, "from-file");

        let cfg = load_config_with(&path, true, |k| {
            (k == "OPENAI_MODEL").then(|| "gpt-4o".to_string())
        })
        .unwrap();
        assert_eq!(cfg.openai.model, "gpt-4o");
        assert_eq!(cfg.notion.database_id, "from-file");
    }
}
