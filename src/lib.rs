//! # Journal Mentor
//!
//! Scheduled mentor feedback for a daily journal kept in Notion.
//!
//! Once per run, Journal Mentor finds (or creates) today's entry in a
//! Notion database, renders it (plus an optional context page) as
//! Markdown, asks an OpenAI model for structured feedback, and appends
//! the reply to the entry as a collapsible, time-stamped block.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────┐   ┌──────────────┐
//! │    Notion    │◀─▶│      Workflow        │──▶│    OpenAI    │
//! │ store + md   │   │ gate→resolve→guard→  │   │  Responses   │
//! └──────────────┘   │ context→generate→    │   └──────────────┘
//!                    │ append               │
//!                    └──────────┬───────────┘
//!                               ▼
//!                        ┌────────────┐
//!                        │    CLI     │
//!                        │ (mentor)   │
//!                        └────────────┘
//! ```
//!
//! The workflow itself lives in [`journal_mentor_core`]; this crate
//! provides the network clients and the command line.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`notion`] | Notion REST client (document store) |
//! | [`markdown`] | Notion blocks → Markdown |
//! | [`openai`] | OpenAI Responses client |
//! | [`run`] | `mentor run` |
//! | [`schema`] | `mentor schema` |

pub mod config;
pub mod markdown;
pub mod notion;
pub mod openai;
pub mod run;
pub mod schema;
