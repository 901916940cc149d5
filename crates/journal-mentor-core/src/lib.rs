//! # Journal Mentor Core
//!
//! I/O-free logic for Journal Mentor: data model, collaborator traits,
//! calendar rules, entry resolution, historical guard, context assembly,
//! and the append-only feedback writer.
//!
//! This crate contains no tokio, HTTP or filesystem dependencies. The
//! document store, page converter and completion service are consumed
//! through the traits in [`store`].

pub mod calendar;
pub mod context;
pub mod error;
pub mod feedback;
pub mod fragment;
pub mod guard;
pub mod models;
pub mod prompt;
pub mod resolver;
pub mod store;
pub mod workflow;
