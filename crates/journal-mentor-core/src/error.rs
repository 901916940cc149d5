//! Typed errors callers may want to match on.
//!
//! Everything else flows through `anyhow`; these variants exist so the
//! CLI and tests can tell a configuration problem apart from a transport
//! failure via `downcast_ref`.

/// Errors raised while resolving today's entry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The configured date property cannot be queried by day.
    ///
    /// `kind` is `"missing"` when the property is absent from the schema.
    #[error("property '{property}' has unsupported type: {kind}")]
    UnsupportedPropertyType { property: String, kind: String },
}
