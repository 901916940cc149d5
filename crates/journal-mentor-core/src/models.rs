//! Core data models shared by the workflow and every collaborator.
//!
//! These types mirror the small slice of the document store that the
//! workflow reads and writes: database schemas, pages with typed
//! properties, query filters, and the blocks appended as feedback.

use std::collections::BTreeMap;

/// Type of a database property as reported by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    /// A stored calendar date.
    Date,
    /// System-assigned creation timestamp.
    CreatedTime,
    /// Any other type, carrying the store's type name (e.g. `"rich_text"`).
    Other(String),
}

impl PropertyKind {
    /// The store's type name for this kind.
    pub fn type_name(&self) -> &str {
        match self {
            PropertyKind::Title => "title",
            PropertyKind::Date => "date",
            PropertyKind::CreatedTime => "created_time",
            PropertyKind::Other(name) => name,
        }
    }
}

/// Property schema of a database (collection).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub properties: BTreeMap<String, PropertyKind>,
}

impl DatabaseSchema {
    pub fn kind_of(&self, property: &str) -> Option<&PropertyKind> {
        self.properties.get(property)
    }
}

/// Value of a date property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    /// `YYYY-MM-DD` or an RFC 3339 date-time.
    pub start: String,
    pub end: Option<String>,
}

impl DateValue {
    pub fn on(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }
}

/// A typed property value on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Plain text of a title property.
    Title(String),
    /// A date property; `None` when the property is empty.
    Date(Option<DateValue>),
    /// Creation timestamp (RFC 3339).
    CreatedTime(String),
    /// A property type the workflow does not interpret.
    Other { kind: String },
}

/// A page (document) in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub properties: BTreeMap<String, PropertyValue>,
    /// RFC 3339 creation timestamp, when the store reports one.
    pub created_time: Option<String>,
}

impl Page {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Plain text of the named title property, if present.
    pub fn title(&self, property: &str) -> Option<&str> {
        match self.properties.get(property) {
            Some(PropertyValue::Title(text)) => Some(text),
            _ => None,
        }
    }
}

/// Properties set on a page at creation time.
pub type PageProperties = BTreeMap<String, PropertyValue>;

/// Database query filter used to find today's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Date property equals the given `YYYY-MM-DD` day.
    DateEquals { property: String, date: String },
    /// Half-open creation-time window `[on_or_after, before)`.
    CreatedWithin { on_or_after: String, before: String },
}

/// Content block appended to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph { text: String },
    /// Collapsible block with a visible title and nested children.
    Toggle { title: String, children: Vec<Block> },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }
}

/// Request sent to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// System-role instruction text.
    pub instructions: String,
    /// User-role input text.
    pub input: String,
    pub temperature: f32,
}
