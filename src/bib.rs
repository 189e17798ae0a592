//! The BibTeX entry model shared by the parser, the resolver, the merge
//! engine, and the ADS client.

use std::collections::HashMap;

pub mod parser;
pub mod writer;

pub use parser::parse_bibliography;
pub use writer::{render_bibliography, render_entry};

/// One bibliography record.
///
/// `fields` maps lower-cased field names to their raw value text, with the
/// outer delimiter stripped but internal structure (nested braces, special
/// characters) preserved verbatim. `raw_text` is the exact source span of
/// the entry so untouched entries can be re-emitted byte-identical.
#[derive(Debug, Clone, PartialEq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    pub fields: HashMap<String, String>,
    pub raw_text: String,
}

impl BibEntry {
    pub fn new(key: String, entry_type: String) -> Self {
        Self {
            key,
            entry_type,
            fields: HashMap::new(),
            raw_text: String::new(),
        }
    }

    /// Create a new BibEntry using the builder pattern
    pub fn builder(key: impl Into<String>, entry_type: impl Into<String>) -> BibEntryBuilder {
        BibEntryBuilder::new(key, entry_type)
    }

    pub fn set(&mut self, field: &str, value: String) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&String> {
        self.fields.get(field)
    }
}

/// Builder for BibEntry to allow for cleaner creation
pub struct BibEntryBuilder {
    key: String,
    entry_type: String,
    fields: HashMap<String, String>,
    raw_text: String,
}

impl BibEntryBuilder {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: HashMap::new(),
            raw_text: String::new(),
        }
    }

    /// Add a field to the BibEntry
    pub fn field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Add multiple fields from an iterator of (field, value) pairs
    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (field, value) in fields {
            self.fields.insert(field.into(), value.into());
        }
        self
    }

    pub fn raw_text(mut self, raw: impl Into<String>) -> Self {
        self.raw_text = raw.into();
        self
    }

    pub fn build(self) -> BibEntry {
        BibEntry {
            key: self.key,
            entry_type: self.entry_type,
            fields: self.fields,
            raw_text: self.raw_text,
        }
    }
}
