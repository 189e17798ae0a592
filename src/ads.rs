//! Query building and result parsing for the NASA/ADS search API, plus the
//! lookup capability the merge engine consumes.
//!
//! Everything here is transport-free; the HTTP client lives in
//! [`client`] and is swapped for an in-memory fake in tests.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

pub mod client;

pub use client::AdsClient;

use crate::bib::BibEntry;
use crate::error::BibCullError;
use crate::merge::PaperId;

static BIBCODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9&]+\.+[a-zA-Z0-9&]+\.+[a-zA-Z0-9&.]*[a-zA-Z0-9]$")
        .expect("Invalid bibcode regex pattern")
});

/// A canonical record from the external database: the stable identifier
/// plus a bibliography entry in the same representation the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRecord {
    pub bibcode: String,
    pub entry: BibEntry,
}

/// The external lookup capability.
///
/// Injected into the merge engine and the query paths so both are testable
/// with an in-memory implementation, independent of transport.
pub trait CanonicalLookup {
    /// Resolve a stable identifier to its canonical record. `Ok(None)`
    /// means "not found"; transport failures are errors.
    fn lookup(&self, id: &PaperId) -> Result<Option<ExternalRecord>, BibCullError>;

    /// Run a search, returning records in the service's relevance order.
    fn search(&self, query: &QuerySpec) -> Result<Vec<ExternalRecord>, BibCullError>;
}

/// A structured search request: free-text terms plus optional filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub terms: Vec<String>,
    pub authors: Vec<String>,
    /// A single year or a `YYYY-YYYY` range, passed through to the service's
    /// year grammar.
    pub year: Option<String>,
    /// Publication venue, matched via the service's bibstem grammar.
    pub venue: Option<String>,
    pub database: Option<String>,
    /// Server-side sort. Results are never re-sorted locally: relevance
    /// order is meaningful.
    pub sort: Option<String>,
}

impl QuerySpec {
    /// A year or venue alone is not enough to search on.
    pub fn is_valid(&self) -> bool {
        !self.terms.is_empty() || !self.authors.is_empty()
    }

    /// Compose the single query string the service expects. Escaping is the
    /// transport's job (query-pair encoding, applied exactly once), so
    /// clauses here are plain text.
    pub fn to_query_string(&self) -> String {
        let mut clauses = Vec::new();
        if !self.terms.is_empty() {
            clauses.push(self.terms.join(" "));
        }
        for author in &self.authors {
            clauses.push(format!("author:\"{}\"", author));
        }
        if let Some(year) = &self.year {
            clauses.push(format!("year:{}", year));
        }
        if let Some(venue) = &self.venue {
            clauses.push(format!("bibstem:{}", venue));
        }
        clauses.join(" ")
    }

    /// The collection filter, sent as a separate filter-query parameter.
    pub fn filter_query(&self) -> Option<String> {
        self.database
            .as_ref()
            .map(|database| format!("database:{}", database))
    }
}

/// Whether a term looks like an ADS bibcode (used to decide fetch-vs-search
/// for positional CLI arguments).
pub fn is_bibcode(term: &str) -> bool {
    BIBCODE_REGEX.is_match(term)
}

/// Turn a search response into records, preserving the service's ordering.
/// Absent fields are simply absent; only a response without a document list
/// at all is an error.
pub fn parse_search_response(body: &Value) -> Result<Vec<ExternalRecord>, BibCullError> {
    let docs = body
        .get("response")
        .and_then(|r| r.get("docs"))
        .and_then(|d| d.as_array())
        .ok_or_else(|| {
            BibCullError::ApiError("search response missing response.docs".to_string())
        })?;
    Ok(docs.iter().map(doc_to_record).collect())
}

fn doc_to_record(doc: &Value) -> ExternalRecord {
    let bibcode = doc
        .get("bibcode")
        .and_then(|b| b.as_str())
        .unwrap_or_default()
        .to_string();
    let mut builder = BibEntry::builder(bibcode.clone(), "article");
    if let Some(fields) = doc.as_object() {
        // Sorted for deterministic field insertion; the map is unordered
        // anyway but logs and debug output stay stable.
        let fields: BTreeMap<&String, &Value> = fields.iter().collect();
        for (name, value) in fields {
            builder = builder.field(name, render_doc_value(name, value));
        }
    }
    ExternalRecord {
        bibcode,
        entry: builder.build(),
    }
}

fn render_doc_value(name: &str, value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            match name {
                // Author lists use the BibTeX separator; links_data items
                // are self-contained JSON strings, kept one per line.
                "author" => parts.join(" and "),
                "links_data" => parts.join("\n"),
                _ => parts.join("; "),
            }
        }
        other => other.to_string(),
    }
}
