use thiserror::Error;

/// Errors surfaced by the bibcull library.
///
/// Parse problems, unresolved citations, duplicate keys, and merge conflicts
/// are not errors: they are reported as structured diagnostics so the caller
/// can decide how to present them. Only conditions that stop an operation
/// outright live here.
#[derive(Error, Debug)]
pub enum BibCullError {
    /// Network-level failure talking to NASA/ADS. Distinct from "not found":
    /// a search that returns zero documents is a successful empty result.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The service answered with a non-success status or an unreadable payload.
    #[error("ADS API error: {0}")]
    ApiError(String),

    /// No API token in the `ADS_TOKEN` environment variable.
    #[error("no ADS API token found in the ADS_TOKEN environment variable")]
    MissingToken,

    /// A search query without enough information to run (no terms, no authors).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
