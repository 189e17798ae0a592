//! Keep a LaTeX bibliography minimal and canonical.
//!
//! The library scans a document for the citation keys it actually uses,
//! parses the accompanying BibTeX database, filters it down to the cited
//! entries, and optionally reconciles each surviving entry against its
//! canonical NASA/ADS record. A query client against the same service
//! turns search terms or bibcodes into bibliography-ready records.
//!
//! - [`latex`]: citation scanning
//! - [`bib`]: the entry model, the brace-balancing parser, and re-emission
//! - [`resolve`]: matching cited keys against parsed entries
//! - [`merge`]: identifier extraction and the canonical field merge
//! - [`ads`]: query building, result parsing, and the HTTP transport
//! - [`error`]: the error taxonomy

pub mod ads;
pub mod bib;
pub mod error;
pub mod latex;
pub mod merge;
pub mod resolve;

pub use ads::{is_bibcode, parse_search_response, AdsClient, CanonicalLookup, ExternalRecord, QuerySpec};
pub use bib::{parse_bibliography, render_bibliography, render_entry, BibEntry, BibEntryBuilder};
pub use error::BibCullError;
pub use latex::{scan_citations, strip_comments};
pub use merge::{equivalent, extract_paper_id, reconcile, MergeOutcome, PaperId};
pub use resolve::{resolve, ResolutionResult};
