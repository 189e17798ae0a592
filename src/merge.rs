//! Reconciling local entries against canonical NASA/ADS records.
//!
//! An entry is only eligible for lookup when it carries something that
//! identifies it unambiguously (DOI, arXiv identifier, or ADS bibcode).
//! Title and author are never used for lookup: they are too ambiguous in a
//! large database search.

use log::debug;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::fmt;

use crate::ads::{CanonicalLookup, ExternalRecord};
use crate::bib::BibEntry;
use crate::error::BibCullError;

static ARXIV_NOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"arXiv:\s?([0-9]{4}\.[0-9]+)").expect("Invalid arXiv note regex pattern")
});
static BIBCODE_NOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ADS Bibcode:\s?([^\s}]+)").expect("Invalid bibcode note regex pattern")
});
static ARXIV_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"arxiv\.org/(?:abs|pdf)/([^\s/}]+)").expect("Invalid arXiv URL regex pattern")
});
static ADS_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"adsabs\.harvard\.edu/abs/([^\s/}]+)").expect("Invalid ADS URL regex pattern")
});

/// A stable identifier extracted from an entry, usable for an unambiguous
/// external lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperId {
    Doi(String),
    Arxiv(String),
    Bibcode(String),
}

impl PaperId {
    /// The ADS query clause selecting exactly this publication.
    pub fn to_query(&self) -> String {
        match self {
            PaperId::Doi(doi) => format!("doi:\"{}\"", doi),
            PaperId::Arxiv(id) => format!("arXiv:{}", id),
            PaperId::Bibcode(bibcode) => format!("bibcode:{}", bibcode),
        }
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperId::Doi(doi) => write!(f, "doi {}", doi),
            PaperId::Arxiv(id) => write!(f, "arXiv {}", id),
            PaperId::Bibcode(bibcode) => write!(f, "bibcode {}", bibcode),
        }
    }
}

/// Outcome of reconciling one entry against the external database.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged entry. Equal to the input when nothing matched.
    pub entry: BibEntry,
    /// Field names where local and canonical values disagree semantically.
    /// The local value is kept for these.
    pub conflicts: Vec<String>,
    /// Whether a canonical record was found at all.
    pub matched: bool,
    /// Whether any field was adopted or re-formatted, so the caller knows
    /// to re-serialize instead of reusing the raw text.
    pub changed: bool,
}

impl MergeOutcome {
    fn unmatched(entry: BibEntry) -> Self {
        Self {
            entry,
            conflicts: Vec::new(),
            matched: false,
            changed: false,
        }
    }
}

/// Try to extract an unambiguous identifier from an entry's fields.
///
/// Probes, in order: the `doi` field; `note`/`journal` text for `arXiv:` and
/// `ADS Bibcode:` markers; the `eprint` field; `url`/`adsurl` for arxiv.org
/// and adsabs.harvard.edu links (bibcodes in URLs are percent-decoded).
/// When several identifiers are present the most direct one wins:
/// bibcode, then DOI, then arXiv id.
pub fn extract_paper_id(entry: &BibEntry) -> Option<PaperId> {
    let doi = entry
        .get("doi")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let mut arxiv: Option<String> = None;
    let mut bibcode: Option<String> = None;

    for field in ["note", "journal"] {
        if let Some(text) = entry.get(field) {
            if arxiv.is_none() {
                if let Some(cap) = ARXIV_NOTE_REGEX.captures(text) {
                    arxiv = Some(cap[1].to_string());
                }
            }
            if bibcode.is_none() {
                if let Some(cap) = BIBCODE_NOTE_REGEX.captures(text) {
                    bibcode = Some(percent_decode(&cap[1]));
                }
            }
        }
    }

    if arxiv.is_none() {
        if let Some(eprint) = entry.get("eprint") {
            let is_arxiv = entry
                .get("archiveprefix")
                .map_or(true, |p| p.to_lowercase().contains("arxiv"));
            let eprint = eprint.trim();
            if is_arxiv && !eprint.is_empty() {
                arxiv = Some(eprint.to_string());
            }
        }
    }

    for field in ["url", "adsurl"] {
        if let Some(text) = entry.get(field) {
            if arxiv.is_none() {
                if let Some(cap) = ARXIV_URL_REGEX.captures(text) {
                    arxiv = Some(cap[1].to_string());
                }
            }
            if bibcode.is_none() {
                if let Some(cap) = ADS_URL_REGEX.captures(text) {
                    bibcode = Some(percent_decode(&cap[1]));
                }
            }
        }
    }

    bibcode
        .map(PaperId::Bibcode)
        .or(doi.map(PaperId::Doi))
        .or(arxiv.map(PaperId::Arxiv))
}

fn percent_decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Compare two field values ignoring formatting: case, braces, punctuation,
/// and token order. `"J. Smith"` and `"Smith, J."` are equivalent;
/// `"2015"` and `"2016"` are not.
pub fn equivalent(a: &str, b: &str) -> bool {
    normalized_tokens(a) == normalized_tokens(b)
}

fn normalized_tokens(value: &str) -> Vec<String> {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut tokens: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    tokens.sort();
    tokens
}

/// Reconcile one entry against the canonical database.
///
/// Field policy when a record is found: a field the local entry lacks is
/// adopted outright; a field both sides have takes the canonical value when
/// the two are formatting variants of the same content, and is flagged as a
/// conflict (local value kept) when they differ semantically. Local-only
/// fields always survive. "Not found" is a clean non-match; transport
/// failures propagate as errors so the caller can decide retry vs skip.
pub fn reconcile(
    entry: &BibEntry,
    lookup: &dyn CanonicalLookup,
) -> Result<MergeOutcome, BibCullError> {
    let id = match extract_paper_id(entry) {
        Some(id) => id,
        None => {
            debug!("no stable identifier in entry '{}'", entry.key);
            return Ok(MergeOutcome::unmatched(entry.clone()));
        }
    };

    let record: ExternalRecord = match lookup.lookup(&id)? {
        Some(record) => record,
        None => {
            debug!("no ADS record for entry '{}' ({})", entry.key, id);
            return Ok(MergeOutcome::unmatched(entry.clone()));
        }
    };

    let mut merged = entry.clone();
    let mut conflicts = Vec::new();
    let mut changed = false;

    // Sorted iteration keeps adoption order and conflict lists deterministic.
    let mut names: Vec<&String> = record.entry.fields.keys().collect();
    names.sort();
    for name in names {
        let canonical = &record.entry.fields[name];
        match merged.fields.get(name).cloned() {
            None => {
                merged.fields.insert(name.clone(), canonical.clone());
                changed = true;
            }
            Some(local) => {
                if local == *canonical {
                    continue;
                }
                if equivalent(&local, canonical) {
                    merged.fields.insert(name.clone(), canonical.clone());
                    changed = true;
                } else {
                    conflicts.push(name.clone());
                }
            }
        }
    }

    Ok(MergeOutcome {
        entry: merged,
        conflicts,
        matched: true,
        changed,
    })
}
