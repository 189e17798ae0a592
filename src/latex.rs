//! Citation scanning for LaTeX sources.
//!
//! The scanner works on the document as one blob of text, so citation
//! commands wrapped across line breaks are found. Comments are stripped
//! first so commented-out citations never count as used.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

// Covers \cite and the natbib variants, with optional starred forms and any
// number of optional [..] arguments before the key list. The key list itself
// is everything up to the closing brace; [^}] crosses line breaks.
static CITE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\cite(?:alp|alt|author|year|t|p)?\*?(?:\[[^\]]*\])*\s*\{([^}]+)\}")
        .expect("Invalid citation regex pattern")
});

/// Remove LaTeX comments: an unescaped `%` kills the rest of its line.
/// `\%` is a literal percent sign and is kept.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let mut escaped = false;
        let mut cut = line.len();
        for (i, c) in line.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '%' => {
                    cut = i;
                    break;
                }
                _ => {}
            }
        }
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}

/// Extract the set of citation keys referenced by a LaTeX document.
///
/// Handles comma-separated multi-key citations, multiple commands per line,
/// and commands split across line breaks. Keys are matched verbatim
/// (case-sensitive, no normalization); duplicates collapse via set semantics.
pub fn scan_citations(source: &str) -> BTreeSet<String> {
    let text = strip_comments(source);
    let mut keys = BTreeSet::new();
    for cap in CITE_REGEX.captures_iter(&text) {
        for key in cap[1].split(',') {
            let key = key.trim();
            if !key.is_empty() {
                keys.insert(key.to_string());
            }
        }
    }
    keys
}
