//! Re-emitting bibliography entries.
//!
//! Untouched entries are written back from `raw_text` verbatim so user
//! formatting survives the round trip. Entries changed by a merge are
//! re-serialized field by field in a deterministic (alphabetical) order.

use std::collections::BTreeMap;

use crate::bib::BibEntry;

/// Serialize one entry with fields in alphabetical order.
///
/// Opaque entries (no parsed fields) fall back to their raw text, since
/// nothing better than the original span can be produced for them.
pub fn render_entry(entry: &BibEntry) -> String {
    if entry.fields.is_empty() && !entry.raw_text.is_empty() {
        return entry.raw_text.clone();
    }
    let fields: BTreeMap<&String, &String> = entry.fields.iter().collect();
    let body: Vec<String> = fields
        .iter()
        .map(|(name, value)| format!("    {} = {{{}}}", name, value))
        .collect();
    format!("@{}{{{},\n{}\n}}", entry.entry_type, entry.key, body.join(",\n"))
}

/// Write a sequence of entries back out verbatim, preserving their original
/// formatting and relative order.
pub fn render_bibliography(entries: &[BibEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        out.push_str(entry.raw_text.trim_end());
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
