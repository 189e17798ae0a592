//! Matching cited keys against parsed bibliography entries.

use std::collections::{BTreeSet, HashMap};

use crate::bib::BibEntry;

/// Classification of a document's citations against a bibliography.
///
/// `resolved_entries` keeps the bibliography's own order so repeated runs
/// produce stable diffs. Nothing here is fatal: keys cited but never
/// defined and keys defined more than once are reportable outcomes and the
/// caller decides their severity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    pub used_keys: BTreeSet<String>,
    pub resolved_entries: Vec<BibEntry>,
    pub unresolved_keys: BTreeSet<String>,
    pub duplicate_keys: BTreeSet<String>,
}

/// Resolve `used_keys` against `entries`.
///
/// A key defined exactly once contributes its entry to `resolved_entries`
/// (in bibliography order). A key defined more than once is ambiguous: it
/// goes to `duplicate_keys` and all entries sharing it are excluded rather
/// than guessed between. Duplicates are reported whether or not the key is
/// cited, so a broken database is always visible. Cited keys with no entry
/// go to `unresolved_keys`.
pub fn resolve(used_keys: &BTreeSet<String>, entries: &[BibEntry]) -> ResolutionResult {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *occurrences.entry(entry.key.as_str()).or_insert(0) += 1;
    }

    let duplicate_keys: BTreeSet<String> = occurrences
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(&key, _)| key.to_string())
        .collect();

    let unresolved_keys: BTreeSet<String> = used_keys
        .iter()
        .filter(|key| !occurrences.contains_key(key.as_str()))
        .cloned()
        .collect();

    let resolved_entries: Vec<BibEntry> = entries
        .iter()
        .filter(|entry| {
            used_keys.contains(&entry.key) && occurrences[entry.key.as_str()] == 1
        })
        .cloned()
        .collect();

    ResolutionResult {
        used_keys: used_keys.clone(),
        resolved_entries,
        unresolved_keys,
        duplicate_keys,
    }
}
