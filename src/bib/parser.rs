//! BibTeX parsing with explicit brace balancing.
//!
//! Field values routinely contain nested braces for case protection, so the
//! parser counts delimiter depth instead of splitting on a regex. It is not
//! a validator: values are stored verbatim (outer delimiter stripped) and no
//! LaTeX markup inside them is interpreted.
//!
//! Malformed input policy: an entry whose `@type{key` header parses but
//! whose body cannot be read as fields is retained as an opaque entry
//! (empty `fields`, `raw_text` intact) and a warning is logged; text that
//! yields no key at all is skipped with a warning. Either way nothing
//! disappears without a diagnostic.

use log::{debug, warn};
use std::collections::HashMap;

use crate::bib::BibEntry;

/// Parse a BibTeX source into its entries, in input order.
pub fn parse_bibliography(source: &str) -> Vec<BibEntry> {
    let chars: Vec<char> = source.chars().collect();
    let mut entries = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        if chars[pos] != '@' {
            pos += 1;
            continue;
        }
        match parse_entry(&chars, pos) {
            Some((entry, next)) => {
                if let Some(entry) = entry {
                    entries.push(entry);
                }
                pos = next;
            }
            None => pos += 1,
        }
    }
    entries
}

/// Parse one entry starting at the `@` at `start`. Returns the entry (None
/// for skipped blocks) and the position to resume scanning from, or None if
/// `start` does not open an entry at all.
fn parse_entry(chars: &[char], start: usize) -> Option<(Option<BibEntry>, usize)> {
    let mut pos = start + 1;

    let type_start = pos;
    while pos < chars.len() && chars[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    if pos == type_start {
        return None;
    }
    let entry_type: String = chars[type_start..pos].iter().collect::<String>().to_lowercase();

    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    if pos >= chars.len() || (chars[pos] != '{' && chars[pos] != '(') {
        return None;
    }
    let open = chars[pos];

    let end = match find_balanced_end(chars, pos, open) {
        Some(end) => end,
        None => {
            warn!("unterminated @{} entry, ignoring rest of input", entry_type);
            return Some((None, chars.len()));
        }
    };
    let body = &chars[pos + 1..end];
    let raw_text: String = chars[start..=end].iter().collect();

    if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
        debug!("skipping @{} block", entry_type);
        return Some((None, end + 1));
    }

    // Key runs to the first comma (or the whole body for field-less entries).
    let mut i = 0;
    let mut key = String::new();
    while i < body.len() {
        if body[i] == ',' {
            i += 1;
            break;
        }
        key.push(body[i]);
        i += 1;
    }
    let key = key.trim().to_string();
    if key.is_empty() {
        warn!("skipping @{} entry with an empty key", entry_type);
        return Some((None, end + 1));
    }

    let fields = match parse_fields(&body[i..]) {
        Some(fields) => fields,
        None => {
            warn!("could not read the fields of entry '{}'; keeping it verbatim", key);
            HashMap::new()
        }
    };

    Some((
        Some(BibEntry {
            key,
            entry_type,
            fields,
            raw_text,
        }),
        end + 1,
    ))
}

/// Find the index of the delimiter closing the entry opened at `open_pos`.
fn find_balanced_end(chars: &[char], open_pos: usize, open: char) -> Option<usize> {
    if open == '{' {
        let mut depth = 0i32;
        for (i, &c) in chars.iter().enumerate().skip(open_pos) {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    } else {
        // Paren-delimited entry: a ')' only closes it outside braces and
        // outside a quoted value.
        let mut brace_depth = 0i32;
        let mut in_quotes = false;
        for (i, &c) in chars.iter().enumerate().skip(open_pos + 1) {
            match c {
                '"' if brace_depth == 0 => in_quotes = !in_quotes,
                '{' => brace_depth += 1,
                '}' => brace_depth -= 1,
                ')' if brace_depth == 0 && !in_quotes => return Some(i),
                _ => {}
            }
        }
        None
    }
}

/// Parse `name = value` pairs from an entry body. Returns None on the first
/// construct that cannot be read, which flags the whole entry as opaque.
fn parse_fields(body: &[char]) -> Option<HashMap<String, String>> {
    let mut fields = HashMap::new();
    let mut i = 0;
    loop {
        while i < body.len() && (body[i].is_whitespace() || body[i] == ',') {
            i += 1;
        }
        if i >= body.len() {
            break;
        }

        let name_start = i;
        while i < body.len() && (body[i].is_ascii_alphanumeric() || body[i] == '_' || body[i] == '-') {
            i += 1;
        }
        if i == name_start {
            return None;
        }
        let name: String = body[name_start..i].iter().collect::<String>().to_lowercase();

        while i < body.len() && body[i].is_whitespace() {
            i += 1;
        }
        if i >= body.len() || body[i] != '=' {
            return None;
        }
        i += 1;
        while i < body.len() && body[i].is_whitespace() {
            i += 1;
        }
        if i >= body.len() {
            return None;
        }

        let (value, next) = parse_value(body, i)?;
        fields.insert(name, value);
        i = next;
    }
    Some(fields)
}

/// Parse one field value starting at `start`: a brace-balanced `{...}`
/// group, a `"..."` string (braces inside still balanced), or a bare token
/// (number, macro name, or a `#` concatenation kept verbatim).
fn parse_value(body: &[char], start: usize) -> Option<(String, usize)> {
    match body[start] {
        '{' => {
            let mut depth = 1i32;
            let mut value = String::new();
            let mut i = start + 1;
            while i < body.len() {
                match body[i] {
                    '{' => {
                        depth += 1;
                        value.push('{');
                    }
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some((value, i + 1));
                        }
                        value.push('}');
                    }
                    c => value.push(c),
                }
                i += 1;
            }
            None
        }
        '"' => {
            let mut depth = 0i32;
            let mut value = String::new();
            let mut i = start + 1;
            while i < body.len() {
                match body[i] {
                    '{' => {
                        depth += 1;
                        value.push('{');
                    }
                    '}' => {
                        depth -= 1;
                        value.push('}');
                    }
                    '"' if depth == 0 => return Some((value, i + 1)),
                    c => value.push(c),
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut value = String::new();
            let mut i = start;
            while i < body.len() && body[i] != ',' {
                value.push(body[i]);
                i += 1;
            }
            let value = value.trim().to_string();
            if value.is_empty() {
                None
            } else {
                Some((value, i))
            }
        }
    }
}
