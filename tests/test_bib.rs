use bibcull::bib::{parse_bibliography, render_bibliography, render_entry, BibEntry};

const TWO_ENTRIES: &str = r#"@article{Smith99,
    author = {Smith, J.},
    title = {The {Event Horizon} of {M87}},
    year = 1999
}

@book{Jones01,
    author = "Jones, A.",
    publisher = {MIT Press},
    year = {2001}
}
"#;

#[test]
fn test_parse_entries_in_order() {
    let entries = parse_bibliography(TWO_ENTRIES);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "Smith99");
    assert_eq!(entries[0].entry_type, "article");
    assert_eq!(entries[1].key, "Jones01");
    assert_eq!(entries[1].entry_type, "book");
}

#[test]
fn test_nested_braces_preserved_verbatim() {
    let entries = parse_bibliography(TWO_ENTRIES);
    assert_eq!(
        entries[0].get("title").unwrap(),
        "The {Event Horizon} of {M87}"
    );
}

#[test]
fn test_quoted_and_bare_values() {
    let entries = parse_bibliography(TWO_ENTRIES);
    assert_eq!(entries[1].get("author").unwrap(), "Jones, A.");
    assert_eq!(entries[0].get("year").unwrap(), "1999");
    assert_eq!(entries[1].get("year").unwrap(), "2001");
}

#[test]
fn test_field_names_lowercased() {
    let entries = parse_bibliography("@ARTICLE{k,\n  AUTHOR = {A},\n  Title = {T}\n}");
    assert_eq!(entries[0].entry_type, "article");
    assert!(entries[0].get("author").is_some());
    assert!(entries[0].get("title").is_some());
}

#[test]
fn test_paren_delimited_entry() {
    let entries = parse_bibliography("@article(Kerr63,\n  title = {Gravitational field},\n  year = 1963\n)");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "Kerr63");
    assert_eq!(entries[0].get("year").unwrap(), "1963");
}

#[test]
fn test_string_comment_preamble_blocks_skipped() {
    let source = "@string{apj = {ApJ}}\n@comment{not an entry}\n@preamble{\"x\"}\n@article{k, year = 1999}";
    let entries = parse_bibliography(source);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "k");
}

#[test]
fn test_malformed_body_kept_as_opaque_entry() {
    let source = "@article{bad, author > {x}}\n@article{good, year = 2000}";
    let entries = parse_bibliography(source);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "bad");
    assert!(entries[0].fields.is_empty());
    assert_eq!(entries[0].raw_text, "@article{bad, author > {x}}");
    assert_eq!(entries[1].key, "good");
}

#[test]
fn test_entry_without_key_skipped() {
    let entries = parse_bibliography("@article{, year = 1999}\n@article{k, year = 2000}");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "k");
}

#[test]
fn test_raw_text_is_exact_source_span() {
    let entries = parse_bibliography(TWO_ENTRIES);
    assert!(entries[0].raw_text.starts_with("@article{Smith99,"));
    assert!(entries[0].raw_text.ends_with('}'));
    assert!(TWO_ENTRIES.contains(&entries[0].raw_text));
}

#[test]
fn test_multiline_field_value() {
    let source = "@article{k,\n  title = {A title\n    wrapped over lines}\n}";
    let entries = parse_bibliography(source);
    assert_eq!(
        entries[0].get("title").unwrap(),
        "A title\n    wrapped over lines"
    );
}

#[test]
fn test_render_entry_deterministic_field_order() {
    let entry = BibEntry::builder("Smith99", "article")
        .field("year", "1999")
        .field("author", "Smith, J.")
        .field("title", "A title")
        .build();
    let rendered = render_entry(&entry);
    assert_eq!(
        rendered,
        "@article{Smith99,\n    author = {Smith, J.},\n    title = {A title},\n    year = {1999}\n}"
    );
}

#[test]
fn test_render_bibliography_round_trip() {
    let source = "@article{k,\n  title = {T}\n}\n";
    let entries = parse_bibliography(source);
    assert_eq!(render_bibliography(&entries), source);
}

#[test]
fn test_render_bibliography_preserves_order_and_formatting() {
    let entries = parse_bibliography(TWO_ENTRIES);
    let out = render_bibliography(&entries);
    let smith = out.find("Smith99").unwrap();
    let jones = out.find("Jones01").unwrap();
    assert!(smith < jones);
    assert!(out.contains("author = \"Jones, A.\""));
}
