use bibcull::bib::parse_bibliography;
use bibcull::latex::scan_citations;
use bibcull::resolve::resolve;

const DOCUMENT: &str = r"
We follow \cite{Smith99,Jones01} here.
%\cite{Doe00}
";

const BIBLIOGRAPHY: &str = r"
@article{Smith99, title = {First}, year = 1999}
@article{Jones01, title = {Second}, year = 2001}
@article{Jones01, title = {Second, again}, year = 2001}
@article{Uncited05, title = {Never cited}, year = 2005}
";

#[test]
fn test_cited_commented_and_duplicate_scenario() {
    let used = scan_citations(DOCUMENT);
    let entries = parse_bibliography(BIBLIOGRAPHY);
    let result = resolve(&used, &entries);

    assert_eq!(result.resolved_entries.len(), 1);
    assert_eq!(result.resolved_entries[0].key, "Smith99");
    assert!(result.unresolved_keys.is_empty());
    assert_eq!(result.duplicate_keys.len(), 1);
    assert!(result.duplicate_keys.contains("Jones01"));
    // Doe00 was commented out: it must not appear anywhere.
    assert!(!result.used_keys.contains("Doe00"));
    assert!(!result.unresolved_keys.contains("Doe00"));
}

#[test]
fn test_resolution_is_deterministic() {
    let used = scan_citations(DOCUMENT);
    let entries = parse_bibliography(BIBLIOGRAPHY);
    let first = resolve(&used, &entries);
    let second = resolve(&used, &entries);
    assert_eq!(first, second);
}

#[test]
fn test_unresolved_key_reported() {
    let used = scan_citations(r"\cite{Smith99,Ghost42}");
    let entries = parse_bibliography(BIBLIOGRAPHY);
    let result = resolve(&used, &entries);

    assert_eq!(result.unresolved_keys.len(), 1);
    assert!(result.unresolved_keys.contains("Ghost42"));
    assert_eq!(result.resolved_entries.len(), 1);
}

#[test]
fn test_resolved_entries_follow_bibliography_order() {
    let used = scan_citations(r"\cite{Zeta,Alpha}");
    let entries = parse_bibliography(
        "@article{Alpha, year = 2001}\n@article{Mid, year = 2002}\n@article{Zeta, year = 2003}",
    );
    let result = resolve(&used, &entries);

    let keys: Vec<&str> = result.resolved_entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["Alpha", "Zeta"]);
}

#[test]
fn test_duplicate_keys_reported_even_when_uncited() {
    let used = scan_citations(r"\cite{Smith99}");
    let entries = parse_bibliography(
        "@article{Smith99, year = 1999}\n@article{Dup, year = 2000}\n@article{Dup, year = 2001}",
    );
    let result = resolve(&used, &entries);

    assert!(result.duplicate_keys.contains("Dup"));
    assert_eq!(result.resolved_entries.len(), 1);
}

#[test]
fn test_cited_duplicate_not_in_unresolved() {
    let used = scan_citations(r"\cite{Dup}");
    let entries =
        parse_bibliography("@article{Dup, year = 2000}\n@article{Dup, year = 2001}");
    let result = resolve(&used, &entries);

    assert!(result.duplicate_keys.contains("Dup"));
    assert!(result.unresolved_keys.is_empty());
    assert!(result.resolved_entries.is_empty());
}
