use bibcull::latex::{scan_citations, strip_comments};

#[test]
fn test_scan_multi_key_citation() {
    let keys = scan_citations(r"Prior work \cite{a,b,c} showed this.");
    assert_eq!(keys.len(), 3);
    assert!(keys.contains("a"));
    assert!(keys.contains("b"));
    assert!(keys.contains("c"));
}

#[test]
fn test_scan_multiple_commands_per_line() {
    let keys = scan_citations(r"See \citet{Smith99} and also \citep{Jones01}.");
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("Smith99"));
    assert!(keys.contains("Jones01"));
}

#[test]
fn test_scan_optional_arguments_are_not_keys() {
    let keys = scan_citations(r"\citep[e.g.][chap. 2]{Smith99}");
    assert_eq!(keys.len(), 1);
    assert!(keys.contains("Smith99"));

    let keys = scan_citations(r"\citealp[see][]{Jones01}");
    assert!(keys.contains("Jones01"));
}

#[test]
fn test_scan_command_split_across_lines() {
    let source = "as shown in \\cite{Smith99,\n  Jones01} earlier";
    let keys = scan_citations(source);
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("Smith99"));
    assert!(keys.contains("Jones01"));
}

#[test]
fn test_scan_variant_commands() {
    let source = r"\citet*{a} \citealt{b} \citeauthor{c} \citeyear{d}";
    let keys = scan_citations(source);
    assert_eq!(keys.len(), 4);
}

#[test]
fn test_scan_keys_with_punctuation() {
    let keys = scan_citations(r"\cite{Smith:2020_a.b+c}");
    assert!(keys.contains("Smith:2020_a.b+c"));
}

#[test]
fn test_scan_set_semantics() {
    let keys = scan_citations(r"\cite{Smith99} and again \cite{Smith99}");
    assert_eq!(keys.len(), 1);
}

#[test]
fn test_commented_citations_are_excluded() {
    let source = "\\cite{Smith99}\n%\\cite{Doe00}\ntext % trailing \\cite{Roe02}\n";
    let keys = scan_citations(source);
    assert!(keys.contains("Smith99"));
    assert!(!keys.contains("Doe00"));
    assert!(!keys.contains("Roe02"));
}

#[test]
fn test_escaped_percent_is_not_a_comment() {
    let source = "a 50\\% increase \\cite{Smith99}\n";
    let keys = scan_citations(source);
    assert!(keys.contains("Smith99"));
}

#[test]
fn test_strip_comments() {
    assert_eq!(strip_comments("foo % bar\nbaz\n"), "foo \nbaz\n");
    assert_eq!(strip_comments("50\\% done\n"), "50\\% done\n");
    assert_eq!(strip_comments("% whole line\nkept\n"), "\nkept\n");
}
