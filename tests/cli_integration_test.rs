use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

const LATEX: &str = r"\documentclass{article}
\begin{document}
We build on \cite{Smith99,Jones01} here.
%\cite{Doe00}
\end{document}
";

const BIBTEX: &str = r"@article{Smith99,
    author = {Smith, J.},
    title = {First result},
    year = 1999
}

@article{Jones01,
    title = {Second result},
    year = 2001
}

@article{Jones01,
    title = {Second result, reprinted},
    year = 2001
}

@article{Uncited05,
    title = {Never cited},
    year = 2005
}
";

#[test]
fn test_prune_without_fetch() {
    let dir = tempdir().unwrap();
    let tex = dir.path().join("main.tex");
    let bib = dir.path().join("refs.bib");
    let out = dir.path().join("output.bib");
    fs::write(&tex, LATEX).unwrap();
    fs::write(&bib, BIBTEX).unwrap();

    let mut cmd = Command::cargo_bin("bibcull").unwrap();
    cmd.arg("prune")
        .arg(&tex)
        .arg(&bib)
        .arg("-o")
        .arg(&out)
        .arg("-m")
        .arg(dir.path().join("missing.bib"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Parsing summary:"))
        .stdout(predicates::str::contains("Unique citations  : 2"))
        .stdout(predicates::str::contains("needed entries  : 1"))
        .stdout(predicates::str::contains("duplicate keys  : 1"))
        .stdout(predicates::str::contains("Jones01"));

    let output = fs::read_to_string(&out).unwrap();
    assert!(output.contains("@article{Smith99"));
    assert!(!output.contains("Jones01"));
    assert!(!output.contains("Uncited05"));
    assert!(!output.contains("Doe00"));
}

#[test]
fn test_prune_fetch_without_token_fails() {
    let dir = tempdir().unwrap();
    let tex = dir.path().join("main.tex");
    let bib = dir.path().join("refs.bib");
    fs::write(&tex, LATEX).unwrap();
    fs::write(&bib, BIBTEX).unwrap();

    let mut cmd = Command::cargo_bin("bibcull").unwrap();
    cmd.env_remove("ADS_TOKEN")
        .arg("prune")
        .arg(&tex)
        .arg(&bib)
        .arg("-o")
        .arg(dir.path().join("output.bib"))
        .arg("-m")
        .arg(dir.path().join("missing.bib"))
        .arg("--fetch");
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("ADS_TOKEN"));
}

#[test]
fn test_query_without_terms_fails() {
    let mut cmd = Command::cargo_bin("bibcull").unwrap();
    cmd.env_remove("ADS_TOKEN").arg("query");
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("invalid query"));
}

#[test]
fn test_prune_missing_input_file_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("bibcull").unwrap();
    cmd.arg("prune")
        .arg(dir.path().join("absent.tex"))
        .arg(dir.path().join("absent.bib"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed to read"));
}
