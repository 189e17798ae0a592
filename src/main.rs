use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use bibcull::{
    extract_paper_id, is_bibcode, parse_bibliography, parse_search_response, reconcile,
    render_bibliography, render_entry, resolve, scan_citations, AdsClient, BibCullError, BibEntry,
    ExternalRecord, QuerySpec,
};

// Pause between consecutive ADS lookups so batch runs stay polite.
const QUERY_SLEEP: Duration = Duration::from_millis(200);

const MAX_AUTHORS: usize = 4;

const TOKEN_HELP: &str = "
Error: NO ADS TOKEN

Please export an ADS API access token to the `ADS_TOKEN` environment
variable. On most shells this can be done with:

    export ADS_TOKEN=\"...\"

You can get a token (for free) by following the instructions here:

    https://ui.adsabs.harvard.edu/help/api/

DO NOT SHARE YOUR TOKEN WITH ANYONE.
";

/// Keep a LaTeX bibliography minimal and in the NASA/ADS canonical format
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Filter a BibTeX file down to the entries a LaTeX document cites
    Prune {
        /// LaTeX source file
        latex_file: PathBuf,
        /// BibTeX database file
        bibtex_file: PathBuf,
        /// Output filepath
        #[arg(short, long, default_value = "output.bib")]
        outfile: PathBuf,
        /// Output filepath for entries that could not be resolved in NASA/ADS
        #[arg(short, long, default_value = "missing.bib")]
        missing_file: PathBuf,
        /// Do network requests to fetch canonical records from NASA/ADS
        #[arg(long)]
        fetch: bool,
    },
    /// Search NASA/ADS, or fetch BibTeX exports when every term is a bibcode
    Query {
        /// Search terms (bibcodes trigger a direct BibTeX fetch)
        terms: Vec<String>,
        /// Author name, in standard ADS format (repeatable)
        #[arg(short, long)]
        author: Vec<String>,
        /// Publication year or YYYY-YYYY range
        #[arg(short, long)]
        year: Option<String>,
        /// Publication venue (journal bibstem)
        #[arg(long)]
        venue: Option<String>,
        /// Which database to request from
        #[arg(long, default_value = "astronomy")]
        database: String,
        /// Which fields to request
        #[arg(long, default_value = "author,date,pub,title,bibcode,citation_count,links_data")]
        fields: String,
        /// Server-side sort, e.g. "date desc"
        #[arg(long)]
        sort: Option<String>,
        /// Output fetched JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Configure logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(err) = run(cli) {
        if let Some(BibCullError::MissingToken) = err.downcast_ref::<BibCullError>() {
            eprintln!("{}", TOKEN_HELP);
        } else {
            eprintln!("Error: {:#}", err);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Prune {
            latex_file,
            bibtex_file,
            outfile,
            missing_file,
            fetch,
        } => cmd_prune(&latex_file, &bibtex_file, &outfile, &missing_file, fetch),
        Command::Query {
            terms,
            author,
            year,
            venue,
            database,
            fields,
            sort,
            json,
        } => cmd_query(terms, author, year, venue, database, &fields, sort, json),
    }
}

fn cmd_prune(
    latex_file: &PathBuf,
    bibtex_file: &PathBuf,
    outfile: &PathBuf,
    missing_file: &PathBuf,
    fetch: bool,
) -> Result<()> {
    let latex_source = fs::read_to_string(latex_file)
        .with_context(|| format!("Failed to read {:?}", latex_file))?;
    let bib_source = fs::read_to_string(bibtex_file)
        .with_context(|| format!("Failed to read {:?}", bibtex_file))?;

    let used_keys = scan_citations(&latex_source);
    let entries = parse_bibliography(&bib_source);
    let resolution = resolve(&used_keys, &entries);

    println!("Parsing summary:");
    println!(" Unique citations  : {}", resolution.used_keys.len());
    println!(" BibTeX entries    : {}", entries.len());
    println!(" . needed entries  : {}", resolution.resolved_entries.len());
    println!(" . missing entries : {}", resolution.unresolved_keys.len());
    println!(" . duplicate keys  : {}", resolution.duplicate_keys.len());
    println!();

    if !resolution.unresolved_keys.is_empty() {
        println!("Cited but not in the database:");
        for key in &resolution.unresolved_keys {
            println!("  {}", key);
        }
        println!();
    }
    if !resolution.duplicate_keys.is_empty() {
        println!("Duplicate keys, excluded from the output:");
        for key in &resolution.duplicate_keys {
            println!("  {}", key);
        }
        println!();
    }

    if !fetch {
        fs::write(outfile, render_bibliography(&resolution.resolved_entries))
            .with_context(|| format!("Failed to write output to {:?}", outfile))?;
        println!("Written '{}'", outfile.display());
        return Ok(());
    }

    let client = AdsClient::from_env()?;

    let needs_lookup: Vec<&BibEntry> = resolution
        .resolved_entries
        .iter()
        .filter(|entry| entry.get("adsurl").is_none())
        .collect();
    let identifiable = needs_lookup
        .iter()
        .filter(|entry| extract_paper_id(entry).is_some())
        .count();
    println!(" Missing ADS record: {}", needs_lookup.len());
    println!(" . identifiable    : {}", identifiable);
    println!(" . no identifier   : {}", needs_lookup.len() - identifiable);
    println!();

    println!("Fetching from NASA/ADS");

    let mut kept: Vec<String> = Vec::new();
    let mut missing: Vec<BibEntry> = Vec::new();
    let mut conflicts: Vec<(String, Vec<String>)> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();
    let total = resolution.resolved_entries.len();

    for (i, entry) in resolution.resolved_entries.iter().enumerate() {
        if entry.get("adsurl").is_some() {
            debug!("'{}' already carries an ADS record", entry.key);
            kept.push(entry.raw_text.trim_end().to_string());
            continue;
        }
        match reconcile(entry, &client) {
            Ok(outcome) if outcome.matched => {
                if !outcome.conflicts.is_empty() {
                    conflicts.push((entry.key.clone(), outcome.conflicts.clone()));
                }
                if outcome.changed {
                    kept.push(render_entry(&outcome.entry));
                } else {
                    kept.push(entry.raw_text.trim_end().to_string());
                }
            }
            Ok(_) => {
                info!("could not identify or resolve '{}' in NASA/ADS", entry.key);
                missing.push(entry.clone());
            }
            Err(err) => {
                warn!("lookup failed for '{}': {}", entry.key, err);
                failures.push((entry.key.clone(), err.to_string()));
                missing.push(entry.clone());
            }
        }
        info!("Done {} of {}", i + 1, total);
        thread::sleep(QUERY_SLEEP);
    }

    let mut output = kept.join("\n\n");
    if !output.is_empty() {
        output.push('\n');
    }
    fs::write(outfile, output)
        .with_context(|| format!("Failed to write output to {:?}", outfile))?;
    println!("Written '{}'", outfile.display());

    fs::write(missing_file, render_bibliography(&missing))
        .with_context(|| format!("Failed to write output to {:?}", missing_file))?;
    println!("Written '{}'", missing_file.display());

    if !conflicts.is_empty() {
        println!();
        println!("Merge conflicts (local values kept, review by hand):");
        for (key, fields) in &conflicts {
            println!("  {}: {}", key, fields.join(", "));
        }
    }
    if !failures.is_empty() {
        println!();
        println!("Lookup failures (entries kept in '{}'):", missing_file.display());
        for (key, err) in &failures {
            println!("  {}: {}", key, err);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_query(
    terms: Vec<String>,
    authors: Vec<String>,
    year: Option<String>,
    venue: Option<String>,
    database: String,
    fields: &str,
    sort: Option<String>,
    json: bool,
) -> Result<()> {
    let pure_bibcodes = authors.is_empty()
        && year.is_none()
        && venue.is_none()
        && !terms.is_empty()
        && terms.iter().all(|t| is_bibcode(t));

    if pure_bibcodes {
        debug!("Fetching bibcodes: {:?}", terms);
        let client = AdsClient::from_env()?;
        if json {
            let body = client.export_raw(&terms)?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            let export = client.export_bibtex(&terms)?;
            println!("{}", export.trim());
        }
        return Ok(());
    }

    let spec = QuerySpec {
        terms,
        authors,
        year,
        venue,
        database: Some(database),
        sort,
    };
    if !spec.is_valid() {
        return Err(BibCullError::InvalidQuery(
            "not enough information for a query; supply search terms or an author".to_string(),
        )
        .into());
    }
    debug!("Formatted query: {}", spec.to_query_string());

    let client = AdsClient::from_env()?;
    let body = client.search_query(
        &spec.to_query_string(),
        fields,
        None,
        spec.sort.as_deref(),
        spec.filter_query().as_deref(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let records = parse_search_response(&body)?;
    if records.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for record in &records {
        println!("{}", render_record(record));
    }
    Ok(())
}

fn canonical_name(author: &str) -> String {
    author
        .split(',')
        .rev()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Render one search result for the terminal: the common fields first with
/// friendly labels, then everything else the service returned.
fn render_record(record: &ExternalRecord) -> String {
    let fields = &record.entry.fields;
    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    let mut done: Vec<&str> = Vec::new();

    if let Some(authors) = fields.get("author") {
        let all: Vec<&str> = authors.split(" and ").collect();
        let mut formatted: Vec<String> =
            all.iter().take(MAX_AUTHORS).map(|a| canonical_name(a)).collect();
        if all.len() > MAX_AUTHORS {
            formatted.push("et al.".to_string());
        }
        rows.push(("Author".to_string(), vec![formatted.join("; ")]));
        done.push("author");
    }
    if let Some(date) = fields.get("date") {
        rows.push(("Date".to_string(), vec![date.clone()]));
        done.push("date");
    }
    if let Some(title) = fields.get("title") {
        rows.push(("Title".to_string(), vec![title.clone()]));
        done.push("title");
    }
    if let Some(bibcode) = fields.get("bibcode") {
        rows.push(("Bibcode".to_string(), vec![bibcode.clone()]));
        rows.push((
            "URL".to_string(),
            vec![format!("https://ui.adsabs.harvard.edu/abs/{}/abstract", bibcode)],
        ));
        done.push("bibcode");
    }
    if let Some(links) = fields.get("links_data") {
        let mut lines = Vec::new();
        for link in links.lines() {
            match serde_json::from_str::<serde_json::Value>(link) {
                Ok(data) => {
                    let link_type = data.get("type").and_then(|v| v.as_str()).unwrap_or("");
                    let url = data.get("url").and_then(|v| v.as_str()).unwrap_or("");
                    let access = data.get("access").and_then(|v| v.as_str()).unwrap_or("");
                    let suffix = if access.is_empty() {
                        String::new()
                    } else {
                        format!("({}) ", access)
                    };
                    lines.push(format!("{} {}{}", link_type, suffix, url));
                }
                Err(_) => lines.push(link.to_string()),
            }
        }
        rows.push(("Links".to_string(), lines));
        done.push("links_data");
    }

    let rest: BTreeMap<&String, &String> = fields
        .iter()
        .filter(|(name, _)| !done.contains(&name.as_str()))
        .collect();
    for (name, value) in rest {
        rows.push((name.clone(), vec![value.clone()]));
    }

    if rows.is_empty() {
        return String::new();
    }
    let padding = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
    let space = " ".repeat(padding);

    let mut text = String::new();
    for (label, lines) in &rows {
        text.push_str(&format!("{:>width$}: ", label, width = padding));
        if lines.len() > 1 {
            for (i, line) in lines.iter().enumerate() {
                if i == 0 {
                    text.push_str(&format!("- {}\n", line));
                } else {
                    text.push_str(&format!("{}  - {}\n", space, line));
                }
            }
        } else {
            text.push_str(&format!("{}\n", lines[0]));
        }
    }
    text
}
