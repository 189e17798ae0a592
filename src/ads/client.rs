//! HTTP transport for the NASA/ADS API.
//!
//! Authentication is a Bearer token from the `ADS_TOKEN` environment
//! variable. The base URL can be overridden with `ADS_BASE_URL` for tests,
//! and `API_TIMEOUT_SECS` caps the retry budget for transient failures.

use backoff::{retry, ExponentialBackoff};
use log::{debug, info};
use once_cell::sync::Lazy;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::ads::{parse_search_response, CanonicalLookup, ExternalRecord, QuerySpec};
use crate::bib::parse_bibliography;
use crate::error::BibCullError;
use crate::merge::PaperId;

const DEFAULT_BASE_URL: &str = "https://api.adsabs.harvard.edu";

/// Default fields requested for interactive searches.
pub const DEFAULT_SEARCH_FIELDS: &str = "author,date,pub,title,bibcode,citation_count,links_data";

// One lazily-initialized client for all API calls, for connection pooling.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

pub struct AdsClient {
    token: String,
    base_url: String,
    retry_budget: Duration,
}

impl AdsClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            retry_budget: Duration::from_secs(30),
        }
    }

    /// Cap the total time spent retrying transient failures.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Build a client from the environment. A missing `ADS_TOKEN` is an
    /// error up front, before any request is attempted.
    pub fn from_env() -> Result<Self, BibCullError> {
        let token = std::env::var("ADS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(BibCullError::MissingToken)?;
        let base_url =
            std::env::var("ADS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let budget = std::env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Ok(Self::new(token, base_url).with_retry_budget(Duration::from_secs(budget)))
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(self.retry_budget),
            ..Default::default()
        }
    }

    /// Run a search query. `rows` bounds the result count when given;
    /// `sort` and `filter` map to the service's `sort` and `fq` parameters.
    pub fn search_query(
        &self,
        q: &str,
        fields: &str,
        rows: Option<usize>,
        sort: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Value, BibCullError> {
        let url = format!("{}/v1/search/query", self.base_url);
        let rows = rows.map(|r| r.to_string());
        let mut params: Vec<(&str, &str)> = vec![("q", q), ("fl", fields)];
        if let Some(rows) = rows.as_deref() {
            params.push(("rows", rows));
        }
        if let Some(sort) = sort {
            params.push(("sort", sort));
        }
        if let Some(filter) = filter {
            params.push(("fq", filter));
        }
        debug!("Making query: {} q={}", url, q);

        let operation = || {
            let response = HTTP_CLIENT
                .get(&url)
                .bearer_auth(&self.token)
                .query(&params)
                .send()
                .map_err(|e| backoff::Error::transient(BibCullError::NetworkError(e)))?;
            json_body(response)
        };
        retry(self.backoff(), operation).map_err(unwrap_backoff)
    }

    /// Export BibTeX for a list of bibcodes, returning the raw response.
    pub fn export_raw(&self, bibcodes: &[String]) -> Result<Value, BibCullError> {
        let url = format!("{}/v1/export/bibtex", self.base_url);
        let payload = serde_json::json!({
            "bibcode": bibcodes,
            "sort": "first_author asc",
        });
        debug!("Making query: {}", url);

        let operation = || {
            let response = HTTP_CLIENT
                .post(&url)
                .bearer_auth(&self.token)
                .json(&payload)
                .send()
                .map_err(|e| backoff::Error::transient(BibCullError::NetworkError(e)))?;
            json_body(response)
        };
        retry(self.backoff(), operation).map_err(unwrap_backoff)
    }

    /// Export BibTeX for a list of bibcodes as text.
    pub fn export_bibtex(&self, bibcodes: &[String]) -> Result<String, BibCullError> {
        let body = self.export_raw(bibcodes)?;
        body.get("export")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BibCullError::ApiError("export response missing 'export' field".to_string())
            })
    }
}

impl CanonicalLookup for AdsClient {
    fn lookup(&self, id: &PaperId) -> Result<Option<ExternalRecord>, BibCullError> {
        let body = self.search_query(&id.to_query(), "bibcode", Some(1), None, None)?;
        let bibcode = body
            .get("response")
            .and_then(|r| r.get("docs"))
            .and_then(|d| d.as_array())
            .and_then(|docs| docs.first())
            .and_then(|doc| doc.get("bibcode"))
            .and_then(|b| b.as_str())
            .map(str::to_string);
        let bibcode = match bibcode {
            Some(bibcode) => bibcode,
            None => {
                info!("no ADS match for {}", id);
                return Ok(None);
            }
        };

        let export = self.export_bibtex(std::slice::from_ref(&bibcode))?;
        let mut entries = parse_bibliography(&export);
        if entries.is_empty() {
            return Err(BibCullError::ApiError(format!(
                "export for {} contained no parseable entry",
                bibcode
            )));
        }
        Ok(Some(ExternalRecord {
            bibcode,
            entry: entries.remove(0),
        }))
    }

    fn search(&self, query: &QuerySpec) -> Result<Vec<ExternalRecord>, BibCullError> {
        if !query.is_valid() {
            return Err(BibCullError::InvalidQuery(
                "supply at least one search term or author".to_string(),
            ));
        }
        let body = self.search_query(
            &query.to_query_string(),
            DEFAULT_SEARCH_FIELDS,
            None,
            query.sort.as_deref(),
            query.filter_query().as_deref(),
        )?;
        parse_search_response(&body)
    }
}

fn json_body(response: Response) -> Result<Value, backoff::Error<BibCullError>> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<Value>()
            .map_err(|e| backoff::Error::permanent(BibCullError::NetworkError(e)))
    } else if status.is_server_error() {
        Err(backoff::Error::transient(BibCullError::ApiError(format!(
            "ADS returned status {}",
            status
        ))))
    } else {
        Err(backoff::Error::permanent(BibCullError::ApiError(format!(
            "ADS returned status {}",
            status
        ))))
    }
}

fn unwrap_backoff(err: backoff::Error<BibCullError>) -> BibCullError {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}
