//! Solr-backed catalog.
//!
//! Queries the repository's own Solr core (`select`, JSON writer) for media
//! objects modified inside a window and for exact-match lookups.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use super::paging::{collect_pages, Page};
use super::{Catalog, CatalogDoc};
use crate::config::IndexerConfig;

/// Every listing is restricted to media objects.
const MEDIA_OBJECT_QUERY: &str = "+has_model_ssim:\"MediaObject\"";

/// Modification time field used for the incremental window.
const MODIFIED_FIELD: &str = "system_modified_dtsi";

/// Page order. Must not depend on anything an update changes, or records
/// edited mid-scan shift across page boundaries and get skipped.
const PAGE_SORT: &str = "id asc";

pub struct SolrCatalog {
    base_url: String,
    http: HttpClient,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectBody,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    #[serde(rename = "numFound")]
    num_found: usize,
    #[serde(default)]
    docs: Vec<CatalogDoc>,
}

impl SolrCatalog {
    pub fn new(base_url: &str, page_size: usize, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            page_size,
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        Self::new(&config.catalog.url, config.catalog.page_size, config.timeout())
    }

    /// Run one page of a query.
    fn select(&self, query: &str, start: usize, rows: usize) -> Result<Page> {
        let url = format!("{}/select", self.base_url);
        let start_param = start.to_string();
        let rows_param = rows.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("start", start_param.as_str()),
                ("rows", rows_param.as_str()),
                ("sort", PAGE_SORT),
                ("wt", "json"),
            ])
            .send()
            .with_context(|| format!("Failed to query catalog at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Catalog query failed ({}): {}", status, body);
        }

        let parsed: SelectResponse = response
            .json()
            .with_context(|| "Failed to parse catalog response")?;

        Ok(Page {
            num_found: parsed.response.num_found,
            docs: parsed.response.docs,
        })
    }

    fn query_all(&self, query: &str) -> Result<Vec<CatalogDoc>> {
        tracing::debug!("Searching catalog: {}", query);
        collect_pages(self.page_size, |start, rows| self.select(query, start, rows))
    }
}

impl Catalog for SolrCatalog {
    fn list_changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CatalogDoc>> {
        self.query_all(&changed_since_query(since.as_ref()))
    }

    fn find(&self, field: &str, value: &str) -> Result<Vec<CatalogDoc>> {
        self.query_all(&field_query(field, value))
    }
}

/// Catalog date literal: UTC, millisecond precision, `Z` suffix.
pub fn solr_date(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Media objects modified at or after `since` up to query time.
pub fn changed_since_query(since: Option<&DateTime<Utc>>) -> String {
    match since {
        None => MEDIA_OBJECT_QUERY.to_string(),
        Some(at) => format!(
            "{} +{}:[{} TO NOW]",
            MEDIA_OBJECT_QUERY,
            MODIFIED_FIELD,
            solr_date(at)
        ),
    }
}

/// Exact phrase match on one field.
pub fn field_query(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{}:\"{}\"", field, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    #[test]
    fn test_full_listing_query() {
        assert_eq!(changed_since_query(None), "+has_model_ssim:\"MediaObject\"");
    }

    #[test]
    fn test_windowed_query_is_inclusive_to_now() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            changed_since_query(Some(&at)),
            "+has_model_ssim:\"MediaObject\" +system_modified_dtsi:[2024-05-01T12:30:00.000Z TO NOW]"
        );
    }

    #[test]
    fn test_field_query_escapes_quotes() {
        assert_eq!(field_query("id", "avalon:1"), "id:\"avalon:1\"");
        assert_eq!(field_query("name_ssi", "a \"b\""), "name_ssi:\"a \\\"b\\\"\"");
    }

    #[test]
    fn test_list_walks_pages() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", "/select")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("rows".into(), "2".into()),
                Matcher::UrlEncoded("sort".into(), "id asc".into()),
                Matcher::UrlEncoded("q".into(), "+has_model_ssim:\"MediaObject\"".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":{"numFound":3,"start":0,"docs":[{"id":"a"},{"id":"b"}]}}"#)
            .create();
        let second = server
            .mock("GET", "/select")
            .match_query(Matcher::UrlEncoded("start".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":{"numFound":3,"start":2,"docs":[{"id":"c"}]}}"#)
            .create();

        let catalog = SolrCatalog::new(&server.url(), 2, Duration::from_secs(5)).unwrap();
        let docs = catalog.list_changed_since(None).unwrap();

        first.assert();
        second.assert();
        let ids: Vec<_> = docs.iter().filter_map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_every_page_sorted_by_id() {
        let mut server = mockito::Server::new();
        let mut page = |start: &str, body: &str| {
            server
                .mock("GET", "/select")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("start".into(), start.into()),
                    Matcher::UrlEncoded("sort".into(), "id asc".into()),
                ]))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(body.to_string())
                .create()
        };
        let first = page("0", r#"{"response":{"numFound":2,"docs":[{"id":"a"}]}}"#);
        let second = page("1", r#"{"response":{"numFound":2,"docs":[{"id":"b"}]}}"#);

        let catalog = SolrCatalog::new(&server.url(), 1, Duration::from_secs(5)).unwrap();
        let docs = catalog.find("isMemberOfCollection_ssim", "c1").unwrap();

        first.assert();
        second.assert();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_server_error_fails_listing() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/select")
            .with_status(500)
            .with_body("boom")
            .create();

        let catalog = SolrCatalog::new(&server.url(), 100, Duration::from_secs(5)).unwrap();
        assert!(catalog.find("id", "a").is_err());
    }
}
