//! Solr update handler client.

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client as HttpClient;
use std::time::Duration;

use super::IndexPublisher;
use crate::config::IndexerConfig;
use crate::error::IndexerError;

pub struct SolrPublisher {
    update_url: String,
    http: HttpClient,
}

impl SolrPublisher {
    pub fn new(update_url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            update_url: update_url.to_string(),
            http,
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        Self::new(config.update_url()?, config.timeout())
    }

    /// Administrative action passed as a `stream.body` command.
    fn action(&self, command: &str) -> Result<()> {
        let body = format!("<{}/>", command);
        let response = self
            .http
            .get(&self.update_url)
            .query(&[("stream.body", body.as_str())])
            .send()
            .with_context(|| format!("Failed to send {} to {}", command, self.update_url))?;

        if !response.status().is_success() {
            return Err(IndexerError::IndexRejected {
                action: command.to_string(),
                status: response.status().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl IndexPublisher for SolrPublisher {
    fn publish(&self, add_xml: &str) -> Result<()> {
        let part = Part::bytes(add_xml.as_bytes().to_vec())
            .file_name("add.xml")
            .mime_str("text/xml; charset=UTF-8")?;
        let form = Form::new().part("add.xml", part);

        let response = self
            .http
            .post(&self.update_url)
            .multipart(form)
            .send()
            .with_context(|| format!("Failed to post document to {}", self.update_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(IndexerError::IndexRejected {
                action: "add".to_string(),
                status: format!("{} {}", status, body.trim()),
            }
            .into());
        }
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.action("commit")?;
        tracing::info!("Committed changes");
        Ok(())
    }

    fn optimize(&self) -> Result<()> {
        self.action("optimize")?;
        tracing::info!("Optimized index");
        Ok(())
    }
}
