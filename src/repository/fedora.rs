//! HTTP repository client.

use anyhow::{Context, Result};
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::StatusCode;
use std::time::Duration;

use super::{object_path, Repository};
use crate::config::IndexerConfig;
use crate::error::IndexerError;

pub struct FedoraRepository {
    base_url: String,
    username: String,
    password: String,
    http: HttpClient,
}

impl FedoraRepository {
    pub fn new(base_url: &str, username: &str, password: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        let repo = &config.repository;
        Self::new(&repo.url, &repo.username, &repo.password, config.timeout())
    }

    fn url_for(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, object_path(id))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        }
    }

    fn fetch(&self, url: &str, id: &str) -> Result<Vec<u8>> {
        let response = self
            .authed(self.http.get(url))
            .send()
            .with_context(|| format!("Failed to fetch {} from repository", id))?;

        let status = response.status();
        if is_gone(status) {
            return Err(IndexerError::NotFound(id.to_string()).into());
        }
        if !status.is_success() {
            return Err(IndexerError::RepositoryStatus {
                id: id.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read {} from repository", id))?;
        Ok(bytes.to_vec())
    }
}

fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

impl Repository for FedoraRepository {
    fn get(&self, id: &str) -> Result<Vec<u8>> {
        self.fetch(&self.url_for(id), id)
    }

    fn datastream(&self, id: &str, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.url_for(id), name);
        self.fetch(&url, &format!("{}/{}", id, name))
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let url = self.url_for(id);
        let response = self
            .authed(self.http.head(&url))
            .send()
            .with_context(|| format!("Failed to test existence of {}", id))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if is_gone(status) {
            Ok(false)
        } else {
            Err(IndexerError::RepositoryStatus {
                id: id.to_string(),
                status: status.as_u16(),
            }
            .into())
        }
    }
}
