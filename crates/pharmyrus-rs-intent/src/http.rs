//! HTTP client for the remote document store.
//!
//! Wire contract:
//! - `GET {base}/documents/{id}` answers `{"revision": n, "fields": {...}}`,
//!   or `404` when the document does not exist.
//! - `PATCH {base}/documents/{id}` with body `{"fields": {...}}` sets the
//!   given top-level fields and answers `{"revision": n}`. An `If-Match`
//!   header carries the expected revision; a mismatch answers `412`.

use crate::document::{Document, DocumentStore, Precondition};
use crate::error::IntentStoreError;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    fields: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    revision: u64,
}

/// `DocumentStore` speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpDocumentStore {
    /// Build a client with the given request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IntentStoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(
            "initialized http document store (base_url={}, timeout_ms={})",
            base_url,
            timeout.as_millis()
        );
        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/documents/{id}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self, id: &str) -> Result<Option<Document>, IntentStoreError> {
        let url = self.document_url(id);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();
        debug!("fetched document (url={url}, status={status})");
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IntentStoreError::Unavailable(format!(
                "GET {url} returned {status}"
            )));
        }
        Ok(Some(response.json::<Document>().await?))
    }

    async fn merge(
        &self,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<u64, IntentStoreError> {
        let url = self.document_url(id);
        let mut request = self
            .authorize(self.client.patch(&url))
            .json(&MergeRequest { fields: &fields });
        if let Precondition::Revision(revision) = precondition {
            request = request.header(header::IF_MATCH, revision.to_string());
        }
        let response = request.send().await?;
        let status = response.status();
        debug!(
            "merged document fields (url={url}, status={status}, fields={})",
            fields.len()
        );
        if status == StatusCode::PRECONDITION_FAILED {
            return Err(IntentStoreError::Conflict(id.to_string()));
        }
        if !status.is_success() {
            return Err(IntentStoreError::Unavailable(format!(
                "PATCH {url} returned {status}"
            )));
        }
        Ok(response.json::<MergeResponse>().await?.revision)
    }
}
