//! Cloudinary implementation of [`MediaCatalog`].
//!
//! | Operation | Request |
//! |---|---|
//! | Search | `POST {api_base}/{cloud}/resources/search` (basic auth, JSON body) |
//! | Placeholder | `GET {delivery_base}/{cloud}/image/upload/f_jpg,w_8,q_70/{id}.{fmt}` |
//!
//! Every request carries the configured timeout. Nothing is retried.

use super::client::{MediaCatalog, MediaError, PlaceholderParams, SearchQuery};
use super::urls::Delivery;
use crate::config::{Credentials, SiteConfig};
use crate::types::RawAsset;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest response body excerpt kept in a [`MediaError::Status`].
const ERROR_BODY_LIMIT: usize = 200;

pub struct CloudinaryCatalog {
    client: reqwest::Client,
    delivery: Delivery,
    credentials: Credentials,
}

impl CloudinaryCatalog {
    pub fn new(config: &SiteConfig, credentials: Credentials) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_secs))
            .user_agent(concat!("cloud-gal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            delivery: Delivery::new(&config.media),
            credentials,
        })
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    expression: String,
    sort_by: [SortField; 1],
    max_results: u32,
}

#[derive(Debug, Serialize)]
struct SortField {
    public_id: &'static str,
}

impl SearchRequest {
    fn for_query(query: &SearchQuery) -> Self {
        Self {
            expression: query.expression(),
            sort_by: [SortField { public_id: "desc" }],
            max_results: query.max_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    resources: Vec<RawAsset>,
}

/// Decode a search response body into assets, keeping the service's order.
pub(crate) fn parse_search_response(body: &str) -> Result<Vec<RawAsset>, MediaError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| MediaError::Malformed(e.to_string()))?;
    Ok(response.resources)
}

/// Wrap JPEG bytes as a `data:` URI.
pub(crate) fn jpeg_data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(MediaError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MediaCatalog for CloudinaryCatalog {
    #[tracing::instrument(skip(self), fields(folder = %query.folder))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawAsset>, MediaError> {
        let response = self
            .client
            .post(self.delivery.search_endpoint())
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .json(&SearchRequest::for_query(query))
            .send()
            .await?;
        let body = error_for_status(response).await?.text().await?;
        let assets = parse_search_response(&body)?;
        tracing::debug!(count = assets.len(), "search complete");
        Ok(assets)
    }

    #[tracing::instrument(skip(self, asset), fields(public_id = %asset.public_id))]
    async fn fetch_placeholder(
        &self,
        asset: &RawAsset,
        params: PlaceholderParams,
    ) -> Result<String, MediaError> {
        let url = self.delivery.placeholder_source(asset, params);
        let response = self.client.get(&url).send().await?;
        let bytes = error_for_status(response).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(MediaError::Malformed(format!("empty placeholder from {url}")));
        }
        tracing::trace!(bytes = bytes.len(), "placeholder fetched");
        Ok(jpeg_data_url(&bytes))
    }
}
