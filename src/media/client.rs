//! Media catalog client trait and shared types.
//!
//! The [`MediaCatalog`] trait defines the two operations the catalog builder
//! needs from a media service: search a folder, and fetch a blur placeholder
//! for one asset. The production implementation is
//! [`CloudinaryCatalog`](super::cloudinary::CloudinaryCatalog).

use crate::types::RawAsset;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Media service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// A folder search, sorted descending by public id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub folder: String,
    pub max_results: u32,
}

impl SearchQuery {
    pub fn new(folder: impl Into<String>, max_results: u32) -> Self {
        Self {
            folder: folder.into(),
            max_results,
        }
    }

    /// Search expression matching every asset in the folder.
    pub fn expression(&self) -> String {
        format!("folder:{}/*", self.folder)
    }
}

/// Parameters of the tiny JPEG a placeholder is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderParams {
    pub width: u32,
    pub quality: u32,
}

impl From<&crate::config::PlaceholderConfig> for PlaceholderParams {
    fn from(config: &crate::config::PlaceholderConfig) -> Self {
        Self {
            width: config.width,
            quality: config.quality,
        }
    }
}

/// Trait for media catalog clients.
#[async_trait]
pub trait MediaCatalog: Sync {
    /// All assets in the queried folder, in the service's sort order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawAsset>, MediaError>;

    /// A `data:` URI holding a low-resolution preview of `asset`.
    async fn fetch_placeholder(
        &self,
        asset: &RawAsset,
        params: PlaceholderParams,
    ) -> Result<String, MediaError>;
}
