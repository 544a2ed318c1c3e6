//! Catalog fetching and image list construction.
//!
//! Stage 1 of the build pipeline. Searches the configured folder on the media
//! service, assigns every asset its id, attaches a blur placeholder to each,
//! and produces the [`Manifest`] the generate stage renders.
//!
//! ## Ids
//!
//! An image's id is its position in the search result (0-based). The service
//! sorts descending by public id; the order is kept as-is and never re-sorted
//! here.
//!
//! ## Placeholders
//!
//! Placeholder requests go out concurrently, at most
//! [`fetch.max_concurrent`](crate::config::FetchConfig) at a time, and
//! complete in any order. Each result is keyed by the asset's public id and
//! every record looks its placeholder up by that key, so completion order has
//! no bearing on which record gets which preview.
//!
//! The batch is all-or-nothing: the first failed request fails the whole
//! fetch, outstanding requests are dropped, and no manifest is produced.
//!
//! ## Output
//!
//! ```text
//! .cloud-gal-temp/
//! ├── catalog.json              # Manifest: collection + image records
//! └── .placeholder-cache.json   # See crate::cache
//! ```

use crate::cache::{CacheStats, PlaceholderCache, placeholder_key};
use crate::config::{self, SiteConfig};
use crate::media::{MediaCatalog, MediaError, PlaceholderParams, SearchQuery};
use crate::types::{ImageList, ImageRecord, ModelError, RawAsset};
use futures_util::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// File name of the catalog manifest inside the temp directory.
pub const CATALOG_FILENAME: &str = "catalog.json";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog search failed: {0}")]
    CatalogFetch(#[source] MediaError),
    #[error("Placeholder fetch failed for {public_id}: {source}")]
    PlaceholderFetch {
        public_id: String,
        #[source]
        source: MediaError,
    },
    #[error("No placeholder resolved for {0}")]
    MissingPlaceholder(String),
    #[error("Invalid image list: {0}")]
    Model(#[from] ModelError),
}

/// Catalog manifest written by the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Folder the images were searched in.
    pub collection: String,
    pub images: ImageList,
}

/// Progress reported while fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Searched {
        collection: String,
        count: usize,
    },
    Placeholder {
        id: u32,
        public_id: String,
        status: PlaceholderStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStatus {
    Cached,
    Fetched,
}

#[derive(Debug)]
pub struct FetchResult {
    pub manifest: Manifest,
    pub cache_stats: CacheStats,
}

fn emit(events: &Option<Sender<FetchEvent>>, event: FetchEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is printing progress.
        let _ = tx.send(event);
    }
}

/// Fetch the catalog and build the image list.
///
/// `cache` is read before the placeholder batch and updated only when the
/// whole fetch succeeds.
#[tracing::instrument(skip_all, fields(folder = %config.media.folder))]
pub async fn fetch_catalog(
    client: &impl MediaCatalog,
    config: &SiteConfig,
    cache: &mut PlaceholderCache,
    events: Option<Sender<FetchEvent>>,
) -> Result<FetchResult, CatalogError> {
    let query = SearchQuery::new(config.media.folder.clone(), config.media.max_results);
    let mut assets = client
        .search(&query)
        .await
        .map_err(CatalogError::CatalogFetch)?;
    let cap = config.media.max_results as usize;
    if assets.len() > cap {
        tracing::warn!(returned = assets.len(), cap, "search returned more than requested");
        assets.truncate(cap);
    }
    emit(
        &events,
        FetchEvent::Searched {
            collection: config.media.folder.clone(),
            count: assets.len(),
        },
    );

    let params = PlaceholderParams::from(&config.placeholders);
    let concurrency = config::effective_concurrency(&config.fetch);
    let cloud_name = config.media.cloud_name.as_str();

    // Split into cache hits and requests to make; one request per public id.
    let mut placeholders: HashMap<String, String> = HashMap::new();
    let mut pending: Vec<(u32, String, &RawAsset)> = Vec::new();
    let mut live_keys = HashSet::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stats = CacheStats::default();
    for (id, asset) in (0u32..).zip(&assets) {
        let key = placeholder_key(cloud_name, asset, params);
        live_keys.insert(key.clone());
        if !seen.insert(asset.public_id.as_str()) {
            continue;
        }
        match cache.get(&key) {
            Some(data_url) => {
                stats.hit();
                placeholders.insert(asset.public_id.clone(), data_url.to_string());
                emit(
                    &events,
                    FetchEvent::Placeholder {
                        id,
                        public_id: asset.public_id.clone(),
                        status: PlaceholderStatus::Cached,
                    },
                );
            }
            None => pending.push((id, key, asset)),
        }
    }

    tracing::debug!(
        cached = stats.hits,
        requests = pending.len(),
        concurrency,
        "fetching placeholders"
    );
    let fetched: Vec<(String, &RawAsset, String)> = stream::iter(pending)
        .map(|(id, key, asset)| async move {
            let data_url = client
                .fetch_placeholder(asset, params)
                .await
                .map_err(|source| CatalogError::PlaceholderFetch {
                    public_id: asset.public_id.clone(),
                    source,
                })?;
            Ok::<_, CatalogError>((id, key, asset, data_url))
        })
        .buffer_unordered(concurrency)
        .inspect_ok(|(id, _, asset, _)| {
            emit(
                &events,
                FetchEvent::Placeholder {
                    id: *id,
                    public_id: asset.public_id.clone(),
                    status: PlaceholderStatus::Fetched,
                },
            )
        })
        .map_ok(|(_, key, asset, data_url)| (key, asset, data_url))
        .try_collect()
        .await?;

    for (key, asset, data_url) in fetched {
        stats.miss();
        cache.insert(key, asset.public_id.clone(), data_url.clone());
        placeholders.insert(asset.public_id.clone(), data_url);
    }
    cache.retain_keys(&live_keys);

    let images = assemble(assets, &placeholders)?;
    Ok(FetchResult {
        manifest: Manifest {
            collection: config.media.folder.clone(),
            images,
        },
        cache_stats: stats,
    })
}

/// Turn ordered assets into records: `id` is the position, the placeholder
/// is looked up by public id.
pub fn assemble(
    assets: Vec<RawAsset>,
    placeholders: &HashMap<String, String>,
) -> Result<ImageList, CatalogError> {
    let records = (0u32..)
        .zip(assets)
        .map(|(id, asset)| {
            let blur_data_url = placeholders
                .get(&asset.public_id)
                .cloned()
                .ok_or_else(|| CatalogError::MissingPlaceholder(asset.public_id.clone()))?;
            Ok(ImageRecord {
                id,
                public_id: asset.public_id,
                format: asset.format,
                width: asset.width,
                height: asset.height,
                blur_data_url,
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;
    Ok(ImageList::new(records)?)
}
