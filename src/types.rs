//! Shared types used across both pipeline stages.
//!
//! [`ImageRecord`] and [`ImageList`] are serialized into the catalog manifest
//! by the fetch stage and read back by the generate stage, so the two stages
//! must agree on them exactly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Image id {found} at position {position} (ids must be 0..N-1 in order)")]
    NonDenseId { position: usize, found: u32 },
    #[error("Image {0} has no blur placeholder")]
    MissingPlaceholder(String),
}

/// Metadata for one asset as reported by the media service search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAsset {
    pub public_id: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Asset version; changes whenever the asset is replaced upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// One photo in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Position in the catalog result (0-based).
    pub id: u32,
    /// The media service's handle for the asset.
    pub public_id: String,
    /// File extension, e.g. `jpg`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// `data:image/jpeg;base64,...` preview shown while the image loads.
    pub blur_data_url: String,
}

impl ImageRecord {
    /// Height matching `width` at this record's aspect ratio.
    pub fn scaled_height(&self, width: u32) -> u32 {
        if self.width == 0 {
            return width;
        }
        ((width as u64 * self.height as u64) / self.width as u64) as u32
    }
}

/// The ordered, read-only list of records for one build.
///
/// Construction checks that ids are exactly `0..N-1` in list order and that
/// every record carries a placeholder, so a list that exists is always safe
/// to render. Deserialization goes through the same check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ImageRecord>", into = "Vec<ImageRecord>")]
pub struct ImageList {
    records: Vec<ImageRecord>,
}

impl ImageList {
    pub fn new(records: Vec<ImageRecord>) -> Result<Self, ModelError> {
        for (position, record) in records.iter().enumerate() {
            if record.id as usize != position {
                return Err(ModelError::NonDenseId {
                    position,
                    found: record.id,
                });
            }
            if record.blur_data_url.is_empty() {
                return Err(ModelError::MissingPlaceholder(record.public_id.clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn get(&self, id: u32) -> Option<&ImageRecord> {
        self.records.get(id as usize)
    }

    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Previous and next ids around `id`, `None` at either end.
    pub fn neighbors(&self, id: u32) -> (Option<u32>, Option<u32>) {
        let prev = id.checked_sub(1).filter(|p| self.contains(*p));
        let next = id.checked_add(1).filter(|n| self.contains(*n));
        (prev, next)
    }

    /// Records within `radius` positions of `id`, in list order.
    pub fn window(&self, id: u32, radius: u32) -> &[ImageRecord] {
        if self.is_empty() {
            return &[];
        }
        let start = id.saturating_sub(radius) as usize;
        let end = (id.saturating_add(radius) as usize + 1).min(self.records.len());
        if start >= end {
            return &[];
        }
        &self.records[start..end]
    }
}

impl TryFrom<Vec<ImageRecord>> for ImageList {
    type Error = ModelError;

    fn try_from(records: Vec<ImageRecord>) -> Result<Self, Self::Error> {
        Self::new(records)
    }
}

impl From<ImageList> for Vec<ImageRecord> {
    fn from(list: ImageList) -> Self {
        list.records
    }
}

impl<'a> IntoIterator for &'a ImageList {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
