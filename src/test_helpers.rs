//! Shared test utilities for the cloud-gal test suite.
//!
//! Builders for the data that flows between the stages (`RawAsset`,
//! `ImageRecord`, `ImageList`) plus a valid `SiteConfig`, so unit tests can
//! exercise pipeline logic without a network or a project directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let images = sample_list(3);
//! assert_eq!(public_ids(&images), vec!["photo_0", "photo_1", "photo_2"]);
//!
//! let config = test_config();
//! assert_eq!(config.media.cloud_name, "demo");
//! ```

use crate::config::SiteConfig;
use crate::types::{ImageList, ImageRecord, RawAsset};

// =========================================================================
// Config
// =========================================================================

/// A config that passes validation: cloud `demo`, folder `weddings`, every
/// other setting at its default.
pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.media.cloud_name = "demo".to_string();
    config.media.folder = "weddings".to_string();
    config.validate().unwrap();
    config
}

// =========================================================================
// Assets and records
// =========================================================================

/// A 3000x2000 JPEG asset at version 1.
pub fn sample_asset(public_id: &str) -> RawAsset {
    RawAsset {
        public_id: public_id.to_string(),
        format: "jpg".to_string(),
        width: 3000,
        height: 2000,
        version: Some(1),
    }
}

/// One [`sample_asset`] per id, in the given order.
pub fn sample_assets(public_ids: &[&str]) -> Vec<RawAsset> {
    public_ids.iter().map(|id| sample_asset(id)).collect()
}

/// A record with a non-empty placeholder, shaped like [`sample_asset`].
pub fn sample_record(id: u32, public_id: &str) -> ImageRecord {
    ImageRecord {
        id,
        public_id: public_id.to_string(),
        format: "jpg".to_string(),
        width: 3000,
        height: 2000,
        blur_data_url: "data:image/jpeg;base64,AA==".to_string(),
    }
}

/// A valid list of `n` records named `photo_0`, `photo_1`, ...
pub fn sample_list(n: u32) -> ImageList {
    let records = (0..n)
        .map(|id| sample_record(id, &format!("photo_{id}")))
        .collect();
    ImageList::new(records).unwrap()
}

// =========================================================================
// Extractors
// =========================================================================

/// Public ids in list order.
pub fn public_ids(images: &ImageList) -> Vec<&str> {
    images.iter().map(|r| r.public_id.as_str()).collect()
}
