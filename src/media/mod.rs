//! Media service access.
//!
//! | Operation | Where |
//! |---|---|
//! | **Search** a folder | [`MediaCatalog::search`] |
//! | **Placeholder** for one asset | [`MediaCatalog::fetch_placeholder`] |
//! | **Delivery URLs** (thumbnail, lightbox, download) | [`urls`] |
//!
//! The module is split into:
//! - **Client**: the [`MediaCatalog`] trait the catalog builder talks to
//! - **Cloudinary**: the HTTP implementation ([`CloudinaryCatalog`])
//! - **URLs**: pure functions building delivery and download links

pub mod client;
pub mod cloudinary;
pub mod urls;

pub use client::{MediaCatalog, MediaError, PlaceholderParams, SearchQuery};
pub use cloudinary::CloudinaryCatalog;
pub use urls::Delivery;
