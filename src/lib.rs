//! # cloud-gal
//!
//! A static photo gallery for a folder of images hosted on a media service.
//! The media service stores the originals and renders every size on request;
//! this crate turns the folder into a fast, linkable gallery page with a
//! lightbox, without downloading or re-encoding a single image.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! cloud-gal processes a collection through two independent stages, joined
//! by a JSON manifest:
//!
//! ```text
//! 1. Fetch     media service  →  catalog.json   (search + blur placeholders)
//! 2. Generate  catalog.json   →  dist/          (final HTML site)
//! ```
//!
//! Only the fetch stage talks to the network. The manifest is human-readable,
//! so a broken page can be traced to either the data or the rendering, and
//! generate can be re-run offline while working on the site text or theme.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Stage 1: searches the collection, fetches placeholders concurrently, builds the image list |
//! | [`generate`] | Stage 2: renders the gallery and permalink pages with Maud |
//! | [`media`] | Media service client trait, Cloudinary implementation, delivery URL synthesis |
//! | [`cache`] | Content-addressed placeholder cache shared between builds |
//! | [`selection`] | Location → lightbox selection, navigation controller, last-viewed store |
//! | [`config`] | Layered `config.toml` loading, validation, and CSS generation |
//! | [`types`] | Records and the validated image list shared between stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ids Are Positions
//!
//! An image's id is its position in the search result, which the service
//! sorts by public id. Ids are dense (`0..N`), which keeps permalinks short
//! and makes previous/next a matter of arithmetic. The cost is that adding a
//! photo can shift the ids after it; the gallery is rebuilt from scratch on
//! every deploy, so every page and link in one build agrees.
//!
//! ## Placeholders Keyed By Asset
//!
//! Placeholder requests complete in any order. Results are keyed by public
//! id and attached by lookup, never by completion position, so a slow
//! response can't end up under the wrong photo.
//!
//! ## One Selection Function
//!
//! The lightbox state is never stored; it is derived from the location by
//! [`selection::Selection::from_location`]. The generator renders permalink
//! pages through it and the navigation controller re-derives it after every
//! transition, so a deep link and an in-page click can't disagree.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors, interpolation is
//! escaped by default, and there is no template directory to ship.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod media;
pub mod output;
pub mod selection;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
