//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every photo is its semantic identity (positional index and name),
//! with public ids and output paths shown as secondary context. This makes
//! the output readable as an inventory of the collection while still letting
//! users trace a page back to the asset it shows.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! weddings (3 photos)
//!     001 img_0003: cached
//!     003 img_0001: fetched
//!     002 img_0002: fetched
//! Placeholders: 1 cached, 2 fetched (3 total)
//! Catalog: 3 photos → .cloud-gal-temp/catalog.json
//! ```
//!
//! Placeholder lines appear in completion order, not index order.
//!
//! ## Generate
//!
//! ```text
//! Gallery → index.html
//!     001 → p/0/index.html
//!     002 → p/1/index.html
//! Assets: 1 file copied
//!
//! Generated 1 gallery, 2 photo pages → dist
//! ```
//!
//! ## Check
//!
//! ```text
//! Collection
//!     Cloud: demo
//!     Folder: weddings (up to 400 photos)
//!     Search: https://api.cloudinary.com/v1_1/demo/resources/search
//!     Download all: https://api.cloudinary.com/v1_1/demo/utilities/download_folder?path=weddings
//! Images
//!     Thumbnails: 720px, lightbox: 1920px, filmstrip: 180px
//!     Placeholders: 8px at quality 70
//! Fetch
//!     16 concurrent requests, 30s timeout
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::catalog::{FetchEvent, FetchResult, PlaceholderStatus};
use crate::config::{self, SiteConfig};
use crate::generate::GeneratedSite;
use crate::media::Delivery;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based image id as a 1-based, 3-digit zero-padded index.
fn format_index(id: u32) -> String {
    format!("{:0>3}", id as u64 + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Last path segment of a public id; the folder is shown once in the header.
fn display_name(public_id: &str) -> &str {
    public_id.rsplit('/').next().unwrap_or(public_id)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Stage 1: Fetch output
// ============================================================================

/// Format a single fetch progress event as display lines.
pub fn format_fetch_event(event: &FetchEvent) -> Vec<String> {
    match event {
        FetchEvent::Searched { collection, count } => {
            vec![format!("{} ({})", collection, plural(*count, "photo", "photos"))]
        }
        FetchEvent::Placeholder {
            id,
            public_id,
            status,
        } => {
            let status = match status {
                PlaceholderStatus::Cached => "cached",
                PlaceholderStatus::Fetched => "fetched",
            };
            vec![format!(
                "{}{} {}: {}",
                indent(1),
                format_index(*id),
                display_name(public_id),
                status
            )]
        }
    }
}

/// Format the closing summary of a fetch run.
pub fn format_fetch_summary(result: &FetchResult, manifest_path: &Path) -> Vec<String> {
    let count = result.manifest.images.len();
    vec![
        format!("Placeholders: {}", result.cache_stats),
        format!(
            "Catalog: {} \u{2192} {}",
            plural(count, "photo", "photos"),
            manifest_path.display()
        ),
    ]
}

pub fn print_fetch_summary(result: &FetchResult, manifest_path: &Path) {
    for line in format_fetch_summary(result, manifest_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output showing generated HTML files.
pub fn format_generate_output(site: &GeneratedSite) -> Vec<String> {
    let mut lines = Vec::new();
    let mut photo_pages = 0;

    for page in &site.pages {
        match permalink_id(page) {
            Some(id) => {
                lines.push(format!("{}{} \u{2192} {}", indent(1), format_index(id), page));
                photo_pages += 1;
            }
            None => lines.push(format!("Gallery \u{2192} {}", page)),
        }
    }

    if site.assets_copied > 0 {
        lines.push(format!(
            "Assets: {} copied",
            plural(site.assets_copied, "file", "files")
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated 1 gallery, {} \u{2192} {}",
        plural(photo_pages, "photo page", "photo pages"),
        site.output_dir.display()
    ));
    lines
}

/// Image id of a `p/{id}/index.html` output path.
fn permalink_id(page: &str) -> Option<u32> {
    page.strip_prefix("p/")?
        .strip_suffix("/index.html")?
        .parse()
        .ok()
}

/// Print generate output to stdout.
pub fn print_generate_output(site: &GeneratedSite) {
    for line in format_generate_output(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the resolved configuration. Needs no network or credentials.
pub fn format_check_output(config: &SiteConfig) -> Vec<String> {
    let delivery = Delivery::new(&config.media);
    let media = &config.media;
    let images = &config.images;
    let mut lines = vec![
        "Collection".to_string(),
        format!("{}Cloud: {}", indent(1), media.cloud_name),
        format!(
            "{}Folder: {} (up to {} photos)",
            indent(1),
            media.folder,
            media.max_results
        ),
        format!("{}Search: {}", indent(1), delivery.search_endpoint()),
        format!(
            "{}Download all: {}",
            indent(1),
            delivery.download_folder(&media.folder)
        ),
    ];
    if let Some(review) = &config.site.review {
        lines.push(format!("{}Review: {} ({})", indent(1), review.label, review.url));
    }
    lines.push("Images".to_string());
    lines.push(format!(
        "{}Thumbnails: {}px, lightbox: {}px, filmstrip: {}px",
        indent(1),
        images.thumbnail_width,
        images.lightbox_width,
        images.filmstrip_width
    ));
    lines.push(format!(
        "{}Placeholders: {}px at quality {}",
        indent(1),
        config.placeholders.width,
        config.placeholders.quality
    ));
    lines.push("Fetch".to_string());
    lines.push(format!(
        "{}{} concurrent requests, {}s timeout",
        indent(1),
        config::effective_concurrency(&config.fetch),
        config.fetch.timeout_secs
    ));
    lines
}

pub fn print_check_output(config: &SiteConfig) {
    for line in format_check_output(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
