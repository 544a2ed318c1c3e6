//! Project configuration module.
//!
//! Handles loading, validating, and layering `config.toml`. Values are
//! resolved from three layers, each overriding the one before it:
//!
//! ```text
//! stock defaults  →  <project>/config.toml  →  environment (CLOUDINARY_*)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [media]
//! cloud_name = "demo"        # Required (or CLOUDINARY_CLOUD_NAME)
//! folder = "weddings/2024"   # Required (or CLOUDINARY_FOLDER)
//! max_results = 400          # Search cap (1-500)
//!
//! [site]
//! title = "Gallery"
//! heading = "Gallery"
//! description = "Thanks for a wonderful day!"   # Markdown
//! footer = ""
//! lang = "en"
//!
//! [site.review]              # Optional call-to-action link
//! label = "Leave a review"
//! url = "https://example.com/review"
//!
//! [images]
//! thumbnail_width = 720
//! lightbox_width = 1920
//! filmstrip_width = 180
//!
//! [placeholders]
//! width = 8
//! quality = 70
//!
//! [theme]
//! gap = "1rem"
//! max_width = "1960px"
//!
//! [theme.columns]
//! base = 1
//! sm = 2
//! xl = 3
//! xxl = 4
//!
//! [colors]
//! background = "#03131a"
//! surface = "#031f29"
//! text = "#ffffff"
//! text_muted = "rgba(255, 255, 255, 0.75)"
//! accent = "#9ec1a3"
//!
//! [fetch]
//! max_concurrent = 16
//! timeout_secs = 30
//! ```
//!
//! API credentials are never read from `config.toml`; see [`Credentials`].
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Project configuration loaded from `config.toml`.
///
/// All fields except the media service coordinates have defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the images live on the media service.
    pub media: MediaConfig,
    /// Page text.
    pub site: SiteText,
    /// Delivery widths for the generated pages.
    pub images: ImagesConfig,
    /// Blur placeholder request parameters.
    pub placeholders: PlaceholderConfig,
    /// Grid layout.
    pub theme: ThemeConfig,
    /// Color scheme.
    pub colors: ColorScheme,
    /// Network settings for the fetch stage.
    pub fetch: FetchConfig,
}

impl SiteConfig {
    /// Validate config values are present and within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.media.cloud_name.trim().is_empty() {
            return Err(ConfigError::Missing("media.cloud_name"));
        }
        if self.media.folder.trim().is_empty() {
            return Err(ConfigError::Missing("media.folder"));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&self.media.max_results) {
            return Err(ConfigError::Validation(format!(
                "media.max_results must be 1-{MAX_SEARCH_RESULTS}"
            )));
        }
        for (key, value) in [
            ("media.api_base", &self.media.api_base),
            ("media.delivery_base", &self.media.delivery_base),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::Validation(format!(
                    "{key} is not a valid URL: {value}"
                )));
            }
        }
        if let Some(review) = &self.site.review
            && url::Url::parse(&review.url).is_err()
        {
            return Err(ConfigError::Validation(format!(
                "site.review.url is not a valid URL: {}",
                review.url
            )));
        }
        if self.images.thumbnail_width == 0
            || self.images.lightbox_width == 0
            || self.images.filmstrip_width == 0
        {
            return Err(ConfigError::Validation(
                "images widths must be non-zero".into(),
            ));
        }
        if self.placeholders.width == 0 {
            return Err(ConfigError::Validation(
                "placeholders.width must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.placeholders.quality) {
            return Err(ConfigError::Validation(
                "placeholders.quality must be 1-100".into(),
            ));
        }
        let c = &self.theme.columns;
        if [c.base, c.sm, c.xl, c.xxl].contains(&0) {
            return Err(ConfigError::Validation(
                "theme.columns values must be at least 1".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be non-zero".into(),
            ));
        }
        if self.fetch.max_concurrent == Some(0) {
            return Err(ConfigError::Validation(
                "fetch.max_concurrent must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Upper bound the search API accepts for a single page of results.
pub const MAX_SEARCH_RESULTS: u32 = 500;

/// Media service coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Account ("cloud") name on the media service.
    pub cloud_name: String,
    /// Collection folder whose images make up the gallery.
    pub folder: String,
    /// Maximum number of assets returned by the search.
    pub max_results: u32,
    /// Base URL of the admin/search API.
    pub api_base: String,
    /// Base URL images are delivered from.
    pub delivery_base: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            folder: String::new(),
            max_results: 400,
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            delivery_base: "https://res.cloudinary.com".to_string(),
        }
    }
}

/// Text shown on the generated pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteText {
    /// Document `<title>`.
    pub title: String,
    /// Heading of the hero card.
    pub heading: String,
    /// Markdown shown under the heading.
    pub description: String,
    /// Footer line; omitted when empty.
    pub footer: String,
    /// `<html lang>` attribute.
    pub lang: String,
    /// Optional call-to-action link in the hero card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewLink>,
}

impl Default for SiteText {
    fn default() -> Self {
        Self {
            title: "Gallery".to_string(),
            heading: "Gallery".to_string(),
            description: String::new(),
            footer: String::new(),
            lang: "en".to_string(),
            review: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewLink {
    pub label: String,
    pub url: String,
}

/// Delivery widths requested from the media service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Width of grid thumbnails.
    pub thumbnail_width: u32,
    /// Width of the image shown in the lightbox.
    pub lightbox_width: u32,
    /// Width of the lightbox filmstrip thumbnails.
    pub filmstrip_width: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            thumbnail_width: 720,
            lightbox_width: 1920,
            filmstrip_width: 180,
        }
    }
}

/// Parameters of the tiny JPEG each blur placeholder is made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub width: u32,
    pub quality: u32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: 8,
            quality: 70,
        }
    }
}

/// Grid layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Column count per viewport breakpoint.
    pub columns: ColumnsConfig,
    /// Gap between columns and thumbnails (CSS value).
    pub gap: String,
    /// Maximum width of the page content (CSS value).
    pub max_width: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            columns: ColumnsConfig::default(),
            gap: "1rem".to_string(),
            max_width: "1960px".to_string(),
        }
    }
}

/// Masonry column counts.
///
/// - `base`: below 640px
/// - `sm`: from 640px
/// - `xl`: from 1280px
/// - `xxl`: from 1536px
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnsConfig {
    pub base: u32,
    pub sm: u32,
    pub xl: u32,
    pub xxl: u32,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            base: 1,
            sm: 2,
            xl: 3,
            xxl: 4,
        }
    }
}

/// Color scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Hero card and lightbox chrome.
    pub surface: String,
    /// Primary text color.
    pub text: String,
    /// Secondary text (description, footer).
    pub text_muted: String,
    /// Buttons and the review link.
    pub accent: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#03131a".to_string(),
            surface: "#031f29".to_string(),
            text: "#ffffff".to_string(),
            text_muted: "rgba(255, 255, 255, 0.75)".to_string(),
            accent: "#9ec1a3".to_string(),
        }
    }
}

/// Network settings for the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Maximum number of placeholder requests in flight.
    /// When absent, defaults to [`DEFAULT_MAX_CONCURRENT`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

pub const DEFAULT_MAX_CONCURRENT: usize = 16;

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            timeout_secs: 30,
        }
    }
}

/// Resolve the effective number of concurrent placeholder requests.
pub fn effective_concurrency(config: &FetchConfig) -> usize {
    config
        .max_concurrent
        .unwrap_or(DEFAULT_MAX_CONCURRENT)
        .max(1)
}

/// Media service API credentials.
///
/// Read from `CLOUDINARY_API_KEY` / `CLOUDINARY_API_SECRET` only; they are
/// needed by the fetch stage alone and never end up in a manifest.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        Ok(Self {
            api_key: read(ENV_API_KEY)?,
            api_secret: read(ENV_API_SECRET)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_FOLDER: &str = "CLOUDINARY_FOLDER";
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the environment layer as a sparse TOML table.
///
/// Returns `None` when no relevant variable is set.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> Option<toml::Value> {
    let mut media = toml::map::Map::new();
    for (var, key) in [(ENV_CLOUD_NAME, "cloud_name"), (ENV_FOLDER, "folder")] {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            media.insert(key.to_string(), toml::Value::String(value));
        }
    }
    if media.is_empty() {
        return None;
    }
    let mut root = toml::map::Map::new();
    root.insert("media".to_string(), toml::Value::Table(media));
    Some(toml::Value::Table(root))
}

/// Merge optional overlays onto a base value in order, then deserialize and
/// validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<SiteConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a project directory: stock defaults, then
/// `config.toml`, then the environment.
pub fn load_config(
    root: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SiteConfig, ConfigError> {
    let file = load_raw_config(root)?;
    let env = env_overlay(lookup);
    resolve_config(stock_defaults_value(), [file, env])
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cloud-gal Configuration
# =======================
# All settings except [media] cloud_name and folder are optional.
# Values shown below are the defaults.
#
# Environment variables override this file:
#   CLOUDINARY_CLOUD_NAME  -> media.cloud_name
#   CLOUDINARY_FOLDER      -> media.folder
# API credentials are only ever read from the environment (or .env):
#   CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Media service
# ---------------------------------------------------------------------------
[media]
# Account name on the media service (required).
cloud_name = ""
# Folder whose images make up the gallery (required).
folder = ""
# Maximum number of images fetched (1-500).
max_results = 400
api_base = "https://api.cloudinary.com/v1_1"
delivery_base = "https://res.cloudinary.com"

# ---------------------------------------------------------------------------
# Page text
# ---------------------------------------------------------------------------
[site]
title = "Gallery"
heading = "Gallery"
# Markdown, shown in the hero card.
description = ""
footer = ""
lang = "en"

# Optional call-to-action link in the hero card.
# [site.review]
# label = "Leave a review"
# url = "https://example.com/review"

# ---------------------------------------------------------------------------
# Delivery widths (pixels)
# ---------------------------------------------------------------------------
[images]
thumbnail_width = 720
lightbox_width = 1920
filmstrip_width = 180

# ---------------------------------------------------------------------------
# Blur placeholders
# ---------------------------------------------------------------------------
[placeholders]
# Width of the tiny JPEG each placeholder is made from.
width = 8
# JPEG quality (1-100).
quality = 70

# ---------------------------------------------------------------------------
# Grid layout
# ---------------------------------------------------------------------------
[theme]
gap = "1rem"
max_width = "1960px"

# Column count below 640px, from 640px, from 1280px and from 1536px.
[theme.columns]
base = 1
sm = 2
xl = 3
xxl = 4

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#03131a"
surface = "#031f29"
text = "#ffffff"
text_muted = "rgba(255, 255, 255, 0.75)"
accent = "#9ec1a3"

# ---------------------------------------------------------------------------
# Fetching
# ---------------------------------------------------------------------------
[fetch]
# Maximum placeholder requests in flight. Omit for the default (16).
# max_concurrent = 16
# Per-request timeout in seconds.
timeout_secs = 30
"##
}

/// Generate CSS custom properties from the color scheme.
pub fn generate_color_css(colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --color-bg: {background};
    --color-surface: {surface};
    --color-text: {text};
    --color-text-muted: {text_muted};
    --color-accent: {accent};
}}"#,
        background = colors.background,
        surface = colors.surface,
        text = colors.text,
        text_muted = colors.text_muted,
        accent = colors.accent,
    )
}

/// Generate layout CSS from theme config: custom properties plus the
/// column count at each breakpoint.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    let c = &theme.columns;
    format!(
        r#":root {{
    --gap: {gap};
    --max-width: {max_width};
}}

.photo-grid {{ columns: {base}; }}
@media (min-width: 640px) {{ .photo-grid {{ columns: {sm}; }} }}
@media (min-width: 1280px) {{ .photo-grid {{ columns: {xl}; }} }}
@media (min-width: 1536px) {{ .photo-grid {{ columns: {xxl}; }} }}"#,
        gap = theme.gap,
        max_width = theme.max_width,
        base = c.base,
        sm = c.sm,
        xl = c.xl,
        xxl = c.xxl,
    )
}
