//! HTML site generation.
//!
//! Stage 2 of the cloud-gal build pipeline. Takes the catalog manifest and
//! generates the final static HTML site. No network access: every image URL
//! is a delivery URL synthesized from the record.
//!
//! ## Generated Pages
//!
//! - **Gallery** (`/index.html`): hero card, masonry grid of thumbnails, and
//!   a hidden lightbox driven by the embedded script
//! - **Permalinks** (`/p/{id}/index.html`): the lightbox for one image,
//!   rendered server-side so deep links work without the script
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html          # Gallery
//! ├── favicon.ico         # Copied from assets/ (if present)
//! ├── logo.svg            # Hero card logo, copied from assets/ (if present)
//! └── p/
//!     ├── 0/index.html    # Permalink pages
//!     ├── 1/index.html
//!     └── ...
//! ```
//!
//! ## Selection
//!
//! Every page is rendered for a location, and the lightbox state of that page
//! comes from [`Selection::from_location`], the same function the navigation
//! controller uses. The browser script mirrors it, so `/p/3/` loaded cold and
//! `/p/3/` reached by clicking a thumbnail show the same image.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: Base styles (colors and grid columns injected from config)
//! - `static/gallery.js`: Shallow navigation, lightbox, keyboard, scroll restore
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::catalog::Manifest;
use crate::config::{self, SiteConfig};
use crate::media::Delivery;
use crate::media::urls::archive_name;
use crate::selection::{GALLERY_LOCATION, Selection, permalink};
use crate::types::{ImageList, ImageRecord, ModelError};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    Model(#[from] ModelError),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/gallery.js");

/// Filmstrip thumbnails shown on each side of the open image.
pub const FILMSTRIP_RADIUS: u32 = 15;

/// Directory in the project copied verbatim to the output root.
const ASSETS_DIR: &str = "assets";
const FAVICON_FILE: &str = "favicon.ico";
const LOGO_FILE: &str = "logo.svg";

/// Summary of a generate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSite {
    pub collection: String,
    /// Output paths relative to the output directory, gallery first.
    pub pages: Vec<String>,
    pub assets_copied: usize,
    pub output_dir: PathBuf,
}

/// Catalog manifest as stored on disk, before the image list is checked.
#[derive(Deserialize)]
struct ManifestFile {
    collection: String,
    images: Vec<ImageRecord>,
}

/// Read and validate a catalog manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest, GenerateError> {
    let content = fs::read_to_string(path)?;
    let file: ManifestFile = serde_json::from_str(&content)?;
    Ok(Manifest {
        collection: file.collection,
        images: ImageList::new(file.images)?,
    })
}

pub fn generate(
    manifest_path: &Path,
    config: &SiteConfig,
    project_root: &Path,
    output_dir: &Path,
) -> Result<GeneratedSite, GenerateError> {
    let manifest = load_manifest(manifest_path)?;
    let assets_dir = project_root.join(ASSETS_DIR);
    let ctx = PageContext::new(config).with_assets(&assets_dir);

    // Render everything before touching the output directory.
    let gallery = Selection::from_location(GALLERY_LOCATION, &manifest.images);
    let mut pages = vec![(
        "index.html".to_string(),
        render_index(&ctx, &manifest, gallery)?,
    )];
    for record in &manifest.images {
        let location = permalink(record.id);
        let selection = Selection::from_location(&location, &manifest.images);
        pages.push((
            format!("p/{}/index.html", record.id),
            render_photo_page(&ctx, &manifest.images, selection),
        ));
    }

    fs::create_dir_all(output_dir)?;
    let assets_copied = copy_assets(&assets_dir, output_dir)?;

    let mut written = Vec::with_capacity(pages.len());
    for (rel_path, markup) in pages {
        let path = output_dir.join(&rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, markup.into_string())?;
        tracing::debug!(page = %rel_path, "page written");
        written.push(rel_path);
    }

    tracing::info!(
        pages = written.len(),
        output = %output_dir.display(),
        "site generated"
    );
    Ok(GeneratedSite {
        collection: manifest.collection,
        pages: written,
        assets_copied,
        output_dir: output_dir.to_path_buf(),
    })
}

/// Copy the project's `assets/` tree to the output root. Returns the number
/// of files copied; a missing directory copies nothing.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Everything a page renderer needs besides the images.
struct PageContext<'a> {
    config: &'a SiteConfig,
    delivery: Delivery,
    css: String,
    has_favicon: bool,
    has_logo: bool,
}

impl<'a> PageContext<'a> {
    fn new(config: &'a SiteConfig) -> Self {
        let css = format!(
            "{}\n{}\n{}",
            config::generate_color_css(&config.colors),
            config::generate_theme_css(&config.theme),
            CSS_STATIC
        );
        Self {
            config,
            delivery: Delivery::new(&config.media),
            css,
            has_favicon: false,
            has_logo: false,
        }
    }

    /// Link the favicon and hero logo when the project ships them.
    fn with_assets(mut self, assets_dir: &Path) -> Self {
        self.has_favicon = assets_dir.join(FAVICON_FILE).is_file();
        self.has_logo = assets_dir.join(LOGO_FILE).is_file();
        self
    }
}

// ============================================================================
// Embedded lightbox data
// ============================================================================

/// Per-image data the script needs to render the lightbox client-side.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PhotoData {
    id: u32,
    full: String,
    strip: String,
    original: String,
    download: String,
    w: u32,
    h: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GalleryData {
    filmstrip_radius: u32,
    photos: Vec<PhotoData>,
}

/// JSON for the `#gallery-data` block, safe to inline in a `<script>`.
fn gallery_data_json(ctx: &PageContext, images: &ImageList) -> Result<String, serde_json::Error> {
    let images_cfg = &ctx.config.images;
    let data = GalleryData {
        filmstrip_radius: FILMSTRIP_RADIUS,
        photos: images
            .iter()
            .map(|r| PhotoData {
                id: r.id,
                full: ctx.delivery.lightbox(r, images_cfg),
                strip: ctx.delivery.filmstrip(r, images_cfg),
                original: ctx.delivery.original(r),
                download: ctx.delivery.download(r),
                w: images_cfg.lightbox_width,
                h: r.scaled_height(images_cfg.lightbox_width),
            })
            .collect(),
    };
    Ok(serde_json::to_string(&data)?.replace("</", "<\\/"))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(ctx: &PageContext, title: &str, page: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(ctx.config.site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if ctx.has_favicon {
                    link rel="icon" href="/favicon.ico";
                }
                style { (PreEscaped(&ctx.css)) }
            }
            body data-page=(page) {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

/// Hero card: optional logo, heading, description, download-all and review
/// links.
fn render_hero(ctx: &PageContext) -> Markup {
    let site = &ctx.config.site;
    let folder = &ctx.config.media.folder;
    html! {
        header.hero {
            @if ctx.has_logo {
                img.hero-logo src=(format!("/{LOGO_FILE}")) alt="";
            }
            h1 { (site.heading) }
            @if !site.description.trim().is_empty() {
                div.hero-description { (PreEscaped(markdown_to_html(&site.description))) }
            }
            div.hero-actions {
                a.button.download-all href=(ctx.delivery.download_folder(folder)) download=(archive_name(folder)) {
                    "Download all"
                }
                @if let Some(review) = &site.review {
                    a.button.review-link href=(review.url) target="_blank" rel="noopener" {
                        (review.label)
                    }
                }
            }
        }
    }
}

fn photo_alt(record: &ImageRecord, count: usize) -> String {
    format!("Photo {} of {}", record.id + 1, count)
}

/// Thumbnail grid: one link per record, in list order.
fn render_grid(ctx: &PageContext, images: &ImageList) -> Markup {
    let width = ctx.config.images.thumbnail_width;
    html! {
        main.photo-grid {
            @for record in images {
                a.photo-link href=(permalink(record.id)) data-id=(record.id) {
                    img src=(ctx.delivery.thumbnail(record, &ctx.config.images))
                        alt=(photo_alt(record, images.len()))
                        width=(width)
                        height=(record.scaled_height(width))
                        loading="lazy"
                        decoding="async"
                        style=(format!("background-image: url('{}')", record.blur_data_url));
                }
            }
        }
    }
}

fn render_footer(ctx: &PageContext) -> Markup {
    html! {
        @if !ctx.config.site.footer.is_empty() {
            footer.site-footer { p { (ctx.config.site.footer) } }
        }
    }
}

/// Lightbox for an open selection, or the hidden skeleton the script fills.
fn render_lightbox(ctx: &PageContext, images: &ImageList, selection: Selection) -> Markup {
    let record = selection.selected_id().and_then(|id| images.get(id));
    let Some(record) = record else {
        return html! {
            div #lightbox.lightbox role="dialog" aria-modal="true" aria-label="Photo viewer" hidden {
                div.lightbox-toolbar {
                    span.lightbox-counter {}
                    a.lightbox-original target="_blank" rel="noopener" { "Original" }
                    a.lightbox-download download { "Download" }
                    a.lightbox-close href=(GALLERY_LOCATION) aria-label="Close" { "×" }
                }
                figure.lightbox-stage {
                    a.lightbox-prev aria-label="Previous photo" hidden { "‹" }
                    img.lightbox-image alt="";
                    a.lightbox-next aria-label="Next photo" hidden { "›" }
                }
                nav.filmstrip aria-label="Nearby photos" {}
            }
        };
    };

    let images_cfg = &ctx.config.images;
    let (prev, next) = images.neighbors(record.id);
    let count = images.len();
    html! {
        div #lightbox.lightbox role="dialog" aria-modal="true" aria-label="Photo viewer" data-id=(record.id) {
            div.lightbox-toolbar {
                span.lightbox-counter { (record.id + 1) " / " (count) }
                a.lightbox-original href=(ctx.delivery.original(record)) target="_blank" rel="noopener" {
                    "Original"
                }
                a.lightbox-download href=(ctx.delivery.download(record)) download {
                    "Download"
                }
                a.lightbox-close href=(GALLERY_LOCATION) aria-label="Close" { "×" }
            }
            figure.lightbox-stage {
                @if let Some(prev) = prev {
                    a.lightbox-prev href=(permalink(prev)) aria-label="Previous photo" { "‹" }
                }
                img.lightbox-image
                    src=(ctx.delivery.lightbox(record, images_cfg))
                    alt=(photo_alt(record, count))
                    width=(images_cfg.lightbox_width)
                    height=(record.scaled_height(images_cfg.lightbox_width))
                    style=(format!("background-image: url('{}')", record.blur_data_url));
                @if let Some(next) = next {
                    a.lightbox-next href=(permalink(next)) aria-label="Next photo" { "›" }
                }
            }
            nav.filmstrip aria-label="Nearby photos" {
                @for item in images.window(record.id, FILMSTRIP_RADIUS) {
                    a.filmstrip-item.current[item.id == record.id] href=(permalink(item.id)) data-id=(item.id) {
                        img src=(ctx.delivery.filmstrip(item, images_cfg)) alt=(photo_alt(item, count)) loading="lazy";
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the gallery page.
fn render_index(
    ctx: &PageContext,
    manifest: &Manifest,
    selection: Selection,
) -> Result<Markup, GenerateError> {
    let data = gallery_data_json(ctx, &manifest.images)?;
    let content = html! {
        div.page {
            (render_hero(ctx))
            (render_grid(ctx, &manifest.images))
            (render_footer(ctx))
        }
        (render_lightbox(ctx, &manifest.images, selection))
        script #gallery-data type="application/json" { (PreEscaped(data)) }
    };
    Ok(base_document(ctx, &ctx.config.site.title, "gallery", content))
}

/// Renders the permalink page of one image.
fn render_photo_page(ctx: &PageContext, images: &ImageList, selection: Selection) -> Markup {
    let title = match selection.selected_id() {
        Some(id) => format!("{} · Photo {}", ctx.config.site.title, id + 1),
        None => ctx.config.site.title.clone(),
    };
    let content = render_lightbox(ctx, images, selection);
    base_document(ctx, &title, "photo", content)
}

// ============================================================================
// Tests
// ============================================================================
