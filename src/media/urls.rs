//! Delivery and download URLs.
//!
//! All transformations are done by the media service; a URL names the
//! transformation (`c_scale,w_720`) and the service renders it on request:
//!
//! ```text
//! {delivery_base}/{cloud}/image/upload/{transformation}/{public_id}.{format}
//! ```

use super::client::PlaceholderParams;
use crate::config::{ImagesConfig, MediaConfig};
use crate::types::{ImageRecord, RawAsset};
use url::form_urlencoded;

/// URL builder for one account on the media service.
#[derive(Debug, Clone)]
pub struct Delivery {
    delivery_base: String,
    api_base: String,
    cloud_name: String,
}

impl Delivery {
    pub fn new(media: &MediaConfig) -> Self {
        Self {
            delivery_base: media.delivery_base.trim_end_matches('/').to_string(),
            api_base: media.api_base.trim_end_matches('/').to_string(),
            cloud_name: media.cloud_name.clone(),
        }
    }

    fn upload_url(&self, transformation: Option<&str>, public_id: &str, format: &str) -> String {
        match transformation {
            Some(t) => format!(
                "{}/{}/image/upload/{}/{}.{}",
                self.delivery_base, self.cloud_name, t, public_id, format
            ),
            None => format!(
                "{}/{}/image/upload/{}.{}",
                self.delivery_base, self.cloud_name, public_id, format
            ),
        }
    }

    /// Image scaled to `width`, keeping its aspect ratio.
    pub fn scaled(&self, record: &ImageRecord, width: u32) -> String {
        self.upload_url(
            Some(&format!("c_scale,w_{width}")),
            &record.public_id,
            &record.format,
        )
    }

    pub fn thumbnail(&self, record: &ImageRecord, images: &ImagesConfig) -> String {
        self.scaled(record, images.thumbnail_width)
    }

    pub fn lightbox(&self, record: &ImageRecord, images: &ImagesConfig) -> String {
        self.scaled(record, images.lightbox_width)
    }

    pub fn filmstrip(&self, record: &ImageRecord, images: &ImagesConfig) -> String {
        self.scaled(record, images.filmstrip_width)
    }

    /// The untransformed upload.
    pub fn original(&self, record: &ImageRecord) -> String {
        self.upload_url(None, &record.public_id, &record.format)
    }

    /// The original, served with `Content-Disposition: attachment`.
    pub fn download(&self, record: &ImageRecord) -> String {
        self.upload_url(Some("fl_attachment"), &record.public_id, &record.format)
    }

    /// Source of a blur placeholder: a tiny JPEG.
    pub fn placeholder_source(&self, asset: &RawAsset, params: PlaceholderParams) -> String {
        self.upload_url(
            Some(&format!("f_jpg,w_{},q_{}", params.width, params.quality)),
            &asset.public_id,
            &asset.format,
        )
    }

    /// Search API endpoint.
    pub fn search_endpoint(&self) -> String {
        format!("{}/{}/resources/search", self.api_base, self.cloud_name)
    }

    /// Bulk download of a whole folder as a zip archive.
    pub fn download_folder(&self, folder: &str) -> String {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("path", folder)
            .finish();
        format!(
            "{}/{}/utilities/download_folder?{}",
            self.api_base, self.cloud_name, query
        )
    }
}

/// File name suggested for the folder archive (`download` attribute).
pub fn archive_name(folder: &str) -> String {
    let last = folder.trim_end_matches('/').rsplit('/').next().unwrap_or(folder);
    format!("{last}.zip")
}
