use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::JournalError;

use super::traits::{ImageEncoder, ImageSource};

/// Default cap on a single attachment: 5 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Base64 `data:` URI encoder.
#[derive(Debug, Clone)]
pub struct DataUriEncoder {
    max_bytes: usize,
}

impl DataUriEncoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    async fn read(&self, source: &ImageSource) -> Result<Vec<u8>, JournalError> {
        match source {
            ImageSource::Bytes { bytes, .. } => Ok(bytes.clone()),
            #[cfg(not(target_arch = "wasm32"))]
            ImageSource::Path(path) => {
                let meta = tokio::fs::metadata(path).await.map_err(|e| {
                    JournalError::ImageEncoding(format!("Cannot read {}: {e}", path.display()))
                })?;
                if meta.len() > self.max_bytes as u64 {
                    return Err(too_large(meta.len(), self.max_bytes));
                }
                tokio::fs::read(path).await.map_err(|e| {
                    JournalError::ImageEncoding(format!("Cannot read {}: {e}", path.display()))
                })
            }
            #[cfg(target_arch = "wasm32")]
            ImageSource::Path(path) => Err(JournalError::ImageEncoding(format!(
                "File paths are not readable here: {}",
                path.display()
            ))),
        }
    }
}

impl Default for DataUriEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ImageEncoder for DataUriEncoder {
    fn name(&self) -> &str {
        "data-uri"
    }

    async fn encode(&self, source: &ImageSource) -> Result<String, JournalError> {
        let file_name = source.file_name();
        let mime = mime_for(&file_name).ok_or_else(|| {
            JournalError::ImageEncoding(format!("'{file_name}' is not a supported image type"))
        })?;

        let bytes = self.read(source).await?;
        if bytes.is_empty() {
            return Err(JournalError::ImageEncoding(format!("'{file_name}' is empty")));
        }
        if bytes.len() > self.max_bytes {
            return Err(too_large(bytes.len() as u64, self.max_bytes));
        }

        Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
    }
}

fn too_large(size: u64, max: usize) -> JournalError {
    JournalError::ImageEncoding(format!("Image is {size} bytes, limit is {max}"))
}

/// MIME type from the file extension (case-insensitive).
#[must_use]
pub fn mime_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
