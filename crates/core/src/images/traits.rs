use async_trait::async_trait;

use crate::errors::JournalError;

/// An image attached to a form submission, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Bytes already in memory (e.g., handed over by a file picker).
    Bytes { file_name: String, bytes: Vec<u8> },
    /// A file on disk (native only).
    Path(std::path::PathBuf),
}

impl ImageSource {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageSource::Bytes {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl Into<std::path::PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    /// File name used to guess the MIME type.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            ImageSource::Bytes { file_name, .. } => file_name.clone(),
            ImageSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Turns an attached image into a `data:` URI.
///
/// Encoding is the one suspending step of a submission: the controller
/// awaits it before building the draft, and a failure drops the image
/// rather than the whole entry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ImageEncoder: Send + Sync {
    /// Human-readable name of this encoder (for logs/errors).
    fn name(&self) -> &str;

    /// Read and encode `source`.
    async fn encode(&self, source: &ImageSource) -> Result<String, JournalError>;
}
