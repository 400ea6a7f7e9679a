//! Local image selections waiting to be uploaded.

use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// An image picked by the user, held in memory until its batch is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageSelection {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageSelection {
    /// Build a selection from raw bytes, inferring the MIME type from the file
    /// name when none is given.
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let file_name = file_name.into().trim().to_string();
        if file_name.is_empty() {
            return Err(Error::InvalidInput(
                "Image file name cannot be empty".to_string(),
            ));
        }
        let content_type = infer_image_mime_type(content_type, &file_name);
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read an image from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::new(file_name, None, bytes)
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageSelection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageSelection")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

fn infer_image_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    if let Some(content_type) = content_type.map(str::trim) {
        if !content_type.is_empty() && content_type != "application/octet-stream" {
            return content_type.to_string();
        }
    }
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
