//! services/app/src/adapters/image.rs
//!
//! An `ImageSource` that reads a photo from disk, standing in for the
//! platform photo library or camera.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use clothesline_core::ports::{ImageSource, PortError, PortResult};

pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Recognises the container formats a phone camera or photo library produces.
pub fn looks_like_image(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF])
        || data.starts_with(b"\x89PNG\r\n\x1a\n")
        || data.starts_with(b"GIF8")
        || (data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP")
        // HEIF/HEIC: an ISO-BMFF `ftyp` box up front.
        || (data.len() >= 12 && &data[4..8] == b"ftyp")
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn produce_image_bytes(&self) -> PortResult<Bytes> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            PortError::ImageLoad(format!("Cannot read {}: {}", self.path.display(), e))
        })?;

        if !looks_like_image(&data) {
            return Err(PortError::ImageLoad(format!(
                "{} is not a supported image",
                self.path.display()
            )));
        }
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_formats() {
        assert!(looks_like_image(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(looks_like_image(b"\x89PNG\r\n\x1a\n...."));
        assert!(looks_like_image(b"RIFF\0\0\0\0WEBPVP8 "));
        assert!(looks_like_image(b"\0\0\0\x18ftypheic"));
        assert!(!looks_like_image(b"hello world"));
        assert!(!looks_like_image(b""));
    }

    #[tokio::test]
    async fn missing_file_is_an_image_load_error() {
        let source = FileImageSource::new("/definitely/not/here.jpg");
        assert!(matches!(
            source.produce_image_bytes().await,
            Err(PortError::ImageLoad(_))
        ));
    }
}
