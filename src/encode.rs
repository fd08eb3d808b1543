use std::path::Path;

use base64::Engine as _;

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Only JPG, PNG, and WebP images are supported.")]
    UnsupportedType,
    #[error("Images must be 10MB or smaller.")]
    TooLarge,
    #[error("Failed to read the image.")]
    Read(#[from] std::io::Error),
}

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Sniffed MIME type, if it is one the form accepts.
    pub fn mime_type(&self) -> Option<&'static str> {
        infer::get(&self.bytes)
            .map(|kind| kind.mime_type())
            .filter(|mime| ACCEPTED_MIME_TYPES.contains(mime))
    }

    pub fn check(&self) -> Result<&'static str, ImageError> {
        let mime = self.mime_type().ok_or(ImageError::UnsupportedType)?;
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge);
        }
        Ok(mime)
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// `data:<mime>;base64,<payload>`, the form the relay forwards as an image part.
pub fn encode_image(image: &ImageFile) -> Result<String, ImageError> {
    let mime = image.check()?;
    let payload = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}
