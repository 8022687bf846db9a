use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub byte_len: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InlineImageError {
    #[error("inline image must be a data URI")]
    NotADataUri,
    #[error("inline image data URI must be base64 encoded")]
    NotBase64Encoded,
    #[error("inline image media type {0} is not an image type")]
    UnsupportedMediaType(String),
    #[error("inline image payload is empty")]
    EmptyPayload,
    #[error("inline image payload is not valid base64")]
    InvalidPayload,
}

/// Checks a `data:image/<subtype>;base64,<payload>` URI as produced by a
/// browser `FileReader`.
pub fn parse_image_data_uri(data_uri: &str) -> Result<InlineImage, InlineImageError> {
    let rest = data_uri
        .trim()
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(InlineImageError::NotADataUri)?;
    let (mime_type, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or(InlineImageError::NotBase64Encoded)?;

    let mime_type = mime_type.trim().to_ascii_lowercase();
    if !mime_type.starts_with("image/") || mime_type.len() == "image/".len() {
        return Err(InlineImageError::UnsupportedMediaType(mime_type));
    }

    if payload.is_empty() {
        return Err(InlineImageError::EmptyPayload);
    }

    let decoded = STANDARD
        .decode(payload)
        .map_err(|_| InlineImageError::InvalidPayload)?;

    Ok(InlineImage {
        mime_type,
        byte_len: decoded.len(),
    })
}
