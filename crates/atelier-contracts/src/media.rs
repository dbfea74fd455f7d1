use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

const FALLBACK_MIME: &str = "image/png";

/// The user's uploaded image, held fully in memory for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl SourceImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("source image is empty");
        }
        let mime_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| FALLBACK_MIME.to_string());
        Ok(Self { bytes, mime_type })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("unusable image {}", path.display()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(rest) = raw.trim().strip_prefix("data:") else {
            bail!("not a data URI");
        };
        let Some((header, payload)) = rest.split_once(',') else {
            bail!("data URI has no payload separator");
        };
        let Some(mime) = header.strip_suffix(";base64") else {
            bail!("only base64 data URIs are supported");
        };
        let mime_type = if mime.trim().is_empty() {
            FALLBACK_MIME.to_string()
        } else {
            mime.trim().to_string()
        };
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .context("data URI base64 decode failed")?;
        Ok(Self { mime_type, bytes })
    }
}

/// Wraps an already base64-encoded payload; the payload is not re-encoded.
pub fn encode_data_uri(mime_type: Option<&str>, base64_payload: &str) -> String {
    let mime = mime_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(FALLBACK_MIME);
    format!("data:{mime};base64,{base64_payload}")
}
