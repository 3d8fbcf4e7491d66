//! Raster image placements.

use super::Annotation;
use crate::coords::PagePoint;
use crate::error::EditError;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Image format of an embedded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Sniff the format from the leading bytes of a payload.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Decoded bytes of an image data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Format sniffed from the bytes, falling back to the declared mime type.
    pub format: Option<ImageFormat>,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Decode a `data:image/...;base64,` URI. Bare base64 is accepted too.
    pub fn from_data_uri(uri: &str) -> Result<Self, EditError> {
        let (declared, encoded) = match uri.split_once(',') {
            Some((header, body)) if header.starts_with("data:") => {
                let mime = header
                    .trim_start_matches("data:")
                    .split(';')
                    .next()
                    .unwrap_or_default();
                (ImageFormat::from_mime_type(mime), body)
            }
            Some(_) => {
                return Err(EditError::InvalidImagePayload(
                    "malformed data URI header".to_string(),
                ));
            }
            None => (None, uri),
        };

        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| EditError::InvalidImagePayload(e.to_string()))?;
        if bytes.is_empty() {
            return Err(EditError::InvalidImagePayload("empty payload".to_string()));
        }

        Ok(Self {
            format: ImageFormat::from_magic_bytes(&bytes).or(declared),
            bytes,
        })
    }

    /// Encode raw bytes back into a data URI.
    pub fn to_data_uri(&self) -> String {
        let mime = self
            .format
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream");
        format!("data:{};base64,{}", mime, STANDARD.encode(&self.bytes))
    }
}

/// An image box on a page. The payload stays encoded until export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Top-left corner.
    pub position: PagePoint,
    pub width: f64,
    pub height: f64,
    pub data_uri: String,
}

impl ImagePlacement {
    pub fn new(position: PagePoint, width: f64, height: f64, data_uri: impl Into<String>) -> Self {
        Self {
            position,
            width,
            height,
            data_uri: data_uri.into(),
        }
    }

    pub fn payload(&self) -> Result<ImagePayload, EditError> {
        ImagePayload::from_data_uri(&self.data_uri)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x(),
            self.position.y(),
            self.position.x() + self.width,
            self.position.y() + self.height,
        )
    }
}

impl Annotation for ImagePlacement {
    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn translate(&mut self, delta: Vec2) {
        self.position = self.position.translate(delta);
    }
}
