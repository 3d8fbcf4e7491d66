//! Raster images as PDF image XObjects.

use crate::error::{ExportError, ExportResult};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, ObjectId, Stream, dictionary};
use pagemark_core::operations::{ImageFormat, ImagePlacement};
use std::io::Write;

/// Decoded pixels ready to embed. Alpha is kept only when some pixel is
/// not fully opaque.
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decoder_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
    }
}

/// Check that an image placement's payload decodes, without embedding it.
pub fn validate_image(placement: &ImagePlacement) -> ExportResult<()> {
    EmbeddedImage::decode(placement).map(|_| ())
}

impl EmbeddedImage {
    pub(crate) fn decode(placement: &ImagePlacement) -> ExportResult<Self> {
        let payload = placement
            .payload()
            .map_err(|e| ExportError::Image(e.to_string()))?;
        let decoded = match payload.format {
            Some(format) => {
                image::load_from_memory_with_format(&payload.bytes, decoder_format(format))
            }
            None => image::load_from_memory(&payload.bytes),
        }
        .map_err(|e| ExportError::Image(e.to_string()))?
        .to_rgba8();

        let (width, height) = decoded.dimensions();
        let pixel_count = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in decoded.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        let translucent = alpha.iter().any(|&a| a != u8::MAX);

        Ok(Self {
            width,
            height,
            rgb,
            alpha: translucent.then_some(alpha),
        })
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Add the image, and its soft mask if it has one, to the document.
    pub(crate) fn embed(self, doc: &mut Document) -> ExportResult<ObjectId> {
        let smask = match &self.alpha {
            Some(alpha) => Some(doc.add_object(self.stream("DeviceGray", alpha)?)),
            None => None,
        };
        let mut stream = self.stream("DeviceRGB", &self.rgb)?;
        if let Some(smask_id) = smask {
            stream.dict.set("SMask", smask_id);
        }
        Ok(doc.add_object(stream))
    }

    fn stream(&self, color_space: &str, samples: &[u8]) -> ExportResult<Stream> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(samples)
            .map_err(|e| ExportError::Image(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ExportError::Image(e.to_string()))?;
        Ok(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => self.width as i64,
                "Height" => self.height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use pagemark_core::PagePoint;
    use std::io::Cursor;

    fn png_data_uri(pixels: &[[u8; 4]], width: u32, height: u32) -> String {
        let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
        let img = image::RgbaImage::from_raw(width, height, raw).unwrap();
        let mut encoded = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&encoded))
    }

    fn placement(uri: String) -> ImagePlacement {
        ImagePlacement::new(PagePoint::new(0.0, 0.0), 10.0, 10.0, uri)
    }

    #[test]
    fn test_opaque_image_has_no_mask() {
        let uri = png_data_uri(&[[255, 0, 0, 255]; 4], 2, 2);
        let image = EmbeddedImage::decode(&placement(uri)).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert!(!image.has_alpha());
        assert_eq!(&image.rgb[..3], &[255, 0, 0]);
    }

    #[test]
    fn test_translucent_image_embeds_smask() {
        let uri = png_data_uri(&[[0, 0, 255, 255], [0, 0, 255, 128]], 2, 1);
        let image = EmbeddedImage::decode(&placement(uri)).unwrap();
        assert!(image.has_alpha());

        let mut doc = Document::with_version("1.7");
        let image_id = image.embed(&mut doc).unwrap();
        let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert!(stream.dict.has(b"SMask"));
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 2);
    }

    #[test]
    fn test_validate_accepts_real_images_only() {
        let good = png_data_uri(&[[1, 2, 3, 255]], 1, 1);
        assert!(validate_image(&placement(good)).is_ok());
        assert!(validate_image(&placement("data:image/png;base64,AAAA".to_string())).is_err());
    }

    #[test]
    fn test_undecodable_payload_is_an_image_error() {
        let uri = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(b"not really a png")
        );
        assert!(matches!(
            EmbeddedImage::decode(&placement(uri)),
            Err(ExportError::Image(_))
        ));
    }
}
