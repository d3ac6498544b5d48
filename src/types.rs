//! Shared types passed between the adapters, the orchestrator and the
//! bundle assembler.
//!
//! [`GeneratedData`] mirrors the JSON object the content model is asked to
//! produce, field for field (including the camelCase `imagePrompts` key), so
//! the raw response deserializes straight into it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// One titled body section of the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub content: String,
}

/// The structured article returned by the content model.
///
/// The request asks for exactly three sections and three image prompts, but
/// the counts are whatever the service actually returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedData {
    pub title: String,
    pub introduction: String,
    pub sections: Vec<ContentSection>,
    pub conclusion: String,
    pub image_prompts: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ImageDecodeError {
    #[error("not a base64 data URI")]
    NotDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a decodable image: {0}")]
    Raster(#[from] image::ImageError),
}

/// An encoded raster image as returned by the image model.
///
/// Serialized as a `data:<mime>;base64,<payload>` URI, which is also the form
/// the preview embeds directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Image {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode an inline base64 payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> Result<Self, ImageDecodeError> {
        let data = STANDARD.decode(payload.trim())?;
        Ok(Self::new(mime_type, data))
    }

    /// Parse `data:<mime>;base64,<payload>`.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageDecodeError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageDecodeError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageDecodeError::NotDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageDecodeError::NotDataUri)?;
        Self::from_base64(mime_type, payload)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    pub fn is_png(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case("image/png")
    }

    /// Re-encode as PNG. PNG payloads pass through untouched.
    pub fn into_png(self) -> Result<Self, ImageDecodeError> {
        if self.is_png() {
            return Ok(self);
        }
        let decoded = image::load_from_memory(&self.data)?;
        let mut out = Cursor::new(Vec::new());
        decoded.write_to(&mut out, ImageFormat::Png)?;
        Ok(Self::new("image/png", out.into_inner()))
    }
}

impl TryFrom<String> for Image {
    type Error = ImageDecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_uri(&value)
    }
}

impl From<Image> for String {
    fn from(image: Image) -> Self {
        image.to_data_uri()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_data_uses_camel_case_prompts() {
        let json = r#"{
            "title": "T",
            "introduction": "I",
            "sections": [{"heading": "H", "content": "C"}],
            "conclusion": "End",
            "imagePrompts": ["a cat"]
        }"#;
        let data: GeneratedData = serde_json::from_str(json).unwrap();
        assert_eq!(data.image_prompts, vec!["a cat"]);
        assert_eq!(data.sections[0].heading, "H");
    }

    #[test]
    fn generated_data_missing_field_is_error() {
        let json = r#"{"title": "T", "introduction": "I", "sections": [], "conclusion": "E"}"#;
        assert!(serde_json::from_str::<GeneratedData>(json).is_err());
    }

    #[test]
    fn data_uri_parses() {
        let image = Image::from_data_uri("data:image/png;base64,AQID").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![1, 2, 3]);
        assert!(image.is_png());
    }

    #[test]
    fn data_uri_round_trips_through_json() {
        let image = Image::new("image/jpeg", vec![0xff, 0xd8, 0x00]);
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"data:image/jpeg;base64,/9gA\"");
        let back: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn data_uri_without_base64_marker_rejected() {
        assert!(matches!(
            Image::from_data_uri("data:image/png,AQID"),
            Err(ImageDecodeError::NotDataUri)
        ));
        assert!(matches!(
            Image::from_data_uri("https://example.com/a.png"),
            Err(ImageDecodeError::NotDataUri)
        ));
    }

    #[test]
    fn jpeg_payload_is_converted_to_png() {
        let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut jpeg = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .unwrap();

        let png = Image::new("image/jpeg", jpeg.into_inner()).into_png().unwrap();
        assert_eq!(png.mime_type, "image/png");
        assert_eq!(&png.data[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn png_payload_is_kept_as_is() {
        let image = Image::new("image/png", vec![1, 2, 3]);
        assert_eq!(image.clone().into_png().unwrap(), image);
    }

    #[test]
    fn undecodable_non_png_payload_is_rejected() {
        assert!(matches!(
            Image::new("image/gif", vec![1, 2, 3, 4]).into_png(),
            Err(ImageDecodeError::Raster(_))
        ));
    }

    #[test]
    fn invalid_base64_rejected() {
        assert!(matches!(
            Image::from_base64("image/png", "@@@"),
            Err(ImageDecodeError::Base64(_))
        ));
    }
}
