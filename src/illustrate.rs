//! Illustration generation.
//!
//! One request per image prompt. The first inline-data part of the response
//! becomes the image, re-encoded as PNG when the model sent another format.
//! A response without one, a payload that does not decode to an image, and a
//! failed request all become [`Illustration::Absent`], so every obtained
//! image is a valid PNG by the time it reaches the bundle. Callers never see an
//! error from this module, so the orchestrator's loop has a single
//! "skip and continue" path.

use crate::backend::{GenerateRequest, GenerateResponse, GenerativeBackend};
use crate::types::Image;
use tracing::{debug, warn};

/// Outcome of one illustration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Illustration {
    Obtained(Image),
    Absent,
}

impl Illustration {
    pub fn into_image(self) -> Option<Image> {
        match self {
            Illustration::Obtained(image) => Some(image),
            Illustration::Absent => None,
        }
    }

    pub fn is_obtained(&self) -> bool {
        matches!(self, Illustration::Obtained(_))
    }
}

/// Pull the first inline image out of a response.
pub fn extract_image(response: &GenerateResponse) -> Illustration {
    let Some(inline) = response
        .parts()
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty())
    else {
        return Illustration::Absent;
    };

    match Image::from_base64(&inline.mime_type, &inline.data).and_then(Image::into_png) {
        Ok(image) => Illustration::Obtained(image),
        Err(e) => {
            warn!(error = %e, "discarding undecodable inline image");
            Illustration::Absent
        }
    }
}

/// Ask the image model to draw `prompt`.
pub async fn illustrate(
    backend: &impl GenerativeBackend,
    model: &str,
    prompt: &str,
) -> Illustration {
    debug!(model, prompt, "requesting illustration");
    match backend.generate(model, &GenerateRequest::text(prompt)).await {
        Ok(response) => {
            let outcome = extract_image(&response);
            if !outcome.is_obtained() {
                warn!(prompt, "image model returned no inline image");
            }
            outcome
        }
        Err(e) => {
            warn!(error = %e, prompt, "image generation failed");
            Illustration::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Part;
    use crate::test_helpers::MockBackend;

    #[test]
    fn first_inline_part_wins() {
        let response = GenerateResponse::from_parts(vec![
            Part::text("a caption"),
            Part::inline("image/png", "AQID"),
            Part::inline("image/jpeg", "BAUG"),
        ]);
        assert_eq!(
            extract_image(&response),
            Illustration::Obtained(Image::new("image/png", vec![1, 2, 3]))
        );
    }

    #[test]
    fn text_only_response_is_absent() {
        let response = GenerateResponse::from_parts(vec![Part::text("I cannot draw that")]);
        assert_eq!(extract_image(&response), Illustration::Absent);
    }

    #[test]
    fn empty_inline_payload_is_skipped() {
        let response = GenerateResponse::from_parts(vec![
            Part::inline("image/png", ""),
            Part::inline("image/png", "BAUG"),
        ]);
        let image = extract_image(&response).into_image().unwrap();
        assert_eq!(image.data, vec![4, 5, 6]);
    }

    #[test]
    fn undecodable_non_png_payload_is_absent() {
        let response = GenerateResponse::from_parts(vec![Part::inline("image/gif", "AQIDBA==")]);
        assert_eq!(extract_image(&response), Illustration::Absent);
    }

    #[test]
    fn non_png_payload_is_obtained_as_png() {
        let pixels = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 255]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .unwrap();
        let payload = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            jpeg.into_inner(),
        );

        let response = GenerateResponse::from_parts(vec![Part::inline("image/jpeg", payload)]);
        let image = extract_image(&response).into_image().unwrap();
        assert!(image.is_png());
        assert_eq!(&image.data[..4], b"\x89PNG");
    }

    #[test]
    fn bad_base64_is_absent() {
        let response = GenerateResponse::from_parts(vec![Part::inline("image/png", "***")]);
        assert_eq!(extract_image(&response), Illustration::Absent);
    }

    #[test]
    fn no_candidates_is_absent() {
        assert_eq!(
            extract_image(&GenerateResponse::default()),
            Illustration::Absent
        );
    }

    #[tokio::test]
    async fn request_failure_is_absorbed() {
        let backend = MockBackend::new();
        backend.push_failure(500);
        let outcome = illustrate(&backend, "image-model", "a lighthouse").await;
        assert_eq!(outcome, Illustration::Absent);
        assert_eq!(backend.calls()[0].prompt, "a lighthouse");
    }

    #[tokio::test]
    async fn obtained_image_is_returned() {
        let backend = MockBackend::new();
        backend.push_image("image/png", &[9, 9, 9]);
        let outcome = illustrate(&backend, "image-model", "a lighthouse").await;
        assert_eq!(outcome.into_image().unwrap().data, vec![9, 9, 9]);
    }
}
