//! OCR providers
//!
//! Text recognition itself happens outside this crate. These providers turn what is
//! available (a fixed mock result, or an operator transcript) into an [`OcrObservation`],
//! measuring print quality from the image where possible.

use tracing::{debug, warn};

use super::blur::BlurDetector;
use super::{decode_grayscale, normalize_fragments, OcrError, OcrProvider};
use crate::validation::OcrObservation;

/// Returns the same observation for every image
#[derive(Debug, Clone)]
pub struct MockOcr {
    observation: OcrObservation,
}

impl MockOcr {
    pub fn new(fragments: Vec<String>, is_blurry: bool) -> Self {
        Self {
            observation: OcrObservation::new(normalize_fragments(fragments), is_blurry),
        }
    }
}

impl OcrProvider for MockOcr {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn observe(&self, _image_bytes: &[u8]) -> Result<OcrObservation, OcrError> {
        debug!("Mock OCR returning {} fragments", self.observation.text_fragments.len());
        Ok(self.observation.clone())
    }
}

/// Operator-transcribed text lines, with print quality measured from the image
#[derive(Debug, Clone)]
pub struct TranscriptOcr {
    fragments: Vec<String>,
    detector: BlurDetector,
}

impl TranscriptOcr {
    pub fn new(fragments: Vec<String>, detector: BlurDetector) -> Self {
        let fragments = normalize_fragments(fragments);
        if fragments.is_empty() {
            warn!("No transcript lines supplied; logo checks will find nothing");
        }
        Self {
            fragments,
            detector,
        }
    }
}

impl OcrProvider for TranscriptOcr {
    fn name(&self) -> &'static str {
        "transcript"
    }

    fn observe(&self, image_bytes: &[u8]) -> Result<OcrObservation, OcrError> {
        let gray = decode_grayscale(image_bytes)?;
        let is_blurry = self.detector.is_blurry(&gray);

        debug!(
            "Transcript OCR: {}x{} image, blurry={} (threshold {})",
            gray.width(),
            gray.height(),
            is_blurry,
            self.detector.threshold()
        );

        Ok(OcrObservation::new(self.fragments.clone(), is_blurry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::tests::encode_png;
    use image::{GrayImage, Luma};

    #[test]
    fn test_mock_ocr_ignores_image() {
        let ocr = MockOcr::new(vec!["ne555dr".into(), " ti ".into()], false);
        let obs = ocr.observe(&[]).unwrap();

        assert_eq!(obs.text_fragments, vec!["NE555DR", "TI"]);
        assert!(!obs.is_blurry);
        assert_eq!(ocr.name(), "mock");
    }

    #[test]
    fn test_transcript_ocr_sharp_image() {
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([if (x + y) % 2 == 0 { 255 } else { 0 }]));
        let ocr = TranscriptOcr::new(vec!["NE555DR".into(), "TI".into()], BlurDetector::default());

        let obs = ocr.observe(&encode_png(&img)).unwrap();
        assert_eq!(obs.text_fragments, vec!["NE555DR", "TI"]);
        assert!(!obs.is_blurry);
    }

    #[test]
    fn test_transcript_ocr_flat_image_is_blurry() {
        let img = GrayImage::from_pixel(16, 16, Luma([90u8]));
        let ocr = TranscriptOcr::new(vec!["NE555DR".into()], BlurDetector::default());

        let obs = ocr.observe(&encode_png(&img)).unwrap();
        assert!(obs.is_blurry);
    }

    #[test]
    fn test_transcript_ocr_rejects_garbage() {
        let ocr = TranscriptOcr::new(vec![], BlurDetector::default());
        assert!(ocr.observe(b"definitely not an image").is_err());
    }

    #[test]
    fn test_transcript_ocr_uses_configured_threshold() {
        let flat = encode_png(&GrayImage::from_pixel(16, 16, Luma([90u8])));
        let sharp = encode_png(&GrayImage::from_fn(16, 16, |x, y| {
            Luma([if (x + y) % 2 == 0 { 255 } else { 0 }])
        }));

        let lenient = TranscriptOcr::new(vec!["TI".into()], BlurDetector::new(0.0));
        assert!(!lenient.observe(&flat).unwrap().is_blurry);

        let strict = TranscriptOcr::new(vec!["TI".into()], BlurDetector::new(f64::MAX));
        assert!(strict.observe(&sharp).unwrap().is_blurry);
    }
}
