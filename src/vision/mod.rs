//! Vision/OCR Layer
//!
//! Collaborators that turn an uploaded package photo into an [`OcrObservation`].
//! Providers:
//! - `MockOcr` (fixed result, for demos and offline runs)
//! - `TranscriptOcr` (operator-supplied text, print quality measured from the image)

pub mod blur;
pub mod ocr;

use image::GrayImage;
use thiserror::Error;
use tracing::warn;

use crate::validation::OcrObservation;

pub use blur::BlurDetector;
pub use ocr::{MockOcr, TranscriptOcr};

/// Errors raised by OCR providers
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image is empty")]
    EmptyImage,

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Produces text observations for an image
pub trait OcrProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Observe the text printed on the package in `image_bytes`
    fn observe(&self, image_bytes: &[u8]) -> Result<OcrObservation, OcrError>;
}

/// Observation substituted when a provider fails.
///
/// An unreadable image counts as a print-quality failure, so the scan continues into a
/// failing verdict instead of aborting.
pub fn fallback_observation() -> OcrObservation {
    OcrObservation::new(Vec::new(), true)
}

/// Run a provider, substituting [`fallback_observation`] on error
pub fn observe_or_fallback(provider: &dyn OcrProvider, image_bytes: &[u8]) -> OcrObservation {
    match provider.observe(image_bytes) {
        Ok(observation) => observation,
        Err(e) => {
            warn!("OCR provider '{}' failed, using fallback observation: {}", provider.name(), e);
            fallback_observation()
        }
    }
}

/// Upper-case and trim fragments, dropping blank lines
pub fn normalize_fragments(fragments: Vec<String>) -> Vec<String> {
    fragments
        .into_iter()
        .map(|f| f.trim().to_uppercase())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Decode any supported image format into grayscale
pub(crate) fn decode_grayscale(image_bytes: &[u8]) -> Result<GrayImage, OcrError> {
    if image_bytes.is_empty() {
        return Err(OcrError::EmptyImage);
    }
    Ok(image::load_from_memory(image_bytes)?.to_luma8())
}
