//! Authenticity Validation
//!
//! Compares an OCR observation against a reference record and produces a [`Verdict`].
//! Checks run in a fixed order and can only move the status from PASS toward a failure.
//! Validation is pure: no I/O, and identical inputs give identical verdicts.

pub mod verdict;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reference::ReferenceRecord;

pub use verdict::{DetectedData, ImageQuality, Status, Verdict};

/// Starting confidence for every scan
pub const INITIAL_CONFIDENCE: f64 = 98.5;
/// Lowest confidence a verdict can report
pub const CONFIDENCE_FLOOR: f64 = 10.0;
/// Penalty when the print looks blurry or broken
pub const PRINT_DEFECT_PENALTY: f64 = 35.0;
/// Penalty when the manufacturer logo cannot be found
pub const MISSING_LOGO_PENALTY: f64 = 15.0;

const PRINT_DEFECT_ISSUE: &str = "Text is blurry or broken (Possible Counterfeit)";
const PRINT_DEFECT_EXPLANATION: &str = "The image quality is poor with blurred text. \
    This is a strong indicator of counterfeiting as genuine IC manufacturers use \
    high-quality printing processes.";

/// Text detected on the package, as delivered by an OCR collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrObservation {
    /// Upper-cased lines of detected text, in reading order
    pub text_fragments: Vec<String>,
    /// Image judged too degraded for reliable inspection
    pub is_blurry: bool,
}

impl OcrObservation {
    pub fn new(text_fragments: Vec<String>, is_blurry: bool) -> Self {
        Self {
            text_fragments,
            is_blurry,
        }
    }
}

/// Validate one scan.
pub fn validate(observation: &OcrObservation, reference: &ReferenceRecord) -> Verdict {
    let detected_texts: Vec<String> = observation
        .text_fragments
        .iter()
        .map(|t| t.to_uppercase())
        .collect();

    let mut status = Status::Pass;
    let mut issues = Vec::new();
    let mut confidence = INITIAL_CONFIDENCE;
    let mut explanation = String::new();

    // Print quality
    if observation.is_blurry {
        status = Status::print_defect();
        issues.push(PRINT_DEFECT_ISSUE.to_string());
        explanation = PRINT_DEFECT_EXPLANATION.to_string();
        confidence -= PRINT_DEFECT_PENALTY;
    }

    // Manufacturer logo. Only reported while nothing else has failed; status is left as is.
    if reference.has_known_logo() {
        let expected_logo = reference.expected_logo.to_uppercase();
        let logo_found = detected_texts.iter().any(|t| t.contains(&expected_logo));

        if !logo_found && status.is_pass() {
            issues.push(format!("Logo '{}' not clearly detected", expected_logo));
            explanation = format!(
                "The expected manufacturer logo '{}' from {} was not detected in the image. \
                 Genuine ICs always have clear manufacturer markings.",
                expected_logo, reference.manufacturer
            );
            confidence -= MISSING_LOGO_PENALTY;
        }
    }

    if status.is_pass() && explanation.is_empty() {
        explanation = format!(
            "✅ All authenticity checks passed! The IC matches the {} datasheet specifications. \
             The part number, logo, and print quality are consistent with genuine components \
             from the official supplier.",
            reference.manufacturer
        );
    }

    let verdict = Verdict {
        status,
        confidence: confidence.max(CONFIDENCE_FLOOR),
        issues,
        explanation,
        detected_data: DetectedData {
            manufacturer: reference.manufacturer.clone(),
            expected_logo: reference.expected_logo.clone(),
            detected_texts,
            image_quality: ImageQuality::from_blur(observation.is_blurry),
        },
    };

    debug!(
        status = %verdict.status,
        confidence = verdict.confidence,
        issues = verdict.issues.len(),
        "Validation complete"
    );

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ReferenceResolver, StaticReferenceTable};

    fn ne555() -> ReferenceRecord {
        StaticReferenceTable::builtin().resolve("NE555DR")
    }

    fn observation(fragments: &[&str], is_blurry: bool) -> OcrObservation {
        OcrObservation::new(fragments.iter().map(|s| s.to_string()).collect(), is_blurry)
    }

    #[test]
    fn test_genuine_part_passes() {
        let verdict = validate(&observation(&["NE555DR", "TI", "BATCH2024"], false), &ne555());

        assert_eq!(verdict.status, Status::Pass);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.confidence, 98.5);
        assert!(verdict.explanation.contains("Texas Instruments"));
        assert_eq!(verdict.detected_data.image_quality, ImageQuality::Clear);
    }

    #[test]
    fn test_missing_logo_keeps_pass_status() {
        let verdict = validate(&observation(&["NE555DR"], false), &ne555());

        assert_eq!(verdict.status, Status::Pass);
        assert_eq!(verdict.issues, vec!["Logo 'TI' not clearly detected".to_string()]);
        assert_eq!(verdict.confidence, 83.5);
        assert!(verdict.explanation.contains("'TI'"));
        assert!(verdict.explanation.contains("Texas Instruments"));
    }

    #[test]
    fn test_blurry_image_fails_print_check() {
        let verdict = validate(&observation(&[], true), &ne555());

        assert_eq!(verdict.status.label(), "FAIL - Print Defect");
        assert_eq!(verdict.confidence, 63.5);
        assert_eq!(verdict.explanation, PRINT_DEFECT_EXPLANATION);
        assert_eq!(verdict.detected_data.image_quality, ImageQuality::Blurry);
    }

    #[test]
    fn test_blur_dominates_logo_mismatch() {
        let verdict = validate(&observation(&["NE555DR"], true), &ne555());

        assert!(!verdict.status.is_pass());
        assert_eq!(verdict.explanation, PRINT_DEFECT_EXPLANATION);
    }

    /// Once the print check has failed, a missing logo adds neither an issue nor a penalty.
    #[test]
    fn test_logo_check_silent_after_print_failure() {
        let verdict = validate(&observation(&["NE555DR"], true), &ne555());

        assert_eq!(verdict.issues, vec![PRINT_DEFECT_ISSUE.to_string()]);
        assert_eq!(verdict.confidence, 63.5);
    }

    #[test]
    fn test_logo_match_is_case_insensitive_substring() {
        let verdict = validate(&observation(&["TEXAS INSTRUMENTS TI"], false), &ne555());
        assert!(verdict.issues.is_empty());

        let verdict = validate(&observation(&["ne555dr ti"], false), &ne555());
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.detected_data.detected_texts, vec!["NE555DR TI".to_string()]);
    }

    #[test]
    fn test_unknown_part_skips_logo_check() {
        let reference = StaticReferenceTable::builtin().resolve("XYZ999");
        let verdict = validate(&observation(&["SOMETHING"], false), &reference);

        assert_eq!(verdict.status, Status::Pass);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.confidence, 98.5);
        assert!(verdict.explanation.contains("Unknown"));
    }

    #[test]
    fn test_empty_observation_with_known_logo() {
        let verdict = validate(&OcrObservation::default(), &ne555());
        assert_eq!(verdict.issues.len(), 1);
        assert_eq!(verdict.confidence, 83.5);
    }

    #[test]
    fn test_detected_data_snapshot() {
        let verdict = validate(&observation(&["ne555dr", "ti"], false), &ne555());

        assert_eq!(verdict.detected_data.manufacturer, "Texas Instruments");
        assert_eq!(verdict.detected_data.expected_logo, "Ti");
        assert_eq!(verdict.detected_data.detected_texts, vec!["NE555DR", "TI"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let obs = observation(&["NE555DR"], true);
        let reference = ne555();

        let first = serde_json::to_string(&validate(&obs, &reference)).unwrap();
        let second = serde_json::to_string(&validate(&obs, &reference)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_confidence_and_pass_invariants() {
        let table = StaticReferenceTable::builtin();
        let fragment_sets: [&[&str]; 4] = [&[], &["NE555DR"], &["TI", "M", "F"], &["UNKNOWN"]];

        for part in ["NE555DR", "LM7805", "ATMEGA328P", "XYZ999"] {
            let reference = table.resolve(part);
            for fragments in fragment_sets {
                for is_blurry in [false, true] {
                    let verdict = validate(&observation(fragments, is_blurry), &reference);

                    assert!((CONFIDENCE_FLOOR..=INITIAL_CONFIDENCE).contains(&verdict.confidence));
                    assert!(!verdict.explanation.is_empty());
                    if is_blurry {
                        assert!(!verdict.status.is_pass());
                    }
                    if verdict.status.is_pass() && verdict.confidence == INITIAL_CONFIDENCE {
                        assert!(verdict.issues.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_observation_missing_fields_default() {
        let obs: OcrObservation = serde_json::from_str("{}").unwrap();
        assert!(obs.text_fragments.is_empty());
        assert!(!obs.is_blurry);

        let obs: OcrObservation = serde_json::from_str(r#"{"is_blurry": true}"#).unwrap();
        assert!(obs.is_blurry);
    }
}
