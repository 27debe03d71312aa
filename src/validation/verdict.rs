//! Verdict data structures produced by the authenticity validator

use serde::{Deserialize, Serialize};
use std::fmt;

const PASS_LABEL: &str = "PASS";
const FAIL_PREFIX: &str = "FAIL - ";

/// Outcome of a scan.
///
/// Serialized as its human-readable label: `"PASS"` or `"FAIL - <reason>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Status {
    Pass,
    Fail(String),
}

impl Status {
    /// Failure caused by degraded or broken printing
    pub fn print_defect() -> Self {
        Status::Fail("Print Defect".to_string())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    /// Label as stored and displayed
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str(PASS_LABEL),
            Status::Fail(reason) => write!(f, "{}{}", FAIL_PREFIX, reason),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        if label == PASS_LABEL {
            return Status::Pass;
        }
        match label.strip_prefix(FAIL_PREFIX) {
            Some(reason) => Status::Fail(reason.to_string()),
            None => Status::Fail(label),
        }
    }
}

/// Qualitative image quality label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageQuality {
    Clear,
    Blurry,
}

impl ImageQuality {
    pub fn from_blur(is_blurry: bool) -> Self {
        if is_blurry {
            ImageQuality::Blurry
        } else {
            ImageQuality::Clear
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageQuality::Clear => f.write_str("Clear"),
            ImageQuality::Blurry => f.write_str("Blurry"),
        }
    }
}

/// Snapshot of what was expected and what was observed, kept for audit and display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedData {
    /// Manufacturer from the reference record
    pub manufacturer: String,
    /// Logo from the reference record, as given
    pub expected_logo: String,
    /// Upper-cased OCR fragments
    pub detected_texts: Vec<String>,
    pub image_quality: ImageQuality,
}

/// Authenticity decision for a single scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    /// Score in `[10.0, 98.5]`
    pub confidence: f64,
    /// One entry per failed check, in evaluation order
    pub issues: Vec<String>,
    /// Dominant reason for the verdict
    pub explanation: String,
    pub detected_data: DetectedData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Pass.label(), "PASS");
        assert_eq!(Status::print_defect().label(), "FAIL - Print Defect");
        assert_eq!(Status::Fail("Logo Mismatch".into()).to_string(), "FAIL - Logo Mismatch");
    }

    #[test]
    fn test_status_from_label() {
        assert_eq!(Status::from("PASS".to_string()), Status::Pass);
        assert_eq!(
            Status::from("FAIL - Print Defect".to_string()),
            Status::print_defect()
        );
        // Labels without the usual prefix keep their full text as the reason
        assert_eq!(
            Status::from("REJECTED".to_string()),
            Status::Fail("REJECTED".to_string())
        );
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&Status::print_defect()).unwrap();
        assert_eq!(json, "\"FAIL - Print Defect\"");

        let parsed: Status = serde_json::from_str("\"PASS\"").unwrap();
        assert!(parsed.is_pass());
    }

    #[test]
    fn test_image_quality_from_blur() {
        assert_eq!(ImageQuality::from_blur(true), ImageQuality::Blurry);
        assert_eq!(ImageQuality::from_blur(false).to_string(), "Clear");
        assert_eq!(serde_json::to_string(&ImageQuality::Blurry).unwrap(), "\"Blurry\"");
    }
}
