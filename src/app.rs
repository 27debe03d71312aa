//! Scan Coordinator
//!
//! Runs one scan end to end: OCR (with fallback), reference lookup, validation and
//! persistence. Collaborators are injected so each can be replaced independently.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::reference::ReferenceResolver;
use crate::storage::{ScanRecord, ScanStore};
use crate::validation::{validate, Verdict};
use crate::vision::{observe_or_fallback, OcrProvider};

/// Result of a completed scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scan_id: String,
    pub verdict: Verdict,
    /// Whether the record reached the store
    pub persisted: bool,
}

/// Request-scoped scan pipeline
pub struct ScanService {
    ocr: Box<dyn OcrProvider>,
    resolver: Arc<dyn ReferenceResolver>,
    store: Arc<dyn ScanStore>,
}

impl ScanService {
    pub fn new(
        ocr: Box<dyn OcrProvider>,
        resolver: Arc<dyn ReferenceResolver>,
        store: Arc<dyn ScanStore>,
    ) -> Self {
        Self {
            ocr,
            resolver,
            store,
        }
    }

    /// Scan an image against a claimed part number.
    ///
    /// Never fails: OCR errors fall back to a degraded observation and storage errors are
    /// logged, so a verdict is always returned.
    pub fn scan(&self, image_bytes: &[u8], part_number: &str) -> ScanOutcome {
        let scan_id = Uuid::new_v4().to_string();
        let part_number = part_number.trim();
        info!("Scan {} started for part '{}'", scan_id, part_number);

        let observation = observe_or_fallback(self.ocr.as_ref(), image_bytes);
        let reference = self.resolver.resolve(part_number);
        if reference.is_unknown() {
            warn!("Part '{}' not found in reference data; logo check skipped", part_number);
        }

        let verdict = validate(&observation, &reference);

        let record = ScanRecord::from_verdict(
            &verdict,
            scan_id.clone(),
            part_number,
            image_digest(image_bytes),
            unix_now(),
        );
        let persisted = match self.store.insert(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist scan {}: {}", scan_id, e);
                false
            }
        };

        info!(
            "Scan {} finished: {} ({:.1}% confidence)",
            scan_id, verdict.status, verdict.confidence
        );

        ScanOutcome {
            scan_id,
            verdict,
            persisted,
        }
    }
}

/// SHA-256 of the image bytes, hex encoded
pub fn image_digest(image_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_bytes);
    format!("{:x}", hasher.finalize())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
