//! Storage Layer
//!
//! Append-only persistence of scan results, aggregate statistics and paginated history.
//! Backends: in-memory and SQLite.

pub mod database;
pub mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::{DetectedData, Verdict};

pub use database::SqliteStore;
pub use memory::InMemoryStore;

/// Largest page size served by [`ScanStore::history`]
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Errors raised by scan stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode scan record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid history page {page} with limit {limit}")]
    InvalidPage { page: usize, limit: usize },
}

/// Flat record of one scan, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    /// Part number as claimed by the caller
    pub part_number: String,
    /// SHA-256 of the uploaded image, hex encoded
    pub image_digest: String,
    /// Status label, e.g. `"PASS"` or `"FAIL - Print Defect"`
    pub status: String,
    pub confidence: f64,
    pub issues: Vec<String>,
    pub explanation: String,
    pub detected_data: DetectedData,
    /// Unix timestamp (seconds)
    pub scanned_at: u64,
}

impl ScanRecord {
    /// Flatten a verdict into a storable record
    pub fn from_verdict(
        verdict: &Verdict,
        scan_id: impl Into<String>,
        part_number: impl Into<String>,
        image_digest: impl Into<String>,
        scanned_at: u64,
    ) -> Self {
        Self {
            scan_id: scan_id.into(),
            part_number: part_number.into(),
            image_digest: image_digest.into(),
            status: verdict.status.label(),
            confidence: verdict.confidence,
            issues: verdict.issues.clone(),
            explanation: verdict.explanation.clone(),
            detected_data: verdict.detected_data.clone(),
            scanned_at,
        }
    }

    pub fn is_genuine(&self) -> bool {
        self.status.contains("PASS")
    }

    pub fn is_counterfeit(&self) -> bool {
        self.status.contains("FAIL")
    }
}

/// Aggregate counts over persisted scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total: usize,
    pub genuine: usize,
    pub counterfeit: usize,
    /// Percentage of genuine scans, rounded to 2 decimals
    pub yield_rate: f64,
}

/// One page of scan history, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub scans: Vec<ScanRecord>,
    /// Total number of persisted scans
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl ScanStatistics {
    /// Build statistics from raw counts, deriving the yield rate
    pub fn from_counts(total: usize, genuine: usize, counterfeit: usize) -> Self {
        let yield_rate = if total == 0 {
            0.0
        } else {
            (genuine as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };

        Self {
            total,
            genuine,
            counterfeit,
            yield_rate,
        }
    }
}

/// Compute statistics over a set of records
pub fn aggregate_statistics<'a>(records: impl IntoIterator<Item = &'a ScanRecord>) -> ScanStatistics {
    let mut total = 0;
    let mut genuine = 0;
    let mut counterfeit = 0;

    for record in records {
        total += 1;
        if record.is_genuine() {
            genuine += 1;
        }
        if record.is_counterfeit() {
            counterfeit += 1;
        }
    }

    ScanStatistics::from_counts(total, genuine, counterfeit)
}

/// Validate a 1-based page request and return (offset, effective limit)
pub(crate) fn page_window(page: usize, limit: usize) -> Result<(usize, usize), StoreError> {
    if page == 0 || limit == 0 {
        return Err(StoreError::InvalidPage { page, limit });
    }
    let limit = limit.min(MAX_HISTORY_LIMIT);
    Ok(((page - 1).saturating_mul(limit), limit))
}

/// Persistence for scan results
pub trait ScanStore: Send + Sync {
    /// Append a record
    fn insert(&self, record: &ScanRecord) -> Result<(), StoreError>;

    /// All records in insertion order
    fn all(&self) -> Result<Vec<ScanRecord>, StoreError>;

    /// Number of persisted records
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.all()?.len())
    }

    /// A page of history, newest first. `page` is 1-based.
    fn history(&self, page: usize, limit: usize) -> Result<HistoryPage, StoreError> {
        let (offset, limit) = page_window(page, limit)?;
        let records = self.all()?;
        let total = records.len();
        let scans = records.into_iter().rev().skip(offset).take(limit).collect();

        Ok(HistoryPage {
            scans,
            total,
            page,
            limit,
        })
    }

    fn statistics(&self) -> Result<ScanStatistics, StoreError> {
        Ok(aggregate_statistics(&self.all()?))
    }
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "markguard", "MarkGuard")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "markguard", "MarkGuard")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}
