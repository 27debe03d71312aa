//! SQLite database for persistent storage

use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

use super::{page_window, HistoryPage, ScanRecord, ScanStatistics, ScanStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS scans (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id       TEXT NOT NULL UNIQUE,
    part_number   TEXT NOT NULL,
    image_digest  TEXT NOT NULL,
    status        TEXT NOT NULL,
    confidence    REAL NOT NULL,
    issues        TEXT NOT NULL,
    explanation   TEXT NOT NULL,
    detected_data TEXT NOT NULL,
    scanned_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scans_status ON scans(status);
";

const SELECT_COLUMNS: &str = "scan_id, part_number, image_digest, status, confidence, \
    issues, explanation, detected_data, scanned_at";

/// Scan store backed by a SQLite database file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create database at path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening scan database at {:?}", path);
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Database that lives only as long as this handle
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(SCHEMA)?;
        Ok(())
    }
}

/// Raw column values; JSON columns are decoded after the row borrow ends
struct RawRow {
    scan_id: String,
    part_number: String,
    image_digest: String,
    status: String,
    confidence: f64,
    issues: String,
    explanation: String,
    detected_data: String,
    scanned_at: i64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            scan_id: row.get(0)?,
            part_number: row.get(1)?,
            image_digest: row.get(2)?,
            status: row.get(3)?,
            confidence: row.get(4)?,
            issues: row.get(5)?,
            explanation: row.get(6)?,
            detected_data: row.get(7)?,
            scanned_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<ScanRecord, StoreError> {
        Ok(ScanRecord {
            scan_id: self.scan_id,
            part_number: self.part_number,
            image_digest: self.image_digest,
            status: self.status,
            confidence: self.confidence,
            issues: serde_json::from_str(&self.issues)?,
            explanation: self.explanation,
            detected_data: serde_json::from_str(&self.detected_data)?,
            scanned_at: self.scanned_at.max(0) as u64,
        })
    }
}

fn collect_records(rows: Vec<RawRow>) -> Result<Vec<ScanRecord>, StoreError> {
    rows.into_iter().map(RawRow::into_record).collect()
}

impl ScanStore for SqliteStore {
    fn insert(&self, record: &ScanRecord) -> Result<(), StoreError> {
        let issues = serde_json::to_string(&record.issues)?;
        let detected_data = serde_json::to_string(&record.detected_data)?;
        let scanned_at = record.scanned_at as i64;

        self.conn.lock().execute(
            "INSERT INTO scans (scan_id, part_number, image_digest, status, confidence, \
             issues, explanation, detected_data, scanned_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.scan_id,
                record.part_number,
                record.image_digest,
                record.status,
                record.confidence,
                issues,
                record.explanation,
                detected_data,
                scanned_at,
            ],
        )?;

        debug!("Persisted scan {}", record.scan_id);
        Ok(())
    }

    fn all(&self) -> Result<Vec<ScanRecord>, StoreError> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!("SELECT {} FROM scans ORDER BY id ASC", SELECT_COLUMNS))?;
            let rows = stmt
                .query_map([], RawRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        collect_records(rows)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn history(&self, page: usize, limit: usize) -> Result<HistoryPage, StoreError> {
        let (offset, limit) = page_window(page, limit)?;

        let (total, rows) = {
            let conn = self.conn.lock();
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))?;
            let total = total.max(0) as usize;

            let rows = if offset >= total {
                Vec::new()
            } else {
                let sql_limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let sql_offset = i64::try_from(offset).unwrap_or(i64::MAX);
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM scans ORDER BY id DESC LIMIT ?1 OFFSET ?2",
                    SELECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![sql_limit, sql_offset], RawRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };
            (total, rows)
        };

        Ok(HistoryPage {
            scans: collect_records(rows)?,
            total,
            page,
            limit,
        })
    }

    /// Counts statuses in SQL; `instr` matches the case-sensitive substring test
    /// used by `ScanRecord::is_genuine` and `is_counterfeit`
    fn statistics(&self) -> Result<ScanStatistics, StoreError> {
        let (total, genuine, counterfeit): (i64, i64, i64) = self.conn.lock().query_row(
            "SELECT COUNT(*), \
             COALESCE(SUM(instr(status, 'PASS') > 0), 0), \
             COALESCE(SUM(instr(status, 'FAIL') > 0), 0) \
             FROM scans",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ScanStatistics::from_counts(
            total.max(0) as usize,
            genuine.max(0) as usize,
            counterfeit.max(0) as usize,
        ))
    }
}
