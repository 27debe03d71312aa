//! Reference Data Layer
//!
//! Resolves a claimed part number to the markings a genuine part is expected to carry.
//! The built-in table stands in for datasheet lookups and can be extended from a JSON
//! catalog file.

pub mod catalog;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strsim::normalized_levenshtein;

pub use catalog::load_catalog;

/// Sentinel used for manufacturer and logo when a part number is not recognized
pub const UNKNOWN: &str = "Unknown";

/// Minimum similarity for a known part number to be offered as a suggestion
const SUGGESTION_THRESHOLD: f64 = 0.5;

/// Expected identifying attributes for a part number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Manufacturer name, or `"Unknown"`
    #[serde(default = "unknown_string")]
    pub manufacturer: String,
    /// Marking expected to appear within the detected text, or `"Unknown"`
    #[serde(default)]
    pub expected_logo: String,
    /// Informational only
    #[serde(default)]
    pub description: String,
}

fn unknown_string() -> String {
    UNKNOWN.to_string()
}

impl ReferenceRecord {
    pub fn new(
        manufacturer: impl Into<String>,
        expected_logo: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            expected_logo: expected_logo.into(),
            description: description.into(),
        }
    }

    /// Record returned for part numbers missing from the table
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, "Not Found")
    }

    /// Whether the logo check has anything to compare against
    pub fn has_known_logo(&self) -> bool {
        self.expected_logo.to_uppercase() != UNKNOWN.to_uppercase()
    }

    pub fn is_unknown(&self) -> bool {
        self.manufacturer == UNKNOWN
    }
}

/// Capability to look up reference data for a part number.
///
/// Resolution never fails: an unrecognized part yields [`ReferenceRecord::unknown`].
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, part_number: &str) -> ReferenceRecord;
}

/// Normalize a part number for lookup
pub fn normalize_part_number(part_number: &str) -> String {
    part_number.trim().to_uppercase()
}

/// In-memory, read-only reference table
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceTable {
    entries: HashMap<String, ReferenceRecord>,
}

impl StaticReferenceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in datasheet entries
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            "NE555DR",
            ReferenceRecord::new("Texas Instruments", "Ti", "Precision Timer"),
        );
        table.insert(
            "LM7805",
            ReferenceRecord::new("Fairchild", "F", "Voltage Regulator"),
        );
        table.insert(
            "ATMEGA328P",
            ReferenceRecord::new("Microchip", "M", "8-bit AVR Microcontroller"),
        );
        table
    }

    /// Insert or replace an entry. The key is normalized like lookups are.
    pub fn insert(&mut self, part_number: &str, record: ReferenceRecord) {
        self.entries.insert(normalize_part_number(part_number), record);
    }

    /// Merge entries from another source, overriding existing part numbers
    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, ReferenceRecord)>) {
        for (part_number, record) in entries {
            self.insert(&part_number, record);
        }
    }

    /// Number of known part numbers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Known part numbers, sorted
    pub fn part_numbers(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Known part numbers that look like `part_number`, most similar first
    pub fn suggest(&self, part_number: &str, limit: usize) -> Vec<String> {
        let needle = normalize_part_number(part_number);
        let mut scored: Vec<(f64, &str)> = self
            .entries
            .keys()
            .map(|known| (normalized_levenshtein(&needle, known), known.as_str()))
            .filter(|(score, known)| *score >= SUGGESTION_THRESHOLD && *known != needle)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, known)| known.to_string())
            .collect()
    }
}

impl ReferenceResolver for StaticReferenceTable {
    fn resolve(&self, part_number: &str) -> ReferenceRecord {
        self.entries
            .get(&normalize_part_number(part_number))
            .cloned()
            .unwrap_or_else(ReferenceRecord::unknown)
    }
}
