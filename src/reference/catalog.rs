//! JSON reference catalog loading

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use super::ReferenceRecord;

/// Errors raised while reading a reference catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read reference catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid reference catalog {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a catalog file mapping part numbers to reference records, e.g.
///
/// ```json
/// { "LM317T": { "manufacturer": "ON Semi", "expected_logo": "ON", "description": "Regulator" } }
/// ```
pub fn load_catalog(path: &Path) -> Result<HashMap<String, ReferenceRecord>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries: HashMap<String, ReferenceRecord> =
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Loaded {} reference entries from {:?}", entries.len(), path);
    Ok(entries)
}
