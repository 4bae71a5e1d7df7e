//! Result persistence for research envelopes and synthesis blobs.
//!
//! The [`ResultStore`] trait is the narrow collaborator interface the rest
//! of the system sees: `save` reports success, `get` reports presence, and
//! backend failures are logged rather than raised. Two backends exist:
//! - [`FsStore`] — one JSON file per record under a root directory
//! - [`LibsqlStore`] — an embedded libSQL database
//!
//! [`open_store`] selects the backend from configuration, falling back to
//! the filesystem when the configured backend is unknown or fails to open.

mod db;
mod fs;
mod migrations;

use async_trait::async_trait;
use tracing::warn;

use webscout_shared::{Result, StorageConfig};

pub use db::LibsqlStore;
pub use fs::FsStore;

/// Database file name used by the libSQL backend.
const DB_FILE_NAME: &str = "webscout.db";

// ---------------------------------------------------------------------------
// ResultStore
// ---------------------------------------------------------------------------

/// Category of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A full research response envelope.
    Research,
    /// An LLM synthesis result.
    Synthesis,
}

impl RecordKind {
    /// File-name prefix for the filesystem backend.
    pub(crate) fn file_prefix(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Synthesis => "synthesis",
        }
    }

    /// Table name for the database backend.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Research => "research_results",
            Self::Synthesis => "syntheses",
        }
    }
}

/// Persistence collaborator for research results.
///
/// Both operations are best-effort: failures are logged inside the backend
/// and surfaced only as `false` / `None`.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist `data` under `id`. Returns whether the write succeeded.
    async fn save(&self, kind: RecordKind, id: &str, data: &serde_json::Value) -> bool;

    /// Fetch the record stored under `id`, if any.
    async fn get(&self, kind: RecordKind, id: &str) -> Option<serde_json::Value>;
}

/// Record ids come from callers; keep them path- and SQL-safe.
pub(crate) fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Open the result store configured in `[storage]`.
///
/// Unknown backends and database-open failures fall back to the filesystem
/// backend with a warning.
pub async fn open_store(config: &StorageConfig) -> Result<Box<dyn ResultStore>> {
    match config.backend.as_str() {
        "database" => {
            let db_path = std::path::Path::new(&config.path).join(DB_FILE_NAME);
            match LibsqlStore::open(&db_path).await {
                Ok(store) => return Ok(Box::new(store)),
                Err(e) => {
                    warn!(error = %e, "failed to open database backend, falling back to local");
                }
            }
        }
        "local" => {}
        other => {
            warn!(backend = other, "unknown storage backend, falling back to local");
        }
    }

    Ok(Box::new(FsStore::open(&config.path)?))
}
