//! Durable, bounded error ledger.
//!
//! The [`ErrorLedger`] keeps lifetime error counters alongside a capped
//! timeline of the most recent failures, persisted as JSON after every
//! mutation. Persistence is best-effort: a failed write is logged, never
//! raised. A corrupt or missing stats file reinitializes an empty ledger.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use webscout_shared::WebScoutError;

/// Maximum number of records retained in the timeline.
pub const TIMELINE_CAP: usize = 100;

// ---------------------------------------------------------------------------
// Records & statistics
// ---------------------------------------------------------------------------

/// A single tracked error occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the error was tracked.
    pub timestamp: DateTime<Utc>,
    /// Error kind name, e.g. `ProviderError`.
    pub kind: String,
    /// Display message of the error.
    pub message: String,
    /// Caller-supplied context (query, depth, stage, ...).
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Aggregated error statistics: lifetime counters plus a bounded timeline.
///
/// `total_errors` and `error_kinds` count every error ever tracked; the
/// timeline holds at most [`TIMELINE_CAP`] most-recent records, oldest
/// evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Lifetime error count (not bounded by the timeline cap).
    pub total_errors: u64,
    /// Lifetime count per error kind.
    pub error_kinds: BTreeMap<String, u64>,
    /// Most recent records, oldest first.
    pub timeline: VecDeque<ErrorRecord>,
    /// When the ledger was last mutated.
    pub last_updated: DateTime<Utc>,
}

impl ErrorStats {
    fn empty() -> Self {
        Self {
            total_errors: 0,
            error_kinds: BTreeMap::new(),
            timeline: VecDeque::new(),
            last_updated: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorLedger
// ---------------------------------------------------------------------------

/// Process-wide error ledger backed by a JSON stats file.
pub struct ErrorLedger {
    path: PathBuf,
    stats: Mutex<ErrorStats>,
}

impl ErrorLedger {
    /// Open the ledger at `path`, loading existing statistics.
    ///
    /// An absent or unreadable file initializes an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = Self::load(&path);
        Self {
            path,
            stats: Mutex::new(stats),
        }
    }

    fn load(path: &Path) -> ErrorStats {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!(?path, "no error statistics file, starting empty");
                return ErrorStats::empty();
            }
        };

        match serde_json::from_str(&content) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(?path, error = %e, "corrupt error statistics file, reinitializing");
                ErrorStats::empty()
            }
        }
    }

    /// Track one error occurrence.
    ///
    /// Increments the lifetime counters, appends to the timeline (evicting
    /// the oldest record past the cap), and persists the updated statistics.
    pub fn track(&self, kind: &str, message: &str, context: BTreeMap<String, serde_json::Value>) {
        let now = Utc::now();
        let mut stats = self.lock();

        stats.total_errors += 1;
        *stats.error_kinds.entry(kind.to_string()).or_insert(0) += 1;

        stats.timeline.push_back(ErrorRecord {
            timestamp: now,
            kind: kind.to_string(),
            message: message.to_string(),
            context,
        });
        while stats.timeline.len() > TIMELINE_CAP {
            stats.timeline.pop_front();
        }

        stats.last_updated = now;
        self.persist(&stats);
    }

    /// Track a classified [`WebScoutError`].
    pub fn track_error(&self, err: &WebScoutError, context: BTreeMap<String, serde_json::Value>) {
        self.track(err.kind_name(), &err.to_string(), context);
    }

    /// A copy of the current statistics.
    pub fn snapshot(&self) -> ErrorStats {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ErrorStats> {
        match self.stats.lock() {
            Ok(guard) => guard,
            // A panic mid-track leaves counters at worst one behind; the
            // stats themselves cannot be left torn.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Write the statistics file. Failures are logged, not raised.
    fn persist(&self, stats: &ErrorStats) {
        let json = match serde_json::to_string_pretty(stats) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize error statistics");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!(path = ?self.path, error = %e, "failed to save error statistics");
        }
    }
}
