//! Embedded libSQL result store.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::{debug, warn};

use webscout_shared::{Result, WebScoutError};

use crate::migrations;
use crate::{RecordKind, ResultStore, valid_id};

/// Result store backed by a local libSQL database.
pub struct LibsqlStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WebScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| WebScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| WebScoutError::Storage(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        WebScoutError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    async fn upsert(&self, kind: RecordKind, id: &str, json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "INSERT INTO {} (id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET
               data = excluded.data,
               updated_at = excluded.updated_at",
            kind.table()
        );
        self.conn
            .execute(&sql, params![id, json, now.as_str()])
            .await
            .map_err(|e| WebScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn select(&self, kind: RecordKind, id: &str) -> Result<Option<String>> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", kind.table());
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(|e| WebScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| WebScoutError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(WebScoutError::Storage(e.to_string())),
        }
    }
}

#[async_trait]
impl ResultStore for LibsqlStore {
    async fn save(&self, kind: RecordKind, id: &str, data: &serde_json::Value) -> bool {
        if !valid_id(id) {
            warn!(id, "rejecting save with invalid record id");
            return false;
        }

        let json = match serde_json::to_string(data) {
            Ok(json) => json,
            Err(e) => {
                warn!(id, error = %e, "failed to serialize record");
                return false;
            }
        };

        match self.upsert(kind, id, &json).await {
            Ok(()) => {
                debug!(id, table = kind.table(), "record saved");
                true
            }
            Err(e) => {
                warn!(id, table = kind.table(), error = %e, "failed to save record");
                false
            }
        }
    }

    async fn get(&self, kind: RecordKind, id: &str) -> Option<serde_json::Value> {
        if !valid_id(id) {
            warn!(id, "rejecting get with invalid record id");
            return None;
        }

        let json = match self.select(kind, id).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(id, table = kind.table(), error = %e, "failed to read record");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(id, table = kind.table(), error = %e, "corrupt record row");
                None
            }
        }
    }
}
