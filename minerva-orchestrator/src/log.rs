//! An event-sourced durable log of pipeline stage transitions. A process
//! restart replays this log to resume a journal from its last durably
//! recorded stage rather than from scratch, per `SPEC_FULL.md` §9: the
//! Rust-native substitute for a hosted workflow engine's history store.

use crate::errors::OrchestratorError;
use crate::state::PipelineStage;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pipeline_events (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    journal_id  TEXT NOT NULL,
    stage       TEXT NOT NULL,
    attempt     INTEGER NOT NULL,
    error       TEXT,
    at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pipeline_events_journal ON pipeline_events(journal_id, seq);
"#;

#[derive(Clone)]
pub struct PipelineLog {
    conn: Arc<Mutex<Connection>>,
}

impl PipelineLog {
    pub async fn open(path: &Path) -> Result<Self, OrchestratorError> {
        let conn = Connection::open(path).map_err(OrchestratorError::from_sqlite)?;
        conn.execute_batch(SCHEMA).map_err(OrchestratorError::from_sqlite)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub async fn open_in_memory() -> Result<Self, OrchestratorError> {
        let conn = Connection::open_in_memory().map_err(OrchestratorError::from_sqlite)?;
        conn.execute_batch(SCHEMA).map_err(OrchestratorError::from_sqlite)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub async fn record_stage(&self, journal_id: Uuid, stage: PipelineStage, attempt: u32, error: Option<&str>) -> Result<(), OrchestratorError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO pipeline_events (journal_id, stage, attempt, error, at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                journal_id.to_string(),
                serde_json::to_string(&stage).unwrap_or_default(),
                attempt,
                error,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(OrchestratorError::from_sqlite)?;
        Ok(())
    }

    /// The last durably recorded stage for a journal, used to resume
    /// after a restart. `None` if the journal has no recorded history.
    pub async fn last_stage(&self, journal_id: Uuid) -> Result<Option<PipelineStage>, OrchestratorError> {
        let conn = self.conn.lock().await;
        let stage_json: Option<String> = conn
            .query_row(
                "SELECT stage FROM pipeline_events WHERE journal_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![journal_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(OrchestratorError::from_sqlite)?;
        Ok(stage_json.and_then(|s| serde_json::from_str(&s).ok()))
    }
}
