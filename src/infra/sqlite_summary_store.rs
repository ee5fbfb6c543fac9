use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::app::ports::{ProcessingSummary, SummaryStorePort};
use crate::error::{CleanerError, Result};

/// SQLite-backed summary store, one row per processed file
pub struct SqliteSummaryStore {
    conn: Mutex<Connection>,
}

impl SqliteSummaryStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processing_summaries (
                run_id            TEXT PRIMARY KEY,
                source_bucket     TEXT NOT NULL,
                source_key        TEXT NOT NULL,
                file_name         TEXT NOT NULL,
                row_count         INTEGER NOT NULL,
                column_count      INTEGER NOT NULL,
                processed_count   INTEGER NOT NULL,
                skipped_count     INTEGER NOT NULL,
                rejection_reasons TEXT NOT NULL,
                source_encoding   TEXT NOT NULL,
                processed_at      TEXT NOT NULL,
                outputs           TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_processing_summaries_processed_at
                ON processing_summaries (processed_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CleanerError::Storage("summary store lock poisoned".to_string()))
    }
}

fn text_column<T>(idx: usize, raw: &str, parsed: std::result::Result<T, String>) -> rusqlite::Result<T> {
    parsed.map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("{}: {}", raw, e).into(),
        )
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ProcessingSummary> {
    let run_id: String = row.get(0)?;
    let reasons: String = row.get(8)?;
    let processed_at: String = row.get(10)?;
    let outputs: String = row.get(11)?;

    Ok(ProcessingSummary {
        run_id: text_column(0, &run_id, Uuid::parse_str(&run_id).map_err(|e| e.to_string()))?,
        source_bucket: row.get(1)?,
        source_key: row.get(2)?,
        file_name: row.get(3)?,
        row_count: row.get::<_, i64>(4)? as usize,
        column_count: row.get::<_, i64>(5)? as usize,
        processed_count: row.get::<_, i64>(6)? as usize,
        skipped_count: row.get::<_, i64>(7)? as usize,
        rejection_reasons: text_column(8, &reasons, serde_json::from_str(&reasons).map_err(|e| e.to_string()))?,
        source_encoding: row.get(9)?,
        processed_at: text_column(
            10,
            &processed_at,
            DateTime::parse_from_rfc3339(&processed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| e.to_string()),
        )?,
        outputs: text_column(11, &outputs, serde_json::from_str(&outputs).map_err(|e| e.to_string()))?,
    })
}

#[async_trait]
impl SummaryStorePort for SqliteSummaryStore {
    async fn put_summary(&self, summary: &ProcessingSummary) -> Result<()> {
        let reasons = serde_json::to_string(&summary.rejection_reasons)?;
        let outputs = serde_json::to_string(&summary.outputs)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO processing_summaries (
                run_id, source_bucket, source_key, file_name, row_count, column_count,
                processed_count, skipped_count, rejection_reasons, source_encoding,
                processed_at, outputs
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                summary.run_id.to_string(),
                summary.source_bucket,
                summary.source_key,
                summary.file_name,
                summary.row_count as i64,
                summary.column_count as i64,
                summary.processed_count as i64,
                summary.skipped_count as i64,
                reasons,
                summary.source_encoding,
                summary.processed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                outputs,
            ],
        )?;
        Ok(())
    }

    async fn list_summaries(&self, limit: usize) -> Result<Vec<ProcessingSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, source_bucket, source_key, file_name, row_count, column_count,
                    processed_count, skipped_count, rejection_reasons, source_encoding,
                    processed_at, outputs
             FROM processing_summaries
             ORDER BY processed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], summary_from_row)?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }
}
