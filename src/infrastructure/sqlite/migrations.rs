use std::time::Duration;

use rusqlite::Connection;

use crate::domain::error::DomainError;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id TEXT PRIMARY KEY,
            run_type TEXT NOT NULL,
            universe_size INTEGER NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            metrics TEXT NOT NULL DEFAULT '{}',
            ai_calls_count INTEGER NOT NULL DEFAULT 0,
            ai_cost REAL NOT NULL DEFAULT 0,
            error TEXT
        );

        CREATE TABLE IF NOT EXISTS candidates (
            id TEXT PRIMARY KEY,
            run_id TEXT NOT NULL REFERENCES runs(id),
            parent_id TEXT,
            stage TEXT NOT NULL,
            instrument_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            rank INTEGER NOT NULL,
            score REAL NOT NULL,
            trade_quality_score REAL,
            ai_confidence REAL,
            combined_score REAL,
            tier TEXT,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ai_cache (
            key TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_runs_type_status ON runs(run_type, status);
        CREATE INDEX IF NOT EXISTS idx_runs_started ON runs(started_at);
        CREATE INDEX IF NOT EXISTS idx_candidates_run_stage ON candidates(run_id, stage);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}

/// Open `db_path` in WAL mode with a busy timeout and an up-to-date schema.
/// Each `:memory:` connection is its own database.
pub fn open_connection(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    run_migrations(&conn)?;
    Ok(conn)
}
