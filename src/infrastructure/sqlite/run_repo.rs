use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::run::Run;
use crate::domain::error::DomainError;
use crate::domain::ports::run_repository::*;
use crate::domain::values::run_type::{RunStatus, RunType};
use crate::domain::values::stage::CandidateStage;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

const RUN_COLUMNS: &str =
    "id, run_type, universe_size, status, started_at, completed_at, metrics, ai_calls_count, ai_cost, error";

pub struct SqliteRunRepo {
    conn: Mutex<Connection>,
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn text_err(col: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

impl SqliteRunRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_run(row: &rusqlite::Row) -> Result<Run, rusqlite::Error> {
        let type_str: String = row.get(1)?;
        let universe_size: i64 = row.get(2)?;
        let status_str: String = row.get(3)?;
        let started_str: String = row.get(4)?;
        let completed_str: Option<String> = row.get(5)?;
        let metrics_str: String = row.get(6)?;
        let ai_calls: i64 = row.get(7)?;

        let run_type: RunType = type_str.parse().map_err(|e: String| text_err(1, e))?;
        let status: RunStatus = status_str.parse().map_err(|e: String| text_err(3, e))?;
        let metrics = serde_json::from_str(&metrics_str).map_err(|e| text_err(6, e.to_string()))?;

        Ok(Run::restore(
            row.get(0)?,
            run_type,
            universe_size.max(0) as usize,
            parse_time(&started_str).unwrap_or_else(Utc::now),
            completed_str.as_deref().and_then(parse_time),
            status,
            metrics,
            ai_calls.max(0) as u32,
            row.get(8)?,
            row.get(9)?,
        ))
    }

    fn row_to_candidate(row: &rusqlite::Row) -> Result<Candidate, rusqlite::Error> {
        let payload: String = row.get(0)?;
        serde_json::from_str(&payload).map_err(|e| text_err(0, e.to_string()))
    }

    fn query_runs(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<Run>, DomainError> {
        let mut stmt = conn.prepare(sql)?;
        let runs = stmt
            .query_map(params, Self::row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}

impl RunRepository for SqliteRunRepo {
    fn create_run(&self, run: &Run) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            &format!("INSERT INTO runs ({RUN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                run.id,
                run.run_type.to_string(),
                run.universe_size() as i64,
                run.status().to_string(),
                run.started_at.to_rfc3339(),
                run.completed_at.map(|dt| dt.to_rfc3339()),
                serde_json::to_string(run.metrics())?,
                run.ai_calls_count() as i64,
                run.ai_cost(),
                run.error,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to create run: {e}")))?;
        Ok(())
    }

    /// Universe size and start time are fixed at creation and never rewritten.
    fn update_run(&self, run: &Run) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn
            .execute(
                "UPDATE runs SET status = ?1, completed_at = ?2, metrics = ?3, ai_calls_count = ?4, ai_cost = ?5, error = ?6 WHERE id = ?7",
                params![
                    run.status().to_string(),
                    run.completed_at.map(|dt| dt.to_rfc3339()),
                    serde_json::to_string(run.metrics())?,
                    run.ai_calls_count() as i64,
                    run.ai_cost(),
                    run.error,
                    run.id,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to update run: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Run not found: {}", run.id)));
        }
        Ok(())
    }

    fn get_run(&self, id: &str) -> Result<Option<Run>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let runs = Self::query_runs(
            &conn,
            &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
            params![id],
        )?;
        Ok(runs.into_iter().next())
    }

    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut sql = format!("SELECT {RUN_COLUMNS} FROM runs WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(run_type) = filter.run_type {
            sql.push_str(&format!(" AND run_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(run_type.to_string()));
        }
        sql.push_str(" ORDER BY started_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        Self::query_runs(&conn, &sql, &params_refs)
    }

    fn latest_completed_run(&self, run_type: RunType, exclude_id: &str) -> Result<Option<Run>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let runs = Self::query_runs(
            &conn,
            &format!(
                "SELECT {RUN_COLUMNS} FROM runs
                 WHERE run_type = ?1 AND status = ?2 AND id != ?3
                 ORDER BY completed_at DESC LIMIT 1"
            ),
            params![run_type.to_string(), RunStatus::Completed.to_string(), exclude_id],
        )?;
        Ok(runs.into_iter().next())
    }

    fn add_candidates(&self, candidates: &[Candidate]) -> Result<(), DomainError> {
        if candidates.is_empty() {
            return Ok(());
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO candidates (id, run_id, parent_id, stage, instrument_id, symbol, rank, score, trade_quality_score, ai_confidence, combined_score, tier, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            let now = Utc::now().to_rfc3339();
            for c in candidates {
                stmt.execute(params![
                    c.id,
                    c.run_id,
                    c.parent_id,
                    c.stage.to_string(),
                    c.instrument_id,
                    c.symbol,
                    c.rank as i64,
                    c.raw_scores.score,
                    c.trade_quality_score,
                    c.ai_confidence,
                    c.combined_score,
                    c.tier.map(|t| t.to_string()),
                    serde_json::to_string(c)?,
                    now,
                ])
                .map_err(|e| DomainError::Database(format!("Failed to add candidate {}: {e}", c.id)))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_candidates(&self, run_id: &str, stage: Option<CandidateStage>) -> Result<Vec<Candidate>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM candidates
             WHERE run_id = ?1 AND (?2 IS NULL OR stage = ?2)
             ORDER BY rowid",
        )?;
        let candidates = stmt
            .query_map(params![run_id, stage.map(|s| s.to_string())], Self::row_to_candidate)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(candidates)
    }

    fn final_symbols(&self, run_id: &str) -> Result<Vec<String>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT symbol FROM candidates
             WHERE run_id = ?1 AND stage = ?2
             GROUP BY symbol ORDER BY MIN(rank), symbol",
        )?;
        let symbols = stmt
            .query_map(params![run_id, CandidateStage::Final.to_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(symbols)
    }
}
