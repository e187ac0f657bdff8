use crate::app_dirs::AppDirs;
use crate::session::{ResultSink, Summary};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

/// One persisted session result, as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub game_id: String,
    pub total_score: i64,
    pub correct_count: u32,
    pub rounds_played: u32,
    pub best_streak: u32,
    pub avg_response_ms: f64,
    pub timestamp: DateTime<Local>,
}

/// Database manager for session score history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (or create) the on-disk history database.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quizbuzz_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(db_path)
    }

    /// Open (or create) a history database at an explicit path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    /// In-memory database, used by tests and headless runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id TEXT NOT NULL,
                total_score INTEGER NOT NULL,
                correct_count INTEGER NOT NULL,
                rounds_played INTEGER NOT NULL,
                best_streak INTEGER NOT NULL,
                avg_response_ms REAL NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_results_game ON session_results(game_id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_results_timestamp ON session_results(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Persist one finished session.
    pub fn record_result(&self, summary: &Summary) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO session_results
            (game_id, total_score, correct_count, rounds_played, best_streak, avg_response_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                summary.game_id,
                summary.total_score,
                summary.correct_count,
                summary.rounds_played,
                summary.best_streak,
                summary.avg_response_ms,
                summary.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Highest score recorded for a game, if any.
    pub fn best_score(&self, game_id: &str) -> Result<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT MAX(total_score) FROM session_results WHERE game_id = ?1")?;
        let best: Option<i64> = stmt.query_row([game_id], |row| row.get(0))?;
        Ok(best)
    }

    /// Most recent sessions, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game_id, total_score, correct_count, rounds_played, best_streak, avg_response_ms, timestamp
            FROM session_results
            ORDER BY timestamp DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let entry_iter = stmt.query_map([limit as i64], |row| {
            let timestamp_str: String = row.get(6)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        6,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(HistoryEntry {
                game_id: row.get(0)?,
                total_score: row.get(1)?,
                correct_count: row.get(2)?,
                rounds_played: row.get(3)?,
                best_streak: row.get(4)?,
                avg_response_ms: row.get(5)?,
                timestamp,
            })
        })?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        Ok(entries)
    }

    /// Number of stored sessions.
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM session_results", [], |row| row.get(0))
    }

    /// Dump the full history to a CSV file, newest first.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let entries = self.recent(usize::MAX >> 1)?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "timestamp",
            "game_id",
            "total_score",
            "correct_count",
            "rounds_played",
            "best_streak",
            "avg_response_ms",
        ])?;
        for e in &entries {
            writer.write_record([
                e.timestamp.to_rfc3339(),
                e.game_id.clone(),
                e.total_score.to_string(),
                e.correct_count.to_string(),
                e.rounds_played.to_string(),
                e.best_streak.to_string(),
                format!("{:.1}", e.avg_response_ms),
            ])?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session_results", [])?;
        Ok(())
    }
}

impl ResultSink for HistoryDb {
    fn submit_result(&mut self, summary: &Summary) -> Result<(), Box<dyn std::error::Error>> {
        self.record_result(summary)?;
        Ok(())
    }
}
