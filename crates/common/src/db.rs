//! SQLite database for Framework Hub persistence
//!
//! One file serves two roles: the `kv` table backs the client's local
//! fallback store, and the document tables back the server.

use crate::store::KeyValueStore;
use crate::types::{
    BuildLogFilter, BuildLogRecord, BuildLogUpdate, BuildStatus, GeneratedCodeRecord, PageFilter,
    StatsSnapshot, BUILD_LOG_DEFAULT_LIMIT, FLOATING_FRAMEWORK, GENERATED_CODE_CAP,
    GENERATED_CODE_DEFAULT_LIMIT, JTAF_FRAMEWORK, OS_MAKING,
};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for state persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Local fallback namespace, one JSON array per key
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Build logs, addressed by build_id
            CREATE TABLE IF NOT EXISTS build_logs (
                id TEXT PRIMARY KEY,
                build_id TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL,
                status TEXT NOT NULL,
                start_ts INTEGER NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_build_logs_start ON build_logs(start_ts);

            -- Generated code snippets
            CREATE TABLE IF NOT EXISTS generated_code (
                id TEXT PRIMARY KEY,
                created_ts INTEGER NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_generated_code_created ON generated_code(created_ts);
            "#,
        )?;

        Ok(())
    }

    // ========================================================================
    // Build logs
    // ========================================================================

    /// Insert a build log. A second record with the same build_id is rejected.
    pub fn insert_build_log(&self, record: &BuildLogRecord) -> Result<()> {
        let conn = self.conn.lock();
        let doc = serde_json::to_string(record)?;

        let inserted = conn.execute(
            r#"
            INSERT INTO build_logs (id, build_id, type, status, start_ts, doc)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.build_id,
                record.kind,
                record.status.to_string(),
                record.start_time.timestamp_micros(),
                doc,
            ],
        );

        match inserted {
            Ok(_) => {
                debug!("Inserted build log {}", record.build_id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::AlreadyExists {
                    kind: "build log".to_string(),
                    id: record.build_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List build logs newest-first by start time
    pub fn list_build_logs(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>> {
        let conn = self.conn.lock();

        let mut sql = String::from("SELECT doc FROM build_logs WHERE 1=1");
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.to_string()));
        }
        if let Some(kind) = &filter.kind {
            sql.push_str(" AND type = ?");
            args.push(Box::new(kind.clone()));
        }
        sql.push_str(" ORDER BY start_ts DESC, rowid DESC LIMIT ? OFFSET ?");
        args.push(Box::new(filter.limit.unwrap_or(BUILD_LOG_DEFAULT_LIMIT) as i64));
        args.push(Box::new(filter.skip.unwrap_or(0) as i64));

        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params_from_iter(args.iter()), |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Error::from))
            .collect()
    }

    /// Get a build log by its build_id
    pub fn get_build_log(&self, build_id: &str) -> Result<Option<BuildLogRecord>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM build_logs WHERE build_id = ?1",
                params![build_id],
                |row| row.get(0),
            )
            .optional()?;

        doc.map(|d| serde_json::from_str(&d).map_err(Error::from))
            .transpose()
    }

    /// Merge a partial update. Returns false if no build log matched.
    pub fn update_build_log(&self, build_id: &str, update: &BuildLogUpdate) -> Result<bool> {
        let Some(mut record) = self.get_build_log(build_id)? else {
            return Ok(false);
        };
        record.apply(update);

        let conn = self.conn.lock();
        let doc = serde_json::to_string(&record)?;
        let rows = conn.execute(
            "UPDATE build_logs SET status = ?1, doc = ?2 WHERE build_id = ?3",
            params![record.status.to_string(), doc, build_id],
        )?;
        Ok(rows > 0)
    }

    /// Delete a build log by build_id
    pub fn delete_build_log(&self, build_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM build_logs WHERE build_id = ?1", params![build_id])?;
        Ok(rows > 0)
    }

    /// Delete every build log, returning how many were removed
    pub fn clear_build_logs(&self) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute("DELETE FROM build_logs", [])?)
    }

    // ========================================================================
    // Generated code
    // ========================================================================

    pub fn insert_generated_code(&self, record: &GeneratedCodeRecord) -> Result<()> {
        let conn = self.conn.lock();
        let doc = serde_json::to_string(record)?;
        conn.execute(
            "INSERT INTO generated_code (id, created_ts, doc) VALUES (?1, ?2, ?3)",
            params![record.id, record.created_at.timestamp_micros(), doc],
        )?;
        debug!("Inserted generated code {}", record.id);
        Ok(())
    }

    /// List generated code newest-first by creation time
    pub fn list_generated_code(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT doc FROM generated_code ORDER BY created_ts DESC, rowid DESC LIMIT ?1 OFFSET ?2",
        )?;
        let docs = stmt
            .query_map(
                params![
                    page.limit.unwrap_or(GENERATED_CODE_DEFAULT_LIMIT) as i64,
                    page.skip.unwrap_or(0) as i64
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Error::from))
            .collect()
    }

    pub fn get_generated_code(&self, id: &str) -> Result<Option<GeneratedCodeRecord>> {
        let conn = self.conn.lock();
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM generated_code WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        doc.map(|d| serde_json::from_str(&d).map_err(Error::from))
            .transpose()
    }

    pub fn delete_generated_code(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM generated_code WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn clear_generated_code(&self) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute("DELETE FROM generated_code", [])?)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Aggregate counts, computed with SQL rather than by loading documents
    pub fn stats(&self) -> Result<StatsSnapshot> {
        let conn = self.conn.lock();
        let count = |sql: &str, arg: Option<&str>| -> Result<usize> {
            let n: i64 = match arg {
                Some(a) => conn.query_row(sql, params![a], |row| row.get(0))?,
                None => conn.query_row(sql, [], |row| row.get(0))?,
            };
            Ok(n as usize)
        };

        let by_status = "SELECT COUNT(*) FROM build_logs WHERE status = ?1";
        let by_type = "SELECT COUNT(*) FROM build_logs WHERE type = ?1";

        let mut snapshot = StatsSnapshot::default();
        snapshot.build_logs.total = count("SELECT COUNT(*) FROM build_logs", None)?;
        snapshot.build_logs.running = count(by_status, Some(BuildStatus::Running.to_string().as_str()))?;
        snapshot.build_logs.completed = count(by_status, Some(BuildStatus::Completed.to_string().as_str()))?;
        snapshot.build_logs.failed = count(by_status, Some(BuildStatus::Failed.to_string().as_str()))?;
        snapshot.build_logs.by_type.jtaf = count(by_type, Some(JTAF_FRAMEWORK))?;
        snapshot.build_logs.by_type.floating = count(by_type, Some(FLOATING_FRAMEWORK))?;
        snapshot.build_logs.by_type.os_making = count(by_type, Some(OS_MAKING))?;
        snapshot.generated_code.total = count("SELECT COUNT(*) FROM generated_code", None)?;
        snapshot.generated_code.limit = GENERATED_CODE_CAP;

        Ok(snapshot)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
