//! Document storage for the REST backend
//!
//! SQLite when the database file can be opened, process memory otherwise.
//! Both keep the same ordering: newest first, later inserts first on ties.

use fhub_common::config::{ServerConfig, StorageKind};
use fhub_common::{
    BuildLogFilter, BuildLogRecord, BuildLogUpdate, Database, Error, GeneratedCodeRecord,
    PageFilter, Result, StatsSnapshot, BUILD_LOG_DEFAULT_LIMIT, GENERATED_CODE_DEFAULT_LIMIT,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Build log and generated code persistence behind the HTTP routes.
/// Build logs are addressed by `build_id`, generated code by `id`.
pub trait DocumentStore: Send + Sync {
    /// Label reported by the health endpoint
    fn label(&self) -> &'static str;

    /// True when records outlive the process
    fn is_persistent(&self) -> bool;

    fn insert_build_log(&self, record: &BuildLogRecord) -> Result<()>;
    fn list_build_logs(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>>;
    fn get_build_log(&self, build_id: &str) -> Result<Option<BuildLogRecord>>;
    fn update_build_log(&self, build_id: &str, update: &BuildLogUpdate) -> Result<bool>;
    fn delete_build_log(&self, build_id: &str) -> Result<bool>;
    fn clear_build_logs(&self) -> Result<usize>;

    fn insert_generated_code(&self, record: &GeneratedCodeRecord) -> Result<()>;
    fn list_generated_code(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>>;
    fn get_generated_code(&self, id: &str) -> Result<Option<GeneratedCodeRecord>>;
    fn delete_generated_code(&self, id: &str) -> Result<bool>;
    fn clear_generated_code(&self) -> Result<usize>;

    fn stats(&self) -> Result<StatsSnapshot>;
}

impl DocumentStore for Database {
    fn label(&self) -> &'static str {
        "SQLite"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    fn insert_build_log(&self, record: &BuildLogRecord) -> Result<()> {
        Database::insert_build_log(self, record)
    }

    fn list_build_logs(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>> {
        Database::list_build_logs(self, filter)
    }

    fn get_build_log(&self, build_id: &str) -> Result<Option<BuildLogRecord>> {
        Database::get_build_log(self, build_id)
    }

    fn update_build_log(&self, build_id: &str, update: &BuildLogUpdate) -> Result<bool> {
        Database::update_build_log(self, build_id, update)
    }

    fn delete_build_log(&self, build_id: &str) -> Result<bool> {
        Database::delete_build_log(self, build_id)
    }

    fn clear_build_logs(&self) -> Result<usize> {
        Database::clear_build_logs(self)
    }

    fn insert_generated_code(&self, record: &GeneratedCodeRecord) -> Result<()> {
        Database::insert_generated_code(self, record)
    }

    fn list_generated_code(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>> {
        Database::list_generated_code(self, page)
    }

    fn get_generated_code(&self, id: &str) -> Result<Option<GeneratedCodeRecord>> {
        Database::get_generated_code(self, id)
    }

    fn delete_generated_code(&self, id: &str) -> Result<bool> {
        Database::delete_generated_code(self, id)
    }

    fn clear_generated_code(&self) -> Result<usize> {
        Database::clear_generated_code(self)
    }

    fn stats(&self) -> Result<StatsSnapshot> {
        Database::stats(self)
    }
}

/// Process-lifetime storage, kept in insertion order
#[derive(Default)]
pub struct MemoryDocuments {
    build_logs: RwLock<Vec<BuildLogRecord>>,
    generated_code: RwLock<Vec<GeneratedCodeRecord>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocuments {
    fn label(&self) -> &'static str {
        "In-Memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn insert_build_log(&self, record: &BuildLogRecord) -> Result<()> {
        let mut logs = self.build_logs.write();
        if logs.iter().any(|l| l.build_id == record.build_id) {
            return Err(Error::AlreadyExists {
                kind: "build log".to_string(),
                id: record.build_id.clone(),
            });
        }
        logs.push(record.clone());
        Ok(())
    }

    fn list_build_logs(&self, filter: &BuildLogFilter) -> Result<Vec<BuildLogRecord>> {
        let mut logs: Vec<_> = self.build_logs.read().iter().rev().cloned().collect();
        logs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(filter.apply(logs, BUILD_LOG_DEFAULT_LIMIT))
    }

    fn get_build_log(&self, build_id: &str) -> Result<Option<BuildLogRecord>> {
        Ok(self
            .build_logs
            .read()
            .iter()
            .find(|l| l.build_id == build_id)
            .cloned())
    }

    fn update_build_log(&self, build_id: &str, update: &BuildLogUpdate) -> Result<bool> {
        let mut logs = self.build_logs.write();
        match logs.iter_mut().find(|l| l.build_id == build_id) {
            Some(log) => {
                log.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_build_log(&self, build_id: &str) -> Result<bool> {
        let mut logs = self.build_logs.write();
        let before = logs.len();
        logs.retain(|l| l.build_id != build_id);
        Ok(logs.len() < before)
    }

    fn clear_build_logs(&self) -> Result<usize> {
        Ok(self.build_logs.write().drain(..).count())
    }

    fn insert_generated_code(&self, record: &GeneratedCodeRecord) -> Result<()> {
        self.generated_code.write().push(record.clone());
        Ok(())
    }

    fn list_generated_code(&self, page: &PageFilter) -> Result<Vec<GeneratedCodeRecord>> {
        let mut codes: Vec<_> = self.generated_code.read().iter().rev().cloned().collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.apply(codes, GENERATED_CODE_DEFAULT_LIMIT))
    }

    fn get_generated_code(&self, id: &str) -> Result<Option<GeneratedCodeRecord>> {
        Ok(self
            .generated_code
            .read()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    fn delete_generated_code(&self, id: &str) -> Result<bool> {
        let mut codes = self.generated_code.write();
        let before = codes.len();
        codes.retain(|c| c.id != id);
        Ok(codes.len() < before)
    }

    fn clear_generated_code(&self) -> Result<usize> {
        Ok(self.generated_code.write().drain(..).count())
    }

    fn stats(&self) -> Result<StatsSnapshot> {
        let logs = self.build_logs.read();
        Ok(StatsSnapshot::from_records(
            &logs,
            self.generated_code.read().len(),
        ))
    }
}

/// Open the configured store. SQLite that cannot be opened degrades to
/// memory instead of refusing to start.
pub fn open_store(config: &ServerConfig) -> Arc<dyn DocumentStore> {
    match config.storage {
        StorageKind::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryDocuments::new())
        }
        StorageKind::Sqlite => match Database::open(&config.db_path) {
            Ok(db) => Arc::new(db),
            Err(e) => {
                warn!(
                    "Could not open database at {:?}, using in-memory storage: {}",
                    config.db_path, e
                );
                Arc::new(MemoryDocuments::new())
            }
        },
    }
}
