//! Database - SQLite-backed record store
//!
//! Holds projects, documents, uploads, validation results, validation jobs and
//! the event log. A single connection is shared behind an async mutex. Short
//! statements run under the lock on the caller's task; result writes and reads,
//! which grow with the number of fields, run on the blocking pool.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    Document, FieldResult, JobStatus, JobUpdate, LogEntry, LogLevel, Project, Upload,
    ValidationJob,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Maximum number of log entries returned by [`Database::list_logs`]
pub const MAX_LOG_LIMIT: usize = 1000;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        ocr_url TEXT,
        sample_json_path TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_documents_project ON documents(project_id);

    CREATE TABLE IF NOT EXISTS uploads (
        id TEXT PRIMARY KEY,
        document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        file_path TEXT NOT NULL,
        user_input_json_path TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_uploads_document ON uploads(document_id);

    CREATE TABLE IF NOT EXISTS validation_results (
        id TEXT PRIMARY KEY,
        document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        upload_id TEXT REFERENCES uploads(id) ON DELETE SET NULL,
        field_name TEXT NOT NULL,
        user_value TEXT NOT NULL,
        ocr_value TEXT NOT NULL,
        accuracy REAL NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_results_document ON validation_results(document_id);
    CREATE INDEX IF NOT EXISTS idx_results_upload ON validation_results(upload_id);
    CREATE INDEX IF NOT EXISTS idx_results_created ON validation_results(created_at);

    CREATE TABLE IF NOT EXISTS validation_jobs (
        id TEXT PRIMARY KEY,
        document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT,
        error TEXT,
        result TEXT,
        total_uploads INTEGER,
        processed_uploads INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_jobs_document ON validation_jobs(document_id);
    CREATE INDEX IF NOT EXISTS idx_jobs_status ON validation_jobs(status);
    CREATE INDEX IF NOT EXISTS idx_jobs_created ON validation_jobs(created_at);

    CREATE TABLE IF NOT EXISTS logs (
        id TEXT PRIMARY KEY,
        level TEXT NOT NULL,
        message TEXT NOT NULL,
        context TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_logs_created ON logs(created_at);
";

/// SQLite record store
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Create or open `docval.db` under `data_dir`
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join("docval.db");

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = ?path, "Opened database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Path of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with the connection locked, on the blocking thread pool
    async fn blocking<F, R>(&self, f: F) -> StorageResult<R>
    where
        F: FnOnce(&mut Connection) -> StorageResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut conn = Arc::clone(&self.conn).lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut conn))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Cheap round trip used by readiness checks
    pub async fn ping(&self) -> StorageResult<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // ============================================
    // Projects
    // ============================================

    pub async fn create_project(&self, name: &str) -> StorageResult<Project> {
        let project = Project {
            id: new_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![project.id, project.name, project.created_at],
        )
        .map_err(|e| {
            if StorageError::is_constraint_violation(&e) {
                StorageError::Conflict(format!("Project '{}' already exists", name))
            } else {
                StorageError::Sqlite(e)
            }
        })?;

        Ok(project)
    }

    pub async fn list_projects(&self) -> StorageResult<Vec<Project>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, created_at FROM projects ORDER BY created_at DESC, rowid DESC",
        )?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub async fn get_project(&self, id: &str) -> StorageResult<Option<Project>> {
        let conn = self.conn.lock().await;
        let project = conn
            .query_row(
                "SELECT id, name, created_at FROM projects WHERE id = ?1",
                params![id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Rename a project; `None` leaves it unchanged
    pub async fn update_project(
        &self,
        id: &str,
        name: Option<&str>,
    ) -> StorageResult<Option<Project>> {
        if let Some(name) = name {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE projects SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| {
                if StorageError::is_constraint_violation(&e) {
                    StorageError::Conflict(format!("Project '{}' already exists", name))
                } else {
                    StorageError::Sqlite(e)
                }
            })?;
        }
        self.get_project(id).await
    }

    // ============================================
    // Documents
    // ============================================

    pub async fn create_document(
        &self,
        project_id: &str,
        name: &str,
        ocr_url: Option<&str>,
    ) -> StorageResult<Document> {
        let document = Document {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            ocr_url: ocr_url.map(str::to_string),
            sample_json_path: None,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO documents (id, project_id, name, ocr_url, sample_json_path, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
            params![
                document.id,
                document.project_id,
                document.name,
                document.ocr_url,
                document.created_at
            ],
        )
        .map_err(|e| {
            if StorageError::is_constraint_violation(&e) {
                StorageError::NotFound("Project".to_string())
            } else {
                StorageError::Sqlite(e)
            }
        })?;

        Ok(document)
    }

    /// Partial update; `None` fields are left unchanged
    pub async fn update_document(
        &self,
        id: &str,
        name: Option<&str>,
        ocr_url: Option<&str>,
    ) -> StorageResult<Option<Document>> {
        if name.is_some() || ocr_url.is_some() {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE documents
                 SET name = COALESCE(?1, name), ocr_url = COALESCE(?2, ocr_url)
                 WHERE id = ?3",
                params![name, ocr_url, id],
            )?;
        }
        self.get_document(id).await
    }

    pub async fn get_document(&self, id: &str) -> StorageResult<Option<Document>> {
        let conn = self.conn.lock().await;
        let document = conn
            .query_row(
                "SELECT id, project_id, name, ocr_url, sample_json_path, created_at
                 FROM documents WHERE id = ?1",
                params![id],
                document_from_row,
            )
            .optional()?;
        Ok(document)
    }

    /// List documents, optionally restricted to one project
    pub async fn list_documents(&self, project_id: Option<&str>) -> StorageResult<Vec<Document>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, project_id, name, ocr_url, sample_json_path, created_at
             FROM documents
             WHERE ?1 IS NULL OR project_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let documents = stmt
            .query_map(params![project_id], document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    pub async fn set_document_sample_path(
        &self,
        id: &str,
        path: &str,
    ) -> StorageResult<Option<Document>> {
        {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE documents SET sample_json_path = ?1 WHERE id = ?2",
                params![path, id],
            )?;
        }
        self.get_document(id).await
    }

    // ============================================
    // Uploads
    // ============================================

    pub async fn create_upload(&self, document_id: &str, file_path: &str) -> StorageResult<Upload> {
        let upload = Upload {
            id: new_id(),
            document_id: document_id.to_string(),
            file_path: file_path.to_string(),
            user_input_json_path: None,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO uploads (id, document_id, file_path, user_input_json_path, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![
                upload.id,
                upload.document_id,
                upload.file_path,
                upload.created_at
            ],
        )?;

        Ok(upload)
    }

    pub async fn get_upload(&self, id: &str) -> StorageResult<Option<Upload>> {
        let conn = self.conn.lock().await;
        let upload = conn
            .query_row(
                "SELECT id, document_id, file_path, user_input_json_path, created_at
                 FROM uploads WHERE id = ?1",
                params![id],
                upload_from_row,
            )
            .optional()?;
        Ok(upload)
    }

    pub async fn set_upload_user_input(
        &self,
        id: &str,
        path: &str,
    ) -> StorageResult<Option<Upload>> {
        {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE uploads SET user_input_json_path = ?1 WHERE id = ?2",
                params![path, id],
            )?;
        }
        self.get_upload(id).await
    }

    /// Uploads of a document, newest first
    pub async fn list_uploads(
        &self,
        document_id: &str,
        only_with_user_input: bool,
    ) -> StorageResult<Vec<Upload>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, document_id, file_path, user_input_json_path, created_at
             FROM uploads
             WHERE document_id = ?1 AND (?2 = 0 OR user_input_json_path IS NOT NULL)
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let uploads = stmt
            .query_map(params![document_id, only_with_user_input], upload_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uploads)
    }

    // ============================================
    // Validation results
    // ============================================

    /// Replace the stored results of an upload with a new run
    pub async fn replace_validation_results(
        &self,
        document_id: &str,
        upload_id: &str,
        results: &[FieldResult],
    ) -> StorageResult<()> {
        let document_id = document_id.to_string();
        let upload_id = upload_id.to_string();
        let results = results.to_vec();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM validation_results WHERE upload_id = ?1",
                params![upload_id],
            )?;

            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO validation_results
                     (id, document_id, upload_id, field_name, user_value, ocr_value, accuracy, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                let now = Utc::now();
                for result in &results {
                    stmt.execute(params![
                        new_id(),
                        document_id,
                        upload_id,
                        result.field_name,
                        result.user_value,
                        result.ocr_value,
                        result.accuracy,
                        now
                    ])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Latest result per field of an upload, in field order of the last run
    pub async fn latest_validation_results(
        &self,
        upload_id: &str,
    ) -> StorageResult<Vec<FieldResult>> {
        let upload_id = upload_id.to_string();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT field_name, user_value, ocr_value, accuracy
                 FROM validation_results
                 WHERE upload_id = ?1
                 ORDER BY created_at DESC, rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![upload_id], |row| {
                    Ok(FieldResult {
                        field_name: row.get(0)?,
                        user_value: row.get(1)?,
                        ocr_value: row.get(2)?,
                        accuracy: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut seen = std::collections::HashSet::new();
            Ok(rows
                .into_iter()
                .filter(|r| seen.insert(r.field_name.clone()))
                .collect())
        })
        .await
    }

    // ============================================
    // Validation jobs
    // ============================================

    pub async fn create_job(&self, document_id: &str) -> StorageResult<ValidationJob> {
        let job = ValidationJob {
            id: new_id(),
            document_id: document_id.to_string(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            result: None,
            total_uploads: None,
            processed_uploads: None,
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO validation_jobs (id, document_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![job.id, job.document_id, job.status.as_str(), job.created_at],
        )?;

        Ok(job)
    }

    pub async fn get_job(&self, id: &str) -> StorageResult<Option<ValidationJob>> {
        let conn = self.conn.lock().await;
        let job = conn
            .query_row(
                "SELECT id, document_id, status, created_at, started_at, completed_at,
                        error, result, total_uploads, processed_uploads
                 FROM validation_jobs WHERE id = ?1",
                params![id],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    /// Apply a status transition
    ///
    /// `started_at` is stamped the first time a job enters `running`;
    /// `completed_at` whenever it enters a terminal state.
    pub async fn update_job(&self, id: &str, update: JobUpdate) -> StorageResult<ValidationJob> {
        let result = update
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let changed = {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE validation_jobs SET
                    status = ?1,
                    started_at = CASE WHEN ?1 = 'running' THEN COALESCE(started_at, ?2) ELSE started_at END,
                    completed_at = CASE WHEN ?1 IN ('completed', 'failed') THEN ?2 ELSE completed_at END,
                    error = COALESCE(?3, error),
                    result = COALESCE(?4, result),
                    total_uploads = COALESCE(?5, total_uploads),
                    processed_uploads = COALESCE(?6, processed_uploads)
                 WHERE id = ?7",
                params![
                    update.status.as_str(),
                    Utc::now(),
                    update.error,
                    result,
                    update.total_uploads,
                    update.processed_uploads,
                    id
                ],
            )?
        };

        if changed == 0 {
            return Err(StorageError::NotFound("Job".to_string()));
        }

        self.get_job(id)
            .await?
            .ok_or_else(|| StorageError::NotFound("Job".to_string()))
    }

    // ============================================
    // Event log
    // ============================================

    pub async fn log_event(
        &self,
        level: LogLevel,
        message: &str,
        context: Option<&str>,
    ) -> StorageResult<LogEntry> {
        let entry = LogEntry {
            id: new_id(),
            level,
            message: message.to_string(),
            context: context.map(str::to_string),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO logs (id, level, message, context, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.level.as_str(),
                entry.message,
                entry.context,
                entry.created_at
            ],
        )?;

        Ok(entry)
    }

    /// Newest entries first; `limit` is clamped to `1..=1000`
    pub async fn list_logs(&self, limit: usize) -> StorageResult<Vec<LogEntry>> {
        let limit = limit.clamp(1, MAX_LOG_LIMIT) as i64;

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, level, message, context, created_at
             FROM logs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                let level: String = row.get(1)?;
                Ok(LogEntry {
                    id: row.get(0)?,
                    level: LogLevel::parse(&level).unwrap_or(LogLevel::Info),
                    message: row.get(2)?,
                    context: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        ocr_url: row.get(3)?,
        sample_json_path: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn upload_from_row(row: &Row<'_>) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: row.get(0)?,
        document_id: row.get(1)?,
        file_path: row.get(2)?,
        user_input_json_path: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<ValidationJob> {
    let status: String = row.get(2)?;
    let result: Option<String> = row.get(7)?;
    let started_at: Option<DateTime<Utc>> = row.get(4)?;
    let completed_at: Option<DateTime<Utc>> = row.get(5)?;

    Ok(ValidationJob {
        id: row.get(0)?,
        document_id: row.get(1)?,
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Failed),
        created_at: row.get(3)?,
        started_at,
        completed_at,
        error: row.get(6)?,
        result: result.and_then(|s| serde_json::from_str(&s).ok()),
        total_uploads: row.get(8)?,
        processed_uploads: row.get(9)?,
    })
}
