//! File Store
//!
//! Local filesystem storage for scans, sample OCR responses and user input.
//!
//! Keys have the form `dd-mm-yyyy/<subfolder>/<filename>`; the date prefix
//! (UTC, day of the write) is added when a key does not already carry one.
//! The identifier returned by a save is the full path of the written file and
//! is what gets persisted in the database.

use crate::storage::error::{StorageError, StorageResult};
use chrono::{NaiveDate, Utc};
use std::path::{Component, Path, PathBuf};

/// Subfolder for scanned files
pub const UPLOADS: &str = "uploads";
/// Subfolder for sample OCR responses
pub const SAMPLES: &str = "samples";
/// Subfolder for user-entered values
pub const USER_INPUTS: &str = "user_inputs";

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create the store, making sure the root directory exists
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a key for `filename` in `subfolder` under today's date
    pub fn make_key(subfolder: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            Utc::now().format(DATE_FORMAT),
            subfolder,
            sanitize_file_name(filename)
        )
    }

    /// Write bytes under `key` and return the identifier
    pub async fn save_bytes(&self, key: &str, data: &[u8]) -> StorageResult<String> {
        let key = normalize_key(key)?;
        let path = self.root.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        tracing::debug!(key = %key, bytes = data.len(), "Stored file");
        Ok(path.to_string_lossy().to_string())
    }

    /// Write UTF-8 text under `key`
    pub async fn save_text(&self, key: &str, text: &str) -> StorageResult<String> {
        self.save_bytes(key, text.as_bytes()).await
    }

    /// Read back a file by identifier
    pub async fn read_bytes(&self, identifier: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(identifier)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Read back a UTF-8 file by identifier
    pub async fn read_text(&self, identifier: &str) -> StorageResult<String> {
        let bytes = self.read_bytes(identifier).await?;
        String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Map an identifier back to a path, refusing anything outside the root
    fn resolve(&self, identifier: &str) -> StorageResult<PathBuf> {
        let path = PathBuf::from(identifier);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));

        if escapes || !path.starts_with(&self.root) {
            return Err(StorageError::InvalidKey(identifier.to_string()));
        }
        Ok(path)
    }
}

/// Whether the first key segment is a `dd-mm-yyyy` date
fn has_date_prefix(key: &str) -> bool {
    key.split('/')
        .next()
        .map(|first| NaiveDate::parse_from_str(first, DATE_FORMAT).is_ok())
        .unwrap_or(false)
}

/// Add the date prefix (and the default `uploads` subfolder) when missing
fn normalize_key(key: &str) -> StorageResult<String> {
    let key = key.trim_start_matches('/');

    if key.is_empty() || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    if has_date_prefix(key) {
        return Ok(key.to_string());
    }

    Ok(match key.split_once('/') {
        Some((subfolder, filename)) => FileStore::make_key(subfolder, filename),
        None => FileStore::make_key(UPLOADS, key),
    })
}

/// Strip directory components and traversal from a client-supplied name
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .replace("..", "");

    if cleaned.trim().is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_make_key_has_date_prefix() {
        let key = FileStore::make_key(SAMPLES, "doc_1_sample.json");
        assert!(has_date_prefix(&key));
        assert!(key.ends_with("/samples/doc_1_sample.json"));
    }

    #[test]
    fn test_normalize_key() {
        let dated = normalize_key("01-02-2026/uploads/a.png").unwrap();
        assert_eq!(dated, "01-02-2026/uploads/a.png");

        let with_folder = normalize_key("user_inputs/u.json").unwrap();
        assert!(has_date_prefix(&with_folder));
        assert!(with_folder.ends_with("/user_inputs/u.json"));

        let bare = normalize_key("scan.pdf").unwrap();
        assert!(bare.ends_with("/uploads/scan.pdf"));

        assert!(normalize_key("uploads/../../etc/passwd").is_err());
        assert!(normalize_key("").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\scans\\page 1.png"), "page 1.png");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name("invoice.pdf"), "invoice.pdf");
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let id = store.save_text("samples/s.json", "{\"a\":1}").await.unwrap();
        assert!(id.contains("samples"));
        assert_eq!(store.read_text(&id).await.unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_read_outside_root_is_rejected() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store")).unwrap();

        let err = store.read_bytes("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let sneaky = format!("{}/../secret", store.root().display());
        let err = store.read_bytes(&sneaky).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
