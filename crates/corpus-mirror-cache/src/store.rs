use std::path::{Path, PathBuf};
use std::sync::Mutex;

use corpus_mirror::{CacheError, DocumentMetadata, IndexCache};

use crate::schema;

/// A SQLite-backed index cache that implements `IndexCache`.
///
/// One row per metadata file, plus one row per document it declared, so
/// documents can also be looked up by their identifier or language.
pub struct IndexCacheStore {
    conn: Mutex<rusqlite::Connection>,
}

impl IndexCacheStore {
    /// Open a cache backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, CacheStoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| CacheStoreError::Database(e.to_string()))?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self, CacheStoreError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| CacheStoreError::Database(e.to_string()))?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&mut self) -> Result<(), CacheStoreError> {
        let conn = self.conn.get_mut().unwrap();
        schema::migrations()
            .to_latest(conn)
            .map_err(|e| CacheStoreError::Migration(e.to_string()))
    }

    /// Look up a cached document by its identifier.
    pub fn document(&self, id: &str) -> Result<Option<DocumentMetadata>, CacheStoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, path, language FROM documents WHERE id = ?1 LIMIT 1",
            [id],
            row_to_document,
        );

        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CacheStoreError::Database(e.to_string())),
        }
    }

    /// All cached documents declared in `language`, ordered by path.
    pub fn documents_in(&self, language: &str) -> Result<Vec<DocumentMetadata>, CacheStoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, path, language FROM documents
                 WHERE language = ?1
                 ORDER BY path",
            )
            .map_err(|e| CacheStoreError::Database(e.to_string()))?;

        let docs = stmt
            .query_map([language], row_to_document)
            .map_err(|e| CacheStoreError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    pub fn document_count(&self) -> Result<usize, CacheStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| CacheStoreError::Database(e.to_string()))
    }
}

impl IndexCache for IndexCacheStore {
    fn lookup(&self, key: &str, stamp: &str) -> Result<Option<Vec<DocumentMetadata>>, CacheError> {
        let conn = self.conn.lock().unwrap();

        let cached_stamp: Option<String> = match conn.query_row(
            "SELECT stamp FROM metadata_files WHERE key = ?1",
            [key],
            |row| row.get(0),
        ) {
            Ok(s) => Some(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(CacheError(e.to_string())),
        };

        if cached_stamp.as_deref() != Some(stamp) {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, path, language FROM documents
                 WHERE metadata_key = ?1
                 ORDER BY position",
            )
            .map_err(|e| CacheError(e.to_string()))?;

        let docs = stmt
            .query_map([key], row_to_document)
            .map_err(|e| CacheError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CacheError(e.to_string()))?;

        Ok(Some(docs))
    }

    fn store(
        &self,
        key: &str,
        stamp: &str,
        documents: &[DocumentMetadata],
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(|e| CacheError(e.to_string()))?;

        tx.execute("DELETE FROM documents WHERE metadata_key = ?1", [key])
            .map_err(|e| CacheError(e.to_string()))?;
        tx.execute(
            "INSERT OR REPLACE INTO metadata_files (key, stamp, indexed_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, stamp, now_epoch_secs()],
        )
        .map_err(|e| CacheError(e.to_string()))?;

        for (position, doc) in documents.iter().enumerate() {
            tx.execute(
                "INSERT INTO documents (id, metadata_key, position, path, language)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    doc.id,
                    key,
                    position as i64,
                    doc.path.to_string_lossy(),
                    doc.language,
                ],
            )
            .map_err(|e| CacheError(e.to_string()))?;
        }

        tx.commit().map_err(|e| CacheError(e.to_string()))
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("DELETE FROM documents; DELETE FROM metadata_files;")
            .map_err(|e| CacheError(e.to_string()))?;
        tracing::debug!("index cache cleared");
        Ok(())
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentMetadata> {
    let id: String = row.get(0)?;
    let path: String = row.get(1)?;
    let language: String = row.get(2)?;

    Ok(DocumentMetadata {
        id,
        path: PathBuf::from(path),
        language,
    })
}

/// Errors specific to cache store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}

fn now_epoch_secs() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now.to_string()
}
