//! Connection handling: a single writer plus a read connection.
//!
//! The writer serializes all mutations. File-backed stores route reads
//! through a separate connection so readers don't contend with the writer;
//! in-memory stores route everything through the writer, because a second
//! in-memory connection would be an isolated database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::{migrations, pragmas, to_storage_err};

/// Owns the SQLite connections for one memory root.
pub struct StorageKernel {
    writer: Mutex<Connection>,
    reader: Option<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl StorageKernel {
    /// Open (creating if needed) the database at `path`, run migrations,
    /// and configure pragmas on both connections.
    pub fn open(path: &Path) -> EngramResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        let reader = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_pragmas(&reader)?;

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Some(Mutex::new(reader)),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for tests). Reads route through the
    /// writer.
    pub fn open_in_memory() -> EngramResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            reader: None,
            db_path: None,
        })
    }

    /// Path of the backing file, if file-backed.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` against the writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        let guard = self
            .writer
            .lock()
            .map_err(|_| to_storage_err("writer lock poisoned"))?;
        f(&guard)
    }

    /// Run `f` against the best read connection: the read connection when
    /// file-backed, the writer otherwise.
    pub fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        match &self.reader {
            Some(reader) => {
                let guard = reader
                    .lock()
                    .map_err(|_| to_storage_err("reader lock poisoned"))?;
                f(&guard)
            }
            None => self.with_writer(f),
        }
    }

    /// Run `f` inside a writer transaction. Commits on `Ok`, rolls back on
    /// `Err`.
    pub fn with_tx<F, T>(&self, label: &str, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.with_writer(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_storage_err(format!("{label} begin: {e}")))?;
            match f(&tx) {
                Ok(value) => {
                    tx.commit()
                        .map_err(|e| to_storage_err(format!("{label} commit: {e}")))?;
                    Ok(value)
                }
                Err(e) => {
                    let _ = tx.rollback();
                    Err(e)
                }
            }
        })
    }
}
