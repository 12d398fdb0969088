//! SQLCipher connection handle used by the transcoding pipelines.
//!
//! Wraps a `rusqlite` connection built against SQLCipher and exposes the
//! handful of directives the pipelines need: cipher pragmas, keying,
//! `ATTACH ... KEY`, `sqlcipher_export` and `DETACH`.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Params};

use crate::domain::{AppError, DerivedKey, Result};

/// Open connection to a (possibly encrypted) database file.
///
/// The connection is closed when the handle is dropped, so every exit path
/// releases it. [`CipherDatabase::close`] closes it explicitly and reports
/// errors.
pub struct CipherDatabase {
    conn: Connection,
    path: PathBuf,
}

impl CipherDatabase {
    /// Opens an existing database file.
    ///
    /// # Errors
    /// Returns error if the file is missing or cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        // Opening with the default flags would silently create an empty source.
        if !path.is_file() {
            return Err(AppError::Transcode {
                message: format!("Source database not found: {}", path.display()),
                source: None,
            });
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::transcode(format!("Failed to open {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), "Opened cipher database");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Emulates the defaults of an older SQLCipher major version for every
    /// database keyed afterwards.
    pub fn set_default_compatibility(&self, version: u8) -> Result<()> {
        self.run(
            &format!("PRAGMA cipher_default_compatibility = {version}"),
            [],
        )
    }

    /// Turns off per-page HMAC for every database keyed afterwards.
    pub fn disable_default_hmac(&self) -> Result<()> {
        self.run("PRAGMA cipher_default_use_hmac = OFF", [])
    }

    /// Turns off per-page HMAC on an attached database.
    pub fn disable_hmac_on(&self, alias: &str) -> Result<()> {
        self.run(&format!("PRAGMA {alias}.cipher_use_hmac = OFF"), [])
    }

    /// Keys the main database.
    pub fn unlock(&self, key: &DerivedKey) -> Result<()> {
        self.run(&format!("PRAGMA key = '{}'", key.as_str()), [])
    }

    /// Attaches `path` under `alias`. `None` attaches it unencrypted.
    pub fn attach(&self, path: &Path, alias: &str, key: Option<&DerivedKey>) -> Result<()> {
        let target = path.to_str().ok_or_else(|| AppError::Transcode {
            message: format!("Path is not valid UTF-8: {}", path.display()),
            source: None,
        })?;
        let key = key.map_or("", DerivedKey::as_str);

        self.run(
            &format!("ATTACH DATABASE ?1 AS {alias} KEY ?2"),
            [target, key],
        )
    }

    /// Copies schema and data from the main database into `alias`.
    pub fn export_to(&self, alias: &str) -> Result<()> {
        self.run("SELECT sqlcipher_export(?1)", [alias])
    }

    pub fn detach(&self, alias: &str) -> Result<()> {
        self.run(&format!("DETACH DATABASE {alias}"), [])
    }

    /// Closes the connection, reporting any error.
    ///
    /// # Errors
    /// Returns error if `SQLite` refuses to close the connection.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| {
            AppError::transcode(format!("Failed to close {}", path.display()), e)
        })
    }

    /// Executes one statement, draining any rows it returns.
    ///
    /// Some cipher pragmas answer with an `ok` row depending on the SQLCipher
    /// build, so rows are consumed rather than rejected.
    fn run<P: Params>(&self, sql: &str, params: P) -> Result<()> {
        let context = || format!("`{}` failed on {}", redact(sql), self.path.display());

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| AppError::transcode(context(), e))?;
        let mut rows = stmt
            .query(params)
            .map_err(|e| AppError::transcode(context(), e))?;
        while rows
            .next()
            .map_err(|e| AppError::transcode(context(), e))?
            .is_some()
        {}

        tracing::trace!(sql = %redact(sql), "Executed");
        Ok(())
    }
}

/// Hides the key literal in `PRAGMA key` statements.
fn redact(sql: &str) -> &str {
    if sql.starts_with("PRAGMA key") {
        "PRAGMA key = '***'"
    } else {
        sql
    }
}
