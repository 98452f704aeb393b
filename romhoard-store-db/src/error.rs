// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Error types for store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error without further context
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Open failed or the connection is unusable
    #[error("store unavailable at '{path}': {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Store file absent
    #[error("store not found at: {0}")]
    StoreNotFound(PathBuf),

    /// Dossier request for an unknown machine name
    #[error("machine not found: {0}")]
    MachineNotFound(String),

    /// Statement prepare/bind/step failed
    #[error("query failed ({context}): {source}")]
    QueryFailed {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Catalog XML was ill-formed; no store was written
    #[error("ingest aborted: {0}")]
    IngestParseFailed(#[from] romhoard_catalog::CatalogError),

    /// Schema creation, insert or backup failed; a partially written
    /// target file must be treated as invalid
    #[error("ingest write failed ({context}): {source}")]
    IngestWriteFailed {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Output path exists and overwrite was not permitted
    #[error("store already exists at: {0}")]
    AlreadyExists(PathBuf),

    /// Filesystem error around the store file
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Helper trait for attaching query context to database errors.
pub(crate) trait QueryContext<T> {
    fn query_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> QueryContext<T> for std::result::Result<T, rusqlite::Error> {
    fn query_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::QueryFailed {
            context: f(),
            source: e,
        })
    }
}

/// Same, for the write path.
pub(crate) trait WriteContext<T> {
    fn write_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> WriteContext<T> for std::result::Result<T, rusqlite::Error> {
    fn write_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::IngestWriteFailed {
            context: f(),
            source: e,
        })
    }
}
