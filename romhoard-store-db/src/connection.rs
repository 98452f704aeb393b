// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Store connection management.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::SCHEMA_SQL;

/// SQLite connection to one catalog store.
///
/// A store is written once at ingest time and read-only afterwards; the
/// open path therefore refuses to create or modify files.
pub struct StoreDb {
    pub(crate) conn: Connection,
}

impl std::fmt::Debug for StoreDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreDb").finish_non_exhaustive()
    }
}

impl StoreDb {
    /// Open an existing store read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::StoreNotFound(path.to_owned()));
        }

        // Immutable URI open: the store never changes after creation.
        let uri = format!("file:{}?immutable=1", path.display());
        let conn = Connection::open_with_flags(
            &uri,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|e| Error::StoreUnavailable {
            path: path.to_owned(),
            source: e,
        })?;

        debug!("opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Create an in-memory store with the full schema.
    ///
    /// The ingest pipeline builds here and snapshots to disk; tests use
    /// it directly.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.configure_pragmas()?;
        db.create_schema()?;
        debug!("created in-memory store");
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    /// Create the store schema.
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        debug!("created store schema");
        Ok(())
    }

    /// Check whether the connection points at a romhoard store (all four
    /// expected tables present).
    pub fn has_schema(&self) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM sqlite_master
            WHERE type = 'table'
              AND name IN ('mame', 'machine', 'rom', 'machine_rom')
            "#,
            [],
            |row| row.get(0),
        )?;
        Ok(count == 4)
    }

    /// Get raw connection (for advanced usage).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_has_schema() {
        let db = StoreDb::open_memory().unwrap();
        assert!(db.has_schema().unwrap());
    }

    #[test]
    fn opening_missing_file_is_not_found() {
        let err = StoreDb::open("/nonexistent/romhoard.db").unwrap_err();
        assert!(matches!(err, Error::StoreNotFound(_)));
    }

    #[test]
    fn plain_sqlite_file_is_not_a_store() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE other (x INTEGER);").unwrap();
        let db = StoreDb { conn };
        assert!(!db.has_schema().unwrap());
    }
}
