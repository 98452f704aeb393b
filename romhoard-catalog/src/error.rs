// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Error types for catalog ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while reading a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be opened or read
    #[error("failed to read catalog at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ill-formed XML; `offset` is the byte position the parser stopped at
    #[error("malformed catalog XML at byte {offset}: {source}")]
    Parse {
        offset: u64,
        #[source]
        source: quick_xml::Error,
    },
}
