// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! SQLite store for the normalized machine catalog.
//!
//! This crate owns the four-table relational representation: it creates
//! the store during ingestion (bulk-loading machines, deduplicated ROMs
//! and machine-ROM edges under transactional batching), and answers the
//! read queries the set-derivation layer is built on, including the
//! per-machine dossier.
//!
//! The store file is a private on-disk format; it is written once and
//! never mutated afterwards.
//!
//! # Example
//!
//! ```ignore
//! use romhoard_store_db::StoreDb;
//!
//! let db = StoreDb::ingest_catalog("mame.xml", "catalog.db", false)?;
//! let dossier = db.load_dossier("pacman")?;
//! ```

mod connection;
mod dossier;
mod error;
mod query;
mod schema;
#[cfg(test)]
mod testutil;
mod types;
mod write;

pub use connection::StoreDb;
pub use error::{Error, Result};
pub use schema::SCHEMA_SQL;
pub use types::*;
