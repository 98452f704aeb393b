// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Catalog ingestion front-end.
//!
//! Reads the machine catalog XML as an event stream, classifies machines
//! and ROMs, deduplicates ROMs by identity, and resolves the transitive
//! device-dependency closure per machine. The output of this crate is
//! what the store writer bulk-loads.

mod closure;
mod error;
mod normalize;
mod reader;

pub use closure::DeviceClosureResolver;
pub use error::{CatalogError, Result};
pub use normalize::{normalize, MachineSeed, NormalizedCatalog, RomClaim, RomSeed};
pub use reader::{parse_catalog, read_catalog, Catalog, CatalogHeader, MachineRecord, RomEntry};
