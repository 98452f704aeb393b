// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Core domain types and the ROM-set algebra.
//!
//! This crate is I/O-free. It defines the machine and ROM records the
//! store persists, the per-query [`Dossier`] value with its provenance
//! annotations, and the derivation of the seven canonical ROM-set views.

pub mod dossier;
pub mod machine;
pub mod rom;
pub mod set;

pub use dossier::{Dossier, RomKind, RomSource, RomWithProvenance};
pub use machine::{Machine, MachineType};
pub use rom::{canonical_crc, Rom, RomType};
pub use set::{derive_set, SetKind};
