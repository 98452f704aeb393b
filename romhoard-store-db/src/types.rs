// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Row types returned by store queries.

use romhoard_core::{Machine, MachineType, Rom, RomType};
use rusqlite::Row;

/// The one-row catalog metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMeta {
    pub build: Option<String>,
    pub debug: Option<String>,
    pub mameconfig: Option<String>,
}

/// One machine as listed by `list_machines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSummary {
    pub machine_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub manufacturer: Option<String>,
    pub machine_type: MachineType,
    /// Number of machines declaring this one as their parent.
    pub clone_count: i64,
}

/// One machine_rom edge joined to its ROM row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRomRow {
    pub machine_id: i64,
    pub machine_name: String,
    /// Parent ROM name this edge replaces, from the `merge` column.
    pub replaces: Option<String>,
    pub rom: Rom,
}

/// Row counts of one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub machines: u64,
    pub roms: u64,
    pub edges: u64,
}

/// Map a `machine.*` column window starting at `offset` to a [`Machine`].
///
/// Column order: machine_id, name, description, year, manufacturer,
/// romof, cloneof, machine_type.
pub(crate) fn machine_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Machine> {
    Ok(Machine {
        machine_id: row.get(offset)?,
        name: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        year: row.get(offset + 3)?,
        manufacturer: row.get(offset + 4)?,
        romof: row.get(offset + 5)?,
        cloneof: row.get(offset + 6)?,
        machine_type: MachineType::from_code(row.get::<_, Option<String>>(offset + 7)?.as_deref()),
    })
}

/// Map a `rom.*` column window starting at `offset` to a [`Rom`].
///
/// Column order: rom_id, name, size, crc, rom_type.
pub(crate) fn rom_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Rom> {
    Ok(Rom {
        rom_id: row.get(offset)?,
        name: row.get(offset + 1)?,
        size: row.get::<_, i64>(offset + 2)? as u64,
        crc: row.get(offset + 3)?,
        rom_type: RomType::from_code(row.get::<_, Option<String>>(offset + 4)?.as_deref()),
    })
}
