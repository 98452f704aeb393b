// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! The per-query machine dossier.
//!
//! A [`Dossier`] bundles one target machine, its parent if any, and every
//! ROM reachable through the parent/clone/device/BIOS relations, each row
//! annotated with where it came from and which parent slot it replaces.
//! Dossiers are immutable values built in two passes: a forward scan that
//! assigns sources, then a back-edge pass that resolves `replaced_by`
//! from the forward `replaces` pointers.

use std::collections::HashMap;
use std::fmt;

use crate::machine::Machine;
use crate::rom::Rom;

/// Which relation a dossier ROM row was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomSource {
    /// Claimed directly by the target machine.
    Machine,
    /// Claimed by the target's parent.
    Parent,
    /// Claimed by a clone or sibling of the target.
    Clone,
    /// A device ROM pulled in through the device closure.
    Device,
    /// A BIOS artifact.
    Bios,
}

impl fmt::Display for RomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RomSource::Machine => "machine",
            RomSource::Parent => "parent",
            RomSource::Clone => "clone",
            RomSource::Device => "device",
            RomSource::Bios => "bios",
        };
        write!(f, "{name}")
    }
}

/// Renderer-facing tag of a dossier row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomKind {
    GameRom,
    CloneRom,
    BiosRom,
    DeviceRom,
}

/// One ROM of a dossier together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomWithProvenance {
    pub rom: Rom,
    pub source: RomSource,
    pub kind: RomKind,
    /// The originating machine this claim was attached through.
    pub machine_id: i64,
    pub machine_name: String,
    /// Name of the parent ROM this entry occupies the slot of.
    pub replaces: Option<String>,
    /// Names of the rows that declare this row as their `replaces`
    /// target. Derived, never stored.
    pub replaced_by: Vec<String>,
}

/// Snapshot of one target machine and everything reachable from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dossier {
    pub machine: Machine,
    pub parent: Option<Machine>,
    /// Traversal order: target rows first, then parent, then clones and
    /// siblings; edge insertion order within each machine.
    pub roms: Vec<RomWithProvenance>,
}

impl Dossier {
    /// Build a dossier from source-annotated rows, resolving the
    /// replacement back-edges.
    pub fn new(machine: Machine, parent: Option<Machine>, mut roms: Vec<RomWithProvenance>) -> Self {
        link_replacements(&mut roms);
        Dossier {
            machine,
            parent,
            roms,
        }
    }
}

/// Annotate `replaced_by` back-edges from the forward `replaces`
/// pointers.
///
/// One pass builds a name → index map over the rows (last writer wins on
/// a name collision); a second pass appends each replacing row's name to
/// the list of the row it points at.
fn link_replacements(rows: &mut [RomWithProvenance]) {
    let mut by_name: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        by_name.insert(row.rom.name.clone(), idx);
    }
    for idx in 0..rows.len() {
        let Some(target) = rows[idx].replaces.clone() else {
            continue;
        };
        if let Some(&target_idx) = by_name.get(&target) {
            let name = rows[idx].rom.name.clone();
            rows[target_idx].replaced_by.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomType;

    fn row(name: &str, crc: &str, replaces: Option<&str>) -> RomWithProvenance {
        RomWithProvenance {
            rom: Rom {
                rom_id: 0,
                name: name.into(),
                size: 16,
                crc: crc.into(),
                rom_type: RomType::Regular,
            },
            source: RomSource::Machine,
            kind: RomKind::GameRom,
            machine_id: 1,
            machine_name: "m".into(),
            replaces: replaces.map(str::to_owned),
            replaced_by: Vec::new(),
        }
    }

    #[test]
    fn back_edges_follow_forward_pointers() {
        let mut rows = vec![
            row("a.bin", "1111", None),
            row("a2.bin", "2222", Some("a.bin")),
            row("a3.bin", "3333", Some("a.bin")),
        ];
        link_replacements(&mut rows);
        assert_eq!(rows[0].replaced_by, vec!["a2.bin", "a3.bin"]);
        assert!(rows[1].replaced_by.is_empty());
    }

    #[test]
    fn dangling_replaces_is_ignored() {
        let mut rows = vec![row("a.bin", "1111", Some("ghost.bin"))];
        link_replacements(&mut rows);
        assert!(rows[0].replaced_by.is_empty());
    }

    #[test]
    fn name_collision_last_writer_wins() {
        let mut rows = vec![
            row("dup.bin", "1111", None),
            row("dup.bin", "2222", None),
            row("r.bin", "3333", Some("dup.bin")),
        ];
        link_replacements(&mut rows);
        assert!(rows[0].replaced_by.is_empty());
        assert_eq!(rows[1].replaced_by, vec!["r.bin"]);
    }
}
