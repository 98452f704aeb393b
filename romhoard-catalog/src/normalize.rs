// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Machine classification, ROM provenance tagging and ROM dedup.
//!
//! Normalization turns the raw catalog records into the seeds the store
//! writer bulk-loads: one classified seed per machine, one deduplicated
//! ROM table, and per-machine claims pointing into that table.

use std::collections::{HashMap, HashSet};

use romhoard_core::{canonical_crc, MachineType, RomType};
use tracing::debug;

use crate::reader::{Catalog, CatalogHeader, MachineRecord};

/// One deduplicated ROM, identified by `(name, size, crc)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomSeed {
    pub name: String,
    pub size: u64,
    /// Canonical (uppercase) form.
    pub crc: String,
    pub rom_type: RomType,
}

/// A machine's claim on a ROM of the table.
///
/// Two catalog entries differing only in `merge` collapse to the same
/// ROM; each keeps its own claim and the writer lets the first one win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomClaim {
    /// Index into [`NormalizedCatalog::roms`].
    pub rom: usize,
    pub merge: Option<String>,
}

/// A classified machine with resolved ROM claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSeed {
    pub name: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub manufacturer: Option<String>,
    pub romof: Option<String>,
    pub cloneof: Option<String>,
    pub machine_type: MachineType,
    pub rom_claims: Vec<RomClaim>,
    pub device_refs: Vec<String>,
}

/// Normalized form of a catalog, ready for the store writer.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCatalog {
    pub header: Option<CatalogHeader>,
    pub machines: Vec<MachineSeed>,
    /// Unique ROMs in first-sight order; index order is rom_id order.
    pub roms: Vec<RomSeed>,
}

/// Classify machines, tag and deduplicate ROMs.
pub fn normalize(catalog: Catalog) -> NormalizedCatalog {
    let bios_names = bios_rom_names(&catalog.machines);
    let device_names = device_rom_names(&catalog.machines);

    let mut roms: Vec<RomSeed> = Vec::new();
    let mut index: HashMap<(String, u64, String), usize> = HashMap::new();
    let mut machines = Vec::with_capacity(catalog.machines.len());

    for record in catalog.machines {
        let mut rom_claims = Vec::with_capacity(record.roms.len());
        for entry in &record.roms {
            let crc = canonical_crc(&entry.crc);
            let key = (entry.name.clone(), entry.size, crc.clone());
            let rom = match index.get(&key) {
                Some(&rom) => rom,
                None => {
                    let rom = roms.len();
                    roms.push(RomSeed {
                        name: entry.name.clone(),
                        size: entry.size,
                        crc,
                        rom_type: rom_type_for(&entry.name, &bios_names, &device_names),
                    });
                    index.insert(key, rom);
                    rom
                }
            };
            rom_claims.push(RomClaim {
                rom,
                merge: entry.merge.clone(),
            });
        }
        machines.push(MachineSeed {
            machine_type: classify(&record),
            name: record.name,
            description: record.description,
            year: record.year,
            manufacturer: record.manufacturer,
            romof: record.romof,
            cloneof: record.cloneof,
            rom_claims,
            device_refs: record.device_refs,
        });
    }

    debug!(
        machines = machines.len(),
        roms = roms.len(),
        "normalized catalog"
    );
    NormalizedCatalog {
        header: catalog.header,
        machines,
        roms,
    }
}

/// BIOS wins over device when a record claims both.
fn classify(record: &MachineRecord) -> MachineType {
    if record.is_bios {
        MachineType::Bios
    } else if record.is_device {
        MachineType::Device
    } else {
        MachineType::Regular
    }
}

/// ROM names referenced by any BIOS machine, plus entries carrying a
/// non-empty `bios` attribute of their own.
fn bios_rom_names(machines: &[MachineRecord]) -> HashSet<String> {
    let mut names = HashSet::new();
    for machine in machines {
        for entry in &machine.roms {
            if machine.is_bios || entry.bios.as_deref().is_some_and(|b| !b.is_empty()) {
                names.insert(entry.name.clone());
            }
        }
    }
    names
}

/// ROM names referenced by any device machine.
fn device_rom_names(machines: &[MachineRecord]) -> HashSet<String> {
    let mut names = HashSet::new();
    for machine in machines {
        if !machine.is_device {
            continue;
        }
        for entry in &machine.roms {
            names.insert(entry.name.clone());
        }
    }
    names
}

fn rom_type_for(
    name: &str,
    bios_names: &HashSet<String>,
    device_names: &HashSet<String>,
) -> RomType {
    if bios_names.contains(name) {
        RomType::Bios
    } else if device_names.contains(name) {
        RomType::Device
    } else {
        RomType::Regular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RomEntry;

    fn entry(name: &str, size: u64, crc: &str) -> RomEntry {
        RomEntry {
            name: name.into(),
            size,
            crc: crc.into(),
            merge: None,
            bios: None,
        }
    }

    fn record(name: &str, roms: Vec<RomEntry>) -> MachineRecord {
        MachineRecord {
            name: name.into(),
            roms,
            ..Default::default()
        }
    }

    #[test]
    fn bios_classification_wins_over_device() {
        let mut both = record("both", vec![]);
        both.is_bios = true;
        both.is_device = true;
        assert_eq!(classify(&both), MachineType::Bios);

        let mut device = record("dev", vec![]);
        device.is_device = true;
        assert_eq!(classify(&device), MachineType::Device);

        assert_eq!(classify(&record("plain", vec![])), MachineType::Regular);
    }

    #[test]
    fn identical_identity_is_stored_once() {
        let mut clone_entry = entry("b.bin", 16, "2222");
        clone_entry.merge = Some("a.bin".into());
        let catalog = Catalog {
            header: None,
            machines: vec![
                record("m1", vec![entry("b.bin", 16, "2222")]),
                record("m2", vec![clone_entry]),
            ],
        };

        let normalized = normalize(catalog);
        assert_eq!(normalized.roms.len(), 1);
        assert_eq!(normalized.machines[0].rom_claims[0].rom, 0);
        assert_eq!(normalized.machines[1].rom_claims[0].rom, 0);
        // merge travels on the claim, not the ROM
        assert_eq!(normalized.machines[0].rom_claims[0].merge, None);
        assert_eq!(
            normalized.machines[1].rom_claims[0].merge.as_deref(),
            Some("a.bin")
        );
    }

    #[test]
    fn crc_is_canonicalized_before_dedup() {
        let catalog = Catalog {
            header: None,
            machines: vec![
                record("m1", vec![entry("a.bin", 16, "deadbeef")]),
                record("m2", vec![entry("a.bin", 16, "DEADBEEF")]),
            ],
        };
        let normalized = normalize(catalog);
        assert_eq!(normalized.roms.len(), 1);
        assert_eq!(normalized.roms[0].crc, "DEADBEEF");
    }

    #[test]
    fn same_name_different_crc_stays_distinct() {
        let catalog = Catalog {
            header: None,
            machines: vec![record(
                "m1",
                vec![entry("a.bin", 16, "1111"), entry("a.bin", 16, "9999")],
            )],
        };
        assert_eq!(normalize(catalog).roms.len(), 2);
    }

    #[test]
    fn rom_type_bios_takes_precedence_over_device() {
        let mut bios_machine = record("neogeo", vec![entry("shared.bin", 8, "0001")]);
        bios_machine.is_bios = true;
        let mut device_machine = record("z80", vec![entry("shared.bin", 8, "0001")]);
        device_machine.is_device = true;

        let normalized = normalize(Catalog {
            header: None,
            machines: vec![device_machine, bios_machine],
        });
        assert_eq!(normalized.roms[0].rom_type, RomType::Bios);
    }

    #[test]
    fn bios_attribute_tags_the_rom_even_on_regular_machines() {
        let mut tagged = entry("setrom.bin", 8, "0002");
        tagged.bios = Some("europe".into());
        let mut untagged = entry("plain.bin", 8, "0003");
        untagged.bios = Some("".into());

        let normalized = normalize(Catalog {
            header: None,
            machines: vec![record("m1", vec![tagged, untagged])],
        });
        assert_eq!(normalized.roms[0].rom_type, RomType::Bios);
        assert_eq!(normalized.roms[1].rom_type, RomType::Regular);
    }

    #[test]
    fn device_machine_roms_are_tagged_device() {
        let mut device_machine = record("z80", vec![entry("z80.bin", 8, "0004")]);
        device_machine.is_device = true;

        let normalized = normalize(Catalog {
            header: None,
            machines: vec![device_machine],
        });
        assert_eq!(normalized.roms[0].rom_type, RomType::Device);
    }
}
