// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Dossier loading: one machine plus everything reachable from it.
//!
//! Two queries populate a dossier. The first resolves the target row,
//! its parent and the ids of its clones and siblings; the second fetches
//! every ROM edge of those machines in one pass. Grouping by ROM and the
//! provenance assignment happen in Rust so the attached originating
//! machine is deterministic: first claim in traversal order wins
//! (target, parent, clones, siblings).

use std::collections::{HashMap, HashSet};

use romhoard_core::{Dossier, Machine, RomKind, RomSource, RomType, RomWithProvenance};
use rusqlite::types::Value;
use rusqlite::{named_params, params_from_iter, OptionalExtension};
use tracing::debug;

use crate::connection::StoreDb;
use crate::error::{Error, QueryContext, Result};
use crate::types::{machine_from_row, rom_from_row, MachineRomRow};

impl StoreDb {
    /// Load the dossier for one machine name.
    pub fn load_dossier(&self, name: &str) -> Result<Dossier> {
        let (target, parent, clones, siblings) = self.query_family(name)?;

        // Traversal order: target, parent, clones, siblings.
        let mut machine_ids = vec![target.machine_id];
        if let Some(parent) = &parent {
            machine_ids.push(parent.machine_id);
        }
        for id in clones.into_iter().chain(siblings) {
            if !machine_ids.contains(&id) {
                machine_ids.push(id);
            }
        }

        let rows = self.query_family_roms(&machine_ids)?;
        let roms = annotate(rows, &machine_ids, &target, parent.as_ref());

        debug!(
            machine = %target.name,
            roms = roms.len(),
            "loaded dossier"
        );
        Ok(Dossier::new(target, parent, roms))
    }

    /// Query 1: the target row joined to its parent, plus the ids of its
    /// clones and (when the target is itself a clone) its siblings as
    /// comma-joined strings.
    #[allow(clippy::type_complexity)]
    fn query_family(
        &self,
        name: &str,
    ) -> Result<(Machine, Option<Machine>, Vec<i64>, Vec<i64>)> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT m.machine_id, m.name, m.description, m.year, m.manufacturer,
                       m.romof, m.cloneof, m.machine_type,
                       p.machine_id, p.name, p.description, p.year, p.manufacturer,
                       p.romof, p.cloneof, p.machine_type,
                       (SELECT group_concat(c.machine_id) FROM machine c
                          WHERE c.cloneof = :name),
                       (SELECT group_concat(s.machine_id) FROM machine s
                          WHERE s.cloneof = m.cloneof AND s.name <> :name)
                FROM machine m
                LEFT JOIN machine p ON p.name = m.cloneof
                WHERE m.name = :name
                "#,
            )
            .query_context(|| format!("family prepare for '{name}'"))?;

        let row = stmt
            .query_row(named_params! {":name": name}, |row| {
                let target = machine_from_row(row, 0)?;
                let parent = match row.get::<_, Option<i64>>(8)? {
                    Some(_) => Some(machine_from_row(row, 8)?),
                    None => None,
                };
                let clones: Option<String> = row.get(16)?;
                let siblings: Option<String> = row.get(17)?;
                Ok((target, parent, clones, siblings))
            })
            .optional()
            .query_context(|| format!("family query for '{name}'"))?;

        let Some((target, parent, clones, siblings)) = row else {
            return Err(Error::MachineNotFound(name.to_owned()));
        };
        Ok((
            target,
            parent,
            parse_id_list(clones.as_deref()),
            parse_id_list(siblings.as_deref()),
        ))
    }

    /// Query 2: every ROM edge of the given machines, edge order.
    fn query_family_roms(&self, machine_ids: &[i64]) -> Result<Vec<MachineRomRow>> {
        let placeholders = vec!["?"; machine_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT mr.machine_id, m.name, mr.merge,
                   r.rom_id, r.name, r.size, r.crc, r.rom_type
            FROM machine_rom mr
            JOIN rom r ON r.rom_id = mr.rom_id
            JOIN machine m ON m.machine_id = mr.machine_id
            WHERE mr.machine_id IN ({placeholders})
            ORDER BY mr.machine_rom_id
            "#
        );
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .query_context(|| "family roms prepare".into())?;

        let values: Vec<Value> = machine_ids.iter().copied().map(Value::from).collect();
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(MachineRomRow {
                    machine_id: row.get(0)?,
                    machine_name: row.get(1)?,
                    replaces: row.get(2)?,
                    rom: rom_from_row(row, 3)?,
                })
            })
            .query_context(|| "family roms query".into())?
            .collect::<std::result::Result<Vec<_>, _>>()
            .query_context(|| "family roms collect".into())?;
        Ok(rows)
    }
}

/// Group edges by ROM (first claim in traversal order wins) and assign
/// provenance.
fn annotate(
    mut rows: Vec<MachineRomRow>,
    machine_ids: &[i64],
    target: &Machine,
    parent: Option<&Machine>,
) -> Vec<RomWithProvenance> {
    let rank: HashMap<i64, usize> = machine_ids
        .iter()
        .enumerate()
        .map(|(rank, &id)| (id, rank))
        .collect();
    rows.sort_by_key(|row| rank.get(&row.machine_id).copied().unwrap_or(usize::MAX));

    let mut seen: HashSet<i64> = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.rom.rom_id) {
            continue;
        }
        let source = match row.rom.rom_type {
            RomType::Bios => RomSource::Bios,
            RomType::Device => RomSource::Device,
            RomType::Regular => {
                if row.machine_id == target.machine_id {
                    RomSource::Machine
                } else if parent.is_some_and(|p| p.machine_id == row.machine_id) {
                    RomSource::Parent
                } else {
                    RomSource::Clone
                }
            }
        };
        let kind = match source {
            RomSource::Bios => RomKind::BiosRom,
            RomSource::Device => RomKind::DeviceRom,
            RomSource::Parent => RomKind::GameRom,
            RomSource::Clone => RomKind::CloneRom,
            RomSource::Machine => {
                if target.is_clone() {
                    RomKind::CloneRom
                } else {
                    RomKind::GameRom
                }
            }
        };
        out.push(RomWithProvenance {
            rom: row.rom,
            source,
            kind,
            machine_id: row.machine_id,
            machine_name: row.machine_name,
            replaces: row.replaces,
            replaced_by: Vec::new(),
        });
    }
    out
}

fn parse_id_list(list: Option<&str>) -> Vec<i64> {
    list.map(|list| {
        list.split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    })
    .unwrap_or_default()
}
