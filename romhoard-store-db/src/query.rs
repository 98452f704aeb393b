// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Read query operations for the catalog store.

use romhoard_core::{canonical_crc, Machine, MachineType};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::connection::StoreDb;
use crate::error::{QueryContext, Result};
use crate::types::{
    machine_from_row, rom_from_row, CatalogMeta, MachineRomRow, MachineSummary, StoreStats,
};

impl StoreDb {
    /// The catalog metadata row, if the ingested catalog carried one.
    pub fn catalog_meta(&self) -> Result<Option<CatalogMeta>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT build, debug, mameconfig FROM mame LIMIT 1")
            .query_context(|| "catalog meta prepare".into())?;

        stmt.query_row([], |row| {
            Ok(CatalogMeta {
                build: row.get(0)?,
                debug: row.get(1)?,
                mameconfig: row.get(2)?,
            })
        })
        .optional()
        .query_context(|| "catalog meta".into())
    }

    /// The build string of the ingested catalog.
    pub fn catalog_version(&self) -> Result<Option<String>> {
        Ok(self.catalog_meta()?.and_then(|meta| meta.build))
    }

    /// Query a machine by its unique name.
    pub fn machine_by_name(&self, name: &str) -> Result<Option<Machine>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT machine_id, name, description, year, manufacturer,
                       romof, cloneof, machine_type
                FROM machine
                WHERE name = ?1
                "#,
            )
            .query_context(|| format!("machine lookup prepare for '{name}'"))?;

        stmt.query_row(params![name], |row| machine_from_row(row, 0))
            .optional()
            .query_context(|| format!("machine lookup for '{name}'"))
    }

    /// Resolve a machine id back to its name.
    pub fn machine_name(&self, machine_id: i64) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name FROM machine WHERE machine_id = ?1")
            .query_context(|| format!("machine name prepare for id {machine_id}"))?;

        stmt.query_row(params![machine_id], |row| row.get(0))
            .optional()
            .query_context(|| format!("machine name for id {machine_id}"))
    }

    /// List all machines with their clone counts, ordered by name.
    pub fn list_machines(&self) -> Result<Vec<MachineSummary>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT m.machine_id, m.name, m.description, m.year, m.manufacturer,
                       m.machine_type,
                       (SELECT COUNT(*) FROM machine c WHERE c.cloneof = m.name)
                FROM machine m
                ORDER BY m.name
                "#,
            )
            .query_context(|| "machine list prepare".into())?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MachineSummary {
                    machine_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    year: row.get(3)?,
                    manufacturer: row.get(4)?,
                    machine_type: MachineType::from_code(
                        row.get::<_, Option<String>>(5)?.as_deref(),
                    ),
                    clone_count: row.get(6)?,
                })
            })
            .query_context(|| "machine list".into())?
            .collect::<std::result::Result<Vec<_>, _>>()
            .query_context(|| "machine list collect".into())?;
        Ok(rows)
    }

    /// All edges of one machine joined to their ROM rows, in edge
    /// insertion order.
    pub fn machine_roms(&self, machine_id: i64) -> Result<Vec<MachineRomRow>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT mr.machine_id, m.name, mr.merge,
                       r.rom_id, r.name, r.size, r.crc, r.rom_type
                FROM machine_rom mr
                JOIN rom r ON r.rom_id = mr.rom_id
                JOIN machine m ON m.machine_id = mr.machine_id
                WHERE mr.machine_id = ?1
                ORDER BY mr.machine_rom_id
                "#,
            )
            .query_context(|| format!("machine roms prepare for id {machine_id}"))?;

        let rows = stmt
            .query_map(params![machine_id], |row| {
                Ok(MachineRomRow {
                    machine_id: row.get(0)?,
                    machine_name: row.get(1)?,
                    replaces: row.get(2)?,
                    rom: rom_from_row(row, 3)?,
                })
            })
            .query_context(|| format!("machine roms for id {machine_id}"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .query_context(|| format!("machine roms collect for id {machine_id}"))?;
        Ok(rows)
    }

    /// Find the machine whose ROM CRC set contains all given CRCs, with
    /// exactly as many matches as CRCs provided.
    ///
    /// Comparison is case-insensitive; ties resolve to the smallest
    /// machine_id, an empty input identifies nothing.
    pub fn find_machine_by_crcs(&self, crcs: &[String]) -> Result<Option<i64>> {
        let mut wanted: Vec<String> = Vec::with_capacity(crcs.len());
        for crc in crcs {
            let crc = canonical_crc(crc);
            if !wanted.contains(&crc) {
                wanted.push(crc);
            }
        }
        if wanted.is_empty() {
            return Ok(None);
        }

        let placeholders = vec!["?"; wanted.len()].join(", ");
        let sql = format!(
            r#"
            SELECT mr.machine_id
            FROM machine_rom mr
            JOIN rom r ON r.rom_id = mr.rom_id
            WHERE r.crc IN ({placeholders})
            GROUP BY mr.machine_id
            HAVING COUNT(DISTINCT r.crc) = ?
            ORDER BY mr.machine_id
            LIMIT 1
            "#
        );
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .query_context(|| "crc search prepare".into())?;

        let count = wanted.len() as i64;
        let mut values: Vec<Value> = wanted.into_iter().map(Value::from).collect();
        values.push(Value::from(count));

        stmt.query_row(params_from_iter(values), |row| row.get(0))
            .optional()
            .query_context(|| "crc search".into())
    }

    /// Row counts of the store.
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT (SELECT COUNT(*) FROM machine),
                       (SELECT COUNT(*) FROM rom),
                       (SELECT COUNT(*) FROM machine_rom)
                "#,
            )
            .query_context(|| "stats prepare".into())?;

        stmt.query_row([], |row| {
            Ok(StoreStats {
                machines: row.get::<_, i64>(0)? as u64,
                roms: row.get::<_, i64>(1)? as u64,
                edges: row.get::<_, i64>(2)? as u64,
            })
        })
        .query_context(|| "stats".into())
    }
}
