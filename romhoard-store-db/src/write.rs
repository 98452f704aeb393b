// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Store creation: bulk-load of a normalized catalog.
//!
//! The writer works against a fresh in-memory database and snapshots the
//! result to the target file with SQLite's online backup, so disk I/O
//! never sits inside the bulk-insert transactions. Insert order is
//! {header} → {machines} → {roms} → {edges}, one transaction each;
//! machine and ROM insert order defines surrogate id assignment.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use romhoard_catalog::{normalize, read_catalog, DeviceClosureResolver, NormalizedCatalog};
use rusqlite::backup::Backup;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::connection::StoreDb;
use crate::error::{Error, Result, WriteContext};

impl StoreDb {
    /// Ingest a catalog XML file into a new store at `out_path`.
    ///
    /// Returns a read-only handle on the written store. With `overwrite`
    /// unset an existing output file is an error; the catalog is parsed
    /// and loaded entirely in memory before the target file is touched,
    /// so a parse failure leaves no partial store behind.
    pub fn ingest_catalog<P, Q>(xml_path: P, out_path: Q, overwrite: bool) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let out_path = out_path.as_ref();
        if out_path.exists() && !overwrite {
            return Err(Error::AlreadyExists(out_path.to_owned()));
        }

        let catalog = read_catalog(xml_path)?;
        let staged = build_memory_store(normalize(catalog))?;
        staged.snapshot_to(out_path)?;

        Self::open(out_path)
    }
}

/// Load a normalized catalog into a fresh in-memory store.
pub(crate) fn build_memory_store(normalized: NormalizedCatalog) -> Result<StoreDb> {
    let db = StoreDb::open_memory()?;

    if let Some(header) = &normalized.header {
        db.conn
            .execute(
                "INSERT INTO mame (build, debug, mameconfig) VALUES (?1, ?2, ?3)",
                params![header.build, header.debug, header.mameconfig],
            )
            .write_context(|| "header insert".into())?;
    }

    let mut resolver = DeviceClosureResolver::new(&normalized.machines);
    let machine_ids = insert_machines(&db.conn, &normalized, &mut resolver)?;
    let rom_ids = insert_roms(&db.conn, &normalized)?;
    let edges = insert_edges(&db.conn, &normalized, &machine_ids, &rom_ids, &mut resolver)?;

    info!(
        machines = machine_ids.iter().flatten().count(),
        roms = rom_ids.len(),
        edges,
        "loaded catalog into store"
    );
    Ok(db)
}

/// Insert all machines in catalog order; the returned vector maps the
/// seed index to the assigned machine_id.
///
/// A machine with no direct ROMs, no ROMs through its device closure
/// and no referent pulling it in as a device provides no value in the
/// store and is skipped.
fn insert_machines(
    conn: &Connection,
    normalized: &NormalizedCatalog,
    resolver: &mut DeviceClosureResolver<'_>,
) -> Result<Vec<Option<i64>>> {
    let mut referenced: HashSet<&str> = HashSet::new();
    for machine in &normalized.machines {
        for device in &machine.device_refs {
            if device != &machine.name {
                referenced.insert(device);
            }
        }
    }

    let mut machine_ids = Vec::with_capacity(normalized.machines.len());
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO machine
                    (name, description, year, manufacturer, romof, cloneof, machine_type)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .write_context(|| "machine insert prepare".into())?;
        for (index, machine) in normalized.machines.iter().enumerate() {
            let keep = !machine.rom_claims.is_empty()
                || referenced.contains(machine.name.as_str())
                || resolver
                    .closure(index)
                    .iter()
                    .any(|&device| !normalized.machines[device].rom_claims.is_empty());
            if !keep {
                machine_ids.push(None);
                continue;
            }
            stmt.execute(params![
                machine.name,
                machine.description,
                machine.year,
                machine.manufacturer,
                machine.romof,
                machine.cloneof,
                machine.machine_type.code(),
            ])
            .write_context(|| format!("machine insert '{}'", machine.name))?;
            machine_ids.push(Some(tx.last_insert_rowid()));
        }
    }
    tx.commit().write_context(|| "machine commit".into())?;
    debug!(
        inserted = machine_ids.iter().flatten().count(),
        skipped = machine_ids.iter().filter(|id| id.is_none()).count(),
        "machine phase committed"
    );
    Ok(machine_ids)
}

/// Insert the deduplicated ROM table; index order is rom_id order.
fn insert_roms(conn: &Connection, normalized: &NormalizedCatalog) -> Result<Vec<i64>> {
    let mut rom_ids = Vec::with_capacity(normalized.roms.len());
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx
            .prepare("INSERT INTO rom (name, size, crc, rom_type) VALUES (?1, ?2, ?3, ?4)")
            .write_context(|| "rom insert prepare".into())?;
        for rom in &normalized.roms {
            stmt.execute(params![rom.name, rom.size as i64, rom.crc, rom.rom_type.code()])
                .write_context(|| format!("rom insert '{}'", rom.name))?;
            rom_ids.push(tx.last_insert_rowid());
        }
    }
    tx.commit().write_context(|| "rom commit".into())?;
    debug!(inserted = rom_ids.len(), "rom phase committed");
    Ok(rom_ids)
}

/// Insert the machine_rom edges: each machine's direct claims first,
/// then one edge per ROM of every device in its closure.
///
/// `INSERT OR IGNORE` absorbs the duplicates that arise when a direct
/// ROM and a device-induced ROM coincide; the direct edge keeps its
/// `merge` value.
fn insert_edges(
    conn: &Connection,
    normalized: &NormalizedCatalog,
    machine_ids: &[Option<i64>],
    rom_ids: &[i64],
    resolver: &mut DeviceClosureResolver<'_>,
) -> Result<u64> {
    let mut edges = 0u64;

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT OR IGNORE INTO machine_rom (machine_id, rom_id, merge) VALUES (?1, ?2, ?3)",
            )
            .write_context(|| "edge insert prepare".into())?;
        for (index, machine) in normalized.machines.iter().enumerate() {
            let Some(machine_id) = machine_ids[index] else {
                continue;
            };
            for claim in &machine.rom_claims {
                edges += stmt
                    .execute(params![machine_id, rom_ids[claim.rom], claim.merge])
                    .write_context(|| format!("edge insert '{}'", machine.name))?
                    as u64;
            }
            for device in resolver.closure(index) {
                for claim in &normalized.machines[device].rom_claims {
                    edges += stmt
                        .execute(params![machine_id, rom_ids[claim.rom], Option::<String>::None])
                        .write_context(|| format!("device edge insert '{}'", machine.name))?
                        as u64;
                }
            }
        }
    }
    tx.commit().write_context(|| "edge commit".into())?;
    debug!(inserted = edges, "edge phase committed");
    Ok(edges)
}

impl StoreDb {
    /// Snapshot this store to `path` with SQLite's online backup,
    /// replacing any prior file.
    fn snapshot_to(&self, path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| Error::Io {
                context: format!("failed to remove prior store at '{}'", path.display()),
                source: e,
            })?;
        }

        let mut target = Connection::open(path).map_err(|e| Error::StoreUnavailable {
            path: path.to_owned(),
            source: e,
        })?;
        let backup = Backup::new(&self.conn, &mut target)
            .write_context(|| format!("backup init to '{}'", path.display()))?;
        backup
            .run_to_completion(1024, Duration::ZERO, None)
            .write_context(|| format!("backup to '{}'", path.display()))?;

        debug!("snapshotted store to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::memory_store;

    fn count(db: &StoreDb, sql: &str) -> i64 {
        db.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn machines_without_roms_or_referents_are_skipped() {
        let db = memory_store(
            r#"<mame>
                 <machine name="useful"><rom name="a.bin" size="1" crc="0001"/></machine>
                 <machine name="romless_device" isdevice="yes"/>
                 <machine name="user"><rom name="b.bin" size="1" crc="0002"/>
                   <device_ref name="romless_device"/></machine>
                 <machine name="orphan"/>
               </mame>"#,
        );
        // orphan dropped, romless_device kept (it is referenced)
        assert_eq!(count(&db, "SELECT COUNT(*) FROM machine"), 3);
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM machine WHERE name = 'orphan'"),
            0
        );
    }

    #[test]
    fn machine_with_only_device_provided_roms_is_kept() {
        let db = memory_store(
            r#"<mame>
                 <machine name="z80" isdevice="yes">
                   <rom name="z80.bin" size="4" crc="00AA"/>
                 </machine>
                 <machine name="shell"><device_ref name="z80"/></machine>
               </mame>"#,
        );
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM machine WHERE name = 'shell'"),
            1
        );
        let shell_edges = count(
            &db,
            r#"
            SELECT COUNT(*) FROM machine_rom
            JOIN machine USING (machine_id) WHERE machine.name = 'shell'
            "#,
        );
        assert_eq!(shell_edges, 1);
    }

    #[test]
    fn duplicate_direct_and_device_claim_yields_one_edge() {
        let db = memory_store(
            r#"<mame>
                 <machine name="z80" isdevice="yes">
                   <rom name="z80.bin" size="4" crc="00AA"/>
                 </machine>
                 <machine name="m1">
                   <rom name="z80.bin" size="4" crc="00aa" merge="kept"/>
                   <device_ref name="z80"/>
                 </machine>
               </mame>"#,
        );
        let m1_edges = count(
            &db,
            r#"
            SELECT COUNT(*) FROM machine_rom
            JOIN machine USING (machine_id) WHERE machine.name = 'm1'
            "#,
        );
        assert_eq!(m1_edges, 1);
        // the direct edge was first, so its merge survived
        let merge: Option<String> = db
            .conn
            .query_row(
                r#"
                SELECT mr.merge FROM machine_rom mr
                JOIN machine m USING (machine_id) WHERE m.name = 'm1'
                "#,
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(merge.as_deref(), Some("kept"));
    }

    #[test]
    fn device_closure_expands_edges_transitively() {
        let db = memory_store(
            r#"<mame>
                 <machine name="ram" isdevice="yes">
                   <rom name="ram.bin" size="4" crc="0003"/>
                 </machine>
                 <machine name="bus" isdevice="yes">
                   <device_ref name="ram"/>
                 </machine>
                 <machine name="m1">
                   <rom name="m1.bin" size="4" crc="0004"/>
                   <device_ref name="bus"/>
                 </machine>
               </mame>"#,
        );
        // m1 claims its own ROM plus ram.bin through bus
        let m1_edges = count(
            &db,
            r#"
            SELECT COUNT(*) FROM machine_rom
            JOIN machine USING (machine_id) WHERE machine.name = 'm1'
            "#,
        );
        assert_eq!(m1_edges, 2);
        // the device-induced edge carries no merge
        let merge: Option<String> = db
            .conn
            .query_row(
                r#"
                SELECT mr.merge FROM machine_rom mr
                JOIN machine m USING (machine_id)
                JOIN rom r USING (rom_id)
                WHERE m.name = 'm1' AND r.name = 'ram.bin'
                "#,
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(merge, None);
    }

    #[test]
    fn header_lands_in_the_mame_table() {
        let db = memory_store(r#"<mame build="0.250" debug="no" mameconfig="10"></mame>"#);
        let build: String = db
            .conn
            .query_row("SELECT build FROM mame", [], |row| row.get(0))
            .unwrap();
        assert_eq!(build, "0.250");
        assert_eq!(count(&db, "SELECT COUNT(*) FROM mame"), 1);
    }

    #[test]
    fn rom_identity_is_unique_after_load() {
        let db = memory_store(
            r#"<mame>
                 <machine name="p"><rom name="a.bin" size="8" crc="0005"/></machine>
                 <machine name="c" cloneof="p"><rom name="a.bin" size="8" crc="0005"/></machine>
               </mame>"#,
        );
        assert_eq!(count(&db, "SELECT COUNT(*) FROM rom"), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM machine_rom"), 2);
    }
}
