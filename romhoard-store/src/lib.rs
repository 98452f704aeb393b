// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Async facade over the catalog store.
//!
//! A [`Store`] wraps one open connection behind a mutex: callers may
//! issue concurrent requests, the store queues them and runs each
//! statement to completion before the next begins. Handles are cached
//! process-wide by canonical path, so a repeated open returns the same
//! underlying connection; [`Store::close`] evicts a handle from the
//! cache.
//!
//! # Example
//!
//! ```ignore
//! use romhoard_store::{ingest, open_store, derive_set, SetKind};
//!
//! let store = ingest("mame.xml", "catalog.db", false).await?;
//! let dossier = store.load_dossier("pacman").await?;
//! let roms = derive_set(&dossier, SetKind::Merged);
//! ```

pub mod config;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use romhoard_store_db::StoreDb;

pub use romhoard_core::{derive_set, Dossier, RomKind, RomSource, RomWithProvenance, SetKind};
pub use romhoard_store_db::{CatalogMeta, MachineRomRow, MachineSummary, StoreStats};

/// Result type for store facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the store facade.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying store
    #[error(transparent)]
    Store(#[from] romhoard_store_db::Error),

    /// A blocking task could not be joined
    #[error("background task failed: {0}")]
    Task(String),
}

/// An open catalog store with serialized access.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    db: Arc<Mutex<StoreDb>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

/// Process-wide handle cache, keyed by canonical store path.
fn registry() -> &'static StdMutex<HashMap<PathBuf, Store>> {
    static REGISTRY: OnceLock<StdMutex<HashMap<PathBuf, Store>>> = OnceLock::new();
    REGISTRY.get_or_init(|| StdMutex::new(HashMap::new()))
}

fn registry_lock() -> std::sync::MutexGuard<'static, HashMap<PathBuf, Store>> {
    // A poisoned registry only means another open panicked; the map
    // itself stays usable.
    registry().lock().unwrap_or_else(|e| e.into_inner())
}

/// Open the store at `path`, reusing a cached handle when one exists.
///
/// Lookup and creation are atomic relative to each other, so two
/// concurrent opens of the same path end up sharing one connection.
pub async fn open_store<P: AsRef<Path>>(path: P) -> Result<Store> {
    let path = path.as_ref().to_owned();
    spawn_store_task(move || {
        let canonical = path
            .canonicalize()
            .map_err(|_| romhoard_store_db::Error::StoreNotFound(path.clone()))?;

        let mut stores = registry_lock();
        if let Some(store) = stores.get(&canonical) {
            debug!("reusing cached store handle for {}", canonical.display());
            return Ok(store.clone());
        }
        let db = StoreDb::open(&canonical)?;
        let store = Store {
            path: canonical.clone(),
            db: Arc::new(Mutex::new(db)),
        };
        stores.insert(canonical, store.clone());
        Ok(store)
    })
    .await
}

/// Ingest a catalog XML file into a new store file and open it.
///
/// Any cached handle for `out_path` is replaced by the fresh one.
pub async fn ingest<P, Q>(xml_path: P, out_path: Q, overwrite: bool) -> Result<Store>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let xml_path = xml_path.as_ref().to_owned();
    let out_path = out_path.as_ref().to_owned();
    spawn_store_task(move || {
        let db = StoreDb::ingest_catalog(&xml_path, &out_path, overwrite)?;
        let canonical = out_path
            .canonicalize()
            .map_err(|_| romhoard_store_db::Error::StoreNotFound(out_path.clone()))?;

        let store = Store {
            path: canonical.clone(),
            db: Arc::new(Mutex::new(db)),
        };
        registry_lock().insert(canonical, store.clone());
        Ok(store)
    })
    .await
}

impl Store {
    /// Canonical path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The build string of the ingested catalog.
    pub async fn catalog_version(&self) -> Result<Option<String>> {
        self.with_db(|db| db.catalog_version()).await
    }

    /// The full catalog metadata row.
    pub async fn catalog_meta(&self) -> Result<Option<CatalogMeta>> {
        self.with_db(|db| db.catalog_meta()).await
    }

    /// All machines with clone counts, ordered by name.
    pub async fn list_machines(&self) -> Result<Vec<MachineSummary>> {
        self.with_db(|db| db.list_machines()).await
    }

    /// Load the dossier for one machine name.
    pub async fn load_dossier(&self, name: &str) -> Result<Dossier> {
        let name = name.to_owned();
        self.with_db(move |db| db.load_dossier(&name)).await
    }

    /// All edges of one machine in insertion order.
    pub async fn machine_roms(&self, machine_id: i64) -> Result<Vec<MachineRomRow>> {
        self.with_db(move |db| db.machine_roms(machine_id)).await
    }

    /// The machine whose ROM CRC set matches all given CRCs exactly.
    pub async fn find_machine_by_crcs(&self, crcs: Vec<String>) -> Result<Option<i64>> {
        self.with_db(move |db| db.find_machine_by_crcs(&crcs)).await
    }

    /// Resolve a machine id back to its name.
    pub async fn machine_name(&self, machine_id: i64) -> Result<Option<String>> {
        self.with_db(move |db| db.machine_name(machine_id)).await
    }

    /// Row counts of the store.
    pub async fn stats(&self) -> Result<StoreStats> {
        self.with_db(|db| db.stats()).await
    }

    /// Evict this store from the process-wide cache.
    ///
    /// The connection closes once the last clone of the handle is
    /// dropped; a later [`open_store`] on the same path opens fresh.
    pub async fn close(self) {
        let path = self.path.clone();
        let _ = tokio::task::spawn_blocking(move || {
            registry_lock().remove(&path);
            debug!("evicted store handle for {}", path.display());
        })
        .await;
    }

    /// Run one operation against the connection on the blocking pool.
    ///
    /// The mutex serializes all access: operations run to completion in
    /// FIFO order of lock acquisition.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StoreDb) -> romhoard_store_db::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let db = db.blocking_lock();
            f(&db)
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?
        .map_err(Error::from)
    }
}

async fn spawn_store_task<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, romhoard_store_db::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Task(e.to_string()))?
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SMALL_XML: &str = r#"
        <mame build="0.250">
          <machine name="puckman">
            <rom name="a.bin" size="16" crc="1111"/>
          </machine>
        </mame>"#;

    async fn fixture(dir: &TempDir) -> Store {
        let xml_path = dir.path().join("catalog.xml");
        std::fs::write(&xml_path, SMALL_XML).unwrap();
        ingest(&xml_path, dir.path().join("catalog.db"), false)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn repeated_open_returns_the_cached_handle() {
        let dir = TempDir::new().unwrap();
        let store = fixture(&dir).await;

        let first = open_store(store.path()).await.unwrap();
        let second = open_store(store.path()).await.unwrap();
        assert!(Arc::ptr_eq(&first.db, &second.db));
        // ingest itself populated the cache
        assert!(Arc::ptr_eq(&store.db, &first.db));
    }

    #[tokio::test]
    async fn close_evicts_from_the_cache() {
        let dir = TempDir::new().unwrap();
        let store = fixture(&dir).await;
        let path = store.path().to_owned();

        let before = open_store(&path).await.unwrap();
        before.close().await;

        let after = open_store(&path).await.unwrap();
        assert!(!Arc::ptr_eq(&store.db, &after.db));
    }

    #[tokio::test]
    async fn opening_a_missing_store_fails() {
        let dir = TempDir::new().unwrap();
        let err = open_store(dir.path().join("absent.db")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Store(romhoard_store_db::Error::StoreNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_queries_are_serialized_not_rejected() {
        let dir = TempDir::new().unwrap();
        let store = fixture(&dir).await;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.list_machines().await.map(|m| m.len())
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 1);
        }
    }
}
