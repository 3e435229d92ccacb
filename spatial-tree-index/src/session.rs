//! The database and session handles spatial indexes are created and used
//! through.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::DatabaseConfig;
use crate::errors::{ErrorKind, IndexError, IndexResult};
use crate::store::RTreeStore;

/// A database owning the shared durable store of its persistent spatial
/// indexes.
///
/// The shared store is opened on first use. While the database is
/// *starting* (opening or recovering) index definitions are accepted with
/// column metadata that is not checked yet.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    starting: AtomicBool,
    closed: AtomicBool,
    store: Mutex<Option<RTreeStore>>,
    next_session_id: AtomicU64,
}

impl Database {
    pub fn open(config: DatabaseConfig) -> Database {
        Database {
            inner: Arc::new(DatabaseInner {
                config,
                starting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                store: Mutex::new(None),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    /// A database without a directory; its shared store lives in memory.
    pub fn in_memory() -> Database {
        Database::open(DatabaseConfig::new())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub fn is_starting(&self) -> bool {
        self.inner.starting.load(Ordering::Relaxed)
    }

    pub fn set_starting(&self, starting: bool) {
        self.inner.starting.store(starting, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn create_session(&self) -> Session {
        let id = self.inner.next_session_id.fetch_add(1, Ordering::Relaxed);
        Session {
            id,
            database: self.clone(),
        }
    }

    /// The shared durable store, opening it on first call.
    pub fn spatial_store(&self) -> IndexResult<RTreeStore> {
        if self.is_closed() {
            return Err(IndexError::new(
                "Database is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }

        let mut guard = self.inner.store.lock();
        if let Some(store) = guard.as_ref() {
            return Ok(store.clone());
        }

        let store_config = self.inner.config.store_config();
        let store = RTreeStore::open(store_config).map_err(|e| {
            log::error!("Failed to open the shared spatial store: {}", e);
            IndexError::from(e)
        })?;
        self.inner.config.freeze();
        *guard = Some(store.clone());
        Ok(store)
    }

    /// Closes the shared store, writing it out if it is file-backed.
    pub fn close(&self) -> IndexResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(store) = self.inner.store.lock().take() {
            store.close()?;
        }
        log::debug!("Closed database");
        Ok(())
    }
}

/// A unit of work against a [`Database`].
///
/// Sessions carry no locks; callers serialize conflicting operations on the
/// same index.
#[derive(Clone)]
pub struct Session {
    id: u64,
    database: Database,
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}
