//! Configuration of a [`Database`](crate::session::Database) and its shared
//! spatial store.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::{ErrorKind, IndexError, IndexResult};
use crate::store::StoreConfig;
use crate::util::{atomic, Atomic, ReadExecutor, WriteExecutor};

/// Default fixed overhead, in rows, of using an index at all.
pub const DEFAULT_COST_ROW_OFFSET: u64 = 1000;

/// Default name of the shared store file inside the database directory.
pub const DEFAULT_STORE_FILE_NAME: &str = "spatial.rtree";

/// Database-wide settings for spatial indexes.
///
/// Cloned configs share the same settings. Every setter fails once the
/// database has opened its shared store.
///
/// # Examples
///
/// ```rust
/// use spatial_tree_index::config::DatabaseConfig;
///
/// let config = DatabaseConfig::new();
/// config.set_db_path("/tmp/geo-db").unwrap();
/// config.set_cost_row_offset(500).unwrap();
/// assert!(config.store_config().is_persistent());
/// ```
#[derive(Clone)]
pub struct DatabaseConfig {
    inner: Arc<DatabaseConfigInner>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new()),
        }
    }

    /// Directory holding the shared store file, if the database is on disk.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.inner.db_path()
    }

    /// Sets the database directory.
    ///
    /// # Errors
    ///
    /// Returns error if the shared store is already open.
    pub fn set_db_path<P: AsRef<Path>>(&self, db_path: P) -> IndexResult<()> {
        self.inner.set_db_path(db_path.as_ref())
    }

    pub fn store_file_name(&self) -> String {
        self.inner.store_file_name()
    }

    /// Sets the name of the shared store file.
    ///
    /// # Errors
    ///
    /// Returns error if the shared store is already open or the name is empty.
    pub fn set_store_file_name(&self, name: &str) -> IndexResult<()> {
        self.inner.set_store_file_name(name)
    }

    /// Fixed number of rows added to every cost estimate.
    pub fn cost_row_offset(&self) -> u64 {
        self.inner.cost_row_offset()
    }

    /// Sets the fixed cost overhead.
    ///
    /// # Errors
    ///
    /// Returns error if the shared store is already open.
    pub fn set_cost_row_offset(&self, offset: u64) -> IndexResult<()> {
        self.inner.set_cost_row_offset(offset)
    }

    /// Where the shared store lives: a file under `db_path`, or memory.
    pub fn store_config(&self) -> StoreConfig {
        match self.db_path() {
            Some(dir) => StoreConfig::file(dir.join(self.store_file_name())),
            None => StoreConfig::in_memory(),
        }
    }

    pub(crate) fn freeze(&self) {
        self.inner.frozen.store(true, Ordering::Relaxed);
    }
}

struct DatabaseConfigInner {
    /// Set once the shared store has been opened
    frozen: AtomicBool,
    db_path: Atomic<Option<PathBuf>>,
    store_file_name: Atomic<String>,
    cost_row_offset: AtomicU64,
}

impl DatabaseConfigInner {
    fn new() -> Self {
        DatabaseConfigInner {
            frozen: AtomicBool::from(false),
            db_path: atomic(None),
            store_file_name: atomic(DEFAULT_STORE_FILE_NAME.to_string()),
            cost_row_offset: AtomicU64::from(DEFAULT_COST_ROW_OFFSET),
        }
    }

    fn check_not_frozen(&self, setting: &str) -> IndexResult<()> {
        if self.frozen.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after the store is opened", setting);
            return Err(IndexError::new(
                &format!("{} cannot be changed after the store is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn db_path(&self) -> Option<PathBuf> {
        self.db_path.read_with(|path| path.clone())
    }

    fn set_db_path(&self, db_path: &Path) -> IndexResult<()> {
        self.check_not_frozen("Database path")?;
        self.db_path
            .write_with(|path| *path = Some(db_path.to_path_buf()));
        Ok(())
    }

    fn store_file_name(&self) -> String {
        self.store_file_name.read_with(|name| name.clone())
    }

    fn set_store_file_name(&self, name: &str) -> IndexResult<()> {
        self.check_not_frozen("Store file name")?;
        if name.is_empty() {
            log::error!("Store file name cannot be empty");
            return Err(IndexError::new(
                "Store file name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.store_file_name.write_with(|it| *it = name.to_string());
        Ok(())
    }

    fn cost_row_offset(&self) -> u64 {
        self.cost_row_offset.load(Ordering::Relaxed)
    }

    fn set_cost_row_offset(&self, offset: u64) -> IndexResult<()> {
        self.check_not_frozen("Cost row offset")?;
        self.cost_row_offset.store(offset, Ordering::Relaxed);
        Ok(())
    }
}
