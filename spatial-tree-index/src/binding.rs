//! Binds a spatial index to the store and map that hold its keys.

use crate::bounding_box::BoundingBox;
use crate::errors::IndexResult;
use crate::spatial_key::SpatialKey;
use crate::store::{KeyIterator, RTreeMap, RTreeStore, StoreConfig};

/// Prefix of the map name of every persistent spatial index.
pub const MAP_PREFIX: &str = "RTREE_";

/// Name of the only map of a transient index's private store.
pub const TRANSIENT_MAP_NAME: &str = "spatialIndex";

/// Map name of the persistent index with identifier `id`.
pub fn persistent_map_name(id: i32) -> String {
    format!("{}{}", MAP_PREFIX, id)
}

/// Lifecycle mode of an index's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// A map in the database's shared durable store.
    Persistent,
    /// A private in-memory store, discarded on close.
    Transient,
}

/// The store and map an index writes to.
///
/// The binding owns its map handle. For a transient index it also owns the
/// whole store.
pub struct StoreBinding {
    mode: StorageMode,
    store: RTreeStore,
    map: RTreeMap,
}

impl StoreBinding {
    /// Opens a private in-memory store with a single map.
    pub fn open_transient() -> IndexResult<StoreBinding> {
        let store = RTreeStore::open(StoreConfig::in_memory())?;
        let map = store.open_map(TRANSIENT_MAP_NAME)?;
        Ok(StoreBinding {
            mode: StorageMode::Transient,
            store,
            map,
        })
    }

    /// Opens, creating if needed, the map of index `id` in a shared store.
    pub fn open_persistent(store: RTreeStore, id: i32) -> IndexResult<StoreBinding> {
        let map = store.open_map(&persistent_map_name(id))?;
        Ok(StoreBinding {
            mode: StorageMode::Persistent,
            store,
            map,
        })
    }

    /// Returns `true` if `store` already holds data for index `id`.
    pub fn has_persistent_storage(store: &RTreeStore, id: i32) -> bool {
        store.has_map(&persistent_map_name(id))
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn map_name(&self) -> &str {
        self.map.name()
    }

    pub fn add(&self, key: SpatialKey) -> IndexResult<()> {
        Ok(self.map.add(key)?)
    }

    pub fn remove(&self, key: &SpatialKey) -> IndexResult<bool> {
        Ok(self.map.remove(key)?)
    }

    pub fn contains(&self, key: &SpatialKey) -> IndexResult<bool> {
        Ok(self.map.contains(key)?)
    }

    pub fn clear(&self) -> IndexResult<()> {
        Ok(self.map.clear()?)
    }

    pub fn size(&self) -> u64 {
        self.map.size()
    }

    pub fn keys(&self) -> IndexResult<KeyIterator> {
        Ok(self.map.keys()?)
    }

    pub fn find_intersecting(&self, query: &BoundingBox) -> IndexResult<KeyIterator> {
        Ok(self.map.find_intersecting_keys(query)?)
    }

    /// Persistent: writes the shared store out. Transient: closes the
    /// private store and drops its data.
    pub fn close(&self) -> IndexResult<()> {
        match self.mode {
            StorageMode::Persistent => {
                if !self.store.is_closed() {
                    self.store.flush()?;
                }
            }
            StorageMode::Transient => self.store.close()?,
        }
        log::debug!("Closed spatial map {} ({:?})", self.map.name(), self.mode);
        Ok(())
    }

    /// Permanently deletes the map, unless it is already closed.
    pub fn drop_map(&self) -> IndexResult<()> {
        if !self.map.is_closed() {
            self.map.remove_map()?;
            log::debug!("Dropped spatial map {}", self.map.name());
        }
        Ok(())
    }
}
