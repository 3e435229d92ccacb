use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use rstar::RTree;

use super::config::StoreConfig;
use super::error::{StoreError, StoreResult};
use super::persistence::{MapImage, StoreFile, StoreImage};
use super::rtree_map::RTreeMap;
use crate::util::{atomic, Atomic, ReadExecutor, WriteExecutor};

/// A container of named [`RTreeMap`]s.
///
/// An in-memory store lives as long as its last handle. A file-backed store
/// loads every map when opened and writes them all back on [`flush`] and
/// [`close`].
///
/// [`flush`]: RTreeStore::flush
/// [`close`]: RTreeStore::close
#[derive(Clone)]
pub struct RTreeStore {
    inner: Arc<RTreeStoreInner>,
}

pub(crate) struct RTreeStoreInner {
    config: StoreConfig,
    file: Option<StoreFile>,
    maps: Atomic<HashMap<String, RTreeMap>>,
    closed: AtomicBool,
}

impl RTreeStore {
    /// Opens a store, loading existing maps if the configured file exists.
    pub fn open(config: StoreConfig) -> StoreResult<RTreeStore> {
        let file = config.file_path().map(StoreFile::new);
        let image = match &file {
            Some(file) => file.read()?,
            None => StoreImage::default(),
        };

        let inner = Arc::new_cyclic(|weak: &Weak<RTreeStoreInner>| {
            let maps = image
                .maps
                .into_iter()
                .map(|map| {
                    let handle = RTreeMap::new(&map.name, map.tree, weak.clone());
                    (map.name, handle)
                })
                .collect::<HashMap<_, _>>();
            RTreeStoreInner {
                config,
                file,
                maps: atomic(maps),
                closed: AtomicBool::new(false),
            }
        });

        let store = RTreeStore { inner };
        match store.inner.file.as_ref() {
            Some(file) => log::debug!(
                "Opened spatial store {:?} with {} maps",
                file.path(),
                store.inner.maps.read_with(|maps| maps.len())
            ),
            None => log::debug!("Opened in-memory spatial store"),
        }
        Ok(store)
    }

    pub(crate) fn from_inner(inner: Arc<RTreeStoreInner>) -> Self {
        RTreeStore { inner }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.config.is_persistent()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns the map called `name`, creating an empty one if needed.
    pub fn open_map(&self, name: &str) -> StoreResult<RTreeMap> {
        self.check_opened()?;
        let weak = Arc::downgrade(&self.inner);
        let map = self.inner.maps.write_with(|maps| {
            maps.entry(name.to_string())
                .or_insert_with(|| {
                    log::debug!("Creating spatial map {}", name);
                    RTreeMap::new(name, RTree::new(), weak)
                })
                .clone()
        });
        Ok(map)
    }

    pub fn has_map(&self, name: &str) -> bool {
        self.inner.maps.read_with(|maps| maps.contains_key(name))
    }

    /// Names of all maps, sorted.
    pub fn map_names(&self) -> Vec<String> {
        let mut names = self
            .inner
            .maps
            .read_with(|maps| maps.keys().cloned().collect::<Vec<_>>());
        names.sort();
        names
    }

    /// Deletes the map called `name` and closes every handle to it.
    pub fn remove_map(&self, name: &str) -> StoreResult<()> {
        self.check_opened()?;
        if let Some(map) = self.inner.maps.write_with(|maps| maps.remove(name)) {
            map.close();
            log::debug!("Removed spatial map {}", name);
        }
        Ok(())
    }

    /// Writes every map to the store file. Does nothing for an in-memory
    /// store.
    pub fn flush(&self) -> StoreResult<()> {
        self.check_opened()?;
        self.write_image()
    }

    /// Flushes and closes the store and all of its maps. Closing twice is a
    /// no-op.
    pub fn close(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        let result = self.write_image();
        self.inner.closed.store(true, Ordering::Release);
        self.inner.maps.read_with(|maps| {
            for map in maps.values() {
                map.close();
            }
        });
        log::debug!("Closed spatial store");
        result
    }

    fn write_image(&self) -> StoreResult<()> {
        let file = match &self.inner.file {
            Some(file) => file,
            None => return Ok(()),
        };

        let mut maps = self.inner.maps.read_with(|maps| {
            maps.values()
                .map(|map| MapImage {
                    name: map.name().to_string(),
                    tree: map.snapshot(),
                })
                .collect::<Vec<_>>()
        });
        maps.sort_by(|a, b| a.name.cmp(&b.name));

        let count = maps.len();
        file.write(&StoreImage { maps })?;
        log::debug!("Flushed {} spatial maps to {:?}", count, file.path());
        Ok(())
    }

    fn check_opened(&self) -> StoreResult<()> {
        if self.is_closed() {
            Err(StoreError::Closed("spatial store".to_string()))
        } else {
            Ok(())
        }
    }
}
