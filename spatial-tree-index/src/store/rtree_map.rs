use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use rstar::RTree;

use super::error::{StoreError, StoreResult};
use super::rtree_store::{RTreeStore, RTreeStoreInner};
use crate::bounding_box::BoundingBox;
use crate::spatial_key::SpatialKey;
use crate::util::{atomic, Atomic, ReadExecutor, WriteExecutor};

/// A named multi-dimensional map of [`SpatialKey`]s inside an
/// [`RTreeStore`].
///
/// Tree balancing and node splitting are done by `rstar`. Searches return a
/// [`KeyIterator`] over the keys that matched when the search started;
/// changes made to the map afterwards are not visible to it.
///
/// Cloning is cheap and every clone refers to the same map.
#[derive(Clone)]
pub struct RTreeMap {
    inner: Arc<RTreeMapInner>,
}

struct RTreeMapInner {
    name: String,
    tree: Atomic<RTree<SpatialKey>>,
    closed: AtomicBool,
    store: Weak<RTreeStoreInner>,
}

impl RTreeMap {
    pub(crate) fn new(name: &str, tree: RTree<SpatialKey>, store: Weak<RTreeStoreInner>) -> Self {
        RTreeMap {
            inner: Arc::new(RTreeMapInner {
                name: name.to_string(),
                tree: atomic(tree),
                closed: AtomicBool::new(false),
                store,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Adds a key. Keys are expected to be new; adding an existing key
    /// stores it twice. Keys that are not [`SpatialKey::is_valid`] are
    /// rejected.
    pub fn add(&self, key: SpatialKey) -> StoreResult<()> {
        self.check_opened()?;
        if !key.is_valid() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.inner.tree.write_with(|tree| tree.insert(key));
        Ok(())
    }

    /// Removes one entry equal to `key`. Returns `false` if there was none.
    pub fn remove(&self, key: &SpatialKey) -> StoreResult<bool> {
        self.check_opened()?;
        Ok(self.inner.tree.write_with(|tree| tree.remove(key).is_some()))
    }

    /// Exact-key lookup.
    pub fn contains(&self, key: &SpatialKey) -> StoreResult<bool> {
        self.check_opened()?;
        Ok(self.inner.tree.read_with(|tree| tree.contains(key)))
    }

    /// Removes every entry, keeping the map itself.
    pub fn clear(&self) -> StoreResult<()> {
        self.check_opened()?;
        self.inner.tree.write_with(|tree| *tree = RTree::new());
        Ok(())
    }

    /// Number of entries, tracked by the tree itself.
    pub fn size(&self) -> u64 {
        self.inner.tree.read_with(|tree| tree.size() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// All keys in the tree's own traversal order.
    pub fn keys(&self) -> StoreResult<KeyIterator> {
        self.check_opened()?;
        let keys = self
            .inner
            .tree
            .read_with(|tree| tree.iter().copied().collect::<Vec<_>>());
        Ok(KeyIterator::new(keys))
    }

    /// Keys whose rectangle shares at least one point with `query`,
    /// boundaries included. The query is reduced to single precision the
    /// same way keys are. A query with a NaN bound matches nothing.
    pub fn find_intersecting_keys(&self, query: &BoundingBox) -> StoreResult<KeyIterator> {
        self.check_opened()?;
        if query.has_nan() {
            return Ok(KeyIterator::empty());
        }
        let envelope = SpatialKey::search_envelope(query);
        let keys = self.inner.tree.read_with(|tree| {
            tree.locate_in_envelope_intersecting(&envelope)
                .copied()
                .collect::<Vec<_>>()
        });
        Ok(KeyIterator::new(keys))
    }

    /// Deletes the map and its data from the owning store.
    pub fn remove_map(&self) -> StoreResult<()> {
        match self.inner.store.upgrade() {
            Some(inner) => RTreeStore::from_inner(inner).remove_map(self.name()),
            None => {
                self.close();
                Ok(())
            }
        }
    }

    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> RTree<SpatialKey> {
        self.inner.tree.read_with(|tree| tree.clone())
    }

    fn check_opened(&self) -> StoreResult<()> {
        if self.is_closed() {
            Err(StoreError::Closed(self.inner.name.clone()))
        } else {
            Ok(())
        }
    }
}

/// A finite, forward-only sequence of keys produced by a map search.
///
/// The matching keys are copied out of the tree when the search runs, so
/// the iterator holds no lock but costs one `SpatialKey` (24 bytes) per
/// match. A full scan through [`RTreeMap::keys`] copies the whole map.
pub struct KeyIterator {
    keys: std::vec::IntoIter<SpatialKey>,
}

impl KeyIterator {
    pub(crate) fn new(keys: Vec<SpatialKey>) -> Self {
        KeyIterator {
            keys: keys.into_iter(),
        }
    }

    /// A sequence that yields nothing.
    pub fn empty() -> Self {
        KeyIterator::new(Vec::new())
    }
}

impl Iterator for KeyIterator {
    type Item = SpatialKey;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for KeyIterator {}
