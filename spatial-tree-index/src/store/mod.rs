//! Range-tree storage: named R-tree maps of [`SpatialKey`](crate::spatial_key::SpatialKey)s
//! grouped in a store that is either in memory or backed by a single file.

mod config;
mod error;
mod persistence;
mod rtree_map;
mod rtree_store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use persistence::{MAGIC, VERSION};
pub use rtree_map::{KeyIterator, RTreeMap};
pub use rtree_store::RTreeStore;
