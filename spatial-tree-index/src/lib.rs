//! # Spatial Tree Index - R-Tree Secondary Index for Geometry Columns
//!
//! This crate provides a spatial secondary index for a relational table. It
//! keeps the bounding rectangle of each row's geometry in an R-tree map and
//! finds the rows whose rectangle intersects a query rectangle without
//! scanning the table.
//!
//! ## Features
//!
//! - **Compact Keys**: row id plus a single precision bounding rectangle
//! - **Persistent or Transient**: shared durable store per database, or a
//!   private in-memory store per index
//! - **Cost Model**: cost estimates for the query optimizer
//! - **Lazy Cursors**: rows are fetched from the table only when read
//! - **Checksummed Store File**: atomic, CRC-checked writes
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use spatial_tree_index::{
//!     BoundingBox, Column, ColumnType, Database, Geometry, GeometryValue, IndexColumn,
//!     IndexDefinition, IndexError, IndexResult, RowSource, SearchRow, Session,
//!     SpatialTreeIndex,
//! };
//!
//! struct Place {
//!     id: i64,
//!     shape: Geometry,
//! }
//!
//! impl SearchRow for Place {
//!     fn key(&self) -> i64 {
//!         self.id
//!     }
//!
//!     fn geometry(&self, _column_id: usize) -> IndexResult<Option<&dyn GeometryValue>> {
//!         Ok(Some(&self.shape))
//!     }
//! }
//!
//! struct Places;
//!
//! impl RowSource for Places {
//!     type Row = i64;
//!
//!     fn table_name(&self) -> &str {
//!         "PLACES"
//!     }
//!
//!     fn get_row(&self, _session: &Session, row_id: i64) -> IndexResult<i64> {
//!         Ok(row_id)
//!     }
//!
//!     fn row_count_approximation(&self) -> u64 {
//!         1
//!     }
//! }
//!
//! # fn main() -> Result<(), IndexError> {
//! let session = Database::in_memory().create_session();
//! let column = IndexColumn::new(Column::new(0, "SHAPE", ColumnType::Geometry));
//! let definition = IndexDefinition::new(1, "IDX_PLACES", vec![column]);
//! let index = SpatialTreeIndex::new(Arc::new(Places), &definition, &session)?;
//!
//! index.add(&session, &Place { id: 1, shape: Geometry::point(3.0, 4.0) })?;
//!
//! let query = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
//! let rows = index
//!     .find_by_intersection(&session, Some(&query))?
//!     .collect::<IndexResult<Vec<_>>>()?;
//! assert_eq!(rows, vec![1]);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod bounding_box;
pub mod condition;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod geometry;
pub mod index;
pub mod session;
pub mod spatial_key;
pub mod store;
pub mod table;
pub mod util;

pub use binding::{StorageMode, StoreBinding};
pub use bounding_box::BoundingBox;
pub use condition::{IndexCondition, SortOrder};
pub use config::DatabaseConfig;
pub use cursor::SpatialCursor;
pub use errors::{ErrorKind, IndexError, IndexResult};
pub use geometry::{Coordinate, Geometry, GeometryValue};
pub use index::{IndexDefinition, SpatialTreeIndex};
pub use session::{Database, Session};
pub use spatial_key::SpatialKey;
pub use store::{KeyIterator, RTreeMap, RTreeStore, StoreConfig, StoreError};
pub use table::{Column, ColumnType, IndexColumn, IndexType, RowSource, SearchRow, SortType};
