//! The spatial tree index: keeps one bounding key per row of a table in a
//! range-tree map and answers rectangle intersection searches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::binding::StoreBinding;
use crate::bounding_box::BoundingBox;
use crate::condition::{IndexCondition, SortOrder};
use crate::cursor::SpatialCursor;
use crate::errors::{ErrorKind, IndexError, IndexResult};
use crate::geometry::GeometryValue;
use crate::session::Session;
use crate::spatial_key::SpatialKey;
use crate::store::KeyIterator;
use crate::table::{ColumnType, IndexColumn, IndexType, RowSource, SearchRow, SortType};

/// What a `CREATE SPATIAL INDEX` statement, or the stored metadata of an
/// existing index, asks for.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    id: i32,
    name: String,
    columns: Vec<IndexColumn>,
    index_type: IndexType,
    persistent: bool,
    create: bool,
}

impl IndexDefinition {
    /// A transient spatial index that is being created.
    pub fn new(id: i32, name: &str, columns: Vec<IndexColumn>) -> Self {
        IndexDefinition {
            id,
            name: name.to_string(),
            columns,
            index_type: IndexType::spatial(),
            persistent: false,
            create: true,
        }
    }

    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// `false` when the index is being reopened from existing metadata.
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_create(&self) -> bool {
        self.create
    }
}

/// A spatial index over the single geometry column of a table.
///
/// Every indexed row is stored as a [`SpatialKey`]: its row id and the
/// single precision bounding rectangle of its geometry. Rows whose geometry
/// is `NULL` or empty are not indexed.
///
/// A persistent index keeps its keys in the database's shared store, in a
/// map named after the index id. A transient index opens a private
/// in-memory store that is thrown away on [`close`](SpatialTreeIndex::close).
///
/// Mutations are not synchronized here beyond what the store does; the
/// session layer runs at most one writer per row at a time and never closes
/// or drops an index while it is in use.
pub struct SpatialTreeIndex<S: RowSource> {
    id: i32,
    name: String,
    table: Arc<S>,
    index_column: IndexColumn,
    index_type: IndexType,
    persistent: bool,
    needs_rebuild: AtomicBool,
    closed: AtomicBool,
    cost_row_offset: u64,
    binding: StoreBinding,
}

impl<S: RowSource> SpatialTreeIndex<S> {
    /// Validates `definition` and opens the index's map.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the definition is not a usable
    /// spatial index, and a storage error if the store cannot be opened.
    pub fn new(table: Arc<S>, definition: &IndexDefinition, session: &Session) -> IndexResult<Self> {
        let index_column = validate_definition(definition, session)?;
        let database = session.database();

        let binding = if definition.is_persistent() {
            if definition.id() < 0 {
                log::error!("Persistent spatial index {} has id {}", definition.name(), definition.id());
                return Err(IndexError::new(
                    "Persistent index with id<0",
                    ErrorKind::InvalidIndexId,
                ));
            }
            let store = database.spatial_store()?;
            if !definition.is_create() && !StoreBinding::has_persistent_storage(&store, definition.id()) {
                log::error!("No stored data for spatial index {}", definition.name());
                return Err(IndexError::new(
                    &format!(
                        "Spatial index {} with id {} not found",
                        definition.name(),
                        definition.id()
                    ),
                    ErrorKind::IndexNotFound,
                ));
            }
            StoreBinding::open_persistent(store, definition.id())?
        } else {
            StoreBinding::open_transient()?
        };

        log::debug!(
            "Opened spatial index {} on {}.{} ({:?}, map {})",
            definition.name(),
            table.table_name(),
            index_column.column().name(),
            binding.mode(),
            binding.map_name()
        );

        Ok(SpatialTreeIndex {
            id: definition.id(),
            name: definition.name().to_string(),
            table,
            index_column,
            index_type: definition.index_type(),
            persistent: definition.is_persistent(),
            needs_rebuild: AtomicBool::new(definition.is_create()),
            closed: AtomicBool::new(false),
            cost_row_offset: database.config().cost_row_offset(),
            binding,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Arc<S> {
        &self.table
    }

    pub fn index_column(&self) -> &IndexColumn {
        &self.index_column
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Name of the map holding this index's keys.
    pub fn map_name(&self) -> &str {
        self.binding.map_name()
    }

    /// `true` until the index has been filled from its table.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild.load(Ordering::Relaxed)
    }

    /// Indexes `row`.
    pub fn add<R: SearchRow + ?Sized>(&self, _session: &Session, row: &R) -> IndexResult<()> {
        self.check_opened()?;
        if let Some(key) = self.bounding_key(row)? {
            log::trace!("Adding spatial key {} to {}", key, self.name);
            self.binding.add(key)?;
        }
        Ok(())
    }

    /// Removes `row`, which must carry the same geometry it was added with.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the row's key is not in the index.
    pub fn remove<R: SearchRow + ?Sized>(&self, _session: &Session, row: &R) -> IndexResult<()> {
        self.check_opened()?;
        if let Some(key) = self.bounding_key(row)? {
            log::trace!("Removing spatial key {} from {}", key, self.name);
            if !self.binding.remove(&key)? {
                return Err(IndexError::internal("row not found"));
            }
        }
        Ok(())
    }

    /// Every indexed row, in the map's own order.
    pub fn find(&self, session: &Session) -> IndexResult<SpatialCursor<S>> {
        self.check_opened()?;
        let keys = self.binding.keys()?;
        Ok(self.cursor(keys, session))
    }

    /// Spatial keys have no total order, so range bounds are ignored.
    pub fn find_range(
        &self,
        session: &Session,
        _first: Option<&dyn SearchRow>,
        _last: Option<&dyn SearchRow>,
    ) -> IndexResult<SpatialCursor<S>> {
        self.find(session)
    }

    /// Rows whose bounding rectangle shares at least one point with
    /// `intersection`, or every row if there is no rectangle. A rectangle
    /// with a NaN bound matches nothing.
    pub fn find_by_intersection(
        &self,
        session: &Session,
        intersection: Option<&BoundingBox>,
    ) -> IndexResult<SpatialCursor<S>> {
        self.check_opened()?;
        match intersection {
            None => self.find(session),
            Some(rect) => {
                let keys = self.binding.find_intersecting(rect)?;
                Ok(self.cursor(keys, session))
            }
        }
    }

    /// Like [`find_by_intersection`](Self::find_by_intersection), with the
    /// rectangle taken from a geometry's envelope. An empty geometry matches
    /// nothing.
    pub fn find_by_geometry(
        &self,
        session: &Session,
        geometry: Option<&dyn GeometryValue>,
    ) -> IndexResult<SpatialCursor<S>> {
        self.check_opened()?;
        match geometry {
            None => self.find(session),
            Some(geometry) => match geometry.envelope() {
                Some(rect) => self.find_by_intersection(session, Some(&rect)),
                None => Ok(self.cursor(KeyIterator::empty(), session)),
            },
        }
    }

    /// Estimated cost of answering a query with this index.
    ///
    /// `masks` is indexed by column id. The fixed row offset keeps a table
    /// scan cheaper on tiny tables.
    pub fn estimate_cost(
        &self,
        masks: Option<&[u32]>,
        row_count: u64,
        _sort_order: Option<&SortOrder>,
    ) -> u64 {
        let rows = row_count.saturating_add(self.cost_row_offset);
        let masks = match masks {
            Some(masks) => masks,
            None => return rows,
        };

        let column_id = self.index_column.column().column_id();
        match masks.get(column_id) {
            Some(mask) if IndexCondition::is_overlap(*mask) => 3 + rows / 4,
            _ => rows,
        }
    }

    /// [`estimate_cost`](Self::estimate_cost) with the table's approximate
    /// row count.
    pub fn cost(&self, _session: &Session, masks: Option<&[u32]>, sort_order: Option<&SortOrder>) -> f64 {
        self.estimate_cost(masks, self.table.row_count_approximation(), sort_order) as f64
    }

    pub fn can_get_first_or_last(&self) -> bool {
        true
    }

    /// Only ascending retrieval is possible; `first == false` is an internal
    /// error.
    pub fn find_first_or_last(&self, session: &Session, first: bool) -> IndexResult<SpatialCursor<S>> {
        self.check_opened()?;
        if !first {
            return Err(IndexError::internal(
                "Spatial Index can only be fetch by ascending order",
            ));
        }
        self.find(session)
    }

    /// Persistent: writes the shared store. Transient: discards the private
    /// store. Closing again does nothing.
    pub fn close(&self, _session: &Session) -> IndexResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.binding.close()?;
        log::debug!("Closed spatial index {}", self.name);
        Ok(())
    }

    /// Permanently deletes the index's data.
    pub fn drop_index(&self, _session: &Session) -> IndexResult<()> {
        self.binding.drop_map()
    }

    /// Removes every key; the index stays usable.
    pub fn truncate(&self, _session: &Session) -> IndexResult<()> {
        self.check_opened()?;
        self.binding.clear()?;
        log::debug!("Truncated spatial index {}", self.name);
        Ok(())
    }

    /// Refills the index from `rows` and clears the rebuild flag.
    pub fn rebuild<'a, R, I>(&self, session: &Session, rows: I) -> IndexResult<()>
    where
        R: SearchRow + ?Sized + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        self.check_opened()?;
        self.binding.clear()?;
        for row in rows {
            self.add(session, row)?;
        }
        self.needs_rebuild.store(false, Ordering::Relaxed);
        log::debug!(
            "Rebuilt spatial index {} with {} keys",
            self.name,
            self.binding.size()
        );
        Ok(())
    }

    pub fn row_count(&self, _session: &Session) -> u64 {
        self.binding.size()
    }

    pub fn row_count_approximation(&self) -> u64 {
        self.binding.size()
    }

    /// Not tracked; always 0.
    pub fn disk_space_used(&self) -> u64 {
        0
    }

    /// Map names depend on the id only, so renaming needs no work.
    pub fn check_rename(&self) -> IndexResult<()> {
        Ok(())
    }

    fn bounding_key<R: SearchRow + ?Sized>(&self, row: &R) -> IndexResult<Option<SpatialKey>> {
        let column_id = self.index_column.column().column_id();
        let envelope = match row.geometry(column_id)?.and_then(|geometry| geometry.envelope()) {
            Some(envelope) => envelope,
            None => return Ok(None),
        };
        if envelope.has_nan() {
            log::error!("Row {} of {} has a NaN envelope {}", row.key(), self.name, envelope);
            return Err(IndexError::new(
                &format!("geometry envelope with NaN coordinate, {}", envelope),
                ErrorKind::InvalidDataType,
            ));
        }
        Ok(Some(SpatialKey::from_envelope(row.key(), &envelope)))
    }

    fn cursor(&self, keys: KeyIterator, session: &Session) -> SpatialCursor<S> {
        SpatialCursor::new(keys, self.table.clone(), session)
    }

    fn check_opened(&self) -> IndexResult<()> {
        if self.is_closed() {
            return Err(IndexError::internal(&format!(
                "Spatial index {} is closed",
                self.name
            )));
        }
        Ok(())
    }
}

impl<S: RowSource> std::fmt::Debug for SpatialTreeIndex<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialTreeIndex")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("table", &self.table.table_name())
            .field("column", &self.index_column.column().name())
            .field("mode", &self.binding.mode())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_definition(definition: &IndexDefinition, session: &Session) -> IndexResult<IndexColumn> {
    if definition.index_type().is_unique() {
        return Err(unsupported("not unique"));
    }
    // a private store starts empty and nothing would ever fill it
    if !definition.is_persistent() && !definition.is_create() {
        return Err(unsupported("Non persistent index called with create==false"));
    }
    let index_column = match definition.columns() {
        [column] => column.clone(),
        _ => return Err(unsupported("can only do one column")),
    };

    let sort_type = index_column.sort_type();
    if sort_type.contains(SortType::DESCENDING) {
        return Err(unsupported("cannot do descending"));
    }
    if sort_type.contains(SortType::NULLS_FIRST) {
        return Err(unsupported("cannot do nulls first"));
    }
    if sort_type.contains(SortType::NULLS_LAST) {
        return Err(unsupported("cannot do nulls last"));
    }

    // column metadata may not be migrated yet while the database starts up
    let column = index_column.column();
    if !session.database().is_starting() && column.column_type() != &ColumnType::Geometry {
        log::error!(
            "Spatial index {} requested on column {}",
            definition.name(),
            column.create_sql()
        );
        return Err(IndexError::new(
            &format!("spatial index on non-geometry column, {}", column.create_sql()),
            ErrorKind::InvalidColumnType,
        ));
    }

    Ok(index_column)
}

fn unsupported(message: &str) -> IndexError {
    log::error!("Unsupported spatial index definition: {}", message);
    IndexError::new(message, ErrorKind::UnsupportedIndex)
}
