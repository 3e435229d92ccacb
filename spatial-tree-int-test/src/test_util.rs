use parking_lot::RwLock;
use spatial_tree_index::{
    Column, ColumnType, Database, DatabaseConfig, ErrorKind, Geometry, GeometryValue, IndexColumn,
    IndexDefinition, IndexError, IndexResult, RowSource, SearchRow, Session, SpatialTreeIndex,
};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::{env, fs};

/// Column id of the geometry column of a [`GeoTable`].
pub const GEOMETRY_COLUMN: usize = 1;

/// Runs `test` between `before` and `after`, running `after` even when the
/// test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> IndexResult<()>,
    B: Fn() -> IndexResult<TestContext>,
    A: Fn(TestContext) -> IndexResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_ctx = ctx.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(move || test(test_ctx)));
    let after_result = after(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic) => std::panic::resume_unwind(panic),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A row of a [`GeoTable`]: an id, a name and an optional shape.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRow {
    pub id: i64,
    pub name: String,
    pub shape: Option<Geometry>,
}

impl SearchRow for GeoRow {
    fn key(&self) -> i64 {
        self.id
    }

    fn geometry(&self, column_id: usize) -> IndexResult<Option<&dyn GeometryValue>> {
        if column_id != GEOMETRY_COLUMN {
            return Err(IndexError::new(
                &format!("column {} is not a geometry", column_id),
                ErrorKind::InvalidDataType,
            ));
        }
        Ok(self.shape.as_ref().map(|shape| shape as &dyn GeometryValue))
    }
}

/// An in-memory table `(ID, NAME VARCHAR, SHAPE GEOMETRY)`.
pub struct GeoTable {
    name: String,
    rows: RwLock<BTreeMap<i64, GeoRow>>,
    next_id: AtomicI64,
}

impl GeoTable {
    pub fn new(name: &str) -> Self {
        GeoTable {
            name: name.to_string(),
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn insert(&self, name: &str, shape: Option<Geometry>) -> GeoRow {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let row = GeoRow {
            id,
            name: name.to_string(),
            shape,
        };
        self.rows.write().insert(id, row.clone());
        row
    }

    pub fn delete(&self, id: i64) -> Option<GeoRow> {
        self.rows.write().remove(&id)
    }

    pub fn rows(&self) -> Vec<GeoRow> {
        self.rows.read().values().cloned().collect()
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    pub fn geometry_column() -> IndexColumn {
        IndexColumn::new(Column::new(GEOMETRY_COLUMN, "SHAPE", ColumnType::Geometry))
    }

    pub fn name_column() -> IndexColumn {
        IndexColumn::new(Column::new(0, "NAME", ColumnType::Varchar))
    }
}

impl RowSource for GeoTable {
    type Row = GeoRow;

    fn table_name(&self) -> &str {
        &self.name
    }

    fn get_row(&self, _session: &Session, row_id: i64) -> IndexResult<GeoRow> {
        self.rows.read().get(&row_id).cloned().ok_or_else(|| {
            IndexError::new(
                &format!("row {} not found in {}", row_id, self.name),
                ErrorKind::RowNotFound,
            )
        })
    }

    fn row_count_approximation(&self) -> u64 {
        self.rows.read().len() as u64
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: Option<PathBuf>,
    db: Database,
    table: Arc<GeoTable>,
}

impl TestContext {
    pub fn new(path: Option<PathBuf>, db: Database, table: Arc<GeoTable>) -> Self {
        Self { path, db, table }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }

    pub fn table(&self) -> Arc<GeoTable> {
        self.table.clone()
    }

    pub fn session(&self) -> Session {
        self.db.create_session()
    }

    /// Opens a spatial index on the table's geometry column.
    pub fn open_index(&self, definition: &IndexDefinition) -> IndexResult<SpatialTreeIndex<GeoTable>> {
        SpatialTreeIndex::new(self.table(), definition, &self.session())
    }

    /// Closes the database and opens it again from the same directory,
    /// keeping the table.
    pub fn reopen(&self) -> IndexResult<TestContext> {
        self.db.close()?;
        let config = DatabaseConfig::new();
        if let Some(path) = &self.path {
            config.set_db_path(path)?;
        }
        Ok(TestContext::new(
            self.path.clone(),
            Database::open(config),
            self.table(),
        ))
    }
}

/// Definition of index `id` on the geometry column.
pub fn spatial_index(id: i32, persistent: bool) -> IndexDefinition {
    IndexDefinition::new(id, &format!("IDX_SHAPE_{}", id), vec![GeoTable::geometry_column()])
        .with_persistent(persistent)
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(id.to_string())
}

/// A database stored in a fresh temporary directory.
pub fn create_test_context() -> IndexResult<TestContext> {
    let path = random_path();
    if path.exists() {
        let _ = fs::remove_dir_all(&path);
    }

    let config = DatabaseConfig::new();
    config.set_db_path(&path)?;
    Ok(TestContext::new(
        Some(path),
        Database::open(config),
        Arc::new(GeoTable::new("SHAPES")),
    ))
}

/// A database whose shared store lives in memory.
pub fn create_memory_test_context() -> IndexResult<TestContext> {
    Ok(TestContext::new(
        None,
        Database::in_memory(),
        Arc::new(GeoTable::new("SHAPES")),
    ))
}

pub fn cleanup(ctx: TestContext) -> IndexResult<()> {
    if let Err(e) = ctx.db().close() {
        eprintln!("Warning: Failed to close database: {:?}", e);
    }

    if let Some(path) = ctx.path() {
        if path.exists() {
            if let Err(e) = fs::remove_dir_all(path) {
                eprintln!("Warning: Failed to remove test directory {:?}: {:?}", path, e);
            }
        }
    }
    Ok(())
}
