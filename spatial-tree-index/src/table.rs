//! Contracts between the spatial index and the table it belongs to.
//!
//! The index depends only on capabilities: a row can report its id and the
//! geometry in a column ([`SearchRow`]), and the table can return a full row
//! for an id ([`RowSource`]). Column metadata is plain data.

use std::fmt::{self, Display};

use crate::errors::IndexResult;
use crate::geometry::GeometryValue;
use crate::session::Session;

/// Declared SQL type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Geometry,
    Integer,
    BigInt,
    Double,
    Varchar,
    /// Any other type, by name.
    Other(String),
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Geometry => write!(f, "GEOMETRY"),
            ColumnType::Integer => write!(f, "INT"),
            ColumnType::BigInt => write!(f, "BIGINT"),
            ColumnType::Double => write!(f, "DOUBLE"),
            ColumnType::Varchar => write!(f, "VARCHAR"),
            ColumnType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A table column: its position in the row, its name and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    column_id: usize,
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn new(column_id: usize, name: &str, column_type: ColumnType) -> Self {
        Column {
            column_id,
            name: name.to_string(),
            column_type,
        }
    }

    pub fn column_id(&self) -> usize {
        self.column_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    /// Returns the column definition as it would appear in `CREATE TABLE`.
    pub fn create_sql(&self) -> String {
        format!("{} {}", self.name, self.column_type)
    }
}

/// Sort modifiers of an indexed column, as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortType(u8);

impl SortType {
    pub const ASCENDING: SortType = SortType(0);
    pub const DESCENDING: SortType = SortType(1);
    pub const NULLS_FIRST: SortType = SortType(2);
    pub const NULLS_LAST: SortType = SortType(4);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: SortType) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn with(self, other: SortType) -> SortType {
        SortType(self.0 | other.0)
    }
}

/// A column as referenced by an index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    column: Column,
    sort_type: SortType,
}

impl IndexColumn {
    /// An index column with plain ascending order and default null ordering.
    pub fn new(column: Column) -> Self {
        IndexColumn {
            column,
            sort_type: SortType::ASCENDING,
        }
    }

    pub fn with_sort_type(column: Column, sort_type: SortType) -> Self {
        IndexColumn { column, sort_type }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }
}

/// Kind of index requested by a `CREATE INDEX` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexType {
    unique: bool,
    spatial: bool,
}

impl IndexType {
    /// A (non unique) spatial index.
    pub fn spatial() -> Self {
        IndexType {
            unique: false,
            spatial: true,
        }
    }

    /// A unique index. Spatial indexes reject it.
    pub fn unique() -> Self {
        IndexType {
            unique: true,
            spatial: false,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_spatial(&self) -> bool {
        self.spatial
    }
}

/// A row as handed to the index on insert and delete.
pub trait SearchRow {
    /// Storage identifier of the row.
    fn key(&self) -> i64;

    /// The geometry held in column `column_id`.
    ///
    /// Returns `Ok(None)` for SQL `NULL` and an `InvalidDataType` error if
    /// the column holds something that is not a geometry.
    fn geometry(&self, column_id: usize) -> IndexResult<Option<&dyn GeometryValue>>;
}

/// The row storage layer of the owning table.
pub trait RowSource: Send + Sync {
    /// Full row type returned to the query engine.
    type Row;

    /// Name of the table, for messages.
    fn table_name(&self) -> &str;

    /// Fetches a full row by its storage identifier.
    fn get_row(&self, session: &Session, row_id: i64) -> IndexResult<Self::Row>;

    /// Approximate number of rows in the table.
    fn row_count_approximation(&self) -> u64;
}
