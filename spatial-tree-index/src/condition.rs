//! Predicate masks and sort orders the query optimizer passes to the cost
//! model.

/// Bits describing which kinds of conditions a query has on a column.
///
/// A `masks` slice handed to the cost model is indexed by column id.
pub struct IndexCondition;

impl IndexCondition {
    /// `column = value`
    pub const EQUALITY: u32 = 1;
    /// `column >= value`
    pub const START: u32 = 2;
    /// `column <= value`
    pub const END: u32 = 4;
    /// `column BETWEEN a AND b`
    pub const RANGE: u32 = Self::START | Self::END;
    /// The condition can never be true.
    pub const ALWAYS_FALSE: u32 = 8;
    /// `column && rectangle`: bounding box overlap.
    pub const OVERLAP: u32 = 16;

    /// Returns `true` if `mask` requests a bounding box overlap test.
    pub fn is_overlap(mask: u32) -> bool {
        mask & Self::OVERLAP == Self::OVERLAP
    }
}

/// Requested output order of a query, by column id.
///
/// Spatial indexes cannot produce any particular order, so the cost model
/// accepts this only to match the optimizer's call shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    column_ids: Vec<usize>,
    descending: Vec<bool>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, column_id: usize, descending: bool) -> Self {
        self.column_ids.push(column_id);
        self.descending.push(descending);
        self
    }

    pub fn column_ids(&self) -> &[usize] {
        &self.column_ids
    }

    pub fn is_descending(&self, position: usize) -> bool {
        self.descending.get(position).copied().unwrap_or(false)
    }
}
