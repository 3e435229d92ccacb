use std::sync::Arc;

use crate::errors::{IndexError, IndexResult};
use crate::session::Session;
use crate::spatial_key::SpatialKey;
use crate::store::KeyIterator;
use crate::table::RowSource;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CursorState {
    BeforeFirst,
    Positioned(SpatialKey),
    Exhausted,
}

/// Forward-only cursor over the keys of a spatial search.
///
/// Keys are pulled one at a time and turned into full rows only when asked
/// for. The keys are the ones the store returned when the search started;
/// rows are read from the table at the time [`current_row`] is called.
///
/// [`current_row`]: SpatialCursor::current_row
pub struct SpatialCursor<S: RowSource> {
    keys: KeyIterator,
    state: CursorState,
    table: Arc<S>,
    session: Session,
}

impl<S: RowSource> SpatialCursor<S> {
    pub(crate) fn new(keys: KeyIterator, table: Arc<S>, session: &Session) -> Self {
        SpatialCursor {
            keys,
            state: CursorState::BeforeFirst,
            table,
            session: session.clone(),
        }
    }

    /// Moves to the next key. Returns `false` once no keys remain.
    pub fn advance(&mut self) -> bool {
        if self.state == CursorState::Exhausted {
            return false;
        }
        match self.keys.next() {
            Some(key) => {
                self.state = CursorState::Positioned(key);
                true
            }
            None => {
                self.state = CursorState::Exhausted;
                false
            }
        }
    }

    /// Reverse traversal is not supported; never moves.
    pub fn previous(&mut self) -> bool {
        false
    }

    /// The key the cursor is positioned on, if any.
    pub fn current_key(&self) -> Option<&SpatialKey> {
        match &self.state {
            CursorState::Positioned(key) => Some(key),
            _ => None,
        }
    }

    /// Fetches the full row for the current key from the table.
    pub fn current_row(&self) -> IndexResult<S::Row> {
        match &self.state {
            CursorState::Positioned(key) => self.table.get_row(&self.session, key.row_id()),
            CursorState::BeforeFirst => Err(IndexError::internal(
                "cursor is not positioned, call advance first",
            )),
            CursorState::Exhausted => Err(IndexError::internal("cursor is exhausted")),
        }
    }

    /// Same as [`current_row`](SpatialCursor::current_row); the row the
    /// query engine searches with.
    pub fn current_search_row(&self) -> IndexResult<S::Row> {
        self.current_row()
    }

    /// Number of keys not yet visited.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl<S: RowSource> Iterator for SpatialCursor<S> {
    type Item = IndexResult<S::Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            Some(self.current_row())
        } else {
            None
        }
    }
}
