//! The bounding key stored in the range-tree map for every indexed row.

use std::hash::{Hash, Hasher};

use rstar::{RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;

/// Largest magnitude a key bound can have. Half the `f32` range, so the
/// tree's center and distance arithmetic on keys never overflows to infinity.
pub const MAX_COORDINATE: f32 = f32::MAX / 2.0;

/// One indexed row's spatial footprint.
///
/// The rectangle is kept in single precision: keys stay small and tree
/// comparisons stay cheap, and exact geometry tests are the caller's job.
/// `row_id` breaks ties between rows with identical rectangles, so two keys
/// are equal only if both the id and all four bounds are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpatialKey {
    row_id: i64,
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

impl SpatialKey {
    /// Creates a key from already reduced bounds.
    pub fn new(row_id: i64, min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        SpatialKey {
            row_id,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Encodes a row id and a double precision envelope into a key.
    ///
    /// Each axis is ordered min <= max, then the bounds are clamped to
    /// [`MAX_COORDINATE`] and rounded to the nearest `f32`. Both steps are
    /// monotonic, so two envelopes that touch or overlap still do after
    /// encoding. NaN bounds stay NaN; see [`is_valid`](Self::is_valid).
    pub fn from_envelope(row_id: i64, envelope: &BoundingBox) -> Self {
        let envelope = envelope.normalized();
        SpatialKey::new(
            row_id,
            reduce(envelope.min_x),
            reduce(envelope.max_x),
            reduce(envelope.min_y),
            reduce(envelope.max_y),
        )
    }

    pub fn row_id(&self) -> i64 {
        self.row_id
    }

    pub fn min_x(&self) -> f32 {
        self.min_x
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn min_y(&self) -> f32 {
        self.min_y
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Decodes the rectangle part of the key back into double precision.
    pub fn to_envelope(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_x as f64,
            self.min_y as f64,
            self.max_x as f64,
            self.max_y as f64,
        )
    }

    /// Returns the search envelope used by the tree for a query rectangle,
    /// reduced the same way stored keys are.
    pub(crate) fn search_envelope(envelope: &BoundingBox) -> AABB<[f32; 2]> {
        SpatialKey::from_envelope(0, envelope).envelope()
    }

    /// `false` if any bound is NaN or beyond [`MAX_COORDINATE`], or an axis
    /// is reversed. The tree only accepts valid keys.
    pub fn is_valid(&self) -> bool {
        -MAX_COORDINATE <= self.min_x
            && self.min_x <= self.max_x
            && self.max_x <= MAX_COORDINATE
            && -MAX_COORDINATE <= self.min_y
            && self.min_y <= self.max_y
            && self.max_y <= MAX_COORDINATE
    }

    /// Checks if the key rectangle shares at least one point with `other`.
    pub fn intersects(&self, other: &SpatialKey) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    fn same_bits(&self, other: &SpatialKey) -> bool {
        self.min_x.to_bits() == other.min_x.to_bits()
            && self.max_x.to_bits() == other.max_x.to_bits()
            && self.min_y.to_bits() == other.min_y.to_bits()
            && self.max_y.to_bits() == other.max_y.to_bits()
    }
}

fn reduce(value: f64) -> f32 {
    let limit = MAX_COORDINATE as f64;
    value.clamp(-limit, limit) as f32
}

impl PartialEq for SpatialKey {
    fn eq(&self, other: &Self) -> bool {
        self.row_id == other.row_id && self.same_bits(other)
    }
}

impl Eq for SpatialKey {}

impl Hash for SpatialKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.row_id.hash(state);
        self.min_x.to_bits().hash(state);
        self.max_x.to_bits().hash(state);
        self.min_y.to_bits().hash(state);
        self.max_y.to_bits().hash(state);
    }
}

impl RTreeObject for SpatialKey {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl std::fmt::Display for SpatialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: ({}/{}, {}/{})",
            self.row_id, self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}
