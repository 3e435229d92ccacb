use std::hash::Hash;

/// A 2D axis-aligned rectangle in double precision.
///
/// `BoundingBox` is what the geometry layer reports as a value's envelope
/// and what the query engine passes as a search window. It is reduced to
/// single precision only when it becomes part of a [`SpatialKey`].
///
/// [`SpatialKey`]: crate::spatial_key::SpatialKey
///
/// # Examples
///
/// ```rust
/// use spatial_tree_index::BoundingBox;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
/// assert!(bbox.intersects(&BoundingBox::point(100.0, 50.0)));
/// ```
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl Eq for BoundingBox {}

impl Hash for BoundingBox {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.min_x.to_bits().hash(state);
        self.min_y.to_bits().hash(state);
        self.max_x.to_bits().hash(state);
        self.max_y.to_bits().hash(state);
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox({}, {}, {}, {})", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a degenerate bounding box covering a single point.
    pub fn point(x: f64, y: f64) -> BoundingBox {
        BoundingBox::new(x, y, x, y)
    }

    /// Checks if this bounding box shares at least one point with another.
    /// Touching edges or corners count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns the union of this bounding box with another.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Checks if this bounding box is valid (min <= max on both axes).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Checks if any bound is NaN. Such a box intersects nothing.
    pub fn has_nan(&self) -> bool {
        self.min_x.is_nan() || self.min_y.is_nan() || self.max_x.is_nan() || self.max_y.is_nan()
    }

    /// Returns the same rectangle with each axis ordered min <= max.
    /// NaN bounds are kept as they are.
    pub fn normalized(&self) -> BoundingBox {
        let (min_x, max_x) = ordered(self.min_x, self.max_x);
        let (min_y, max_y) = ordered(self.min_y, self.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

fn ordered(low: f64, high: f64) -> (f64, f64) {
    if low > high {
        (high, low)
    } else {
        (low, high)
    }
}
