//! Geometry values as seen by the spatial index.
//!
//! The index never looks inside a geometry. All it needs is the axis-aligned
//! envelope, so geometry values are consumed through the [`GeometryValue`]
//! capability. [`Geometry`] is a lightweight implementation covering the
//! common shapes; parsing and topology belong to the geometry layer of the
//! database, not to this crate.

use crate::bounding_box::BoundingBox;

/// Anything that can report a minimum bounding rectangle.
pub trait GeometryValue: Send + Sync {
    /// Returns the envelope of this value in double precision, or `None`
    /// if the geometry is empty.
    fn envelope(&self) -> Option<BoundingBox>;
}

impl GeometryValue for BoundingBox {
    fn envelope(&self) -> Option<BoundingBox> {
        Some(*self)
    }
}

/// A 2D coordinate (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geometry value stored in a table column.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Coordinate),
    /// A sequence of connected positions.
    LineString(Vec<Coordinate>),
    /// A polygon given by its exterior ring; holes never widen the envelope.
    Polygon(Vec<Coordinate>),
    /// An axis-aligned rectangle.
    Envelope(BoundingBox),
    /// A heterogeneous collection of geometries.
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Creates a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coordinate::new(x, y))
    }

    /// Creates a line string from `(x, y)` pairs.
    pub fn line_string(points: &[(f64, f64)]) -> Self {
        Geometry::LineString(points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect())
    }

    /// Creates a polygon from the `(x, y)` pairs of its exterior ring.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        Geometry::Polygon(ring.iter().map(|&(x, y)| Coordinate::new(x, y)).collect())
    }

    /// Creates a rectangle geometry.
    pub fn envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Geometry::Envelope(BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    /// Returns `true` if the geometry has no coordinates at all.
    pub fn is_empty(&self) -> bool {
        self.envelope().is_none()
    }
}

fn coordinates_envelope(coords: &[Coordinate]) -> Option<BoundingBox> {
    coords
        .iter()
        .map(|c| BoundingBox::point(c.x, c.y))
        .reduce(|acc, b| acc.union(&b))
}

impl GeometryValue for Geometry {
    fn envelope(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point(c) => Some(BoundingBox::point(c.x, c.y)),
            Geometry::LineString(coords) | Geometry::Polygon(coords) => {
                coordinates_envelope(coords)
            }
            Geometry::Envelope(bbox) => Some(*bbox),
            Geometry::Collection(parts) => parts
                .iter()
                .filter_map(|g| g.envelope())
                .reduce(|acc, b| acc.union(&b)),
        }
    }
}
