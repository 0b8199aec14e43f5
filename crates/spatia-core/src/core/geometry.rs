//! Pure value-typed geometry: the axis-aligned bounding box used by the grid
//! sampler and the shell-cutout prefilter.

use crate::core::models::point::Point;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box over a set of 3D points.
///
/// Value-typed: created per query and discarded. Construction from an empty
/// point collection yields `None`; there is no sentinel "empty box".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl BoundingBox {
    /// Creates a box from explicit corners. The caller is responsible for
    /// supplying `min <= max` per axis.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// The smallest box enclosing all the given points, or `None` for empty
    /// input.
    pub fn around_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = first.position;
        let mut max = first.position;
        for point in iter {
            for axis in 0..3 {
                min[axis] = min[axis].min(point.position[axis]);
                max[axis] = max[axis].max(point.position[axis]);
            }
        }
        Some(Self { min, max })
    }

    /// Expands both corners outward by a uniform margin.
    pub fn with_margin(self, margin: f64) -> Self {
        Self {
            min: self.min - Vector3::repeat(margin),
            max: self.max + Vector3::repeat(margin),
        }
    }

    /// The min corner.
    pub fn min(&self) -> Point3<f64> {
        self.min
    }

    /// The max corner.
    pub fn max(&self) -> Point3<f64> {
        self.max
    }

    /// The box center.
    pub fn center(&self) -> Point3<f64> {
        self.min + (self.max - self.min) * 0.5
    }

    /// The box width along the given axis (0 = x, 1 = y, 2 = z).
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// Whether a position lies inside the box (boundary inclusive).
    pub fn contains(&self, position: &Point3<f64>) -> bool {
        (0..3).all(|axis| position[axis] >= self.min[axis] && position[axis] <= self.max[axis])
    }
}
