//! Regular-grid candidate-point generation over a bounding box.
//!
//! The sampler feeds the candidate-site generation stage: it tiles a box with
//! a lattice of a fixed edge length and filters the lattice against a point
//! set's adaptive index. Two traversal orders are offered — plain row-major
//! (x fastest) and a snake path whose consecutive points are always exactly
//! one edge apart.

use crate::core::geometry::BoundingBox;
use crate::core::models::point::Point;
use crate::engine::error::EngineError;
use crate::engine::points::PointSet;
use nalgebra::Point3;
use tracing::trace;

/// IEEE 754 remainder: `x - round_ties_even(x / y) * y`.
///
/// Unlike `%` (and `rem_euclid`) the result can be negative for positive
/// operands — e.g. `ieee_remainder(8.0, 5.0) == -2.0` while `8.0 % 5.0 ==
/// 3.0`. The grid origin relies on this convention; substituting a plain
/// modulo would shift grid alignment for some box placements.
fn ieee_remainder(dividend: f64, divisor: f64) -> f64 {
    dividend - (dividend / divisor).round_ties_even() * divisor
}

/// Origin shift along one axis: centers the fractional leftover of the box
/// extent as a margin instead of leaving it all on one side.
fn grid_shift(min: f64, max: f64, edge: f64) -> f64 {
    min + ieee_remainder(max - min, edge)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TraversalOrder {
    RowMajor,
    Snake,
}

/// Deterministic regular-grid point generator over a bounding box.
///
/// Defined by an origin, a cell edge length, and per-axis point counts;
/// conceptually a lattice of `nx * ny * nz` points. Value-typed: build one
/// per query and discard it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSampler {
    edge: f64,
    origin: Point3<f64>,
    nx: usize,
    ny: usize,
    nz: usize,
}

impl GridSampler {
    /// Lays a grid of the given edge length over a box.
    ///
    /// The origin is shifted by the IEEE remainder of each extent (see
    /// [`ieee_remainder`]); the per-axis counts are `floor(extent / edge)`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NonPositiveEdge`] if `edge <= 0`.
    pub fn over_box(bounds: &BoundingBox, edge: f64) -> Result<Self, EngineError> {
        if !(edge > 0.0) {
            return Err(EngineError::NonPositiveEdge(edge));
        }
        let origin = Point3::new(
            grid_shift(bounds.min().x, bounds.max().x, edge),
            grid_shift(bounds.min().y, bounds.max().y, edge),
            grid_shift(bounds.min().z, bounds.max().z, edge),
        );
        Ok(Self {
            edge,
            origin,
            nx: (bounds.extent(0) / edge) as usize,
            ny: (bounds.extent(1) / edge) as usize,
            nz: (bounds.extent(2) / edge) as usize,
        })
    }

    /// Total number of lattice points, `nx * ny * nz`.
    pub fn count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// The lattice origin.
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// The cell edge length.
    pub fn edge(&self) -> f64 {
        self.edge
    }

    /// Per-axis point counts `(nx, ny, nz)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// A fresh row-major traversal: `x` fastest, then `y`, then `z`. Each
    /// call starts an independent traversal.
    pub fn cursor(&self) -> GridCursor<'_> {
        GridCursor::new(self, TraversalOrder::RowMajor)
    }

    /// A fresh snake-path traversal: the `x` direction flips whenever it
    /// would overflow, then the `y` direction, then `z` advances — so every
    /// consecutive pair of yielded points is separated by exactly one edge
    /// length. Same point set as [`cursor`](GridSampler::cursor), different
    /// order.
    pub fn snake_cursor(&self) -> GridCursor<'_> {
        GridCursor::new(self, TraversalOrder::Snake)
    }

    /// Convenience copying iterator over a row-major traversal.
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            cursor: self.cursor(),
        }
    }

    /// Samples candidate grid points around a point set: the set's bounding
    /// box is expanded by `radius`, tiled with `edge`, and every lattice
    /// point within `radius` of the set (via its adaptive index) is kept as
    /// a fresh copy.
    ///
    /// An empty input yields an empty result.
    ///
    /// # Errors
    ///
    /// [`EngineError::NonPositiveEdge`] if `edge <= 0`,
    /// [`EngineError::NegativeRadius`] if `radius < 0`.
    pub fn sample_around_points(
        points: &mut PointSet,
        edge: f64,
        radius: f64,
    ) -> Result<PointSet, EngineError> {
        if !(edge > 0.0) {
            return Err(EngineError::NonPositiveEdge(edge));
        }
        if radius < 0.0 {
            return Err(EngineError::NegativeRadius(radius));
        }
        points.with_adaptive_spatial_index();
        let Some(bounds) = BoundingBox::around_points(points.iter()) else {
            return Ok(PointSet::new());
        };
        let grid = Self::over_box(&bounds.with_margin(radius), edge)?;
        trace!(lattice = grid.count(), "sampling candidate grid points");

        let radius_sqr = radius * radius;
        let mut result = PointSet::with_capacity(grid.count() / 2);
        let mut cursor = grid.cursor();
        while let Some(position) = cursor.next_point() {
            if points.nearest_squared_distance(position) <= radius_sqr {
                // Copy the flyweight before the next step overwrites it.
                result.push(Point::at(*position));
            }
        }
        Ok(result)
    }
}

/// Streaming traversal over the lattice of a [`GridSampler`].
///
/// `next_point` yields a reference to a single internal buffer that is
/// overwritten on every step — the flyweight contract. The borrow ends
/// before the next call, so the compiler enforces "copy before advancing";
/// no per-step heap allocation takes place. Cursors are independent: taking
/// a new one restarts the traversal without touching others.
#[derive(Debug, Clone)]
pub struct GridCursor<'a> {
    grid: &'a GridSampler,
    order: TraversalOrder,
    remaining: usize,
    x: isize,
    y: isize,
    z: isize,
    x_step: isize,
    y_step: isize,
    buffer: Point3<f64>,
}

impl<'a> GridCursor<'a> {
    fn new(grid: &'a GridSampler, order: TraversalOrder) -> Self {
        Self {
            grid,
            order,
            remaining: grid.count(),
            x: 0,
            y: 0,
            z: 0,
            x_step: 1,
            y_step: 1,
            buffer: Point3::origin(),
        }
    }

    /// The next lattice point, or `None` once `count()` points have been
    /// yielded. The returned reference aliases the cursor's internal buffer.
    pub fn next_point(&mut self) -> Option<&Point3<f64>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.buffer = Point3::new(
            self.grid.origin.x + self.x as f64 * self.grid.edge,
            self.grid.origin.y + self.y as f64 * self.grid.edge,
            self.grid.origin.z + self.z as f64 * self.grid.edge,
        );
        self.advance();
        Some(&self.buffer)
    }

    fn advance(&mut self) {
        let nx = self.grid.nx as isize;
        let ny = self.grid.ny as isize;
        match self.order {
            TraversalOrder::RowMajor => {
                self.x += 1;
                if self.x >= nx {
                    self.x = 0;
                    self.y += 1;
                    if self.y >= ny {
                        self.y = 0;
                        self.z += 1;
                    }
                }
            }
            TraversalOrder::Snake => {
                self.x += self.x_step;
                if self.x >= nx || self.x < 0 {
                    // Turn around and step back onto the lattice.
                    self.x_step = -self.x_step;
                    self.x += self.x_step;

                    self.y += self.y_step;
                    if self.y >= ny || self.y < 0 {
                        self.y_step = -self.y_step;
                        self.y += self.y_step;
                        self.z += 1;
                    }
                }
            }
        }
    }
}

/// Copying iterator adapter over a [`GridCursor`].
#[derive(Debug, Clone)]
pub struct GridPoints<'a> {
    cursor: GridCursor<'a>,
}

impl Iterator for GridPoints<'_> {
    type Item = Point3<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_point().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl ExactSizeIterator for GridPoints<'_> {}
