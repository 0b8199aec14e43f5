//! Exact k-d tree over 3D points.
//!
//! Nodes live in an arena (`Vec`) and reference each other through integer
//! indices, so the tree needs no interior pointers and clones cheaply.
//! Construction partitions around the median along a splitting axis that
//! cycles with depth. Single points can be inserted incrementally as leaves
//! with no rebalancing: long insertion sequences may degrade toward linear
//! depth, which the owning collection mitigates by rebuilding when its
//! count diverges from the tree's (see
//! [`PointSet::with_adaptive_spatial_index`](crate::engine::points::PointSet::with_adaptive_spatial_index)).

use crate::core::models::point::Point;
use nalgebra::Point3;
use std::cmp::Ordering;

const DIMENSIONS: usize = 3;

type NodeIndex = usize;

#[derive(Debug, Clone)]
struct Node {
    point: Point,
    axis: usize,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
}

/// Arena-backed exact k-d tree. All queries are exact; there is no
/// approximation and no pruning tolerance.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<NodeIndex>,
}

impl KdTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from the given points by recursive median partitioning.
    ///
    /// The splitting axis cycles x, y, z with depth. Expected O(n log n).
    pub fn build(points: &[Point]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        let mut scratch = points.to_vec();
        tree.root = tree.build_recursive(&mut scratch, 0);
        tree
    }

    fn build_recursive(&mut self, points: &mut [Point], depth: usize) -> Option<NodeIndex> {
        if points.is_empty() {
            return None;
        }
        let axis = depth % DIMENSIONS;
        let median = points.len() / 2;
        points.select_nth_unstable_by(median, |a, b| {
            a.position[axis]
                .partial_cmp(&b.position[axis])
                .unwrap_or(Ordering::Equal)
        });

        let index = self.nodes.len();
        self.nodes.push(Node {
            point: points[median],
            axis,
            left: None,
            right: None,
        });

        let (below, rest) = points.split_at_mut(median);
        let left = self.build_recursive(below, depth + 1);
        let right = self.build_recursive(&mut rest[1..], depth + 1);
        self.nodes[index].left = left;
        self.nodes[index].right = right;
        Some(index)
    }

    /// Inserts a single point as a new leaf, without rebalancing.
    ///
    /// Amortized O(log n) on a balanced tree; repeated insertion into the
    /// same region degrades depth (accepted trade-off).
    pub fn add(&mut self, point: Point) {
        let new_index = self.nodes.len();
        let Some(mut current) = self.root else {
            self.nodes.push(Node {
                point,
                axis: 0,
                left: None,
                right: None,
            });
            self.root = Some(new_index);
            return;
        };

        loop {
            let axis = self.nodes[current].axis;
            let goes_left = point.position[axis] < self.nodes[current].point.position[axis];
            let child = if goes_left {
                self.nodes[current].left
            } else {
                self.nodes[current].right
            };
            match child {
                Some(next) => current = next,
                None => {
                    self.nodes.push(Node {
                        point,
                        axis: (axis + 1) % DIMENSIONS,
                        left: None,
                        right: None,
                    });
                    if goes_left {
                        self.nodes[current].left = Some(new_index);
                    } else {
                        self.nodes[current].right = Some(new_index);
                    }
                    return;
                }
            }
        }
    }

    /// Number of points in the tree.
    ///
    /// The owning collection compares this against its own count as its sole
    /// staleness signal; it detects net count changes only, not same-count
    /// content changes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The nearest point to `query` and its Euclidean distance, or `None`
    /// for an empty tree.
    ///
    /// Branch-and-bound descent: the half-space containing the query is
    /// searched first, and the sibling subtree is pruned when the current
    /// best distance is smaller than the distance to the splitting plane.
    pub fn nearest(&self, query: &Point3<f64>) -> Option<(&Point, f64)> {
        let root = self.root?;
        let mut best: Option<NodeIndex> = None;
        let mut best_sqr = f64::INFINITY;
        self.nearest_recursive(root, query, &mut best, &mut best_sqr);
        best.map(|index| (&self.nodes[index].point, best_sqr.sqrt()))
    }

    /// Euclidean distance to the nearest point, `+INFINITY` for an empty
    /// tree.
    pub fn nearest_distance(&self, query: &Point3<f64>) -> f64 {
        self.nearest_squared_distance(query).sqrt()
    }

    /// Squared Euclidean distance to the nearest point, `+INFINITY` for an
    /// empty tree.
    pub fn nearest_squared_distance(&self, query: &Point3<f64>) -> f64 {
        let Some(root) = self.root else {
            return f64::INFINITY;
        };
        let mut best: Option<NodeIndex> = None;
        let mut best_sqr = f64::INFINITY;
        self.nearest_recursive(root, query, &mut best, &mut best_sqr);
        best_sqr
    }

    fn nearest_recursive(
        &self,
        index: NodeIndex,
        query: &Point3<f64>,
        best: &mut Option<NodeIndex>,
        best_sqr: &mut f64,
    ) {
        let node = &self.nodes[index];
        let sqr = (node.point.position - query).norm_squared();
        if sqr < *best_sqr {
            *best_sqr = sqr;
            *best = Some(index);
        }

        let delta = query[node.axis] - node.point.position[node.axis];
        let (near, far) = if delta < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(child) = near {
            self.nearest_recursive(child, query, best, best_sqr);
        }
        if let Some(child) = far {
            if delta * delta < *best_sqr {
                self.nearest_recursive(child, query, best, best_sqr);
            }
        }
    }

    /// All points within `radius` of `center`, in tree order.
    ///
    /// Same pruning discipline as [`nearest`](KdTree::nearest), but collects
    /// every match instead of stopping at the first.
    pub fn range_search(&self, center: &Point3<f64>, radius: f64) -> Vec<&Point> {
        let mut found = Vec::new();
        if let Some(root) = self.root {
            self.range_recursive(root, center, radius, radius * radius, &mut found);
        }
        found
    }

    fn range_recursive<'a>(
        &'a self,
        index: NodeIndex,
        center: &Point3<f64>,
        radius: f64,
        radius_sqr: f64,
        found: &mut Vec<&'a Point>,
    ) {
        let node = &self.nodes[index];
        if (node.point.position - center).norm_squared() <= radius_sqr {
            found.push(&node.point);
        }

        let delta = center[node.axis] - node.point.position[node.axis];
        let (near, far) = if delta < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(child) = near {
            self.range_recursive(child, center, radius, radius_sqr, found);
        }
        if let Some(child) = far {
            if delta.abs() <= radius {
                self.range_recursive(child, center, radius, radius_sqr, found);
            }
        }
    }
}
