//! The primary query surface over a collection of 3D points.

use crate::core::geometry::BoundingBox;
use crate::core::models::point::Point;
use crate::engine::config::ProximityConfig;
use crate::engine::error::EngineError;
use crate::engine::kdtree::KdTree;
use nalgebra::{Point3, Vector3};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

fn ensure_radius(radius: f64) -> Result<(), EngineError> {
    if radius < 0.0 {
        return Err(EngineError::NegativeRadius(radius));
    }
    Ok(())
}

/// Ordered collection of points with lazily built caches and adaptive query
/// routing.
///
/// Insertion order is preserved and coordinate duplicates are permitted. Four
/// pieces of derived state are computed on demand and cached:
///
/// - the *identity index* (serial → position map),
/// - the *spatial index* (a [`KdTree`]),
/// - the memoized *centroid*,
/// - the memoized *center of mass*.
///
/// # Cache staleness contract
///
/// None of these caches is invalidated automatically on mutation. [`push`]
/// keeps an existing spatial index live by inserting into it; every other
/// cache, and the spatial index after [`retain`]/[`truncate`], may serve
/// stale reads. The sole staleness signal the adaptive policies use is
/// `tree.len() != set.len()`, which detects net count changes only — a
/// same-count content change goes unnoticed. This is a deliberate,
/// documented trade-off: full invalidation would change the performance
/// profile of the hot query paths. Call [`invalidate_caches`] (or the
/// explicit rebuild operations) when mutation must be observed.
///
/// [`push`]: PointSet::push
/// [`retain`]: PointSet::retain
/// [`truncate`]: PointSet::truncate
/// [`invalidate_caches`]: PointSet::invalidate_caches
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<Point>,
    config: ProximityConfig,
    serial_index: Option<HashMap<u32, usize>>,
    kd_tree: Option<KdTree>,
    centroid: Option<Point3<f64>>,
    center_of_mass: Option<Point3<f64>>,
}

impl PointSet {
    /// Creates an empty set with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with the given adaptive thresholds.
    pub fn with_config(config: ProximityConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates an empty set with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Wraps an existing point vector.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// A new set sharing this set's config, used for derived results.
    fn subset(&self, points: Vec<Point>) -> PointSet {
        PointSet {
            points,
            config: self.config,
            serial_index: None,
            kd_tree: None,
            centroid: None,
            center_of_mass: None,
        }
    }

    /// The adaptive thresholds this set queries under.
    pub fn config(&self) -> ProximityConfig {
        self.config
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates the points in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// The backing slice, in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The point at a sequence position.
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Appends a point. An existing spatial index is kept live by inserting
    /// the point into it as well (unbalanced over many inserts); the other
    /// caches are left untouched and go stale.
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
        if let Some(tree) = self.kd_tree.as_mut() {
            tree.add(point);
        }
    }

    /// Appends every point of another set via [`push`](PointSet::push).
    pub fn extend_from_set(&mut self, other: &PointSet) {
        for point in other.iter() {
            self.push(*point);
        }
    }

    /// Keeps only the points satisfying the predicate.
    ///
    /// Deliberately leaves all caches untouched: an attached spatial index
    /// keeps its old contents and is only rebuilt by the explicit or
    /// adaptive build operations.
    pub fn retain<F>(&mut self, predicate: F)
    where
        F: FnMut(&Point) -> bool,
    {
        self.points.retain(predicate);
    }

    /// Shortens the set to at most `len` points. Caches are left untouched,
    /// like [`retain`](PointSet::retain).
    pub fn truncate(&mut self, len: usize) {
        self.points.truncate(len);
    }

    /// Drops every cached structure: identity index, spatial index, centroid
    /// and center of mass. The explicit counterpart to the non-automatic
    /// invalidation contract.
    pub fn invalidate_caches(&mut self) -> &mut Self {
        self.serial_index = None;
        self.kd_tree = None;
        self.centroid = None;
        self.center_of_mass = None;
        self
    }

    // ---- identity index -------------------------------------------------

    /// Builds the serial → position map from the current contents,
    /// replacing any previous one. Points without a serial are not indexed;
    /// for duplicate serials the last occurrence wins.
    pub fn build_identity_index(&mut self) -> &mut Self {
        let mut index = HashMap::with_capacity(self.points.len());
        for (position, point) in self.points.iter().enumerate() {
            if let Some(serial) = point.serial {
                index.insert(serial, position);
            }
        }
        self.serial_index = Some(index);
        self
    }

    /// Builds the identity index once; a no-op if one is already attached
    /// (even a stale one).
    pub fn with_identity_index(&mut self) -> &mut Self {
        if self.serial_index.is_none() {
            self.build_identity_index();
        }
        self
    }

    /// Looks up a point by its serial. Uses the identity index when one is
    /// attached (authoritative even if stale), otherwise scans.
    pub fn get_by_serial(&self, serial: u32) -> Option<&Point> {
        match &self.serial_index {
            Some(index) => index.get(&serial).and_then(|&i| self.points.get(i)),
            None => self.points.iter().rfind(|p| p.serial == Some(serial)),
        }
    }

    /// Identity-based membership: whether any point here carries the same
    /// serial. Points without a serial are never members.
    pub fn contains(&self, point: &Point) -> bool {
        point
            .serial
            .is_some_and(|serial| self.get_by_serial(serial).is_some())
    }

    // ---- spatial index --------------------------------------------------

    /// Force-builds the spatial index from the current contents.
    pub fn build_spatial_index(&mut self) -> &mut Self {
        trace!(points = self.points.len(), "building spatial index");
        self.kd_tree = Some(KdTree::build(&self.points));
        self
    }

    /// Builds the spatial index only if none is attached.
    pub fn with_spatial_index(&mut self) -> &mut Self {
        if self.kd_tree.is_none() {
            self.build_spatial_index();
        }
        self
    }

    /// Builds the spatial index only when the set is large enough for the
    /// tree to pay for itself (`len() > nn_index_threshold`). An index that
    /// is already attached is rebuilt whenever its node count has diverged
    /// from the point count, regardless of the threshold.
    pub fn with_adaptive_spatial_index(&mut self) -> &mut Self {
        match &self.kd_tree {
            None => {
                if self.points.len() > self.config.nn_index_threshold {
                    debug!(points = self.points.len(), "building spatial index");
                    self.build_spatial_index();
                }
            }
            Some(tree) => {
                if tree.len() != self.points.len() {
                    debug!(points = self.points.len(), "rebuilding stale spatial index");
                    self.build_spatial_index();
                }
            }
        }
        self
    }

    /// The attached spatial index, if any.
    pub fn spatial_index(&self) -> Option<&KdTree> {
        self.kd_tree.as_ref()
    }

    /// The tree to route queries through: attached AND the set is above the
    /// nearest-neighbor threshold. Staleness is deliberately not checked
    /// here (see the type-level contract).
    fn indexed_tree(&self) -> Option<&KdTree> {
        match &self.kd_tree {
            Some(tree) if self.points.len() > self.config.nn_index_threshold => Some(tree),
            _ => None,
        }
    }

    // ---- distance queries -----------------------------------------------

    /// Euclidean distance from `query` to the nearest point of this set,
    /// `+INFINITY` for an empty set. Routed through the spatial index when
    /// one is attached and the set is above the threshold, otherwise a
    /// linear scan of squared distances with a single final square root.
    pub fn nearest_distance(&self, query: &Point3<f64>) -> f64 {
        self.nearest_squared_distance(query).sqrt()
    }

    /// Squared variant of [`nearest_distance`](PointSet::nearest_distance).
    pub fn nearest_squared_distance(&self, query: &Point3<f64>) -> f64 {
        if let Some(tree) = self.indexed_tree() {
            tree.nearest_squared_distance(query)
        } else {
            self.points
                .iter()
                .map(|p| (p.position - query).norm_squared())
                .fold(f64::INFINITY, f64::min)
        }
    }

    /// Minimum distance between this set and any point of `other`,
    /// `+INFINITY` when either set is empty.
    pub fn distance_to_set(&self, other: &PointSet) -> f64 {
        let mut min_sqr = f64::INFINITY;
        for point in other.iter() {
            let sqr = self.nearest_squared_distance(&point.position);
            if sqr < min_sqr {
                min_sqr = sqr;
            }
        }
        min_sqr.sqrt()
    }

    /// Whether any point lies within `radius` of `query`. The linear path
    /// early-exits on the first hit.
    pub fn within_distance(&self, query: &Point3<f64>, radius: f64) -> Result<bool, EngineError> {
        ensure_radius(radius)?;
        if let Some(tree) = self.indexed_tree() {
            Ok(tree.nearest_distance(query) <= radius)
        } else {
            let radius_sqr = radius * radius;
            Ok(self
                .points
                .iter()
                .any(|p| (p.position - query).norm_squared() <= radius_sqr))
        }
    }

    /// Whether the two sets come within `radius` of each other.
    ///
    /// The larger set hosts the adaptive index (index construction amortizes
    /// only over many queries), and the smaller set's points are queried
    /// against it, short-circuiting on the first hit.
    pub fn within_distance_of_set(
        &mut self,
        other: &mut PointSet,
        radius: f64,
    ) -> Result<bool, EngineError> {
        ensure_radius(radius)?;
        let (bigger, smaller): (&mut PointSet, &PointSet) = if other.len() > self.len() {
            (other, self)
        } else {
            (self, other)
        };
        bigger.with_adaptive_spatial_index();
        for point in smaller.iter() {
            if bigger.within_distance(&point.position, radius)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ---- cutouts --------------------------------------------------------

    /// Sphere cutout by linear filtering over the whole sequence.
    pub fn cutout_sphere_linear(
        &self,
        center: &Point3<f64>,
        radius: f64,
    ) -> Result<PointSet, EngineError> {
        ensure_radius(radius)?;
        let radius_sqr = radius * radius;
        let kept = self
            .points
            .iter()
            .filter(|p| (p.position - center).norm_squared() <= radius_sqr)
            .copied()
            .collect();
        Ok(self.subset(kept))
    }

    /// Sphere cutout through the spatial index's range search.
    ///
    /// Returns exactly the same point identities as the linear variant; a
    /// stale or missing index is rebuilt first so the optimization never
    /// changes the result. Result order follows the tree, not the sequence.
    pub fn cutout_sphere_indexed(
        &mut self,
        center: &Point3<f64>,
        radius: f64,
    ) -> Result<PointSet, EngineError> {
        ensure_radius(radius)?;
        if self
            .kd_tree
            .as_ref()
            .is_none_or(|tree| tree.len() != self.points.len())
        {
            self.build_spatial_index();
        }
        let kept = match &self.kd_tree {
            Some(tree) => tree
                .range_search(center, radius)
                .into_iter()
                .copied()
                .collect(),
            None => Vec::new(),
        };
        Ok(self.subset(kept))
    }

    /// Sphere cutout with adaptive routing: linear below the cutout
    /// threshold, indexed above it.
    pub fn cutout_sphere(
        &mut self,
        center: &Point3<f64>,
        radius: f64,
    ) -> Result<PointSet, EngineError> {
        if self.points.len() > self.config.cutout_index_threshold {
            self.cutout_sphere_indexed(center, radius)
        } else {
            self.cutout_sphere_linear(center, radius)
        }
    }

    /// Points of this set within `radius` of *any* point of `around`.
    ///
    /// A single-point `around` degenerates to a sphere cutout. Otherwise a
    /// two-stage filter runs: a conservative sphere around `around`'s
    /// bounding-box center (radius extended by the center-to-corner
    /// distance) prunes the candidates, which are then exact-filtered
    /// against `around`'s adaptive index. This avoids the full
    /// `|self| x |around|` product when `self` is large and `around` is
    /// localized.
    pub fn cutout_shell(
        &mut self,
        around: &mut PointSet,
        radius: f64,
    ) -> Result<PointSet, EngineError> {
        ensure_radius(radius)?;
        if around.len() == 1 {
            let center = around.points[0].position;
            return self.cutout_sphere(&center, radius);
        }
        let Some(bounds) = BoundingBox::around_points(around.iter()) else {
            return Ok(self.subset(Vec::new()));
        };
        let center = bounds.center();
        let reach = radius + (bounds.max() - center).norm();
        let candidates = self.cutout_sphere(&center, reach)?;
        trace!(
            candidates = candidates.len(),
            total = self.len(),
            "shell cutout prefilter"
        );

        around.with_adaptive_spatial_index();
        let radius_sqr = radius * radius;
        let kept = candidates
            .points
            .into_iter()
            .filter(|p| around.nearest_squared_distance(&p.position) <= radius_sqr)
            .collect();
        Ok(self.subset(kept))
    }

    /// Points of this set inside an axis-aligned box (boundary inclusive).
    pub fn cutout_box(&self, bounds: &BoundingBox) -> PointSet {
        let kept = self
            .points
            .iter()
            .filter(|p| bounds.contains(&p.position))
            .copied()
            .collect();
        self.subset(kept)
    }

    // ---- consolidation and set algebra ----------------------------------

    /// Greedy de-duplication of near-coincident points.
    ///
    /// Iterates the input in order against an incrementally maintained index
    /// on the output: a point is accepted only if every previously accepted
    /// point is strictly farther than `min_separation`. The result is
    /// order-dependent — the first point seen in a cluster survives.
    pub fn consolidate<I>(points: I, min_separation: f64) -> Result<PointSet, EngineError>
    where
        I: IntoIterator<Item = Point>,
    {
        if min_separation < 0.0 {
            return Err(EngineError::NegativeSeparation(min_separation));
        }
        let mut result = PointSet::new();
        result.build_spatial_index();
        let min_sqr = min_separation * min_separation;
        for point in points {
            let nearest_sqr = result
                .kd_tree
                .as_ref()
                .map_or(f64::INFINITY, |tree| {
                    tree.nearest_squared_distance(&point.position)
                });
            if nearest_sqr > min_sqr {
                result.push(point);
            }
        }
        Ok(result)
    }

    /// Identity-deduplicated merge of the given sets, preserving first-seen
    /// order. Points without a serial can never collide and are all kept.
    pub fn union(sets: &[&PointSet]) -> PointSet {
        let mut result = match sets.first() {
            Some(first) => first.subset(Vec::new()),
            None => PointSet::new(),
        };
        let mut seen = HashSet::new();
        for set in sets {
            for point in set.iter() {
                match point.serial {
                    Some(serial) => {
                        if seen.insert(serial) {
                            result.points.push(*point);
                        }
                    }
                    None => result.points.push(*point),
                }
            }
        }
        result
    }

    /// Points of `a` whose identity is present in `b`. Points without a
    /// serial can never match and are excluded.
    pub fn intersection(a: &PointSet, b: &PointSet) -> PointSet {
        let b_serials: HashSet<u32> = b.iter().filter_map(|p| p.serial).collect();
        let kept = a
            .iter()
            .filter(|p| p.serial.is_some_and(|s| b_serials.contains(&s)))
            .copied()
            .collect();
        a.subset(kept)
    }

    /// Points of `a` whose identity is absent from `b`. Points without a
    /// serial are kept.
    pub fn without(a: &PointSet, b: &PointSet) -> PointSet {
        let b_serials: HashSet<u32> = b.iter().filter_map(|p| p.serial).collect();
        let kept = a
            .iter()
            .filter(|p| !p.serial.is_some_and(|s| b_serials.contains(&s)))
            .copied()
            .collect();
        a.subset(kept)
    }

    /// Plain concatenation into a new set — no de-duplication, unlike
    /// [`union`](PointSet::union).
    pub fn join(&self, other: &PointSet) -> PointSet {
        let mut points = Vec::with_capacity(self.points.len() + other.points.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);
        self.subset(points)
    }

    /// Coordinate-only copies of the points, with identity and element
    /// metadata stripped.
    pub fn to_points(&self) -> PointSet {
        let points = self.points.iter().map(|p| Point::at(p.position)).collect();
        self.subset(points)
    }

    // ---- statistics -----------------------------------------------------

    /// Unweighted mean of the coordinates, memoized. `None` for an empty
    /// set. The memo is not invalidated by mutation.
    pub fn centroid(&mut self) -> Option<Point3<f64>> {
        if self.centroid.is_none() {
            self.centroid = self.compute_centroid();
        }
        self.centroid
    }

    fn compute_centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.position.coords);
        Some(Point3::from(sum / self.points.len() as f64))
    }

    /// Mass-weighted mean of the coordinates, memoized. Points without
    /// element metadata contribute unit mass. `None` for an empty set. The
    /// memo is not invalidated by mutation.
    pub fn center_of_mass(&mut self) -> Option<Point3<f64>> {
        if self.center_of_mass.is_none() {
            self.center_of_mass = self.compute_center_of_mass();
        }
        self.center_of_mass
    }

    fn compute_center_of_mass(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let mut weighted = Vector3::zeros();
        let mut total_mass = 0.0;
        for point in &self.points {
            let mass = point.mass();
            weighted += point.position.coords * mass;
            total_mass += mass;
        }
        Some(Point3::from(weighted / total_mass))
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        PointSet::from_points(iter.into_iter().collect())
    }
}

impl Extend<Point> for PointSet {
    fn extend<T: IntoIterator<Item = Point>>(&mut self, iter: T) {
        for point in iter {
            self.push(point);
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn random_set(count: usize, seed: u64) -> PointSet {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                Point::new(
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                )
                .with_serial(i as u32)
            })
            .collect()
    }

    fn serials(set: &PointSet) -> Vec<u32> {
        set.iter().filter_map(|p| p.serial).collect()
    }

    fn serial_set(set: &PointSet) -> std::collections::HashSet<u32> {
        set.iter().filter_map(|p| p.serial).collect()
    }

    mod identity_index {
        use super::*;

        #[test]
        fn get_by_serial_scans_without_index_and_uses_map_with_it() {
            let mut set = random_set(5, 1);
            assert_eq!(set.get_by_serial(3).unwrap().serial, Some(3));

            set.with_identity_index();
            assert_eq!(set.get_by_serial(3).unwrap().serial, Some(3));
            assert!(set.get_by_serial(99).is_none());
        }

        #[test]
        fn contains_is_identity_based_not_coordinate_based() {
            let mut set = PointSet::new();
            set.push(Point::new(1.0, 1.0, 1.0).with_serial(7));

            let same_coords_other_id = Point::new(1.0, 1.0, 1.0).with_serial(8);
            let other_coords_same_id = Point::new(9.0, 9.0, 9.0).with_serial(7);
            let no_identity = Point::new(1.0, 1.0, 1.0);

            assert!(set.contains(&other_coords_same_id));
            assert!(!set.contains(&same_coords_other_id));
            assert!(!set.contains(&no_identity));
        }

        #[test]
        fn stale_identity_index_misses_points_added_after_build() {
            let mut set = random_set(5, 2);
            set.with_identity_index();
            set.push(Point::new(0.0, 0.0, 0.0).with_serial(50));

            // The attached map is authoritative and was not updated.
            assert!(set.get_by_serial(50).is_none());

            set.build_identity_index();
            assert!(set.get_by_serial(50).is_some());
        }

        #[test]
        fn with_identity_index_is_a_noop_when_already_built() {
            let mut set = random_set(3, 3);
            set.with_identity_index();
            set.push(Point::new(0.0, 0.0, 0.0).with_serial(50));
            set.with_identity_index();
            // Still the stale map: a second with_ call must not rebuild.
            assert!(set.get_by_serial(50).is_none());
        }
    }

    mod adaptive_index {
        use super::*;

        #[test]
        fn small_sets_stay_linear() {
            let mut set = random_set(10, 4);
            set.with_adaptive_spatial_index();
            assert!(set.spatial_index().is_none());
        }

        #[test]
        fn large_sets_build_an_index_and_rebuild_on_count_mismatch() {
            // 20 points above the default threshold of 15.
            let mut set = random_set(20, 5);
            set.with_adaptive_spatial_index();
            assert_eq!(set.spatial_index().unwrap().len(), 20);

            // Removal leaves the index stale: 20 nodes vs 10 points.
            set.truncate(10);
            assert_eq!(set.spatial_index().unwrap().len(), 20);
            assert_eq!(set.len(), 10);

            // The next adaptive call notices the mismatch and rebuilds.
            set.with_adaptive_spatial_index();
            assert_eq!(set.spatial_index().unwrap().len(), 10);
        }

        #[test]
        fn push_keeps_an_existing_index_live() {
            let mut set = random_set(20, 7);
            set.with_adaptive_spatial_index();
            set.push(Point::new(-3.0, -3.0, -3.0).with_serial(100));
            assert_eq!(set.spatial_index().unwrap().len(), 21);
            assert_relative_eq!(set.nearest_distance(&Point3::new(-3.0, -3.0, -3.0)), 0.0);
        }

        #[test]
        fn invalidate_caches_drops_everything() {
            let mut set = random_set(20, 8);
            set.with_adaptive_spatial_index();
            set.with_identity_index();
            set.centroid();
            set.invalidate_caches();
            assert!(set.spatial_index().is_none());
        }
    }

    mod distance_queries {
        use super::*;

        #[test]
        fn nearest_distance_of_empty_set_is_infinite() {
            let set = PointSet::new();
            assert_eq!(set.nearest_distance(&Point3::origin()), f64::INFINITY);
            assert_eq!(
                set.nearest_squared_distance(&Point3::origin()),
                f64::INFINITY
            );
        }

        #[test]
        fn indexed_and_linear_nearest_distance_agree() {
            let linear = random_set(60, 9);
            let mut indexed = linear.clone();
            indexed.with_adaptive_spatial_index();
            assert!(indexed.spatial_index().is_some());

            let mut rng = StdRng::seed_from_u64(10);
            for _ in 0..50 {
                let query = Point3::new(
                    rng.gen_range(-2.0..12.0),
                    rng.gen_range(-2.0..12.0),
                    rng.gen_range(-2.0..12.0),
                );
                assert_relative_eq!(
                    indexed.nearest_distance(&query),
                    linear.nearest_distance(&query),
                    max_relative = 1e-9
                );
            }
        }

        #[test]
        fn distance_to_set_is_the_minimum_pairwise_distance() {
            let a: PointSet = vec![Point::new(0.0, 0.0, 0.0), Point::new(10.0, 0.0, 0.0)]
                .into_iter()
                .collect();
            let b: PointSet = vec![Point::new(0.0, 3.0, 0.0), Point::new(20.0, 0.0, 0.0)]
                .into_iter()
                .collect();
            assert_relative_eq!(a.distance_to_set(&b), 3.0);
            assert_relative_eq!(b.distance_to_set(&a), 3.0);
        }

        #[test]
        fn distance_to_empty_set_is_infinite() {
            let a = random_set(5, 11);
            let empty = PointSet::new();
            assert_eq!(a.distance_to_set(&empty), f64::INFINITY);
            assert_eq!(empty.distance_to_set(&a), f64::INFINITY);
        }

        #[test]
        fn within_distance_rejects_negative_radius() {
            let set = random_set(5, 12);
            assert_eq!(
                set.within_distance(&Point3::origin(), -1.0),
                Err(EngineError::NegativeRadius(-1.0))
            );
        }

        #[test]
        fn within_distance_is_boundary_inclusive_on_the_linear_path() {
            let set: PointSet = vec![Point::new(2.0, 0.0, 0.0)].into_iter().collect();
            assert!(set.within_distance(&Point3::origin(), 2.0).unwrap());
            assert!(!set.within_distance(&Point3::origin(), 1.999).unwrap());
        }

        #[test]
        fn set_to_set_within_distance_hosts_the_index_on_the_larger_set() {
            let mut big = random_set(30, 13);
            let mut small: PointSet = vec![Point::new(50.0, 50.0, 50.0).with_serial(0)]
                .into_iter()
                .collect();

            assert!(!small.within_distance_of_set(&mut big, 5.0).unwrap());
            assert!(big.spatial_index().is_some());
            assert!(small.spatial_index().is_none());

            small.push(Point::new(5.0, 5.0, 5.0).with_serial(1));
            assert!(small.within_distance_of_set(&mut big, 10.0).unwrap());
        }
    }

    mod cutouts {
        use super::*;

        #[test]
        fn linear_and_indexed_sphere_cutouts_return_identical_identities() {
            let mut set = random_set(80, 14);
            let center = Point3::new(5.0, 5.0, 5.0);
            for radius in [0.5, 2.0, 4.0, 20.0] {
                let linear = set.cutout_sphere_linear(&center, radius).unwrap();
                let indexed = set.cutout_sphere_indexed(&center, radius).unwrap();
                assert_eq!(serial_set(&linear), serial_set(&indexed), "radius {radius}");
            }
        }

        #[test]
        fn sphere_cutout_is_monotonic_in_the_radius() {
            let mut set = random_set(50, 15);
            let center = Point3::new(5.0, 5.0, 5.0);
            let smaller = set.cutout_sphere(&center, 2.0).unwrap();
            let larger = set.cutout_sphere(&center, 4.0).unwrap();
            assert!(serial_set(&smaller).is_subset(&serial_set(&larger)));
        }

        #[test]
        fn dispatcher_routes_by_the_cutout_threshold() {
            let config = ProximityConfig {
                cutout_index_threshold: 5,
                ..ProximityConfig::default()
            };
            let mut set = PointSet::with_config(config);
            for point in random_set(10, 16).iter() {
                set.push(*point);
            }
            set.cutout_sphere(&Point3::origin(), 3.0).unwrap();
            // 10 > 5, so the dispatcher went through the indexed path.
            assert!(set.spatial_index().is_some());

            let mut default_set = random_set(10, 16);
            default_set.cutout_sphere(&Point3::origin(), 3.0).unwrap();
            // 10 <= 100: linear path, no index built.
            assert!(default_set.spatial_index().is_none());
        }

        #[test]
        fn sphere_cutout_rejects_negative_radius() {
            let mut set = random_set(5, 17);
            assert_eq!(
                set.cutout_sphere(&Point3::origin(), -0.5).unwrap_err(),
                EngineError::NegativeRadius(-0.5)
            );
        }

        #[test]
        fn shell_cutout_matches_brute_force_for_a_two_point_around_set() {
            let mut set = random_set(100, 18);
            let mut around: PointSet = vec![
                Point::new(2.0, 2.0, 2.0).with_serial(1000),
                Point::new(7.0, 7.0, 7.0).with_serial(1001),
            ]
            .into_iter()
            .collect();
            let radius = 2.0;

            let expected: std::collections::HashSet<u32> = set
                .iter()
                .filter(|p| {
                    around
                        .iter()
                        .any(|a| (p.position - a.position).norm() <= radius)
                })
                .filter_map(|p| p.serial)
                .collect();

            let shell = set.cutout_shell(&mut around, radius).unwrap();
            assert_eq!(serial_set(&shell), expected);
        }

        #[test]
        fn shell_cutout_around_a_single_point_equals_a_sphere_cutout() {
            let mut set = random_set(40, 19);
            let mut around: PointSet = vec![Point::new(5.0, 5.0, 5.0)].into_iter().collect();
            let shell = set.cutout_shell(&mut around, 3.0).unwrap();
            let sphere = set
                .cutout_sphere(&Point3::new(5.0, 5.0, 5.0), 3.0)
                .unwrap();
            assert_eq!(serial_set(&shell), serial_set(&sphere));
        }

        #[test]
        fn shell_cutout_around_an_empty_set_is_empty() {
            let mut set = random_set(10, 20);
            let mut around = PointSet::new();
            assert!(set.cutout_shell(&mut around, 5.0).unwrap().is_empty());
        }

        #[test]
        fn box_cutout_keeps_only_contained_points() {
            let set: PointSet = vec![
                Point::new(1.0, 1.0, 1.0).with_serial(1),
                Point::new(5.0, 5.0, 5.0).with_serial(2),
                Point::new(2.0, 2.0, 9.0).with_serial(3),
            ]
            .into_iter()
            .collect();
            let bounds = BoundingBox::new(Point3::origin(), Point3::new(3.0, 3.0, 3.0));
            assert_eq!(serials(&set.cutout_box(&bounds)), vec![1]);
        }
    }

    mod consolidation {
        use super::*;

        #[test]
        fn first_point_seen_in_a_cluster_survives() {
            let input = vec![
                Point::new(0.0, 0.0, 0.0).with_serial(1),
                Point::new(0.5, 0.0, 0.0).with_serial(2),
                Point::new(10.0, 0.0, 0.0).with_serial(3),
            ];
            let result = PointSet::consolidate(input, 1.0).unwrap();
            assert_eq!(serials(&result), vec![1, 3]);
        }

        #[test]
        fn survivors_are_strictly_farther_apart_than_the_separation() {
            let input = random_set(200, 21);
            let min_separation = 1.5;
            let result =
                PointSet::consolidate(input.iter().copied(), min_separation).unwrap();
            for (i, a) in result.iter().enumerate() {
                for b in result.iter().skip(i + 1) {
                    assert!(a.distance(b) > min_separation);
                }
            }
        }

        #[test]
        fn consolidation_is_idempotent() {
            let input = random_set(200, 22);
            let once = PointSet::consolidate(input.iter().copied(), 1.5).unwrap();
            let twice = PointSet::consolidate(once.iter().copied(), 1.5).unwrap();
            assert_eq!(serials(&once), serials(&twice));
        }

        #[test]
        fn points_exactly_at_the_separation_are_dropped() {
            // Acceptance requires strictly-greater distance.
            let input = vec![
                Point::new(0.0, 0.0, 0.0).with_serial(1),
                Point::new(1.0, 0.0, 0.0).with_serial(2),
            ];
            let result = PointSet::consolidate(input, 1.0).unwrap();
            assert_eq!(serials(&result), vec![1]);
        }

        #[test]
        fn consolidation_rejects_negative_separation() {
            assert_eq!(
                PointSet::consolidate(Vec::new(), -1.0).unwrap_err(),
                EngineError::NegativeSeparation(-1.0)
            );
        }
    }

    mod set_algebra {
        use super::*;

        #[test]
        fn union_deduplicates_by_identity_and_is_idempotent() {
            let a = random_set(10, 23);
            let self_union = PointSet::union(&[&a, &a]);
            assert_eq!(serials(&self_union), serials(&a));
        }

        #[test]
        fn union_size_is_bounded_by_the_sum_of_inputs() {
            let a = random_set(10, 24);
            let b: PointSet = (5..15)
                .map(|i| Point::new(i as f64, 0.0, 0.0).with_serial(i))
                .collect();
            let merged = PointSet::union(&[&a, &b]);
            assert!(merged.len() <= a.len() + b.len());
            assert_eq!(merged.len(), 15);
        }

        #[test]
        fn union_keeps_identityless_points() {
            let a: PointSet = vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)]
                .into_iter()
                .collect();
            let merged = PointSet::union(&[&a, &a]);
            assert_eq!(merged.len(), 4);
        }

        #[test]
        fn intersection_is_contained_in_both_inputs() {
            let a = random_set(10, 25);
            let b: PointSet = (5..15)
                .map(|i| Point::new(0.0, 0.0, 0.0).with_serial(i))
                .collect();
            let common = PointSet::intersection(&a, &b);
            let common_serials = serial_set(&common);
            assert!(common_serials.is_subset(&serial_set(&a)));
            assert!(common_serials.is_subset(&serial_set(&b)));
            assert_eq!(serials(&common), vec![5, 6, 7, 8, 9]);
        }

        #[test]
        fn without_complements_intersection() {
            let a = random_set(10, 26);
            let b: PointSet = (5..15)
                .map(|i| Point::new(0.0, 0.0, 0.0).with_serial(i))
                .collect();
            let kept = PointSet::without(&a, &b);
            assert_eq!(serials(&kept), vec![0, 1, 2, 3, 4]);
            assert_eq!(
                kept.len() + PointSet::intersection(&a, &b).len(),
                a.len()
            );
        }

        #[test]
        fn join_concatenates_without_deduplication() {
            let a = random_set(4, 27);
            let joined = a.join(&a);
            assert_eq!(joined.len(), 8);
            assert_eq!(serials(&joined), vec![0, 1, 2, 3, 0, 1, 2, 3]);
        }

        #[test]
        fn to_points_strips_identity_and_element() {
            let set: PointSet = vec![
                Point::new(1.0, 2.0, 3.0)
                    .with_serial(1)
                    .with_element(Element::Iron),
            ]
            .into_iter()
            .collect();
            let bare = set.to_points();
            assert_eq!(bare.len(), 1);
            assert_eq!(bare.get(0).unwrap().serial, None);
            assert_eq!(bare.get(0).unwrap().element, None);
            assert_eq!(bare.get(0).unwrap().position, Point3::new(1.0, 2.0, 3.0));
        }
    }

    mod statistics {
        use super::*;

        #[test]
        fn centroid_is_the_unweighted_mean() {
            let mut set: PointSet = vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(2.0, 0.0, 0.0),
                Point::new(1.0, 3.0, 0.0),
            ]
            .into_iter()
            .collect();
            let centroid = set.centroid().unwrap();
            assert_relative_eq!(centroid.x, 1.0);
            assert_relative_eq!(centroid.y, 1.0);
            assert_relative_eq!(centroid.z, 0.0);
        }

        #[test]
        fn centroid_of_empty_set_is_none() {
            let mut set = PointSet::new();
            assert!(set.centroid().is_none());
            assert!(set.center_of_mass().is_none());
        }

        #[test]
        fn center_of_mass_weights_by_element_mass() {
            let mut set: PointSet = vec![
                Point::new(0.0, 0.0, 0.0).with_element(Element::Carbon),
                Point::new(2.0, 0.0, 0.0).with_element(Element::Oxygen),
            ]
            .into_iter()
            .collect();
            let expected_x =
                2.0 * Element::Oxygen.mass() / (Element::Carbon.mass() + Element::Oxygen.mass());
            let com = set.center_of_mass().unwrap();
            assert_relative_eq!(com.x, expected_x, max_relative = 1e-12);
            assert_relative_eq!(com.y, 0.0);
        }

        #[test]
        fn points_without_an_element_contribute_unit_mass() {
            let mut set: PointSet = vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(4.0, 0.0, 0.0),
            ]
            .into_iter()
            .collect();
            // Equal unit masses: the center of mass is the midpoint.
            assert_relative_eq!(set.center_of_mass().unwrap().x, 2.0);
        }

        #[test]
        fn memoized_statistics_go_stale_until_invalidated() {
            let mut set: PointSet = vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(2.0, 0.0, 0.0),
            ]
            .into_iter()
            .collect();
            assert_relative_eq!(set.centroid().unwrap().x, 1.0);

            set.push(Point::new(7.0, 0.0, 0.0));
            // Mutation does not invalidate the memo.
            assert_relative_eq!(set.centroid().unwrap().x, 1.0);

            set.invalidate_caches();
            assert_relative_eq!(set.centroid().unwrap().x, 3.0);
        }
    }
}
