use super::element::Element;
use nalgebra::Point3;

/// A lightweight spatial sample: a coordinate triple with optional identity
/// and element metadata.
///
/// Two notions of equality apply to points and are deliberately kept apart:
///
/// - *Geometric* operations (distances, nearest-neighbor search, range
///   queries) look only at [`position`](Point::position).
/// - *Identity-based* operations (membership, set algebra, identity lookup)
///   act on [`serial`](Point::serial). Two points with equal coordinates but
///   different serials are distinct entries; a point without a serial never
///   compares equal to anything.
///
/// The type is `Copy`: query results and index nodes hold copies, not
/// references into the originating collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// The 3D coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Caller-assigned stable identity (e.g. a PDB atom serial).
    pub serial: Option<u32>,
    /// Chemical element metadata; determines the mass used for
    /// center-of-mass computation.
    pub element: Option<Element>,
}

impl Point {
    /// Creates a bare coordinate point with no identity or element.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::at(Point3::new(x, y, z))
    }

    /// Creates a bare point at the given position.
    pub fn at(position: Point3<f64>) -> Self {
        Self {
            position,
            serial: None,
            element: None,
        }
    }

    /// Attaches a caller-assigned identity.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    /// Attaches chemical element metadata.
    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    /// The mass used for center-of-mass weighting: the element's atomic mass,
    /// or unit mass when the point carries no element information.
    pub fn mass(&self) -> f64 {
        self.element.map_or(1.0, |e| e.mass())
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.position - other.position).norm()
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        (self.position - other.position).norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_point_has_no_identity_or_element() {
        let point = Point::new(1.0, 2.0, 3.0);
        assert_eq!(point.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(point.serial, None);
        assert_eq!(point.element, None);
    }

    #[test]
    fn builders_attach_identity_and_element() {
        let point = Point::new(0.0, 0.0, 0.0)
            .with_serial(42)
            .with_element(Element::Oxygen);
        assert_eq!(point.serial, Some(42));
        assert_eq!(point.element, Some(Element::Oxygen));
    }

    #[test]
    fn mass_defaults_to_unit_without_element() {
        assert_relative_eq!(Point::new(0.0, 0.0, 0.0).mass(), 1.0);
        assert_relative_eq!(
            Point::new(0.0, 0.0, 0.0).with_element(Element::Carbon).mass(),
            Element::Carbon.mass()
        );
    }

    #[test]
    fn distance_matches_euclidean_norm() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }
}
