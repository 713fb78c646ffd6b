//! Bounding volumes and triangle measures

use nalgebra::{Point3, Vector3};

use crate::frame::Frame;

/// Axis-aligned bounding box in some local coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point, or `None` when the hull is empty or
    /// has a non-finite coordinate
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let bounds = iter.fold(Self::new(first, first), |acc, p| acc.including(p));
        bounds.is_finite().then_some(bounds)
    }

    pub fn including(&self, p: &Point3<f32>) -> Self {
        Self {
            min: self.min.inf(p),
            max: self.max.sup(p),
        }
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn contains(&self, p: &Point3<f32>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|c| c.is_finite())
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn diagonal(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(b.x, b.y, b.z),
            Point3::new(a.x, b.y, b.z),
        ]
    }

    /// The twelve box edges as corner index pairs into `corners()`
    #[rustfmt::skip]
    pub fn edge_indices() -> [(usize, usize); 12] {
        [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ]
    }

    /// Box around this box's corners after moving them through `frame`
    pub fn transformed(&self, frame: &Frame) -> Self {
        let corners = self.corners().map(|c| frame.transform_point(&c));
        let first = corners[0];
        corners[1..]
            .iter()
            .fold(Self::new(first, first), |acc, p| acc.including(p))
    }
}

/// Area of the triangle spanned by three points
pub fn triangle_area(p1: &Point3<f32>, p2: &Point3<f32>, p3: &Point3<f32>) -> f32 {
    0.5 * (p2 - p1).cross(&(p3 - p1)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Axis, Plane};
    use approx::assert_relative_eq;

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 3.0, 4.0));
        assert!(points.iter().all(|p| bounds.contains(p)));
    }

    #[test]
    fn test_empty_and_non_finite_hulls() {
        let none: [Point3<f32>; 0] = [];
        assert!(BoundingBox::from_points(&none).is_none());

        let bad = [Point3::new(f32::NAN, 0.0, 0.0)];
        assert!(BoundingBox::from_points(&bad).is_none());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = BoundingBox::new(Point3::new(-1.0, 0.5, 0.5), Point3::new(0.5, 2.0, 0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(u.max, Point3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_transformed_box() {
        let unit = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let mirrored = unit.transformed(&Frame::identity().mirrored_across(&Plane::yz()));
        assert_relative_eq!(mirrored.min, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(mirrored.max, Point3::new(0.0, 1.0, 1.0), epsilon = 1e-6);

        let spun = unit.transformed(&Frame::identity().rotated_around(&Axis::z(), 0.5));
        assert!(spun.diagonal().x > 1.0);
    }

    #[test]
    fn test_triangle_area() {
        let area = triangle_area(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
        );
        assert_relative_eq!(area, 0.5);
    }
}
