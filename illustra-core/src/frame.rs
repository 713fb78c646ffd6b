//! Rigid coordinate frames, axes and planes

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Unit, Vector3};

/// An orthonormal coordinate frame expressed in its parent's coordinates.
///
/// The columns of `basis` are the frame's x, y and z axes. A frame produced by
/// a mirror is left-handed; `is_right_handed` reports which one you have.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f32>,
    pub basis: Matrix3<f32>,
}

/// A line through `origin` along `direction`, used as a rotation axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Axis {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn x() -> Self {
        Self::new(Point3::origin(), Vector3::x())
    }

    pub fn y() -> Self {
        Self::new(Point3::origin(), Vector3::y())
    }

    pub fn z() -> Self {
        Self::new(Point3::origin(), Vector3::z())
    }
}

/// A plane through `origin` with the given `normal`, used for mirroring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Plane {
    pub fn new(origin: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { origin, normal }
    }

    pub fn yz() -> Self {
        Self::new(Point3::origin(), Vector3::x())
    }

    pub fn xz() -> Self {
        Self::new(Point3::origin(), Vector3::y())
    }

    pub fn xy() -> Self {
        Self::new(Point3::origin(), Vector3::z())
    }

    /// Householder reflection through the plane's normal (origin excluded)
    fn reflection(&self) -> Matrix3<f32> {
        let n = self.normal.normalize();
        Matrix3::identity() - 2.0 * n * n.transpose()
    }
}

impl Frame {
    pub fn identity() -> Self {
        Self {
            origin: Point3::origin(),
            basis: Matrix3::identity(),
        }
    }

    pub fn new(
        origin: Point3<f32>,
        x: Vector3<f32>,
        y: Vector3<f32>,
        z: Vector3<f32>,
    ) -> Self {
        Self {
            origin,
            basis: Matrix3::from_columns(&[x, y, z]),
        }
    }

    /// A right-handed frame at `origin` with the parent's axes
    pub fn at(origin: Point3<f32>) -> Self {
        Self {
            origin,
            basis: Matrix3::identity(),
        }
    }

    pub fn is_right_handed(&self) -> bool {
        self.basis.determinant() > 0.0
    }

    /// Express `child` (given relative to `self`) in `self`'s parent coordinates
    pub fn compose(&self, child: &Frame) -> Frame {
        Frame {
            origin: self.transform_point(&child.origin),
            basis: self.basis * child.basis,
        }
    }

    pub fn inverse(&self) -> Frame {
        let inv = self.basis.transpose();
        Frame {
            origin: Point3::from(-(inv * self.origin.coords)),
            basis: inv,
        }
    }

    pub fn translated_by(&self, v: &Vector3<f32>) -> Frame {
        Frame {
            origin: self.origin + v,
            basis: self.basis,
        }
    }

    pub fn rotated_around(&self, axis: &Axis, angle: f32) -> Frame {
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis.direction), angle);
        let r = rotation.matrix();
        Frame {
            origin: axis.origin + r * (self.origin - axis.origin),
            basis: r * self.basis,
        }
    }

    pub fn mirrored_across(&self, plane: &Plane) -> Frame {
        let m = plane.reflection();
        Frame {
            origin: plane.origin + m * (self.origin - plane.origin),
            basis: m * self.basis,
        }
    }

    /// Reinterpret this frame as living inside `target`
    pub fn placed_in(&self, target: &Frame) -> Frame {
        target.compose(self)
    }

    /// Re-express this frame in `target`'s coordinates
    pub fn relative_to(&self, target: &Frame) -> Frame {
        target.inverse().compose(self)
    }

    pub fn transform_point(&self, p: &Point3<f32>) -> Point3<f32> {
        self.origin + self.basis * p.coords
    }

    pub fn transform_vector(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.basis * v
    }

    /// Homogeneous model matrix of this frame
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.origin.coords) * self.basis.to_homogeneous()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}
