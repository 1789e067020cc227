use crate::float_types::{EPSILON, Real, parry3d::bounding_volume::Aabb};
use crate::solid::plane::Plane;
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, Vector3};

/// Boolean operations
pub trait BooleanOps<Other = Self> {
    type Output;

    fn union(&self, other: &Other) -> Self::Output;
    fn difference(&self, other: &Other) -> Self::Output;
    fn intersection(&self, other: &Other) -> Self::Output;
    fn xor(&self, other: &Other) -> Self::Output;
}

/// Affine transformations
pub trait TransformOps: Sized + Clone {
    fn new() -> Self;
    fn transform(&self, matrix: &Matrix4<Real>) -> Self;
    fn bounding_box(&self) -> Aabb;
    fn inverse(&self) -> Self;

    /// Returns a new Self translated by vector.
    fn translate_vector(&self, vector: Vector3<Real>) -> Self {
        self.transform(&Translation3::from(vector).to_homogeneous())
    }

    /// Returns a new Self translated by x, y, and z.
    fn translate(&self, x: Real, y: Real, z: Real) -> Self {
        self.translate_vector(Vector3::new(x, y, z))
    }

    /// Returns a new Self translated so that its bounding-box center is at the origin (0,0,0).
    fn center(&self) -> Self {
        let aabb = self.bounding_box();

        // Compute the AABB center
        let center_x = (aabb.mins.x + aabb.maxs.x) * 0.5;
        let center_y = (aabb.mins.y + aabb.maxs.y) * 0.5;
        let center_z = (aabb.mins.z + aabb.maxs.z) * 0.5;

        // Translate so that the bounding-box center goes to the origin
        self.translate(-center_x, -center_y, -center_z)
    }

    /// Rotates by x_degrees, y_degrees, z_degrees
    fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> Self {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());

        // Compose them in the desired order
        let rot = rz * ry * rx;
        self.transform(&rot.to_homogeneous())
    }

    /// Scales by scale_x, scale_y, scale_z
    fn scale(&self, sx: Real, sy: Real, sz: Real) -> Self {
        let mat4 = Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz));
        self.transform(&mat4)
    }

    /// Reflect (mirror) about an arbitrary plane.
    ///
    /// Returns a new Self whose geometry is mirrored accordingly; the
    /// transform keeps windings outward-facing, so no inversion is needed
    /// afterwards.
    fn mirror(&self, plane: &Plane) -> Self {
        let n = plane.normal();
        if n.norm() < EPSILON {
            // Degenerate plane? Just return clone (no transform)
            return self.clone();
        }
        let w = plane.offset();

        // Translate so the plane crosses the origin
        let offset = n * w;
        let t1 = Translation3::from(-offset).to_homogeneous();

        // Build the reflection matrix about a plane normal n at the origin
        // R = I - 2 n n^T
        let mut reflect_4 = Matrix4::identity();
        let reflect_3 = Matrix3::identity() - 2.0 * n * n.transpose();
        reflect_4.fixed_view_mut::<3, 3>(0, 0).copy_from(&reflect_3);

        // Translate back
        let t2 = Translation3::from(offset).to_homogeneous();

        self.transform(&(t2 * reflect_4 * t1))
    }
}
