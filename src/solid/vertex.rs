//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::Point3;

/// A vertex of a polygon.
///
/// Orientation lives on the polygon's plane, so a vertex is just a position.
/// Vertices are shared by value; near-duplicates are collapsed onto single
/// representatives by canonicalization, after which bitwise equality doubles
/// as identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
}

impl Vertex {
    #[inline]
    pub const fn new(pos: Point3<Real>) -> Self {
        Vertex { pos }
    }

    /// Flipping a solid reverses polygon winding and plane orientation; a
    /// lone vertex carries no orientation, so this is the identity.
    #[inline]
    pub const fn flipped(self) -> Self {
        self
    }

    /// Linear interpolation towards `other` at parameter `t`.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        Vertex::new(Point3::from(self.pos.coords.lerp(&other.pos.coords, t)))
    }

    pub fn distance_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm()
    }

    /// Squared distance, for comparisons that do not need the square root.
    pub fn distance_squared_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm_squared()
    }
}

impl approx::AbsDiffEq for Vertex {
    type Epsilon = <Point3<Real> as approx::AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Point3::<Real>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.pos, &other.pos, epsilon)
    }
}

impl approx::RelativeEq for Vertex {
    fn default_max_relative() -> Self::Epsilon {
        Point3::<Real>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        approx::RelativeEq::relative_eq(&self.pos, &other.pos, epsilon, max_relative)
    }
}
