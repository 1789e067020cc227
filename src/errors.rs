use crate::float_types::Real;
use nalgebra::Point3;

/// Failure modes the kernel reports instead of producing wrong topology.
///
/// Violations of internal tree invariants are not represented here; those
/// panic, because the data structures are corrupt and any result would be
/// silently wrong.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    /// A polygon needs at least three vertices
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    /// A coordinate has a NaN or infinite component
    #[error("Point({}) has NaN or infinite fields", .0)]
    NonFiniteCoordinate(Point3<Real>),
    /// The given points are collinear and do not span a plane
    #[error("points are collinear, no plane can be derived")]
    DegeneratePlane,
    /// Two planes are parallel, no intersection line exists
    #[error("planes are parallel within tolerance, no intersection line")]
    ParallelPlanes,
    /// A polygon failed the convexity check (debug builds only)
    #[error("polygon is not convex")]
    NonConvexPolygon,
}
