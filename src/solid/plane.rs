//! Planes in normal-offset form and the polygon splitting used by the BSP.

use crate::errors::GeometryError;
use crate::float_types::{AREA_EPSILON, EPSILON, EPSILON_SQUARED, Real};
use crate::solid::polygon::Polygon;
use crate::solid::vertex::Vertex;
use nalgebra::{Matrix4, Point3, Vector3};

// Classification of a point or polygon against a plane, as a bitmask so a
// polygon's class is the OR over its vertices.
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// An oriented plane `{ p : normal · p = w }` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3<Real>,
    w: Real,
}

/// Outcome of splitting one polygon by a plane.
///
/// Fragments of a `Spanning` polygon keep the source polygon's plane and
/// shared surface data; a side that degenerates to fewer than three vertices
/// is discarded.
#[derive(Debug, Clone)]
pub enum PolygonSplit<S: Clone> {
    /// Entirely on the plane, facing the same way
    CoplanarFront,
    /// Entirely on the plane, facing the other way
    CoplanarBack,
    /// Entirely in the front half-space
    Front,
    /// Entirely in the back half-space
    Back,
    /// Straddling the plane
    Spanning {
        front: Option<Polygon<S>>,
        back: Option<Polygon<S>>,
    },
}

impl Plane {
    /// Build a plane from a (not necessarily unit) normal and offset.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let len = normal.norm();
        debug_assert!(len > 0.0, "plane normal must not be zero");
        Plane {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through three points, oriented by their winding.
    pub fn from_points(
        a: &Point3<Real>,
        b: &Point3<Real>,
        c: &Point3<Real>,
    ) -> Result<Self, GeometryError> {
        let cross = (b - a).cross(&(c - a));
        if cross.norm_squared() < AREA_EPSILON {
            return Err(GeometryError::DegeneratePlane);
        }
        let normal = cross.normalize();
        Ok(Plane {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Plane through the first three vertices of a ring.
    pub fn from_vertices(vertices: &[Vertex]) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        Self::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos)
    }

    #[inline]
    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    #[inline]
    pub const fn offset(&self) -> Real {
        self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            w: -self.w,
        }
    }

    #[inline]
    pub fn signed_distance_to(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point against the plane within [`EPSILON`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.signed_distance_to(point);
        if t > EPSILON {
            FRONT
        } else if t < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Which side a coplanar polygon's orientation puts it on.
    pub fn orient_plane(&self, other: &Plane) -> i8 {
        if self.normal.dot(&other.normal) >= 0.0 {
            FRONT
        } else {
            BACK
        }
    }

    /// Bitmask classification of a whole polygon.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Intersection of the segment `p1 -> p2` with the plane.
    ///
    /// The line parameter is clamped to `[0, 1]`, so a segment parallel to
    /// the plane (or otherwise ill-conditioned) yields an endpoint rather
    /// than a point far off the segment; NaN resolves to `p1`.
    pub fn split_line_between_points(
        &self,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
    ) -> Point3<Real> {
        let direction = p2 - p1;
        let mut t = (self.w - self.normal.dot(&p1.coords)) / self.normal.dot(&direction);
        if t.is_nan() {
            t = 0.0;
        }
        t = t.clamp(0.0, 1.0);
        p1 + direction * t
    }

    /// Apply an affine transform: the normal follows the inverse transpose
    /// rule, the offset is recovered from a transformed point on the plane.
    #[must_use]
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Plane {
        let inverse_transpose = match matrix.try_inverse() {
            Some(inverse) => inverse.transpose(),
            None => {
                eprintln!(
                    "Warning: Transformation matrix is not invertible, using identity for normals"
                );
                Matrix4::identity()
            }
        };
        let normal = inverse_transpose.transform_vector(&self.normal).normalize();
        let point_on_plane = matrix.transform_point(&Point3::from(self.normal * self.w));
        Plane {
            normal,
            w: normal.dot(&point_on_plane.coords),
        }
    }

    /// Intersection line of two planes as `(point, direction)`.
    pub fn intersect_plane(
        &self,
        other: &Plane,
    ) -> Result<(Point3<Real>, Vector3<Real>), GeometryError> {
        let direction = self.normal.cross(&other.normal);
        let norm_squared = direction.norm_squared();
        if norm_squared < AREA_EPSILON {
            return Err(GeometryError::ParallelPlanes);
        }
        let point = (other.normal.cross(&direction) * self.w
            + direction.cross(&self.normal) * other.w)
            / norm_squared;
        Ok((Point3::from(point), direction))
    }

    /// Split `polygon` by this plane.
    ///
    /// Coplanar polygons are tagged front or back by the direction of their
    /// own plane normal. A spanning polygon is cut along the plane: original
    /// vertices go to their side, edge intersections to both sides, and each
    /// side is deduplicated before a fragment is emitted.
    pub fn split_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> PolygonSplit<S> {
        let mut has_front = false;
        let mut has_back = false;
        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| {
                let t = self.orient_point(&v.pos);
                has_front |= t == FRONT;
                has_back |= t == BACK;
                t
            })
            .collect();

        match (has_front, has_back) {
            (false, false) => {
                if self.orient_plane(&polygon.plane) == FRONT {
                    PolygonSplit::CoplanarFront
                } else {
                    PolygonSplit::CoplanarBack
                }
            }
            (true, false) => PolygonSplit::Front,
            (false, true) => PolygonSplit::Back,
            (true, true) => {
                let num_vertices = polygon.vertices.len();
                let mut front_vertices = Vec::with_capacity(num_vertices + 2);
                let mut back_vertices = Vec::with_capacity(num_vertices + 2);

                for i in 0..num_vertices {
                    let j = (i + 1) % num_vertices;
                    let vi = &polygon.vertices[i];
                    if types[i] != BACK {
                        front_vertices.push(*vi);
                    }
                    if types[i] != FRONT {
                        back_vertices.push(*vi);
                    }
                    if (types[i] | types[j]) == SPANNING {
                        let vj = &polygon.vertices[j];
                        let intersection =
                            Vertex::new(self.split_line_between_points(&vi.pos, &vj.pos));
                        front_vertices.push(intersection);
                        back_vertices.push(intersection);
                    }
                }

                dedup_ring(&mut front_vertices);
                dedup_ring(&mut back_vertices);

                let front = (front_vertices.len() >= 3).then(|| {
                    Polygon::with_plane(front_vertices, polygon.plane, polygon.shared.clone())
                });
                let back = (back_vertices.len() >= 3).then(|| {
                    Polygon::with_plane(back_vertices, polygon.plane, polygon.shared.clone())
                });
                PolygonSplit::Spanning { front, back }
            }
        }
    }
}

/// Remove consecutive near-identical vertices from a ring, closing pair
/// included.
fn dedup_ring(vertices: &mut Vec<Vertex>) {
    let mut deduped: Vec<Vertex> = Vec::with_capacity(vertices.len());
    for vertex in vertices.drain(..) {
        if let Some(last) = deduped.last() {
            if last.distance_squared_to(&vertex) < EPSILON_SQUARED {
                continue;
            }
        }
        deduped.push(vertex);
    }
    while deduped.len() >= 2
        && deduped[0].distance_squared_to(deduped.last().unwrap()) < EPSILON_SQUARED
    {
        deduped.pop();
    }
    *vertices = deduped;
}

impl approx::AbsDiffEq for Plane {
    type Epsilon = Real;

    fn default_epsilon() -> Self::Epsilon {
        <Real as approx::AbsDiffEq>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.normal, &other.normal, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.w, &other.w, epsilon)
    }
}
