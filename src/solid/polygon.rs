//! Convex coplanar polygons with cached bounding volumes.

use crate::errors::GeometryError;
use crate::float_types::{
    AREA_EPSILON, Real,
    parry3d::bounding_volume::{Aabb, BoundingSphere},
};
use crate::solid::plane::Plane;
use crate::solid::vertex::Vertex;
use nalgebra::Point3;
use std::sync::OnceLock;

/// A convex polygon: an ordered ring of at least three coplanar vertices
/// whose winding matches the outward-facing `plane` normal.
///
/// `shared` is opaque per-surface data (a color, a material id, anything)
/// preserved through all boolean operations; fragments of a split polygon
/// keep their source's `shared`.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,

    /// Opaque per-surface data carried through splits and merges.
    pub shared: Option<S>,

    /// Lazily calculated AABB that spans `vertices`.
    pub bounding_box: OnceLock<Aabb>,

    /// Lazily calculated sphere around `bounding_box`.
    pub bounding_sphere: OnceLock<BoundingSphere>,
}

impl<S: Clone + PartialEq> PartialEq for Polygon<S> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.shared == other.shared
    }
}

impl<S: Clone> Polygon<S> {
    /// Build a polygon, deriving its plane from the first three vertices.
    pub fn new(vertices: Vec<Vertex>, shared: Option<S>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        let plane = Plane::from_vertices(&vertices)?;
        let polygon = Polygon {
            vertices,
            plane,
            shared,
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        };
        #[cfg(feature = "csg-debug")]
        if !polygon.check_convex() {
            return Err(GeometryError::NonConvexPolygon);
        }
        Ok(polygon)
    }

    /// Build a polygon whose plane is already known, e.g. a fragment of a
    /// split polygon.
    pub fn with_plane(vertices: Vec<Vertex>, plane: Plane, shared: Option<S>) -> Self {
        assert!(vertices.len() >= 3, "degenerate polygon");
        let polygon = Polygon {
            vertices,
            plane,
            shared,
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        };
        #[cfg(feature = "csg-debug")]
        assert!(polygon.check_convex(), "polygon is not convex");
        polygon
    }

    /// Reverse winding and flip the plane in place.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut polygon = self.clone();
        polygon.flip();
        polygon
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for v in &self.vertices {
                mins.x = mins.x.min(v.pos.x);
                mins.y = mins.y.min(v.pos.y);
                mins.z = mins.z.min(v.pos.z);
                maxs.x = maxs.x.max(v.pos.x);
                maxs.y = maxs.y.max(v.pos.y);
                maxs.z = maxs.z.max(v.pos.z);
            }
            Aabb::new(mins, maxs)
        })
    }

    /// Sphere guaranteed to contain the polygon: centered on the AABB, with
    /// the half-diagonal as radius.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        *self.bounding_sphere.get_or_init(|| {
            let aabb = self.bounding_box();
            let center = nalgebra::center(&aabb.mins, &aabb.maxs);
            let radius = (aabb.maxs - aabb.mins).norm() * 0.5;
            BoundingSphere::new(center, radius)
        })
    }

    /// Fan triangulation: `k - 2` triangles for a `k`-gon. Valid because the
    /// polygon is convex.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        (2..self.vertices.len())
            .map(|i| [self.vertices[0], self.vertices[i - 1], self.vertices[i]])
            .collect()
    }

    /// Verify that the signed cross product of successive edge pairs,
    /// projected onto the polygon's normal, does not change sign.
    pub fn check_convex(&self) -> bool {
        let num_vertices = self.vertices.len();
        let normal = self.plane.normal();
        let mut sign = 0i8;
        for i in 0..num_vertices {
            let prev = self.vertices[(i + num_vertices - 1) % num_vertices].pos;
            let current = self.vertices[i].pos;
            let next = self.vertices[(i + 1) % num_vertices].pos;
            let projected = (current - prev).cross(&(next - current)).dot(&normal);
            if projected > AREA_EPSILON {
                if sign < 0 {
                    return false;
                }
                sign = 1;
            } else if projected < -AREA_EPSILON {
                if sign > 0 {
                    return false;
                }
                sign = -1;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    fn quad() -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0)),
                Vertex::new(Point3::new(2.0, 0.0, 0.0)),
                Vertex::new(Point3::new(2.0, 1.0, 0.0)),
                Vertex::new(Point3::new(0.0, 1.0, 0.0)),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn plane_derived_from_winding() {
        let poly = quad();
        approx::assert_relative_eq!(poly.plane.normal(), Vector3::z());
        assert_eq!(poly.plane.offset(), 0.0);
    }

    #[test]
    fn too_few_vertices() {
        let result = Polygon::<()>::new(
            vec![
                Vertex::new(Point3::origin()),
                Vertex::new(Point3::new(1.0, 0.0, 0.0)),
            ],
            None,
        );
        assert_eq!(result, Err(GeometryError::TooFewVertices(2)));
    }

    #[test]
    fn collinear_vertices_do_not_span_a_plane() {
        let result = Polygon::<()>::new(
            vec![
                Vertex::new(Point3::origin()),
                Vertex::new(Point3::new(1.0, 0.0, 0.0)),
                Vertex::new(Point3::new(2.0, 0.0, 0.0)),
            ],
            None,
        );
        assert_eq!(result, Err(GeometryError::DegeneratePlane));
    }

    #[test]
    fn flip_reverses_winding_and_plane() {
        let poly = quad().flipped();
        approx::assert_relative_eq!(poly.plane.normal(), -Vector3::z());
        assert_eq!(poly.vertices[0].pos, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn bounding_volumes_cover_all_vertices() {
        let poly = quad();
        let aabb = poly.bounding_box();
        assert_eq!(aabb.mins, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.maxs, Point3::new(2.0, 1.0, 0.0));

        let sphere = poly.bounding_sphere();
        for v in &poly.vertices {
            assert!((v.pos - sphere.center).norm() <= sphere.radius + 1e-12);
        }
    }

    #[test]
    fn triangulate_fans_from_first_vertex() {
        let tris = quad().triangulate();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0][0].pos, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(tris[1][2].pos, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn convexity_check() {
        assert!(quad().check_convex());

        // A dart shaped quad is not convex. Built directly so the
        // constructor's debug assertion does not fire first.
        let dart: Polygon<()> = Polygon {
            vertices: vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0)),
                Vertex::new(Point3::new(2.0, 0.0, 0.0)),
                Vertex::new(Point3::new(0.5, 0.5, 0.0)),
                Vertex::new(Point3::new(0.0, 2.0, 0.0)),
            ],
            plane: Plane::from_normal(Vector3::z(), 0.0),
            shared: None,
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        };
        assert!(!dart.check_convex());
    }
}
