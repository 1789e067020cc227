//! Triangle-soup import and export.
//!
//! The kernel's outer packaging talks to mesh toolkits in flat triangle
//! arrays; these two functions are the whole contract. Import trusts the
//! caller to supply a closed manifold, but degenerate triangles are skipped
//! rather than crashing.

use crate::errors::GeometryError;
use crate::float_types::Real;
use crate::solid::Solid;
use crate::solid::polygon::Polygon;
use crate::solid::vertex::Vertex;
use nalgebra::Point3;
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> Solid<S> {
    /// Build a solid from a triangle array, one 3-vertex polygon per
    /// triangle, all carrying `shared`. The result is neither canonicalized
    /// nor retesselated. Non-finite coordinates are rejected; zero-area
    /// triangles are silently dropped.
    pub fn from_triangles(
        triangles: &[[Point3<Real>; 3]],
        shared: Option<S>,
    ) -> Result<Solid<S>, GeometryError> {
        let mut polygons = Vec::with_capacity(triangles.len());
        for corners in triangles {
            for point in corners {
                if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
                    return Err(GeometryError::NonFiniteCoordinate(*point));
                }
            }
            let vertices = corners.iter().map(|&point| Vertex::new(point)).collect();
            match Polygon::new(vertices, shared.clone()) {
                Ok(polygon) => polygons.push(polygon),
                Err(GeometryError::DegeneratePlane) => continue,
                Err(error) => return Err(error),
            }
        }
        Ok(Solid::from_polygons(polygons))
    }

    /// Flatten to a triangle stream, fanning each k-gon into k - 2
    /// triangles.
    pub fn to_triangles(&self) -> Vec<[Vertex; 3]> {
        self.polygons
            .iter()
            .flat_map(|polygon| polygon.triangulate())
            .collect()
    }
}
