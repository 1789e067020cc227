//! Rebuilding a solid so geometrically-equal elements become identical.

use crate::solid::Solid;
use crate::solid::fuzzy::FuzzySolidFactory;
use std::fmt::Debug;
use std::hash::Hash;

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Solid<S> {
    /// Collapse vertices and planes within tolerance of each other onto
    /// single representatives and drop polygons that degenerate in the
    /// process. After this, bitwise equality of vertices and planes is
    /// geometric identity. Idempotent.
    #[must_use]
    pub fn canonicalized(&self) -> Solid<S> {
        if self.is_canonicalized {
            return self.clone();
        }
        let mut factory = FuzzySolidFactory::new();
        let polygons = self
            .polygons
            .iter()
            .filter_map(|polygon| factory.get_polygon(polygon))
            .map(|canonical| canonical.polygon)
            .collect();

        let mut result = Solid::from_polygons(polygons);
        result.properties = self.properties.clone();
        result.is_canonicalized = true;
        result.is_retesselated = self.is_retesselated;
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::float_types::EPSILON;
    use crate::solid::polygon::Polygon;
    use crate::solid::vertex::Vertex;
    use nalgebra::Point3;

    fn jittered_quads() -> Solid<()> {
        // Two quads that should share an edge but disagree by a fraction of
        // the tolerance.
        let nudge = 0.3 * EPSILON;
        Solid::from_polygons(vec![
            Polygon::new(
                vec![
                    Vertex::new(Point3::new(0.0, 0.0, 0.0)),
                    Vertex::new(Point3::new(1.0, 0.0, 0.0)),
                    Vertex::new(Point3::new(1.0, 1.0, 0.0)),
                    Vertex::new(Point3::new(0.0, 1.0, 0.0)),
                ],
                None,
            )
            .unwrap(),
            Polygon::new(
                vec![
                    Vertex::new(Point3::new(1.0 + nudge, nudge, 0.0)),
                    Vertex::new(Point3::new(2.0, 0.0, 0.0)),
                    Vertex::new(Point3::new(2.0, 1.0, 0.0)),
                    Vertex::new(Point3::new(1.0 - nudge, 1.0 + nudge, 0.0)),
                ],
                None,
            )
            .unwrap(),
        ])
    }

    #[test]
    fn near_duplicate_vertices_become_identical() {
        let canonical = jittered_quads().canonicalized();
        assert!(canonical.is_canonicalized);
        assert_eq!(canonical.polygons.len(), 2);
        // The shared edge now uses the exact same vertex values.
        assert_eq!(
            canonical.polygons[0].vertices[1],
            canonical.polygons[1].vertices[0]
        );
        assert_eq!(
            canonical.polygons[0].vertices[2],
            canonical.polygons[1].vertices[3]
        );
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = jittered_quads().canonicalized();
        let twice = once.canonicalized();
        assert_eq!(once.polygons.len(), twice.polygons.len());
        for (a, b) in once.polygons.iter().zip(&twice.polygons) {
            assert_eq!(a.vertices, b.vertices);
        }
    }
}
