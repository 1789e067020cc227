//! Quantized deduplication of near-identical geometric values.
//!
//! Boolean operations leave behind vertices and planes that are equal up to
//! floating point noise. A [`FuzzyFactory`] collapses tuples within a
//! tolerance of each other onto a single stored instance: the first tuple
//! inserted fixes the canonical value, and every corner of its quantization
//! cell is seeded in the index so any later tuple within one quantum
//! resolves to it.

use crate::float_types::{EPSILON, Real};
use crate::solid::plane::Plane;
use crate::solid::polygon::Polygon;
use crate::solid::vertex::Vertex;
use hashbrown::HashMap;
use std::hash::Hash;

/// Quantized lookup collapsing `dimensions`-tuples within `tolerance` onto
/// one representative.
///
/// Lookups cost one hash; inserts cost `2^dimensions` hashes to seed the
/// cell corners. The tag returned alongside each element is its creation
/// ordinal, unique within this factory, so tag equality is identity.
#[derive(Debug, Clone)]
pub struct FuzzyFactory<T> {
    lookup: HashMap<Vec<i64>, u32>,
    elements: Vec<T>,
    multiplier: Real,
    dimensions: usize,
}

impl<T> FuzzyFactory<T> {
    pub fn new(dimensions: usize, tolerance: Real) -> Self {
        FuzzyFactory {
            lookup: HashMap::new(),
            elements: Vec::new(),
            multiplier: 1.0 / tolerance,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolve `values` to its canonical element, creating it with `make`
    /// on first sight.
    pub fn lookup_or_create(
        &mut self,
        values: &[Real],
        make: impl FnOnce(&[Real]) -> T,
    ) -> (u32, &T) {
        debug_assert_eq!(values.len(), self.dimensions);
        let key: Vec<i64> = values
            .iter()
            .map(|v| (v * self.multiplier).round() as i64)
            .collect();
        if let Some(&tag) = self.lookup.get(&key) {
            return (tag, &self.elements[tag as usize]);
        }

        let tag = self.elements.len() as u32;
        self.elements.push(make(values));

        // Seed every corner of the quantization cell. The rounded key above
        // is always one of these corners.
        let floors: Vec<i64> = values
            .iter()
            .map(|v| (v * self.multiplier).floor() as i64)
            .collect();
        for corner in 0..(1u32 << self.dimensions) {
            let corner_key: Vec<i64> = floors
                .iter()
                .enumerate()
                .map(|(axis, &floor)| floor + i64::from(corner >> axis & 1))
                .collect();
            self.lookup.insert(corner_key, tag);
        }
        (tag, &self.elements[tag as usize])
    }
}

/// A polygon resolved through a [`FuzzySolidFactory`], with the tags that
/// identify its plane and shared surface data within that factory.
#[derive(Debug, Clone)]
pub struct CanonicalPolygon<S: Clone> {
    pub polygon: Polygon<S>,
    pub plane_tag: u32,
    pub shared_tag: u32,
}

/// The factory bundle used to canonicalize one solid: vertices by position,
/// planes by normal and offset, shared surface data by content.
#[derive(Debug, Clone)]
pub struct FuzzySolidFactory<S: Clone + Hash + Eq> {
    vertices: FuzzyFactory<Vertex>,
    planes: FuzzyFactory<Plane>,
    shared: HashMap<Option<S>, u32>,
}

impl<S: Clone + Hash + Eq> Default for FuzzySolidFactory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Hash + Eq> FuzzySolidFactory<S> {
    pub fn new() -> Self {
        FuzzySolidFactory {
            vertices: FuzzyFactory::new(3, EPSILON),
            planes: FuzzyFactory::new(4, EPSILON),
            shared: HashMap::new(),
        }
    }

    pub fn get_vertex(&mut self, vertex: Vertex) -> (u32, Vertex) {
        let (tag, canonical) = self
            .vertices
            .lookup_or_create(&[vertex.pos.x, vertex.pos.y, vertex.pos.z], |_| vertex);
        (tag, *canonical)
    }

    pub fn get_plane(&mut self, plane: Plane) -> (u32, Plane) {
        let normal = plane.normal();
        let (tag, canonical) = self
            .planes
            .lookup_or_create(&[normal.x, normal.y, normal.z, plane.offset()], |_| plane);
        (tag, *canonical)
    }

    pub fn get_shared(&mut self, shared: &Option<S>) -> u32 {
        let next = self.shared.len() as u32;
        *self.shared.entry(shared.clone()).or_insert(next)
    }

    /// Remap a polygon through the factories. Consecutive vertices that
    /// collapse onto the same canonical instance are dropped, the closing
    /// pair included; a polygon left with fewer than three vertices is
    /// degenerate and yields `None`.
    pub fn get_polygon(&mut self, source: &Polygon<S>) -> Option<CanonicalPolygon<S>> {
        let (plane_tag, plane) = self.get_plane(source.plane);
        let shared_tag = self.get_shared(&source.shared);

        let tagged: Vec<(u32, Vertex)> = source
            .vertices
            .iter()
            .map(|&vertex| self.get_vertex(vertex))
            .collect();

        let mut vertices = Vec::with_capacity(tagged.len());
        let mut previous_tag = tagged.last().map(|&(tag, _)| tag);
        for (tag, vertex) in tagged {
            if Some(tag) != previous_tag {
                vertices.push(vertex);
            }
            previous_tag = Some(tag);
        }

        if vertices.len() < 3 {
            return None;
        }
        Some(CanonicalPolygon {
            polygon: Polygon::with_plane(vertices, plane, source.shared.clone()),
            plane_tag,
            shared_tag,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn nearby_tuples_resolve_to_the_first_instance() {
        let mut factory: FuzzyFactory<[Real; 3]> = FuzzyFactory::new(3, EPSILON);
        let (tag_a, _) = factory.lookup_or_create(&[1.0, 2.0, 3.0], |v| [v[0], v[1], v[2]]);
        let nudged = [1.0 + 0.4 * EPSILON, 2.0 - 0.4 * EPSILON, 3.0];
        let (tag_b, element) = factory.lookup_or_create(&nudged, |v| [v[0], v[1], v[2]]);
        assert_eq!(tag_a, tag_b);
        assert_eq!(*element, [1.0, 2.0, 3.0]);
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn distant_tuples_stay_distinct() {
        let mut factory: FuzzyFactory<Real> = FuzzyFactory::new(1, EPSILON);
        let (tag_a, _) = factory.lookup_or_create(&[0.0], |v| v[0]);
        let (tag_b, _) = factory.lookup_or_create(&[3.0 * EPSILON], |v| v[0]);
        assert_ne!(tag_a, tag_b);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn shared_data_collapses_by_content() {
        let mut factory: FuzzySolidFactory<&str> = FuzzySolidFactory::new();
        let red = factory.get_shared(&Some("red"));
        let blue = factory.get_shared(&Some("blue"));
        let red_again = factory.get_shared(&Some("red"));
        assert_eq!(red, red_again);
        assert_ne!(red, blue);
    }

    #[test]
    fn near_duplicate_vertices_degenerate_the_polygon() {
        let mut factory: FuzzySolidFactory<()> = FuzzySolidFactory::new();
        // A sliver triangle whose third vertex sits within EPSILON of the
        // second collapses to two distinct vertices and is dropped.
        let sliver = Polygon::with_plane(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0)),
                Vertex::new(Point3::new(1.0, 0.0, 0.0)),
                Vertex::new(Point3::new(1.0, 0.2 * EPSILON, 0.0)),
            ],
            Plane::from_normal(nalgebra::Vector3::z(), 0.0),
            None,
        );
        assert!(factory.get_polygon(&sliver).is_none());
    }
}
