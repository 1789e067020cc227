//! `Solid` struct and implementations of the boolean and transform traits.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::properties::Properties;
use crate::solid::bsp::BspTree;
use crate::solid::polygon::Polygon;
use crate::traits::{BooleanOps, TransformOps};
use nalgebra::{Matrix4, Point3};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::OnceLock;

pub mod bsp;
pub mod canonicalize;
pub mod fuzzy;
pub mod ortho_basis;
pub mod plane;
pub mod poly_tree;
pub mod polygon;
pub mod retessellate;
pub mod triangles;
pub mod vertex;

/// A closed solid bounded by coplanar convex polygons.
///
/// Solids are value objects: every operation returns a new one, leaving the
/// operands untouched. `S` is the opaque per-surface data carried on each
/// polygon.
#[derive(Debug, Clone)]
pub struct Solid<S: Clone + Send + Sync + Debug> {
    /// The boundary polygons.
    pub polygons: Vec<Polygon<S>>,

    /// Named annotations that follow the solid through transforms.
    pub properties: Properties,

    /// Lazily calculated AABB that spans `polygons`.
    pub bounding_box: OnceLock<Aabb>,

    /// Whether near-duplicate vertices and planes have been collapsed.
    pub is_canonicalized: bool,

    /// Whether coplanar fragments have been re-merged.
    pub is_retesselated: bool,
}

impl<S: Clone + Send + Sync + Debug> Solid<S> {
    /// Build a Solid from an existing polygon list.
    pub fn from_polygons(polygons: Vec<Polygon<S>>) -> Self {
        Solid {
            polygons,
            properties: Properties::new(),
            bounding_box: OnceLock::new(),
            is_canonicalized: false,
            is_retesselated: false,
        }
    }

    /// False when the bounding boxes are disjoint on some axis (or either
    /// solid is empty); the solids then cannot intersect and the boolean
    /// fast paths apply.
    pub fn may_overlap(&self, other: &Solid<S>) -> bool {
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return false;
        }
        let mine = self.bounding_box();
        let theirs = other.bounding_box();
        mine.maxs.x >= theirs.mins.x
            && mine.mins.x <= theirs.maxs.x
            && mine.maxs.y >= theirs.mins.y
            && mine.mins.y <= theirs.maxs.y
            && mine.maxs.z >= theirs.mins.z
            && mine.mins.z <= theirs.maxs.z
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Solid<S> {
    /// Union without the finishing passes, for chaining.
    fn union_sub(&self, other: &Solid<S>) -> Solid<S> {
        if !self.may_overlap(other) {
            // Disjoint bounds: the union is the concatenation, no BSP
            // needed.
            let mut polygons = self.polygons.clone();
            polygons.extend(other.polygons.iter().cloned());
            let mut result = Solid::from_polygons(polygons);
            result.properties = self.properties.merge(&other.properties);
            result.is_canonicalized = self.is_canonicalized && other.is_canonicalized;
            result.is_retesselated = self.is_retesselated && other.is_retesselated;
            return result;
        }

        let mut a = BspTree::from_polygons(self.polygons.clone());
        let mut b = BspTree::from_polygons(other.polygons.clone());

        a.clip_to(&b, false);
        b.clip_to(&a, false);
        // Clipping B's inverse against A also removes B's faces coplanar
        // with A's, so no facet ends up covered twice.
        b.invert();
        b.clip_to(&a, false);
        b.invert();

        let mut polygons = a.all_polygons();
        polygons.extend(b.all_polygons());
        let mut result = Solid::from_polygons(polygons);
        result.properties = self.properties.merge(&other.properties);
        result
    }

    /// Difference without the finishing passes, for chaining.
    fn difference_sub(&self, other: &Solid<S>) -> Solid<S> {
        if !self.may_overlap(other) {
            // Nothing of `other` can be inside `self`.
            let mut result = self.clone();
            result.properties = self.properties.merge(&other.properties);
            return result;
        }

        let mut a = BspTree::from_polygons(self.polygons.clone());
        let mut b = BspTree::from_polygons(other.polygons.clone());

        a.invert();
        a.clip_to(&b, false);
        // The second clip removes B's faces coplanar with A's, taking the
        // cut surface from A instead of duplicating it. The sequence is
        // asymmetric on purpose.
        b.clip_to(&a, true);
        a.add_polygons(b.all_polygons());
        a.invert();

        let mut result = Solid::from_polygons(a.all_polygons());
        result.properties = self.properties.merge(&other.properties);
        result
    }

    /// Intersection without the finishing passes, for chaining.
    fn intersection_sub(&self, other: &Solid<S>) -> Solid<S> {
        if !self.may_overlap(other) {
            // Disjoint bounds: the intersection is empty.
            let mut result = Solid::from_polygons(Vec::new());
            result.properties = self.properties.merge(&other.properties);
            return result;
        }

        let mut a = BspTree::from_polygons(self.polygons.clone());
        let mut b = BspTree::from_polygons(other.polygons.clone());

        a.invert();
        b.clip_to(&a, false);
        b.invert();
        a.clip_to(&b, false);
        b.clip_to(&a, false);
        a.add_polygons(b.all_polygons());
        a.invert();

        let mut result = Solid::from_polygons(a.all_polygons());
        result.properties = self.properties.merge(&other.properties);
        result
    }

    /// Finishing passes applied to every boolean result before it is
    /// returned.
    fn finished(self) -> Solid<S> {
        self.retesselated().canonicalized()
    }

    /// Union of `self` with every solid in `others`, paired up in a
    /// balanced binary tree so BSP depth stays bounded on long chains. The
    /// finishing passes run once, on the final result.
    pub fn union_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut queue: Vec<Solid<S>> = Vec::with_capacity(others.len() * 2 + 1);
        queue.push(self.clone());
        queue.extend(others.iter().cloned());
        let mut index = 1;
        while index < queue.len() {
            let merged = queue[index - 1].union_sub(&queue[index]);
            queue.push(merged);
            index += 2;
        }
        queue.pop().unwrap().finished()
    }

    /// Subtract every solid in `others` from `self`, left to right.
    pub fn difference_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut result = self.clone();
        for other in others {
            result = result.difference_sub(other);
        }
        result.finished()
    }

    /// Intersect `self` with every solid in `others`, left to right.
    pub fn intersection_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut result = self.clone();
        for other in others {
            result = result.intersection_sub(other);
        }
        result.finished()
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> BooleanOps for Solid<S> {
    type Output = Solid<S>;

    /// Return a new Solid representing the union of the two solids.
    ///
    /// ```text
    /// let c = a.union(&b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn union(&self, other: &Solid<S>) -> Solid<S> {
        self.union_sub(other).finished()
    }

    /// Return a new Solid representing the difference of the two solids.
    ///
    /// ```text
    /// let c = a.difference(&b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn difference(&self, other: &Solid<S>) -> Solid<S> {
        self.difference_sub(other).finished()
    }

    /// Return a new Solid representing the intersection of the two solids.
    ///
    /// ```text
    /// let c = a.intersection(&b);
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn intersection(&self, other: &Solid<S>) -> Solid<S> {
        self.intersection_sub(other).finished()
    }

    /// Return a new Solid representing space in exactly one of the two
    /// solids.
    fn xor(&self, other: &Solid<S>) -> Solid<S> {
        // A \ B
        let a_sub_b = self.difference(other);

        // B \ A
        let b_sub_a = other.difference(self);

        // Union those two
        a_sub_b.union(&b_sub_a)
    }
}

impl<S: Clone + Send + Sync + Debug> TransformOps for Solid<S> {
    /// Returns a new empty Solid.
    fn new() -> Self {
        Solid::from_polygons(Vec::new())
    }

    /// Apply an arbitrary affine transform. Vertices transform
    /// homogeneously, planes by the inverse transpose rule; a mirroring
    /// transform reverses every winding so normals stay outward. The
    /// solid's properties are transformed along with its geometry.
    fn transform(&self, matrix: &Matrix4<Real>) -> Solid<S> {
        let mirroring = matrix.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0;

        let mut solid = self.clone();
        for polygon in &mut solid.polygons {
            for vertex in &mut polygon.vertices {
                vertex.pos = matrix.transform_point(&vertex.pos);
            }
            if mirroring {
                polygon.vertices.reverse();
            }
            polygon.plane = polygon.plane.transformed(matrix);

            // Invalidate the polygon's cached bounds
            polygon.bounding_box = OnceLock::new();
            polygon.bounding_sphere = OnceLock::new();
        }
        solid.properties = self.properties.transform(matrix);
        solid.bounding_box = OnceLock::new();
        // Moved vertices may no longer coincide with their canonical
        // representatives.
        solid.is_canonicalized = false;
        solid
    }

    /// Returns an [`Aabb`] indicating the 3D bounds of all `polygons`.
    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut min_x = Real::MAX;
            let mut min_y = Real::MAX;
            let mut min_z = Real::MAX;
            let mut max_x = -Real::MAX;
            let mut max_y = -Real::MAX;
            let mut max_z = -Real::MAX;

            for polygon in &self.polygons {
                for vertex in &polygon.vertices {
                    min_x = min_x.min(vertex.pos.x);
                    min_y = min_y.min(vertex.pos.y);
                    min_z = min_z.min(vertex.pos.z);
                    max_x = max_x.max(vertex.pos.x);
                    max_y = max_y.max(vertex.pos.y);
                    max_z = max_z.max(vertex.pos.z);
                }
            }

            // No polygons: a trivial AABB at the origin.
            if min_x > max_x {
                return Aabb::new(Point3::origin(), Point3::origin());
            }

            Aabb::new(
                Point3::new(min_x, min_y, min_z),
                Point3::new(max_x, max_y, max_z),
            )
        })
    }

    /// Invert this Solid (flip inside vs. outside).
    fn inverse(&self) -> Solid<S> {
        let mut solid = self.clone();
        for polygon in &mut solid.polygons {
            polygon.flip();
        }
        solid
    }
}
