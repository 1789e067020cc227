//! Derivation forest over polygons.
//!
//! Every polygon fed into a BSP gets a node here; splitting a polygon adds
//! its fragments as children while the ancestor keeps its own polygon. As
//! long as no descendant is removed, [`PolyTree::get_polygons`] re-emits the
//! intact ancestor as a single polygon, so a solid does not accumulate a
//! sliver per historical cut. Removing a fragment invalidates the polygons
//! of its ancestors, at which point the surviving fragments take over.
//!
//! Nodes live in an arena owned by one boolean operation and are never
//! freed individually; removal is a sticky flag plus detachment.

use crate::float_types::EPSILON;
use crate::solid::plane::{Plane, PolygonSplit};
use crate::solid::polygon::Polygon;

/// Index of a node within a [`PolyTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolyNodeId(u32);

#[derive(Debug, Clone)]
struct PolyNode<S: Clone> {
    parent: Option<PolyNodeId>,
    children: Vec<PolyNodeId>,
    polygon: Option<Polygon<S>>,
    removed: bool,
}

#[derive(Debug, Clone)]
pub struct PolyTree<S: Clone> {
    nodes: Vec<PolyNode<S>>,
}

impl<S: Clone> Default for PolyTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> PolyTree<S> {
    /// An empty forest: a root node holding only children.
    pub fn new() -> Self {
        PolyTree {
            nodes: vec![PolyNode {
                parent: None,
                children: Vec::new(),
                polygon: None,
                removed: false,
            }],
        }
    }

    pub const fn root(&self) -> PolyNodeId {
        PolyNodeId(0)
    }

    fn node(&self, id: PolyNodeId) -> &PolyNode<S> {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: PolyNodeId) -> &mut PolyNode<S> {
        &mut self.nodes[id.0 as usize]
    }

    /// Add a polygon as a direct child of the root.
    pub fn add_polygon(&mut self, polygon: Polygon<S>) -> PolyNodeId {
        self.add_child(self.root(), polygon)
    }

    pub fn add_polygons(&mut self, polygons: Vec<Polygon<S>>) -> Vec<PolyNodeId> {
        polygons
            .into_iter()
            .map(|polygon| self.add_polygon(polygon))
            .collect()
    }

    /// Append a child holding one fragment of `parent`'s polygon.
    fn add_child(&mut self, parent: PolyNodeId, polygon: Polygon<S>) -> PolyNodeId {
        let id = PolyNodeId(self.nodes.len() as u32);
        self.nodes.push(PolyNode {
            parent: Some(parent),
            children: Vec::new(),
            polygon: Some(polygon),
            removed: false,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    pub fn is_removed(&self, id: PolyNodeId) -> bool {
        self.node(id).removed
    }

    /// The live polygon of a leaf. Panics on a node whose polygon has been
    /// invalidated; callers must check their node lists first.
    pub fn get_polygon(&self, id: PolyNodeId) -> &Polygon<S> {
        self.node(id)
            .polygon
            .as_ref()
            .expect("polygon tree node has no polygon")
    }

    /// Collect the polygons below `id`, breadth first. A node that still
    /// carries its own polygon is emitted as that single polygon; only
    /// invalidated nodes recurse into their fragments.
    pub fn get_polygons(&self, id: PolyNodeId, result: &mut Vec<Polygon<S>>) {
        let mut queue = vec![id];
        let mut index = 0;
        while index < queue.len() {
            let node = self.node(queue[index]);
            index += 1;
            if let Some(polygon) = &node.polygon {
                result.push(polygon.clone());
            } else {
                queue.extend_from_slice(&node.children);
            }
        }
    }

    /// Flip every polygon held anywhere in the forest, un-split ancestors
    /// included.
    pub fn invert(&mut self) {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            if let Some(polygon) = &mut node.polygon {
                polygon.flip();
            }
            let children = self.node(id).children.clone();
            stack.extend(children);
        }
    }

    /// Split the subtree at `id` by `plane`, pushing the resulting node ids
    /// into the four buckets. Interior nodes descend to their live leaves;
    /// a leaf is split via its polygon, spawning child nodes for spanning
    /// fragments.
    pub fn split_by_plane(
        &mut self,
        id: PolyNodeId,
        plane: &Plane,
        coplanar_front: &mut Vec<PolyNodeId>,
        coplanar_back: &mut Vec<PolyNodeId>,
        front: &mut Vec<PolyNodeId>,
        back: &mut Vec<PolyNodeId>,
    ) {
        if self.node(id).children.is_empty() {
            self.split_leaf(id, plane, coplanar_front, coplanar_back, front, back);
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for child in self.node(current).children.clone() {
                if !self.node(child).children.is_empty() {
                    stack.push(child);
                } else if self.node(child).polygon.is_some() {
                    self.split_leaf(child, plane, coplanar_front, coplanar_back, front, back);
                }
            }
        }
    }

    fn split_leaf(
        &mut self,
        id: PolyNodeId,
        plane: &Plane,
        coplanar_front: &mut Vec<PolyNodeId>,
        coplanar_back: &mut Vec<PolyNodeId>,
        front: &mut Vec<PolyNodeId>,
        back: &mut Vec<PolyNodeId>,
    ) {
        let Some(polygon) = &self.node(id).polygon else {
            return;
        };

        // Cheap sphere-vs-plane test before the full split. The radius is
        // padded so a polygon grazing the plane still goes through exact
        // classification.
        let sphere = polygon.bounding_sphere();
        let sphere_radius = sphere.radius + EPSILON;
        let distance = plane.signed_distance_to(&sphere.center);
        if distance > sphere_radius {
            front.push(id);
        } else if distance < -sphere_radius {
            back.push(id);
        } else {
            match plane.split_polygon(polygon) {
                PolygonSplit::CoplanarFront => coplanar_front.push(id),
                PolygonSplit::CoplanarBack => coplanar_back.push(id),
                PolygonSplit::Front => front.push(id),
                PolygonSplit::Back => back.push(id),
                PolygonSplit::Spanning {
                    front: front_fragment,
                    back: back_fragment,
                } => {
                    if let Some(fragment) = front_fragment {
                        front.push(self.add_child(id, fragment));
                    }
                    if let Some(fragment) = back_fragment {
                        back.push(self.add_child(id, fragment));
                    }
                }
            }
        }
    }

    /// Remove a leaf: detach it from its parent and invalidate every
    /// ancestor's polygon, since the larger polygon is no longer fully
    /// present. Removal is sticky.
    pub fn remove(&mut self, id: PolyNodeId) {
        if self.node(id).removed {
            return;
        }
        assert!(
            self.node(id).children.is_empty(),
            "cannot remove a polygon tree node with live children"
        );
        let parent = self
            .node(id)
            .parent
            .expect("cannot remove the root of a polygon tree");

        self.node_mut(id).removed = true;
        self.node_mut(id).polygon = None;

        let position = self
            .node(parent)
            .children
            .iter()
            .position(|&child| child == id)
            .expect("node missing from its parent's children");
        self.node_mut(parent).children.remove(position);

        // Walk up invalidating un-split ancestors; a node whose polygon is
        // already gone means everything above it is, too.
        let mut current = Some(parent);
        while let Some(node_id) = current {
            let node = self.node_mut(node_id);
            if node.polygon.is_none() {
                break;
            }
            node.polygon = None;
            current = node.parent;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solid::vertex::Vertex;
    use nalgebra::{Point3, Vector3};

    fn square() -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::new(Point3::new(-1.0, -1.0, 0.0)),
                Vertex::new(Point3::new(1.0, -1.0, 0.0)),
                Vertex::new(Point3::new(1.0, 1.0, 0.0)),
                Vertex::new(Point3::new(-1.0, 1.0, 0.0)),
            ],
            None,
        )
        .unwrap()
    }

    fn split_x0(tree: &mut PolyTree<()>, id: PolyNodeId) -> (Vec<PolyNodeId>, Vec<PolyNodeId>) {
        let plane = Plane::from_normal(Vector3::x(), 0.0);
        let (mut cf, mut cb, mut front, mut back) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        tree.split_by_plane(id, &plane, &mut cf, &mut cb, &mut front, &mut back);
        assert!(cf.is_empty() && cb.is_empty());
        (front, back)
    }

    #[test]
    fn intact_ancestor_reemits_as_one_polygon() {
        let mut tree = PolyTree::new();
        let id = tree.add_polygon(square());
        let (front, back) = split_x0(&mut tree, id);
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);

        // Both fragments live: the un-split square is still the output.
        let mut polygons = Vec::new();
        tree.get_polygons(tree.root(), &mut polygons);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].vertices.len(), 4);
    }

    #[test]
    fn removal_invalidates_ancestors() {
        let mut tree = PolyTree::new();
        let id = tree.add_polygon(square());
        let (front, back) = split_x0(&mut tree, id);
        tree.remove(back[0]);
        assert!(tree.is_removed(back[0]));

        let mut polygons = Vec::new();
        tree.get_polygons(tree.root(), &mut polygons);
        assert_eq!(polygons.len(), 1);
        // Only the front fragment survives; all its x coordinates are >= 0.
        for v in &polygons[0].vertices {
            assert!(v.pos.x >= -EPSILON);
        }
        assert_eq!(tree.get_polygon(front[0]).vertices.len(), 4);
    }

    #[test]
    fn invert_flips_fragments_and_ancestors() {
        let mut tree = PolyTree::new();
        let id = tree.add_polygon(square());
        let (front, _back) = split_x0(&mut tree, id);
        tree.invert();

        let mut polygons = Vec::new();
        tree.get_polygons(tree.root(), &mut polygons);
        approx::assert_relative_eq!(polygons[0].plane.normal(), -Vector3::z());
        approx::assert_relative_eq!(tree.get_polygon(front[0]).plane.normal(), -Vector3::z());
    }

    #[test]
    fn coplanar_buckets_respect_orientation() {
        let mut tree = PolyTree::new();
        let id = tree.add_polygon(square());
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let (mut cf, mut cb, mut front, mut back) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        tree.split_by_plane(id, &plane, &mut cf, &mut cb, &mut front, &mut back);
        assert_eq!(cf, vec![id]);
        assert!(cb.is_empty() && front.is_empty() && back.is_empty());

        let mut tree = PolyTree::new();
        let id = tree.add_polygon(square().flipped());
        let (mut cf, mut cb, mut front, mut back) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        tree.split_by_plane(id, &plane, &mut cf, &mut cb, &mut front, &mut back);
        assert_eq!(cb, vec![id]);
        assert!(cf.is_empty() && front.is_empty() && back.is_empty());
    }
}
