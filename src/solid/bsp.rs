//! BSP trees used to clip one solid against another.
//!
//! A [`BspTree`] owns two structures: the [`PolyTree`] holding every polygon
//! ever added together with its split history, and an arena of spatial
//! nodes indexing references into it. The polygon tree is the authoritative
//! geometry; clipping never copies polygons out, it removes polygon tree
//! nodes in place.
//!
//! All traversals run on explicit work stacks so deeply split inputs cannot
//! exhaust the call stack.

use crate::solid::plane::Plane;
use crate::solid::poly_tree::{PolyNodeId, PolyTree};
use crate::solid::polygon::Polygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BspNodeId(u32);

const ROOT: BspNodeId = BspNodeId(0);

#[derive(Debug, Clone)]
struct BspNode {
    /// Splitting plane, or `None` until the first polygons arrive.
    plane: Option<Plane>,
    front: Option<BspNodeId>,
    back: Option<BspNodeId>,
    /// Polygon tree nodes lying on `plane`.
    polygon_nodes: Vec<PolyNodeId>,
}

impl BspNode {
    const fn new() -> Self {
        BspNode {
            plane: None,
            front: None,
            back: None,
            polygon_nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BspTree<S: Clone> {
    poly_tree: PolyTree<S>,
    nodes: Vec<BspNode>,
}

impl<S: Clone> BspTree<S> {
    pub fn new() -> Self {
        BspTree {
            poly_tree: PolyTree::new(),
            nodes: vec![BspNode::new()],
        }
    }

    pub fn from_polygons(polygons: Vec<Polygon<S>>) -> Self {
        let mut tree = Self::new();
        tree.add_polygons(polygons);
        tree
    }

    fn node(&self, id: BspNodeId) -> &BspNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: BspNodeId) -> &mut BspNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Register polygons in the polygon tree and file them into the spatial
    /// index.
    pub fn add_polygons(&mut self, polygons: Vec<Polygon<S>>) {
        let node_ids = self.poly_tree.add_polygons(polygons);
        self.add_polygon_tree_nodes(node_ids);
    }

    /// Insert polygon tree nodes starting at the root. A node without a
    /// plane adopts the plane of the first polygon it is offered; no
    /// balancing heuristic is applied.
    fn add_polygon_tree_nodes(&mut self, node_ids: Vec<PolyNodeId>) {
        let mut stack = vec![(ROOT, node_ids)];
        while let Some((bsp_id, ids)) = stack.pop() {
            if ids.is_empty() {
                continue;
            }
            if self.node(bsp_id).plane.is_none() {
                let plane = self.poly_tree.get_polygon(ids[0]).plane;
                self.node_mut(bsp_id).plane = Some(plane);
            }
            let plane = self.node(bsp_id).plane.unwrap();

            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for id in ids {
                self.poly_tree.split_by_plane(
                    id,
                    &plane,
                    &mut coplanar_front,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
            }

            // Both coplanar orientations are filed at this node.
            let node = self.node_mut(bsp_id);
            node.polygon_nodes.extend(coplanar_front);
            node.polygon_nodes.extend(coplanar_back);

            if !front.is_empty() {
                let front_id = self.child(bsp_id, Side::Front);
                stack.push((front_id, front));
            }
            if !back.is_empty() {
                let back_id = self.child(bsp_id, Side::Back);
                stack.push((back_id, back));
            }
        }
    }

    fn child(&mut self, parent: BspNodeId, side: Side) -> BspNodeId {
        let existing = match side {
            Side::Front => self.node(parent).front,
            Side::Back => self.node(parent).back,
        };
        existing.unwrap_or_else(|| {
            let id = BspNodeId(self.nodes.len() as u32);
            self.nodes.push(BspNode::new());
            match side {
                Side::Front => self.node_mut(parent).front = Some(id),
                Side::Back => self.node_mut(parent).back = Some(id),
            }
            id
        })
    }

    /// Swap solid and empty space: flip every plane and polygon, swap the
    /// front and back subtrees.
    pub fn invert(&mut self) {
        self.poly_tree.invert();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            if let Some(plane) = &mut node.plane {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
            stack.extend(node.front.into_iter().chain(node.back));
        }
    }

    /// Remove everything in this tree that lies inside `other`.
    ///
    /// With `remove_coplanar_front` set, faces coplanar with (and facing the
    /// same way as) `other`'s faces are removed too, which is how difference
    /// avoids duplicating the cut surface.
    pub fn clip_to(&mut self, other: &BspTree<S>, remove_coplanar_front: bool) {
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node_ids = self.node(id).polygon_nodes.clone();
            if !node_ids.is_empty() {
                other.clip_polygon_nodes(&mut self.poly_tree, node_ids, remove_coplanar_front);
            }
            if let Some(front) = self.node(id).front {
                stack.push(front);
            }
            if let Some(back) = self.node(id).back {
                stack.push(back);
            }
        }
    }

    /// Classify `node_ids` (which live in `poly_tree`) against this BSP,
    /// removing everything that ends up inside the solid.
    ///
    /// A polygon reaching a missing front subtree is outside and survives
    /// untouched; one reaching a missing back subtree is inside and its
    /// polygon tree node is removed, invalidating its ancestors.
    fn clip_polygon_nodes(
        &self,
        poly_tree: &mut PolyTree<S>,
        node_ids: Vec<PolyNodeId>,
        remove_coplanar_front: bool,
    ) {
        let mut stack = vec![(ROOT, node_ids)];
        while let Some((bsp_id, ids)) = stack.pop() {
            let node = self.node(bsp_id);
            let Some(plane) = node.plane else {
                // An empty tree clips nothing.
                continue;
            };

            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for id in ids {
                if !poly_tree.is_removed(id) {
                    poly_tree.split_by_plane(
                        id,
                        &plane,
                        &mut coplanar_front,
                        &mut coplanar_back,
                        &mut front,
                        &mut back,
                    );
                }
            }
            if remove_coplanar_front {
                back.extend(coplanar_front);
            } else {
                front.extend(coplanar_front);
            }
            back.extend(coplanar_back);

            if let Some(front_id) = node.front {
                if !front.is_empty() {
                    stack.push((front_id, front));
                }
            }
            match node.back {
                Some(back_id) if !back.is_empty() => stack.push((back_id, back)),
                Some(_) => {}
                None => {
                    // Nothing behind this plane: these polygons are inside
                    // the solid.
                    for id in back {
                        poly_tree.remove(id);
                    }
                }
            }
        }
    }

    /// Harvest the surviving polygons, re-joining historically split but
    /// still intact polygons into single pieces.
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        self.poly_tree.get_polygons(self.poly_tree.root(), &mut result);
        result
    }
}

impl<S: Clone> Default for BspTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

enum Side {
    Front,
    Back,
}
