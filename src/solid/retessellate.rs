//! Re-joining coplanar convex fragments into larger convex polygons.
//!
//! Boolean operations cut polygons along every BSP plane they meet, so a
//! face that survives intact still comes out as a patchwork of fragments.
//! This pass groups the result by (plane, shared surface data), projects
//! each group into 2D, and sweeps it in horizontal strips, gluing adjacent
//! quads back together as long as the combined outline stays convex. The
//! sweep is deterministic for a given input order and tolerance.

use crate::float_types::{EPSILON, Real};
use crate::solid::Solid;
use crate::solid::fuzzy::FuzzySolidFactory;
use crate::solid::ortho_basis::{
    Line2D, OrthoNormalBasis, interpolate_between_2d_points_for_y,
};
use crate::solid::polygon::Polygon;
use crate::solid::vertex::Vertex;
use hashbrown::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

#[cfg(feature = "f64")]
#[inline]
fn y_key(y: Real) -> u64 {
    y.to_bits()
}

#[cfg(feature = "f32")]
#[inline]
fn y_key(y: Real) -> u64 {
    u64::from(y.to_bits())
}

/// A source polygon crossing the current sweep strip. `left_vertex_index`
/// and `right_vertex_index` track the 2D ring positions bracketing the
/// strip; the four corner points are the polygon's outline at the strip's
/// top and bottom.
struct ActivePolygon {
    polygon_index: usize,
    left_vertex_index: usize,
    right_vertex_index: usize,
    top_left: nalgebra::Point2<Real>,
    top_right: nalgebra::Point2<Real>,
    bottom_left: nalgebra::Point2<Real>,
    bottom_right: nalgebra::Point2<Real>,
}

/// One quad of output being assembled for the current strip.
struct OutQuad {
    top_left: nalgebra::Point2<Real>,
    top_right: nalgebra::Point2<Real>,
    bottom_left: nalgebra::Point2<Real>,
    bottom_right: nalgebra::Point2<Real>,
    left_line: Line2D,
    right_line: Line2D,
    /// Index of the output chain this quad extends, once assigned.
    chain: Option<usize>,
    left_line_continues: bool,
    right_line_continues: bool,
}

/// An output polygon under construction: its left and right boundary
/// chains, joined on close-out as right + reversed left.
#[derive(Default)]
struct OutChain {
    left_points: Vec<nalgebra::Point2<Real>>,
    right_points: Vec<nalgebra::Point2<Real>>,
}

/// Merge a group of coplanar polygons sharing one (plane, shared) tag into
/// the coarsest convex decomposition reachable by horizontal strips,
/// appending the result to `destination`.
pub(crate) fn retessellate_coplanar_polygons<S: Clone>(
    source_polygons: &[Polygon<S>],
    destination: &mut Vec<Polygon<S>>,
) {
    let num_polygons = source_polygons.len();
    if num_polygons == 0 {
        return;
    }
    let plane = source_polygons[0].plane;
    let shared = source_polygons[0].shared.clone();
    let basis = OrthoNormalBasis::new(&plane);

    // 2D rings per polygon, plus per-y bookkeeping: which polygons touch a
    // given y, and which start (have their topmost vertex) there.
    let mut polygon_vertices_2d: Vec<Vec<nalgebra::Point2<Real>>> =
        Vec::with_capacity(num_polygons);
    let mut polygon_top_vertex_indexes: Vec<usize> = Vec::with_capacity(num_polygons);
    let mut y_to_polygons: HashMap<u64, (Real, HashSet<usize>)> = HashMap::new();
    let mut top_y_to_polygons: HashMap<u64, Vec<usize>> = HashMap::new();

    // Nearly identical y coordinates from different source polygons are
    // snapped to one value so horizontal edges line up exactly.
    let mut y_coordinate_bins: HashMap<i64, Real> = HashMap::new();
    let y_coordinate_binning_factor = 1.0 / EPSILON * 10.0;

    for (polygon_index, polygon) in source_polygons.iter().enumerate() {
        let num_vertices = polygon.vertices.len();
        let mut vertices_2d: Vec<nalgebra::Point2<Real>> = Vec::with_capacity(num_vertices);
        let mut min_index = 0;
        let mut min_y = 0.0;
        let mut max_y = 0.0;
        for (i, vertex) in polygon.vertices.iter().enumerate() {
            let mut position = basis.project(&vertex.pos);
            let bin = (position.y * y_coordinate_binning_factor).floor() as i64;
            let new_y = if let Some(&snapped) = y_coordinate_bins.get(&bin) {
                snapped
            } else if let Some(&snapped) = y_coordinate_bins.get(&(bin + 1)) {
                snapped
            } else if let Some(&snapped) = y_coordinate_bins.get(&(bin - 1)) {
                snapped
            } else {
                y_coordinate_bins.insert(bin, position.y);
                position.y
            };
            position = nalgebra::Point2::new(position.x, new_y);
            vertices_2d.push(position);
            let y = position.y;
            if i == 0 || y < min_y {
                min_y = y;
                min_index = i;
            }
            if i == 0 || y > max_y {
                max_y = y;
            }
            y_to_polygons
                .entry(y_key(y))
                .or_insert_with(|| (y, HashSet::new()))
                .1
                .insert(polygon_index);
        }
        if min_y >= max_y {
            // All vertices snapped onto one y: the polygon has no area in
            // the sweep direction. Keep its y events but never activate it.
            vertices_2d.clear();
        } else {
            top_y_to_polygons
                .entry(y_key(min_y))
                .or_default()
                .push(polygon_index);
        }
        // Reverse so the sweep sees counter-clockwise rings.
        vertices_2d.reverse();
        let top_index = if vertices_2d.is_empty() {
            0
        } else {
            vertices_2d.len() - min_index - 1
        };
        polygon_vertices_2d.push(vertices_2d);
        polygon_top_vertex_indexes.push(top_index);
    }

    let mut y_coordinates: Vec<Real> = y_to_polygons.values().map(|&(y, _)| y).collect();
    y_coordinates.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // Sweep top to bottom. Per strip, the active polygons stay sorted left
    // to right; their strip slices become quads, merged horizontally when
    // they share an edge and continued vertically while convexity allows.
    let mut active_polygons: Vec<ActivePolygon> = Vec::new();
    let mut previous_out_row: Vec<OutQuad> = Vec::new();
    let mut chains: Vec<OutChain> = Vec::new();

    for y_index in 0..y_coordinates.len() {
        let y = y_coordinates[y_index];
        let polygons_with_corner = &y_to_polygons[&y_key(y)].1;

        // Advance or retire active polygons that have a corner here.
        let mut active_index = 0;
        while active_index < active_polygons.len() {
            let active = &mut active_polygons[active_index];
            if !polygons_with_corner.contains(&active.polygon_index) {
                active_index += 1;
                continue;
            }
            let vertices_2d = &polygon_vertices_2d[active.polygon_index];
            let num_vertices = vertices_2d.len();
            let mut new_left = active.left_vertex_index;
            let mut new_right = active.right_vertex_index;
            loop {
                let next_left = if new_left + 1 >= num_vertices { 0 } else { new_left + 1 };
                if vertices_2d[next_left].y != y {
                    break;
                }
                new_left = next_left;
            }
            let next_right = if new_right == 0 { num_vertices - 1 } else { new_right - 1 };
            if vertices_2d[next_right].y == y {
                new_right = next_right;
            }
            if new_left != active.left_vertex_index && new_left == new_right {
                // Left and right met: this is the polygon's bottom point.
                active_polygons.remove(active_index);
            } else {
                active.left_vertex_index = new_left;
                active.right_vertex_index = new_right;
                active.top_left = vertices_2d[new_left];
                active.top_right = vertices_2d[new_right];
                let below_left = if new_left + 1 >= num_vertices { 0 } else { new_left + 1 };
                active.bottom_left = vertices_2d[below_left];
                let below_right = if new_right == 0 { num_vertices - 1 } else { new_right - 1 };
                active.bottom_right = vertices_2d[below_right];
                active_index += 1;
            }
        }

        let next_y = if y_index + 1 >= y_coordinates.len() {
            // Last row: every polygon must have finished by now.
            active_polygons.clear();
            None
        } else {
            let next_y = y_coordinates[y_index + 1];
            let middle_y = 0.5 * (y + next_y);

            // Insert polygons whose topmost vertex lies on this y, sorted
            // by x at the strip midline.
            if let Some(starting) = top_y_to_polygons.get(&y_key(y)) {
                for &polygon_index in starting {
                    let vertices_2d = &polygon_vertices_2d[polygon_index];
                    let num_vertices = vertices_2d.len();
                    let top_vertex_index = polygon_top_vertex_indexes[polygon_index];

                    // The top may be a horizontal edge; find its left and
                    // right ends.
                    let mut top_left_vertex_index = top_vertex_index;
                    loop {
                        let i = if top_left_vertex_index + 1 >= num_vertices {
                            0
                        } else {
                            top_left_vertex_index + 1
                        };
                        if vertices_2d[i].y != y || i == top_vertex_index {
                            break;
                        }
                        top_left_vertex_index = i;
                    }
                    let mut top_right_vertex_index = top_vertex_index;
                    loop {
                        let i = if top_right_vertex_index == 0 {
                            num_vertices - 1
                        } else {
                            top_right_vertex_index - 1
                        };
                        if vertices_2d[i].y != y || i == top_left_vertex_index {
                            break;
                        }
                        top_right_vertex_index = i;
                    }

                    let below_left = if top_left_vertex_index + 1 >= num_vertices {
                        0
                    } else {
                        top_left_vertex_index + 1
                    };
                    let below_right = if top_right_vertex_index == 0 {
                        num_vertices - 1
                    } else {
                        top_right_vertex_index - 1
                    };
                    let new_active = ActivePolygon {
                        polygon_index,
                        left_vertex_index: top_left_vertex_index,
                        right_vertex_index: top_right_vertex_index,
                        top_left: vertices_2d[top_left_vertex_index],
                        top_right: vertices_2d[top_right_vertex_index],
                        bottom_left: vertices_2d[below_left],
                        bottom_right: vertices_2d[below_right],
                    };
                    let new_x = interpolate_between_2d_points_for_y(
                        &new_active.top_left,
                        &new_active.bottom_left,
                        middle_y,
                    );
                    let insert_at = active_polygons.partition_point(|existing| {
                        interpolate_between_2d_points_for_y(
                            &existing.top_left,
                            &existing.bottom_left,
                            middle_y,
                        ) < new_x
                    });
                    active_polygons.insert(insert_at, new_active);
                }
            }
            Some(next_y)
        };

        // Slice every active polygon at this strip, merging neighbors that
        // share an edge within tolerance.
        let mut new_out_row: Vec<OutQuad> = Vec::new();
        if let Some(next_y) = next_y {
            for active in &active_polygons {
                let top_left = nalgebra::Point2::new(
                    interpolate_between_2d_points_for_y(&active.top_left, &active.bottom_left, y),
                    y,
                );
                let top_right = nalgebra::Point2::new(
                    interpolate_between_2d_points_for_y(&active.top_right, &active.bottom_right, y),
                    y,
                );
                let bottom_left = nalgebra::Point2::new(
                    interpolate_between_2d_points_for_y(
                        &active.top_left,
                        &active.bottom_left,
                        next_y,
                    ),
                    next_y,
                );
                let bottom_right = nalgebra::Point2::new(
                    interpolate_between_2d_points_for_y(
                        &active.top_right,
                        &active.bottom_right,
                        next_y,
                    ),
                    next_y,
                );
                let mut quad = OutQuad {
                    top_left,
                    top_right,
                    bottom_left,
                    bottom_right,
                    left_line: Line2D::from_points(&top_left, &bottom_left),
                    right_line: Line2D::from_points(&bottom_right, &top_right),
                    chain: None,
                    left_line_continues: false,
                    right_line_continues: false,
                };
                if let Some(previous) = new_out_row.last() {
                    let top_gap = (quad.top_left - previous.top_right).norm();
                    let bottom_gap = (quad.bottom_left - previous.bottom_right).norm();
                    if top_gap < EPSILON && bottom_gap < EPSILON {
                        // Join with the quad to the left.
                        quad.top_left = previous.top_left;
                        quad.left_line = previous.left_line;
                        quad.bottom_left = previous.bottom_left;
                        new_out_row.pop();
                    }
                }
                new_out_row.push(quad);
            }
        }

        if y_index > 0 {
            // Match this row against the previous one; an unmatched
            // previous quad closes its output polygon.
            let mut previous_continued = vec![false; previous_out_row.len()];
            let mut matched = vec![false; previous_out_row.len()];
            for quad in &mut new_out_row {
                for (previous_index, previous) in previous_out_row.iter().enumerate() {
                    if matched[previous_index] {
                        continue;
                    }
                    if (previous.bottom_left - quad.top_left).norm() < EPSILON
                        && (previous.bottom_right - quad.top_right).norm() < EPSILON
                    {
                        matched[previous_index] = true;
                        // The joined polygon stays convex only if the left
                        // boundary keeps bending right and the right
                        // boundary keeps bending left.
                        let left_bend =
                            quad.left_line.direction().x - previous.left_line.direction().x;
                        let right_bend =
                            quad.right_line.direction().x - previous.right_line.direction().x;
                        let left_line_continues = left_bend.abs() < EPSILON;
                        let right_line_continues = right_bend.abs() < EPSILON;
                        let left_convex = left_line_continues || left_bend >= 0.0;
                        let right_convex = right_line_continues || right_bend >= 0.0;
                        if left_convex && right_convex {
                            quad.chain = previous.chain;
                            quad.left_line_continues = left_line_continues;
                            quad.right_line_continues = right_line_continues;
                            previous_continued[previous_index] = true;
                        }
                        break;
                    }
                }
            }
            for (previous_index, previous) in previous_out_row.iter().enumerate() {
                if previous_continued[previous_index] {
                    continue;
                }
                // Close the chain: final right point, a bottom-left point
                // unless the bottom edge is degenerate, then right chain
                // plus reversed left chain is the full outline.
                let chain_index = previous.chain.expect("row quad without an output chain");
                let chain = &mut chains[chain_index];
                chain.right_points.push(previous.bottom_right);
                if (previous.bottom_right - previous.bottom_left).norm() > EPSILON {
                    chain.left_points.push(previous.bottom_left);
                }
                let mut points_2d = std::mem::take(&mut chain.right_points);
                let mut left_points = std::mem::take(&mut chain.left_points);
                left_points.reverse();
                points_2d.extend(left_points);
                if points_2d.len() >= 3 {
                    let vertices = points_2d
                        .iter()
                        .map(|point| Vertex::new(basis.unproject(point)))
                        .collect();
                    destination.push(Polygon::with_plane(vertices, plane, shared.clone()));
                }
            }
        }

        for quad in &mut new_out_row {
            match quad.chain {
                None => {
                    // A fresh output polygon starts at this quad.
                    let mut chain = OutChain::default();
                    chain.left_points.push(quad.top_left);
                    if (quad.top_left - quad.top_right).norm() > EPSILON {
                        // Horizontal line at the top.
                        chain.right_points.push(quad.top_right);
                    }
                    quad.chain = Some(chains.len());
                    chains.push(chain);
                }
                Some(chain_index) => {
                    let chain = &mut chains[chain_index];
                    if !quad.left_line_continues {
                        chain.left_points.push(quad.top_left);
                    }
                    if !quad.right_line_continues {
                        chain.right_points.push(quad.top_right);
                    }
                }
            }
        }
        previous_out_row = new_out_row;
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Solid<S> {
    /// Re-join coplanar adjacent convex fragments into larger convex
    /// polygons. Groups are keyed by canonicalized plane and shared surface
    /// data; single-polygon groups pass through untouched. Idempotent.
    #[must_use]
    pub fn retesselated(&self) -> Solid<S> {
        if self.is_retesselated {
            return self.clone();
        }
        let mut factory = FuzzySolidFactory::new();
        let mut groups: HashMap<(u32, u32), Vec<Polygon<S>>> = HashMap::new();
        // Hash maps iterate in arbitrary order; remember first-seen order
        // so the output is deterministic.
        let mut group_order: Vec<(u32, u32)> = Vec::new();
        for polygon in &self.polygons {
            if let Some(canonical) = factory.get_polygon(polygon) {
                let key = (canonical.plane_tag, canonical.shared_tag);
                groups
                    .entry(key)
                    .or_insert_with(|| {
                        group_order.push(key);
                        Vec::new()
                    })
                    .push(canonical.polygon);
            }
        }

        let mut destination = Vec::new();
        for key in &group_order {
            let source_polygons = groups.remove(key).unwrap();
            if source_polygons.len() < 2 {
                destination.extend(source_polygons);
            } else {
                retessellate_coplanar_polygons(&source_polygons, &mut destination);
            }
        }

        let mut result = Solid::from_polygons(destination);
        result.properties = self.properties.clone();
        result.is_retesselated = true;
        result
    }
}
