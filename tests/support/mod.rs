//! Test support library
//! Provides various helper functions & utilities for tests.

#![allow(dead_code)]

use csgcore::float_types::Real;
use csgcore::solid::Solid;
use csgcore::solid::polygon::Polygon;
use csgcore::solid::vertex::Vertex;
use nalgebra::Point3;

/// Returns the approximate bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// for a set of polygons.
pub fn bounding_box(polygons: &[Polygon<()>]) -> [Real; 6] {
    let mut min_x = Real::MAX;
    let mut min_y = Real::MAX;
    let mut min_z = Real::MAX;
    let mut max_x = Real::MIN;
    let mut max_y = Real::MIN;
    let mut max_z = Real::MIN;

    for poly in polygons {
        for v in &poly.vertices {
            let p = v.pos;
            if p.x < min_x {
                min_x = p.x;
            }
            if p.y < min_y {
                min_y = p.y;
            }
            if p.z < min_z {
                min_z = p.z;
            }
            if p.x > max_x {
                max_x = p.x;
            }
            if p.y > max_y {
                max_y = p.y;
            }
            if p.z > max_z {
                max_z = p.z;
            }
        }
    }

    [min_x, min_y, min_z, max_x, max_y, max_z]
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

pub fn assert_bounds(solid: &Solid<()>, expected: [Real; 6], eps: Real) {
    let actual = bounding_box(&solid.polygons);
    for (index, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            approx_eq(*a, *e, eps),
            "bounds component {index}: expected {e}, got {a} (all: {actual:?})"
        );
    }
}

/// Helper to make a simple Polygon in 3D with given vertices.
/// The plane is derived from the first three points.
pub fn make_polygon_3d(points: &[[Real; 3]]) -> Polygon<()> {
    let verts = points
        .iter()
        .map(|p| Vertex::new(Point3::new(p[0], p[1], p[2])))
        .collect();
    Polygon::new(verts, None).unwrap()
}

/// Axis-aligned cube of the given side length around `center`, as 6 quads
/// with outward windings.
pub fn cube_at(side: Real, center: [Real; 3]) -> Solid<()> {
    const FACES: [[[Real; 3]; 4]; 6] = [
        // Left face (-x)
        [
            [-1.0, -1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, 1.0],
            [-1.0, 1.0, -1.0],
        ],
        // Right face (+x)
        [
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [1.0, 1.0, 1.0],
            [1.0, -1.0, 1.0],
        ],
        // Bottom face (-y)
        [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, -1.0, 1.0],
            [-1.0, -1.0, 1.0],
        ],
        // Top face (+y)
        [
            [-1.0, 1.0, -1.0],
            [-1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, -1.0],
        ],
        // Back face (-z)
        [
            [-1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
        ],
        // Front face (+z)
        [
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
    ];

    let half = side * 0.5;
    let polygons = FACES
        .iter()
        .map(|face| {
            let corners: Vec<[Real; 3]> = face
                .iter()
                .map(|corner| {
                    [
                        center[0] + half * corner[0],
                        center[1] + half * corner[1],
                        center[2] + half * corner[2],
                    ]
                })
                .collect();
            make_polygon_3d(&corners)
        })
        .collect();
    Solid::from_polygons(polygons)
}

/// Unit-style cube of side `side` centered at the origin.
pub fn cube(side: Real) -> Solid<()> {
    cube_at(side, [0.0, 0.0, 0.0])
}

/// Area of a convex planar polygon via the cross product sum.
pub fn polygon_area(polygon: &Polygon<()>) -> Real {
    let n = polygon.vertices.len();
    let mut doubled = nalgebra::Vector3::zeros();
    for i in 0..n {
        let a = polygon.vertices[i].pos.coords;
        let b = polygon.vertices[(i + 1) % n].pos.coords;
        doubled += a.cross(&b);
    }
    doubled.norm() * 0.5
}

/// Total surface area of a solid.
pub fn surface_area(solid: &Solid<()>) -> Real {
    solid.polygons.iter().map(polygon_area).sum()
}

/// True when both solids hold the same polygons up to reordering of the
/// polygon list and rotation of each vertex ring, with positions compared
/// within `eps`.
pub fn same_polygon_set(a: &Solid<()>, b: &Solid<()>, eps: Real) -> bool {
    if a.polygons.len() != b.polygons.len() {
        return false;
    }
    let mut used = vec![false; b.polygons.len()];
    for poly_a in &a.polygons {
        let mut found = false;
        for (index, poly_b) in b.polygons.iter().enumerate() {
            if !used[index] && same_ring(poly_a, poly_b, eps) {
                used[index] = true;
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
    }
    true
}

fn same_ring(a: &Polygon<()>, b: &Polygon<()>, eps: Real) -> bool {
    let n = a.vertices.len();
    if n != b.vertices.len() {
        return false;
    }
    (0..n).any(|offset| {
        (0..n).all(|i| {
            (a.vertices[i].pos - b.vertices[(i + offset) % n].pos).norm() < eps
        })
    })
}
