//! Projection of coplanar geometry into 2D and back.

use crate::float_types::Real;
use crate::solid::plane::Plane;
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// A right-handed orthonormal basis `(u, v)` spanning a plane, rooted at the
/// point of the plane closest to the origin. Projecting with `u` pointing
/// right and `v` pointing up preserves the winding sense seen from the
/// plane's front side.
#[derive(Debug, Clone, Copy)]
pub struct OrthoNormalBasis {
    u: Vector3<Real>,
    v: Vector3<Real>,
    origin: Point3<Real>,
}

impl OrthoNormalBasis {
    pub fn new(plane: &Plane) -> Self {
        let normal = plane.normal();
        // Any vector not parallel to the normal does; the axis of the
        // normal's smallest component is the safest pick.
        let absolute = normal.abs();
        let right: Vector3<Real> = if absolute.x <= absolute.y && absolute.x <= absolute.z {
            Vector3::x()
        } else if absolute.y <= absolute.z {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let v = normal.cross(&right).normalize();
        let u = v.cross(&normal);
        OrthoNormalBasis {
            u,
            v,
            origin: Point3::from(normal * plane.offset()),
        }
    }

    pub fn project(&self, point: &Point3<Real>) -> Point2<Real> {
        Point2::new(point.coords.dot(&self.u), point.coords.dot(&self.v))
    }

    pub fn unproject(&self, point: &Point2<Real>) -> Point3<Real> {
        self.origin + self.u * point.x + self.v * point.y
    }
}

/// A 2D line in normal-offset form, `{ p : normal · p = w }`.
#[derive(Debug, Clone, Copy)]
pub struct Line2D {
    normal: Vector2<Real>,
    w: Real,
}

impl Line2D {
    /// Line through two points, oriented so its direction runs from `p1`
    /// towards `p2`.
    pub fn from_points(p1: &Point2<Real>, p2: &Point2<Real>) -> Self {
        let direction = p2 - p1;
        let normal = Vector2::new(-direction.y, direction.x).normalize();
        Line2D {
            normal,
            w: p1.coords.dot(&normal),
        }
    }

    /// Unit direction along the line.
    pub fn direction(&self) -> Vector2<Real> {
        Vector2::new(self.normal.y, -self.normal.x)
    }

    /// The x coordinate where the line crosses height `y`. Horizontal lines
    /// have no single answer; callers must not ask for one.
    pub fn x_at_y(&self, y: Real) -> Real {
        (self.w - self.normal.y * y) / self.normal.x
    }
}

/// The x coordinate of the segment `p1 -> p2` at height `y`, clamped to the
/// segment so near-horizontal edges give a stable answer.
pub fn interpolate_between_2d_points_for_y(
    p1: &Point2<Real>,
    p2: &Point2<Real>,
    y: Real,
) -> Real {
    let mut f1 = y - p1.y;
    let mut f2 = p2.y - p1.y;
    if f2 < 0.0 {
        f1 = -f1;
        f2 = -f2;
    }
    let t = if f1 <= 0.0 {
        0.0
    } else if f1 >= f2 {
        1.0
    } else if f2 < 1e-10 {
        0.5
    } else {
        f1 / f2
    };
    p1.x + t * (p2.x - p1.x)
}
