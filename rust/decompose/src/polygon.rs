// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon math
//!
//! Normals, areas, convexity and 2D projection for closed vertex loops lying
//! in one plane. No external kernel is involved.

use nalgebra::{Point2, Vector3};

use crate::vertex::{Triangle, Vertex};

/// A closed loop of vertices. The last vertex connects back to the first.
pub type Polygon = Vec<Vertex>;

/// Unit normal following the loop's winding, or `None` for a loop that
/// encloses no area. Concave loops are fine.
pub fn newell_normal(points: &[Vertex]) -> Option<Vector3<f64>> {
    vector_area(points).try_normalize(1e-15)
}

/// Half the sum of fan cross products. Its length is the enclosed area and
/// its direction follows the winding.
pub fn vector_area(points: &[Vertex]) -> Vector3<f64> {
    if points.len() < 3 {
        return Vector3::zeros();
    }

    let p0 = &points[0];
    let mut total = Vector3::zeros();
    for i in 1..points.len() - 1 {
        total += p0.to(&points[i]).cross(&p0.to(&points[i + 1]));
    }
    total * 0.5
}

#[inline]
pub fn polygon_area(points: &[Vertex]) -> f64 {
    vector_area(points).norm()
}

/// Area measured along `normal`: positive when the loop winds
/// counter-clockwise around it.
#[inline]
pub fn signed_area(points: &[Vertex], normal: &Vector3<f64>) -> f64 {
    vector_area(points).dot(normal)
}

/// Sine of the turn at `current` measured around `normal`.
///
/// Positive for a left (convex) turn, negative for a right (reflex) turn.
/// Returns `None` when either adjacent edge has zero length.
pub fn turn(prev: &Vertex, current: &Vertex, next: &Vertex, normal: &Vector3<f64>) -> Option<f64> {
    let incoming = prev.to(current);
    let outgoing = current.to(next);
    let scale = incoming.norm() * outgoing.norm();
    if scale < 1e-300 {
        return None;
    }
    Some(incoming.cross(&outgoing).dot(normal) / scale)
}

/// True when the interior angle at `current` exceeds 180°.
///
/// A zero-width spike (the loop doubles back on itself) counts as reflex.
pub fn is_reflex(
    prev: &Vertex,
    current: &Vertex,
    next: &Vertex,
    normal: &Vector3<f64>,
    epsilon: f64,
) -> bool {
    match turn(prev, current, next, normal) {
        Some(sine) if sine < -epsilon => true,
        Some(sine) if sine.abs() <= epsilon => prev.to(current).dot(&current.to(next)) < 0.0,
        Some(_) => false,
        None => false,
    }
}

/// Check that no vertex of the loop is reflex with respect to `normal`
pub fn is_convex(points: &[Vertex], normal: &Vector3<f64>, epsilon: f64) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        !is_reflex(
            &points[(i + n - 1) % n],
            &points[i],
            &points[(i + 1) % n],
            normal,
            epsilon,
        )
    })
}

/// Indices of reflex vertices
pub fn reflex_vertices(points: &[Vertex], normal: &Vector3<f64>, epsilon: f64) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    (0..n)
        .filter(|&i| {
            is_reflex(
                &points[(i + n - 1) % n],
                &points[i],
                &points[(i + 1) % n],
                normal,
                epsilon,
            )
        })
        .collect()
}

/// Orthonormal frame of a plane.
///
/// `(p, q, normal)` is right-handed, so angles measured with
/// [`PlaneBasis::angle`] grow counter-clockwise around `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub normal: Vector3<f64>,
    pub p: Vector3<f64>,
    pub q: Vector3<f64>,
}

impl PlaneBasis {
    /// Builds the frame from a triangle: `p` runs along its first edge.
    ///
    /// Returns `None` when the triangle is degenerate.
    pub fn from_triangle(triangle: &Triangle) -> Option<Self> {
        let [a, b, _] = triangle.vertices();
        let cross = triangle.cross();
        let cross_len = cross.norm();
        let edge = a.to(b);
        let edge_len = edge.norm();
        if cross_len < 1e-15 || edge_len < 1e-15 {
            return None;
        }

        let normal = cross / cross_len;
        let p = edge / edge_len;
        let q = normal.cross(&p);
        Some(Self { normal, p, q })
    }

    /// Builds a frame around an arbitrary normal, using the world axis least
    /// parallel to it for a stable cross product.
    pub fn from_normal(normal: &Vector3<f64>) -> Self {
        let normal = normal.normalize();
        let reference = Vector3::ith(normal.iamin(), 1.0);

        let p = normal.cross(&reference).normalize();
        let q = normal.cross(&p).normalize();
        Self { normal, p, q }
    }

    /// Polar angle of an in-plane direction, in `(-π, π]`
    #[inline]
    pub fn angle(&self, direction: &Vector3<f64>) -> f64 {
        direction.dot(&self.q).atan2(direction.dot(&self.p))
    }

    #[inline]
    pub fn project(&self, origin: &Vertex, v: &Vertex) -> Point2<f64> {
        let d = origin.to(v);
        Point2::new(d.dot(&self.p), d.dot(&self.q))
    }

    #[inline]
    pub fn lift(&self, origin: &Vertex, p: &Point2<f64>) -> Vertex {
        let v = origin.point() + self.p * p.x + self.q * p.y;
        Vertex::new(v.x, v.y, v.z)
    }

    pub fn project_all(&self, origin: &Vertex, points: &[Vertex]) -> Vec<Point2<f64>> {
        points.iter().map(|v| self.project(origin, v)).collect()
    }
}

/// Nonzero winding test. Either orientation of `contour` works.
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    let n = contour.len();
    if n < 3 {
        return false;
    }

    let mut winding = 0i32;
    for (i, a) in contour.iter().enumerate() {
        let b = &contour[(i + 1) % n];
        let side = (b - a).perp(&(point - a));
        if a.y <= point.y {
            if b.y > point.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding != 0
}

/// Distance from `point` to the segment `a`-`b`
pub fn segment_distance(point: &Vertex, a: &Vertex, b: &Vertex) -> f64 {
    let ab = a.to(b);
    let len_sq = ab.norm_squared();
    if len_sq < 1e-300 {
        return a.distance(point);
    }
    let t = (a.to(point).dot(&ab) / len_sq).clamp(0.0, 1.0);
    let closest = a.point() + ab * t;
    (point.point() - closest).norm()
}
