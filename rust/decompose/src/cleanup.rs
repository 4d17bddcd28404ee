// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon cleanup
//!
//! Strips coincident and collinear vertices left behind by fusing, and
//! normalizes winding against the face normal.

use nalgebra::Vector3;

use crate::config::DecomposeConfig;
use crate::polygon::{polygon_area, signed_area, Polygon};
use crate::vertex::Vertex;

/// Drop exact consecutive duplicates, including a closing point that
/// repeats the first one.
pub fn sanitize_loop(points: &[Vertex]) -> Polygon {
    let mut result: Polygon = Vec::with_capacity(points.len());
    for v in points {
        if result.last() != Some(v) {
            result.push(*v);
        }
    }
    while result.len() > 1 && result.first() == result.last() {
        result.pop();
    }
    result
}

/// Reverse the loop if it winds clockwise around `normal`
pub fn orient_to(points: &[Vertex], normal: &Vector3<f64>) -> Polygon {
    if signed_area(points, normal) < 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Strip coincident and collinear vertices, then orient to `normal`.
///
/// A vertex is only removed when the loop's area stays within
/// `cleanup_area_tolerance` of the input area, so true corners survive even
/// when they are very flat. Triangles are never reduced.
pub fn clean_polygon(points: &[Vertex], normal: &Vector3<f64>, config: &DecomposeConfig) -> Polygon {
    let mut polygon = orient_to(points, normal);
    if polygon.len() <= 3 {
        return polygon;
    }

    let reference = polygon_area(&polygon);
    while polygon.len() > 3 {
        let removable = (0..polygon.len()).find(|&i| {
            is_redundant(&polygon, i, config)
                && area_after_removal(&polygon, i).map_or(false, |area| {
                    (area - reference).abs() <= config.cleanup_area_tolerance
                })
        });

        match removable {
            Some(index) => {
                polygon.remove(index);
            }
            None => break,
        }
    }

    polygon
}

/// Coincident with its predecessor, or collinear with both neighbours
fn is_redundant(polygon: &[Vertex], index: usize, config: &DecomposeConfig) -> bool {
    let n = polygon.len();
    let prev = &polygon[(index + n - 1) % n];
    let current = &polygon[index];
    let next = &polygon[(index + 1) % n];

    prev.distance(current) < config.vertex_tolerance
        || collinearity(prev, current, next) < config.collinear_tolerance
}

/// Sine of the angle between the incoming and outgoing edge, unsigned
fn collinearity(prev: &Vertex, current: &Vertex, next: &Vertex) -> f64 {
    let incoming = prev.to(current);
    let outgoing = current.to(next);
    let scale = incoming.norm() * outgoing.norm();
    if scale < 1e-300 {
        return 0.0;
    }
    incoming.cross(&outgoing).norm() / scale
}

fn area_after_removal(polygon: &[Vertex], index: usize) -> Option<f64> {
    if polygon.len() <= 3 {
        return None;
    }
    let remaining: Polygon = polygon
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, v)| *v)
        .collect();
    Some(polygon_area(&remaining))
}
