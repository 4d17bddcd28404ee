// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangulation graph
//!
//! Splits the edges of a triangulated face into boundary edges (used by one
//! triangle) and diagonals (shared by two).

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::vertex::{Edge, Triangle};

/// Edges of a triangulation, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeClassification {
    /// Boundary edges of the outer loop and of every hole, directed as they
    /// appear in their triangle. Chained together they wind each loop with
    /// the face interior on the left.
    pub outside: Vec<Edge>,
    /// Diagonals introduced by the triangulator, in arbitrary direction.
    pub inside: Vec<Edge>,
}

/// How often a normalized edge was seen and in which direction first.
struct EdgeUse {
    first: Edge,
    count: usize,
}

/// Classify every distinct edge of `triangles` as outside or inside.
///
/// Fails with [`Error::DegenerateTriangulation`] when there are no triangles,
/// a triangle repeats a vertex, an edge is used more than twice, or two
/// triangles traverse a shared edge in the same direction.
pub fn classify_edges(triangles: &[Triangle]) -> Result<EdgeClassification> {
    if triangles.is_empty() {
        return Err(Error::DegenerateTriangulation(
            "Triangulation produced no triangles".to_string(),
        ));
    }

    let mut order: Vec<Edge> = Vec::with_capacity(triangles.len() * 2);
    let mut uses: FxHashMap<Edge, EdgeUse> = FxHashMap::default();

    for triangle in triangles {
        if triangle.has_repeated_vertex() {
            return Err(Error::DegenerateTriangulation(format!(
                "Triangle repeats a vertex: {} {} {}",
                triangle.0[0], triangle.0[1], triangle.0[2]
            )));
        }

        for edge in triangle.edges() {
            match uses.entry(edge.normalized()) {
                Entry::Occupied(mut entry) => {
                    let seen = entry.get_mut();
                    if seen.first == edge {
                        return Err(Error::DegenerateTriangulation(format!(
                            "Edge {} -> {} is traversed twice in the same direction",
                            edge.start, edge.end
                        )));
                    }
                    seen.count += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(EdgeUse {
                        first: edge,
                        count: 1,
                    });
                    order.push(edge);
                }
            }
        }
    }

    let mut classification = EdgeClassification::default();
    for edge in order {
        match uses[&edge.normalized()].count {
            1 => classification.outside.push(edge),
            2 => classification.inside.push(edge),
            n => {
                return Err(Error::DegenerateTriangulation(format!(
                    "Edge {} - {} is shared by {} triangles",
                    edge.start, edge.end, n
                )))
            }
        }
    }

    Ok(classification)
}
