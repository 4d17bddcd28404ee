// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hole removal
//!
//! Bridges every hole to the outer boundary with triangulation diagonals and
//! walks the bridged boundary into one simple "slit" polygon. Each bridge is
//! traversed once in each direction, so it shows up as a zero-width slit and
//! its endpoints appear twice in the output.
//!
//! The bridges form a spanning tree over the boundary loops, found with
//! Kruskal's algorithm on the unweighted diagonal graph. At a vertex carrying
//! several bridges the walk takes them in clockwise order starting from the
//! incoming boundary edge, which keeps the result free of crossings.

use std::f64::consts::TAU;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Error, Result};
use crate::polygon::{PlaneBasis, Polygon};
use crate::triangulation::{classify_edges, EdgeClassification};
use crate::union_find::UnionFind;
use crate::vertex::{Edge, Triangle, Vertex};

/// Bridge partners of one vertex, in the order the walk takes them
pub type JumpList = SmallVec<[Vertex; 2]>;

/// Vertex -> bridge partners, clockwise from the incoming boundary edge
pub type JumpMap = FxHashMap<Vertex, JumpList>;

/// Result of hole removal
#[derive(Debug, Clone, PartialEq)]
pub struct SlitPolygon {
    /// Single loop with bridge endpoints repeated
    pub vertices: Polygon,
    /// Diagonals used as bridges
    pub cuts: Vec<Edge>,
    /// Boundary loops the face had (outer + holes)
    pub loops: usize,
}

/// Predecessor and successor of every boundary vertex along its loop.
#[derive(Debug, Default)]
struct BoundaryLinks {
    next: FxHashMap<Vertex, Vertex>,
    prev: FxHashMap<Vertex, Vertex>,
}

impl BoundaryLinks {
    fn from_edges(outside: &[Edge]) -> Result<Self> {
        let mut links = Self::default();
        for edge in outside {
            if links.next.insert(edge.start, edge.end).is_some() {
                return Err(Error::DegenerateTriangulation(format!(
                    "Boundary loops touch at {}",
                    edge.start
                )));
            }
            if links.prev.insert(edge.end, edge.start).is_some() {
                return Err(Error::DegenerateTriangulation(format!(
                    "Boundary loops touch at {}",
                    edge.end
                )));
            }
        }
        Ok(links)
    }

    fn next(&self, v: &Vertex) -> Result<Vertex> {
        self.next.get(v).copied().ok_or_else(|| {
            Error::DegenerateTriangulation(format!("Boundary loop is open after {}", v))
        })
    }

    fn prev(&self, v: &Vertex) -> Result<Vertex> {
        self.prev.get(v).copied().ok_or_else(|| {
            Error::DegenerateTriangulation(format!("Boundary loop is open before {}", v))
        })
    }
}

/// Remove the holes of a triangulated face.
///
/// A face without holes comes back as its boundary loop with no cuts.
pub fn remove_holes(triangles: &[Triangle]) -> Result<SlitPolygon> {
    let edges = classify_edges(triangles)?;
    remove_holes_classified(triangles, &edges)
}

/// Same as [`remove_holes`] for callers that already classified the edges.
pub fn remove_holes_classified(
    triangles: &[Triangle],
    edges: &EdgeClassification,
) -> Result<SlitPolygon> {
    let (cuts, loops) = find_cut_edges(edges)?;
    let links = BoundaryLinks::from_edges(&edges.outside)?;

    let basis = triangles
        .iter()
        .find_map(PlaneBasis::from_triangle)
        .ok_or_else(|| {
            Error::DegenerateTriangulation("Every triangle has zero area".to_string())
        })?;

    let jumps = build_jump_map(&cuts, &links, &basis)?;

    let limit = edges.outside.len() + 2 * cuts.len();

    // A spanning tree has fewer edges than the loops have vertices, so some
    // boundary vertex carries no bridge.
    let start = edges
        .outside
        .iter()
        .map(|e| e.start)
        .find(|v| !jumps.contains_key(v))
        .ok_or(Error::InvalidReconstruction { limit })?;

    let vertices = reconstruct(start, &links, &jumps, limit)?;

    debug!(
        loops,
        cuts = cuts.len(),
        vertices = vertices.len(),
        "Removed holes"
    );

    Ok(SlitPolygon {
        vertices,
        cuts,
        loops,
    })
}

/// Kruskal over the diagonals: every diagonal joining two still separate
/// boundary loops becomes a cut. Returns the cuts and the number of loops.
pub fn find_cut_edges(edges: &EdgeClassification) -> Result<(Vec<Edge>, usize)> {
    let mut forest = UnionFind::new();
    let mut boundary = FxHashSet::default();
    for edge in &edges.outside {
        forest.union(&edge.start, &edge.end);
        boundary.insert(edge.start);
        boundary.insert(edge.end);
    }

    let loops = forest.set_count();
    let mut components = loops;
    let mut cuts = Vec::with_capacity(loops.saturating_sub(1));

    for edge in &edges.inside {
        if components <= 1 {
            break;
        }
        // Steiner points are not on any loop and cannot bridge
        if !boundary.contains(&edge.start) || !boundary.contains(&edge.end) {
            continue;
        }
        if forest.union(&edge.start, &edge.end) {
            cuts.push(*edge);
            components -= 1;
        }
    }

    if components > 1 {
        return Err(Error::DegenerateTriangulation(format!(
            "{} boundary loops are not connected by any diagonal",
            components
        )));
    }

    Ok((cuts, loops))
}

/// Group cut partners per vertex and order them clockwise, measured from
/// the direction towards the vertex's boundary predecessor.
fn build_jump_map(cuts: &[Edge], links: &BoundaryLinks, basis: &PlaneBasis) -> Result<JumpMap> {
    let mut jumps = JumpMap::default();
    for cut in cuts {
        jumps.entry(cut.start).or_default().push(cut.end);
        jumps.entry(cut.end).or_default().push(cut.start);
    }

    for (vertex, partners) in jumps.iter_mut() {
        if partners.len() < 2 {
            continue;
        }
        let control = links.prev(vertex)?;
        let reference = basis.angle(&vertex.to(&control));
        let clockwise =
            |other: &Vertex| (reference - basis.angle(&vertex.to(other))).rem_euclid(TAU);
        partners.sort_by(|a, b| clockwise(a).total_cmp(&clockwise(b)));
    }

    Ok(jumps)
}

/// Walk the bridged boundary starting at `start`.
///
/// Leaving a vertex, the walk takes the next exit after the one it arrived
/// through, in the order `[bridges..., boundary successor]` (arriving along
/// the boundary counts as position zero). Every boundary edge is used once
/// and every bridge twice, so a correct walk emits exactly `limit` vertices.
fn reconstruct(
    start: Vertex,
    links: &BoundaryLinks,
    jumps: &JumpMap,
    limit: usize,
) -> Result<Polygon> {
    let empty = JumpList::new();
    let mut polygon = Vec::with_capacity(limit);
    let mut current = start;
    let mut came_from = links.prev(&start)?;

    loop {
        if polygon.len() >= limit {
            return Err(Error::InvalidReconstruction { limit });
        }
        polygon.push(current);

        let partners = jumps.get(&current).unwrap_or(&empty);
        let position = if came_from == links.prev(&current)? {
            0
        } else {
            match partners.iter().position(|p| *p == came_from) {
                Some(index) => index + 1,
                None => return Err(Error::InvalidReconstruction { limit }),
            }
        };

        let next = match partners.get(position) {
            Some(partner) => *partner,
            None => links.next(&current)?,
        };

        came_from = current;
        current = next;
        if current == start {
            break;
        }
    }

    if polygon.len() != limit {
        return Err(Error::InvalidReconstruction { limit });
    }
    Ok(polygon)
}
