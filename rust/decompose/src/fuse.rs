// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex decomposition by triangle fusing
//!
//! Every triangle starts as its own piece. Two pieces sharing an edge (with
//! opposite winding) are fused when both corners at the ends of that edge
//! stay convex. Protected regions (window or door openings) change the rule
//! in two ways: an edge on a protected boundary is never fused across, so
//! the opening outline stays a cut, and an edge through a protected interior
//! is always fused across, so the opening never ends up split between
//! pieces.
//!
//! Fusing is greedy: the result depends on triangle order but is
//! deterministic for a fixed order.

use nalgebra::{Point2, Vector3};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::DecomposeConfig;
use crate::polygon::{
    is_convex, is_reflex, point_in_contour, segment_distance, PlaneBasis, Polygon,
};
use crate::vertex::{Edge, Triangle, Vertex};

/// Protected polygons prepared for edge queries.
pub struct ProtectedRegions<'a> {
    regions: Vec<ProtectedRegion<'a>>,
    basis: PlaneBasis,
    origin: Vertex,
    tolerance: f64,
}

struct ProtectedRegion<'a> {
    boundary: &'a [Vertex],
    contour: Vec<Point2<f64>>,
}

impl<'a> ProtectedRegions<'a> {
    pub fn new(protected: &'a [Polygon], normal: &Vector3<f64>, tolerance: f64) -> Self {
        let basis = PlaneBasis::from_normal(normal);
        let valid: Vec<&'a Polygon> = protected.iter().filter(|p| p.len() >= 3).collect();
        let origin = valid
            .first()
            .map(|p| p[0])
            .unwrap_or(Vertex::new(0.0, 0.0, 0.0));

        let regions = valid
            .into_iter()
            .map(|p| ProtectedRegion {
                boundary: p.as_slice(),
                contour: basis.project_all(&origin, p),
            })
            .collect();

        Self {
            regions,
            basis,
            origin,
            tolerance,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// True when `edge` lies on a protected boundary. It must stay a cut.
    pub fn keeps(&self, edge: &Edge) -> bool {
        self.regions.iter().any(|region| self.on_boundary(region, edge))
    }

    /// True when `edge` runs through a protected interior. It must not
    /// remain as a cut.
    pub fn forces_fusion(&self, edge: &Edge) -> bool {
        self.regions
            .iter()
            .any(|region| self.crosses_interior(region, edge))
    }

    /// Both endpoints within tolerance of the same boundary segment
    fn on_boundary(&self, region: &ProtectedRegion<'_>, edge: &Edge) -> bool {
        let boundary = region.boundary;
        let n = boundary.len();
        (0..n).any(|i| {
            let a = &boundary[i];
            let b = &boundary[(i + 1) % n];
            segment_distance(&edge.start, a, b) < self.tolerance
                && segment_distance(&edge.end, a, b) < self.tolerance
        })
    }

    /// Midpoint strictly inside the region
    fn crosses_interior(&self, region: &ProtectedRegion<'_>, edge: &Edge) -> bool {
        let midpoint = edge.midpoint();
        let boundary = region.boundary;
        let n = boundary.len();
        let on_boundary = (0..n).any(|i| {
            segment_distance(&midpoint, &boundary[i], &boundary[(i + 1) % n]) < self.tolerance
        });
        !on_boundary
            && point_in_contour(&self.basis.project(&self.origin, &midpoint), &region.contour)
    }
}

/// Fuse a consistently wound triangulation into convex pieces.
///
/// `normal` is the face normal the triangles wind around. Pieces keep that
/// winding. Only protected regions can leave a piece non-convex.
pub fn fuse_triangles(
    triangles: &[Triangle],
    normal: &Vector3<f64>,
    protected: &[Polygon],
    config: &DecomposeConfig,
) -> Vec<Polygon> {
    let guard = ProtectedRegions::new(protected, normal, config.vertex_tolerance);
    let mut pieces: Vec<Polygon> = triangles.iter().map(|t| t.vertices().to_vec()).collect();

    let mut fused_any = true;
    while fused_any {
        fused_any = false;
        let mut i = 0;
        while i < pieces.len() {
            let mut j = i + 1;
            while j < pieces.len() {
                match try_fuse(&pieces[i], &pieces[j], normal, &guard, config) {
                    Some(merged) => {
                        pieces[i] = merged;
                        pieces.remove(j);
                        fused_any = true;
                        j = i + 1;
                    }
                    None => j += 1,
                }
            }
            i += 1;
        }
    }

    debug!(
        triangles = triangles.len(),
        pieces = pieces.len(),
        protected = protected.len(),
        "Fused triangles"
    );
    pieces
}

/// Fuse two pieces if they share an edge and the result is acceptable.
fn try_fuse(
    a: &[Vertex],
    b: &[Vertex],
    normal: &Vector3<f64>,
    guard: &ProtectedRegions<'_>,
    config: &DecomposeConfig,
) -> Option<Polygon> {
    let shared = shared_edges(a, b);
    let &(i, j) = shared.first()?;

    let edges: Vec<Edge> = shared
        .iter()
        .map(|&(ia, _)| Edge::new(a[ia], a[(ia + 1) % a.len()]))
        .collect();
    if !guard.is_empty() && edges.iter().any(|e| guard.keeps(e)) {
        return None;
    }

    let merged = collapse_spikes(splice(a, i, b, j));
    if merged.len() < 3 || has_repeated_vertex(&merged) {
        return None;
    }

    if !guard.is_empty() && edges.iter().any(|e| guard.forces_fusion(e)) {
        return Some(merged);
    }

    junctions_convex(&merged, &edges[0], normal, config.convexity_tolerance).then_some(merged)
}

/// Pairs `(i, j)` with `a[i] -> a[i + 1]` equal to `b[j + 1] -> b[j]`
fn shared_edges(a: &[Vertex], b: &[Vertex]) -> Vec<(usize, usize)> {
    let na = a.len();
    let nb = b.len();
    let mut shared = Vec::new();
    for i in 0..na {
        let a1 = a[i];
        let a2 = a[(i + 1) % na];
        for j in 0..nb {
            if b[j] == a2 && b[(j + 1) % nb] == a1 {
                shared.push((i, j));
            }
        }
    }
    shared
}

/// Concatenate both cycles, dropping the shared edge `a[i] -> a[i + 1]`.
///
/// The result runs from after the edge around `a` up to `a[i]`, then from
/// after the edge around `b` up to `b[j] == a[i + 1]`.
fn splice(a: &[Vertex], i: usize, b: &[Vertex], j: usize) -> Polygon {
    let na = a.len();
    let nb = b.len();
    let mut result = Vec::with_capacity(na + nb - 2);
    for k in 1..na {
        result.push(a[(i + 1 + k) % na]);
    }
    for k in 1..nb {
        result.push(b[(j + 1 + k) % nb]);
    }
    result
}

/// Remove zero-width spikes `x, m, x` left when pieces share a chain of
/// several consecutive edges.
fn collapse_spikes(mut polygon: Polygon) -> Polygon {
    loop {
        let n = polygon.len();
        if n < 3 {
            return polygon;
        }
        let spike = (0..n).find(|&i| polygon[(i + n - 1) % n] == polygon[(i + 1) % n]);
        let Some(tip) = spike else {
            return polygon;
        };

        // Drop the tip and the duplicate that follows it
        let after = (tip + 1) % n;
        polygon.remove(tip.max(after));
        polygon.remove(tip.min(after));
    }
}

fn has_repeated_vertex(polygon: &[Vertex]) -> bool {
    let mut seen = FxHashSet::default();
    !polygon.iter().all(|v| seen.insert(*v))
}

/// Check the corners at both ends of the removed edge. When spike collapse
/// removed one of them, fall back to checking the whole piece.
fn junctions_convex(
    polygon: &[Vertex],
    edge: &Edge,
    normal: &Vector3<f64>,
    epsilon: f64,
) -> bool {
    let n = polygon.len();
    let mut checked = 0;
    for junction in [edge.start, edge.end] {
        if let Some(i) = polygon.iter().position(|v| *v == junction) {
            if is_reflex(&polygon[(i + n - 1) % n], &polygon[i], &polygon[(i + 1) % n], normal, epsilon) {
                return false;
            }
            checked += 1;
        }
    }
    checked == 2 || is_convex(polygon, normal, epsilon)
}
