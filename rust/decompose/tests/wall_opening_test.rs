// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end decomposition of wall and slab surfaces through the earcut /
//! i_overlay kernel.

use approx::assert_relative_eq;
use ifc_lite_decompose::{
    polygon::{is_convex, polygon_area, signed_area},
    Face, FaceOutcome, GeometryKernel, PlanarKernel, Result, Surface, SurfaceDecomposer,
    Triangle, Vertex,
};

fn wall_vertex(x: f64, z: f64) -> Vertex {
    Vertex::new(x, 0.0, z)
}

/// 10 x 3 wall in the XZ plane with a 2 x 1 window opening
fn wall_with_window() -> (Face, Vec<Vertex>) {
    let outer = vec![
        wall_vertex(0.0, 0.0),
        wall_vertex(10.0, 0.0),
        wall_vertex(10.0, 3.0),
        wall_vertex(0.0, 3.0),
    ];
    let window = vec![
        wall_vertex(4.0, 1.0),
        wall_vertex(4.0, 2.0),
        wall_vertex(6.0, 2.0),
        wall_vertex(6.0, 1.0),
    ];
    (Face::with_holes(outer, vec![window.clone()]), window)
}

fn total_area(faces: &[Face]) -> f64 {
    faces.iter().map(|f| polygon_area(&f.outer)).sum()
}

/// Drops the last triangle so the pieces leave a gap to patch
struct LossyKernel;

impl GeometryKernel for LossyKernel {
    fn triangulate(&self, face: &Face) -> Result<Vec<Triangle>> {
        let mut triangles = PlanarKernel.triangulate(face)?;
        triangles.pop();
        Ok(triangles)
    }

    fn boolean_cut(&self, face: &Face, tools: &[Face]) -> Result<Vec<Face>> {
        PlanarKernel.boolean_cut(face, tools)
    }
}

#[test]
fn test_window_opening_is_removed() {
    let (face, _) = wall_with_window();
    let decomposer = SurfaceDecomposer::new(PlanarKernel);
    let normal = PlanarKernel.face_normal(&face).unwrap();

    let result = decomposer.try_decompose(&face, &[]).unwrap();

    // A frame around a rectangular opening splits into four convex pieces
    assert_eq!(result.pieces.len(), 4);
    for piece in &result.pieces {
        assert!(!piece.has_holes());
        assert!(is_convex(&piece.outer, &normal, 1e-9));
        assert!(signed_area(&piece.outer, &normal) > 0.0);
    }
    assert_relative_eq!(total_area(&result.pieces), 28.0, epsilon = 5e-3);

    let slit = result.slit.expect("holed face reports its slit polygon");
    assert_eq!(slit.loops, 2);
    assert_eq!(slit.vertices.len(), 8 + 2);
}

fn has_edge(piece: &Face, a: Vertex, b: Vertex) -> bool {
    let m = piece.outer.len();
    (0..m).any(|k| {
        let (p, q) = (piece.outer[k], piece.outer[(k + 1) % m]);
        (p == a && q == b) || (p == b && q == a)
    })
}

#[test]
fn test_protected_window_edges_are_piece_edges() {
    // Solid wall; the window is only marked as an opening to keep intact
    let (wall, window) = wall_with_window();
    let face = Face::new(wall.outer);
    let normal = PlanarKernel.face_normal(&face).unwrap();

    let outcome = SurfaceDecomposer::new(PlanarKernel).decompose(&face, &[window.clone()]);
    assert!(outcome.is_decomposed(), "unexpected outcome {:?}", outcome);

    let pieces = outcome.faces();
    let n = window.len();
    for i in 0..n {
        let (a, b) = (window[i], window[(i + 1) % n]);
        assert!(
            pieces.iter().any(|piece| has_edge(piece, a, b)),
            "window edge {} -> {} is not a piece edge",
            a,
            b
        );
    }

    let window_pieces = pieces
        .iter()
        .filter(|piece| piece.outer.len() == 4 && window.iter().all(|w| piece.outer.contains(w)))
        .count();
    assert_eq!(window_pieces, 1);

    for piece in pieces {
        assert!(is_convex(&piece.outer, &normal, 1e-9));
    }
    assert_relative_eq!(total_area(pieces), 30.0, epsilon = 5e-3);
}

#[test]
fn test_reflex_slab_splits_in_two() {
    let face = Face::new(vec![
        Vertex::new(1.0, 1.0, 0.0),
        Vertex::new(5.0, 1.0, 0.0),
        Vertex::new(2.0, 2.0, 0.0),
        Vertex::new(1.0, 5.0, 0.0),
    ]);

    let result = SurfaceDecomposer::new(PlanarKernel)
        .try_decompose(&face, &[])
        .unwrap();

    assert_eq!(result.pieces.len(), 2);
    for piece in &result.pieces {
        assert_eq!(piece.outer.len(), 3);
    }
    assert_relative_eq!(total_area(&result.pieces), 4.0, epsilon = 1e-9);
}

#[test]
fn test_lost_triangle_is_patched() {
    let face = Face::new(vec![
        Vertex::new(0.0, 0.0, 0.0),
        Vertex::new(4.0, 0.0, 0.0),
        Vertex::new(4.0, 3.0, 0.0),
        Vertex::new(0.0, 3.0, 0.0),
    ]);

    let decomposition = match SurfaceDecomposer::new(LossyKernel).decompose(&face, &[]) {
        FaceOutcome::Decomposed(decomposition) => decomposition,
        other => panic!("expected a decomposed face, got {:?}", other),
    };

    assert_eq!(decomposition.patch_rounds, 1);
    assert_eq!(decomposition.pieces.len(), 2);
    assert!(decomposition.residual() < 5e-3);
    assert_relative_eq!(total_area(&decomposition.pieces), 12.0, epsilon = 5e-3);
}

#[test]
fn test_batch_runs_every_surface() {
    let (wall, window) = wall_with_window();
    let surfaces: Vec<Surface> = (0..16)
        .map(|i| match i % 4 {
            0 => Surface::new(wall.clone()),
            1 => Surface::with_protected(wall.clone(), vec![window.clone()]),
            2 => Surface::new(Face::new(vec![
                Vertex::new(0.0, 0.0, i as f64),
                Vertex::new(3.0, 0.0, i as f64),
                Vertex::new(0.0, 3.0, i as f64),
            ])),
            // Collapses to two distinct points
            _ => Surface::new(Face::new(vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 0.0, 0.0),
            ])),
        })
        .collect();

    let decomposer = SurfaceDecomposer::new(PlanarKernel);
    let report = decomposer.par_decompose_all(&surfaces);

    assert_eq!(report.outcomes.len(), 16);
    assert_eq!(report.summary.decomposed, 12);
    assert_eq!(report.summary.unmodified, 4);
    assert_eq!(report, decomposer.decompose_all(&surfaces));
}
