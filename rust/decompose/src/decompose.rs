// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-surface pipeline and batch driver
//!
//! A failure on one surface never stops the batch: every surface ends up as
//! a [`FaceOutcome`], and a surface that cannot be decomposed is passed
//! through unmodified.

use rayon::prelude::*;

use crate::cleanup::{clean_polygon, sanitize_loop};
use crate::config::DecomposeConfig;
use crate::error::{Error, Result};
use crate::fuse::fuse_triangles;
use crate::holes::{remove_holes, remove_holes_classified, SlitPolygon};
use crate::kernel::{Face, GeometryKernel};
use crate::polygon::{polygon_area, Polygon};
use crate::reconcile::reconcile;
use crate::triangulation::classify_edges;

/// A face to decompose together with the openings that must stay intact
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub face: Face,
    pub protected: Vec<Polygon>,
}

impl Surface {
    pub fn new(face: Face) -> Self {
        Self {
            face,
            protected: Vec::new(),
        }
    }

    pub fn with_protected(face: Face, protected: Vec<Polygon>) -> Self {
        Self { face, protected }
    }
}

/// Pieces of one decomposed face
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Hole-free pieces oriented like the input face
    pub pieces: Vec<Face>,
    /// Single-loop form of the face, present when it had holes
    pub slit: Option<SlitPolygon>,
    pub patch_rounds: usize,
    pub expected_area: f64,
    pub actual_area: f64,
}

impl Decomposition {
    #[inline]
    pub fn residual(&self) -> f64 {
        (self.expected_area - self.actual_area).abs()
    }
}

/// What happened to one face
#[derive(Debug, Clone, PartialEq)]
pub enum FaceOutcome {
    Decomposed(Decomposition),
    /// Best-effort pieces whose area is off by more than the tolerance
    Approximate {
        decomposition: Decomposition,
        error: Error,
    },
    /// The original face, returned as-is
    Unmodified { face: Face, error: Error },
}

impl FaceOutcome {
    /// Faces to export for this surface
    pub fn faces(&self) -> &[Face] {
        match self {
            FaceOutcome::Decomposed(decomposition)
            | FaceOutcome::Approximate { decomposition, .. } => &decomposition.pieces,
            FaceOutcome::Unmodified { face, .. } => std::slice::from_ref(face),
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            FaceOutcome::Decomposed(_) => None,
            FaceOutcome::Approximate { error, .. } | FaceOutcome::Unmodified { error, .. } => {
                Some(error)
            }
        }
    }

    #[inline]
    pub fn is_decomposed(&self) -> bool {
        matches!(self, FaceOutcome::Decomposed(_))
    }
}

/// Counts per outcome kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub decomposed: usize,
    pub approximate: usize,
    pub unmodified: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FaceOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                FaceOutcome::Decomposed(_) => summary.decomposed += 1,
                FaceOutcome::Approximate { .. } => summary.approximate += 1,
                FaceOutcome::Unmodified { .. } => summary.unmodified += 1,
            }
        }
        summary
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.decomposed + self.approximate + self.unmodified
    }
}

/// Outcomes of a batch, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<FaceOutcome>,
    pub summary: BatchSummary,
}

impl BatchReport {
    fn new(outcomes: Vec<FaceOutcome>) -> Self {
        let summary = BatchSummary::from_outcomes(&outcomes);
        tracing::info!(
            decomposed = summary.decomposed,
            approximate = summary.approximate,
            unmodified = summary.unmodified,
            "Surface decomposition complete"
        );
        Self { outcomes, summary }
    }
}

/// Splits planar faces into hole-free convex pieces
pub struct SurfaceDecomposer<K> {
    kernel: K,
    config: DecomposeConfig,
}

impl<K: GeometryKernel> SurfaceDecomposer<K> {
    pub fn new(kernel: K) -> Self {
        Self::with_config(kernel, DecomposeConfig::default())
    }

    pub fn with_config(kernel: K, config: DecomposeConfig) -> Self {
        Self { kernel, config }
    }

    /// Decompose one face, recovering from every error.
    pub fn decompose(&self, face: &Face, protected: &[Polygon]) -> FaceOutcome {
        match self.run(face, protected) {
            Ok((decomposition, None)) => FaceOutcome::Decomposed(decomposition),
            Ok((decomposition, Some(error))) => FaceOutcome::Approximate {
                decomposition,
                error,
            },
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    vertices = face.vertex_count(),
                    holes = face.holes.len(),
                    "Keeping face unmodified"
                );
                FaceOutcome::Unmodified {
                    face: face.clone(),
                    error,
                }
            }
        }
    }

    /// Decompose one face.
    ///
    /// An area gap left open after patching is not an error here; check
    /// [`Decomposition::residual`] or use [`SurfaceDecomposer::decompose`].
    pub fn try_decompose(&self, face: &Face, protected: &[Polygon]) -> Result<Decomposition> {
        self.run(face, protected).map(|(decomposition, _)| decomposition)
    }

    /// The pipeline, returning the unresolved area mismatch next to the
    /// best-effort pieces
    fn run(&self, face: &Face, protected: &[Polygon]) -> Result<(Decomposition, Option<Error>)> {
        let face = sanitize_face(face)?;
        let normal = self.kernel.face_normal(&face)?;

        if !face.has_holes() && face.outer.len() == 3 {
            let area = self.kernel.face_area(&face);
            let decomposition = Decomposition {
                pieces: vec![self.kernel.make_polygon(&face.outer)?],
                slit: None,
                patch_rounds: 0,
                expected_area: area,
                actual_area: area,
            };
            return Ok((decomposition, None));
        }

        // Protected outlines go into the triangulation as constraint edges
        let triangles = self.kernel.triangulate_constrained(&face, protected)?;
        let edges = classify_edges(&triangles)?;

        // Bridges only connect boundary loops, so constraint vertices are
        // kept out of hole removal
        let slit = match (face.has_holes(), protected.is_empty()) {
            (false, _) => None,
            (true, true) => Some(remove_holes_classified(&triangles, &edges)?),
            (true, false) => Some(remove_holes(&self.kernel.triangulate(&face)?)?),
        };

        let pieces: Vec<Polygon> = fuse_triangles(&triangles, &normal, protected, &self.config)
            .iter()
            .map(|piece| clean_polygon(piece, &normal, &self.config))
            .filter(|piece| piece.len() >= 3 && polygon_area(piece) >= self.config.min_piece_area)
            .collect();

        let reconciled = reconcile(&self.kernel, &face, &normal, pieces, protected, &self.config)?;

        tracing::debug!(
            triangles = triangles.len(),
            loops = face.loop_count(),
            protected = protected.len(),
            pieces = reconciled.pieces.len(),
            patch_rounds = reconciled.rounds,
            "Decomposed face"
        );

        let mismatch = reconciled.mismatch(self.config.area_tolerance);
        let decomposition = Decomposition {
            pieces: reconciled
                .pieces
                .iter()
                .map(|piece| self.kernel.make_polygon(piece))
                .collect::<Result<Vec<_>>>()?,
            slit,
            patch_rounds: reconciled.rounds,
            expected_area: reconciled.expected,
            actual_area: reconciled.actual,
        };
        Ok((decomposition, mismatch))
    }

    /// Decompose surfaces one after another
    pub fn decompose_all(&self, surfaces: &[Surface]) -> BatchReport {
        BatchReport::new(
            surfaces
                .iter()
                .map(|s| self.decompose(&s.face, &s.protected))
                .collect(),
        )
    }
}

impl<K: GeometryKernel + Sync> SurfaceDecomposer<K> {
    /// Decompose surfaces in parallel. Outcomes keep the input order.
    pub fn par_decompose_all(&self, surfaces: &[Surface]) -> BatchReport {
        BatchReport::new(
            surfaces
                .par_iter()
                .map(|s| self.decompose(&s.face, &s.protected))
                .collect(),
        )
    }
}

/// Strip duplicate points from every loop; holes that collapse are dropped
fn sanitize_face(face: &Face) -> Result<Face> {
    let outer = sanitize_loop(&face.outer);
    if outer.len() < 3 {
        return Err(Error::InvalidFace(format!(
            "Outer loop has {} distinct points",
            outer.len()
        )));
    }

    let holes = face
        .holes
        .iter()
        .map(|hole| sanitize_loop(hole))
        .filter(|hole| hole.len() >= 3)
        .collect();

    Ok(Face::with_holes(outer, holes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::FixtureKernel;
    use crate::polygon::is_convex;
    use crate::vertex::{Triangle, Vertex};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn v(x: f64, y: f64) -> Vertex {
        Vertex::new(x, y, 0.0)
    }

    fn t(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Triangle {
        Triangle::new(v(a.0, a.1), v(b.0, b.1), v(c.0, c.1))
    }

    fn up() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 1.0)
    }

    fn is_rotation_of(a: &[Vertex], b: &[Vertex]) -> bool {
        a.len() == b.len() && (0..b.len()).any(|shift| (0..a.len()).all(|k| a[k] == b[(k + shift) % b.len()]))
    }

    fn square() -> Polygon {
        vec![v(1.0, 1.0), v(5.0, 1.0), v(5.0, 5.0), v(1.0, 5.0)]
    }

    fn square_kernel() -> FixtureKernel {
        FixtureKernel::new(vec![
            t((1.0, 1.0), (5.0, 1.0), (5.0, 5.0)),
            t((1.0, 1.0), (5.0, 5.0), (1.0, 5.0)),
        ])
    }

    fn framed_square() -> (Face, FixtureKernel) {
        let face = Face::with_holes(
            vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)],
            vec![vec![v(1.0, 1.0), v(1.0, 3.0), v(3.0, 3.0), v(3.0, 1.0)]],
        );
        let kernel = FixtureKernel::new(vec![
            t((0.0, 0.0), (4.0, 0.0), (3.0, 1.0)),
            t((0.0, 0.0), (3.0, 1.0), (1.0, 1.0)),
            t((4.0, 0.0), (4.0, 4.0), (3.0, 3.0)),
            t((4.0, 0.0), (3.0, 3.0), (3.0, 1.0)),
            t((4.0, 4.0), (0.0, 4.0), (1.0, 3.0)),
            t((4.0, 4.0), (1.0, 3.0), (3.0, 3.0)),
            t((0.0, 4.0), (0.0, 0.0), (1.0, 1.0)),
            t((0.0, 4.0), (1.0, 1.0), (1.0, 3.0)),
        ]);
        (face, kernel)
    }

    #[test]
    fn test_convex_face_is_kept_whole() {
        let decomposer = SurfaceDecomposer::new(square_kernel());
        let result = decomposer.try_decompose(&Face::new(square()), &[]).unwrap();

        assert_eq!(result.pieces.len(), 1);
        assert!(is_rotation_of(&result.pieces[0].outer, &square()));
        assert!(result.slit.is_none());
        assert_eq!(result.patch_rounds, 0);
    }

    #[test]
    fn test_closing_point_is_ignored() {
        let mut closed = square();
        closed.push(v(1.0, 1.0));

        let decomposer = SurfaceDecomposer::new(square_kernel());
        let result = decomposer.try_decompose(&Face::new(closed), &[]).unwrap();
        assert_eq!(result.pieces.len(), 1);
        assert_eq!(result.pieces[0].outer.len(), 4);
    }

    #[test]
    fn test_single_reflex_vertex_splits_in_two() {
        let face = Face::new(vec![v(1.0, 1.0), v(5.0, 1.0), v(2.0, 2.0), v(1.0, 5.0)]);
        let kernel = FixtureKernel::new(vec![
            t((5.0, 1.0), (2.0, 2.0), (1.0, 1.0)),
            t((1.0, 5.0), (1.0, 1.0), (2.0, 2.0)),
        ]);

        let outcome = SurfaceDecomposer::new(kernel).decompose(&face, &[]);
        assert!(outcome.is_decomposed());

        let pieces: Vec<&Polygon> = outcome.faces().iter().map(|f| &f.outer).collect();
        assert_eq!(
            pieces,
            vec![
                &vec![v(5.0, 1.0), v(2.0, 2.0), v(1.0, 1.0)],
                &vec![v(1.0, 5.0), v(1.0, 1.0), v(2.0, 2.0)],
            ]
        );
    }

    #[test]
    fn test_hole_is_removed() {
        let (face, kernel) = framed_square();
        let result = SurfaceDecomposer::new(kernel).try_decompose(&face, &[]).unwrap();

        assert_eq!(result.pieces.len(), 4);
        for piece in &result.pieces {
            assert!(!piece.has_holes());
            assert!(is_convex(&piece.outer, &up(), 1e-9));
        }
        assert_relative_eq!(result.actual_area, 12.0, epsilon = 1e-10);
        assert_relative_eq!(result.expected_area, 12.0, epsilon = 1e-10);

        // 8 boundary vertices + 2 per additional loop
        let slit = result.slit.unwrap();
        assert_eq!(slit.vertices.len(), 10);
    }

    #[test]
    fn test_triangle_is_returned_unchanged() {
        let triangle = vec![v(5.0, 1.0), v(2.0, 2.0), v(1.0, 1.0)];
        // No triangles configured: the kernel must not be asked
        let decomposer = SurfaceDecomposer::new(FixtureKernel::default());

        let outcome = decomposer.decompose(&Face::new(triangle.clone()), &[]);
        assert!(outcome.is_decomposed());
        assert_eq!(outcome.faces(), &[Face::new(triangle)]);
    }

    #[test]
    fn test_empty_triangulation_keeps_face() {
        let face = Face::new(square());
        let decomposer = SurfaceDecomposer::new(FixtureKernel::default());

        match decomposer.decompose(&face, &[]) {
            FaceOutcome::Unmodified { face: kept, error } => {
                assert_eq!(kept, face);
                assert!(matches!(error, Error::DegenerateTriangulation(_)));
            }
            other => panic!("expected unmodified face, got {:?}", other),
        }
    }

    #[test]
    fn test_too_few_points_is_invalid() {
        let face = Face::new(vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0)]);
        let outcome = SurfaceDecomposer::new(FixtureKernel::default()).decompose(&face, &[]);

        assert!(matches!(outcome.error(), Some(Error::InvalidFace(_))));
        assert_eq!(outcome.faces(), &[face]);
    }

    #[test]
    fn test_unpatched_gap_is_approximate() {
        // Triangulation covers only half the square and the cut finds nothing
        let face = Face::new(vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)]);
        let kernel = FixtureKernel::new(vec![t((0.0, 0.0), (4.0, 0.0), (4.0, 4.0))]);

        match SurfaceDecomposer::new(kernel).decompose(&face, &[]) {
            FaceOutcome::Approximate {
                decomposition,
                error,
            } => {
                assert_eq!(decomposition.pieces.len(), 1);
                assert_eq!(
                    error,
                    Error::AreaMismatchUnresolved {
                        expected: 16.0,
                        actual: 8.0,
                        rounds: 1,
                    }
                );
            }
            other => panic!("expected approximate result, got {:?}", other),
        }
    }

    #[test]
    fn test_protected_window_keeps_l_shape_whole() {
        let face = Face::new(vec![
            v(0.0, 0.0),
            v(4.0, 0.0),
            v(4.0, 2.0),
            v(2.0, 2.0),
            v(2.0, 4.0),
            v(0.0, 4.0),
        ]);
        let kernel = FixtureKernel::new(vec![
            t((0.0, 0.0), (4.0, 0.0), (4.0, 2.0)),
            t((0.0, 0.0), (4.0, 2.0), (2.0, 2.0)),
            t((0.0, 0.0), (2.0, 2.0), (2.0, 4.0)),
            t((0.0, 0.0), (2.0, 4.0), (0.0, 4.0)),
        ]);
        let window = vec![v(0.5, 0.5), v(1.5, 0.5), v(1.5, 1.5), v(0.5, 1.5)];
        let decomposer = SurfaceDecomposer::new(kernel);

        let free = decomposer.try_decompose(&face, &[]).unwrap();
        assert_eq!(free.pieces.len(), 2);

        let protected = decomposer.try_decompose(&face, &[window]).unwrap();
        assert_eq!(protected.pieces.len(), 1);
        assert_relative_eq!(protected.actual_area, 12.0, epsilon = 1e-10);
    }

    #[test]
    fn test_batch_summary() {
        let surfaces = vec![
            Surface::new(Face::new(square())),
            Surface::new(Face::new(vec![v(5.0, 1.0), v(2.0, 2.0), v(1.0, 1.0)])),
            Surface::new(Face::new(vec![v(0.0, 0.0), v(1.0, 0.0)])),
        ];
        let decomposer = SurfaceDecomposer::new(square_kernel());

        let expected = BatchSummary {
            decomposed: 2,
            approximate: 0,
            unmodified: 1,
        };

        let report = decomposer.decompose_all(&surfaces);
        assert_eq!(report.summary, expected);
        assert_eq!(report.summary.total(), 3);
        assert!(matches!(
            report.outcomes[2],
            FaceOutcome::Unmodified { .. }
        ));

        let parallel = decomposer.par_decompose_all(&surfaces);
        assert_eq!(parallel, report);
    }
}
