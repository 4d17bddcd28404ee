// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Area reconciliation
//!
//! Triangulation and fusing can lose small slivers of the face to floating
//! point noise. Whatever part of the original face the pieces no longer cover
//! is recovered with a boolean cut and appended as extra pieces, for a
//! bounded number of rounds.

use nalgebra::Vector3;

use crate::cleanup::{clean_polygon, orient_to};
use crate::config::DecomposeConfig;
use crate::error::{Error, Result};
use crate::fuse::fuse_triangles;
use crate::kernel::{Face, GeometryKernel};
use crate::polygon::{polygon_area, Polygon};

/// Pieces after gap patching
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub pieces: Vec<Polygon>,
    /// Area of the original face
    pub expected: f64,
    /// Summed area of `pieces`
    pub actual: f64,
    /// Patch rounds that ran
    pub rounds: usize,
}

impl Reconciled {
    #[inline]
    pub fn residual(&self) -> f64 {
        (self.expected - self.actual).abs()
    }

    /// [`Error::AreaMismatchUnresolved`] when the gap is still open
    pub fn mismatch(&self, tolerance: f64) -> Option<Error> {
        (self.residual() > tolerance).then(|| Error::AreaMismatchUnresolved {
            expected: self.expected,
            actual: self.actual,
            rounds: self.rounds,
        })
    }
}

/// Summed unsigned area of a set of loops
pub fn total_area(pieces: &[Polygon]) -> f64 {
    pieces.iter().map(|p| polygon_area(p)).sum()
}

/// Patch the gap between `face` and `pieces`.
///
/// An open gap after `max_patch_rounds` is not an error here: the best
/// effort comes back and [`Reconciled::mismatch`] reports it. Kernel
/// failures do propagate.
pub fn reconcile<K: GeometryKernel + ?Sized>(
    kernel: &K,
    face: &Face,
    normal: &Vector3<f64>,
    mut pieces: Vec<Polygon>,
    protected: &[Polygon],
    config: &DecomposeConfig,
) -> Result<Reconciled> {
    let expected = kernel.face_area(face);
    let mut actual = total_area(&pieces);
    let mut rounds = 0;

    while (expected - actual).abs() > config.area_tolerance && rounds < config.max_patch_rounds {
        rounds += 1;

        let tools = pieces
            .iter()
            .map(|p| kernel.make_polygon(p))
            .collect::<Result<Vec<_>>>()?;
        let fragments = kernel.boolean_cut(face, &tools)?;

        let mut patched = 0;
        for fragment in &fragments {
            if fragment.outer.len() < 3 || kernel.face_area(fragment) < config.min_fragment_area {
                continue;
            }
            for piece in patch_fragment(kernel, fragment, normal, protected, config)? {
                pieces.push(piece);
                patched += 1;
            }
        }

        actual = total_area(&pieces);
        tracing::debug!(
            round = rounds,
            fragments = fragments.len(),
            patched,
            residual = (expected - actual).abs(),
            "Patched area gap"
        );

        if patched == 0 {
            break;
        }
    }

    let reconciled = Reconciled {
        pieces,
        expected,
        actual,
        rounds,
    };

    if reconciled.residual() > config.area_tolerance {
        tracing::error!(
            expected,
            actual,
            rounds,
            "Area mismatch unresolved after gap patching"
        );
    }

    Ok(reconciled)
}

/// Turn one leftover fragment into pieces oriented like the face
fn patch_fragment<K: GeometryKernel + ?Sized>(
    kernel: &K,
    fragment: &Face,
    normal: &Vector3<f64>,
    protected: &[Polygon],
    config: &DecomposeConfig,
) -> Result<Vec<Polygon>> {
    if !fragment.has_holes() {
        let outer = orient_to(&fragment.outer, normal);
        return Ok(vec![clean_polygon(&outer, normal, config)]);
    }

    // Fragments wrapping a hole are split like any other holed face
    let triangles: Vec<_> = kernel
        .triangulate(fragment)?
        .into_iter()
        .map(|t| t.oriented_to(normal))
        .collect();
    Ok(fuse_triangles(&triangles, normal, protected, config)
        .iter()
        .map(|p| clean_polygon(p, normal, config))
        .filter(|p| p.len() >= 3)
        .collect())
}
