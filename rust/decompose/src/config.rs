// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerances and caps for surface decomposition.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::SurfaceDecomposer`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecomposeConfig {
    /// Maximum allowed difference between the face area and the summed piece
    /// area. Default: 5e-3
    pub area_tolerance: f64,

    /// Number of gap-patching rounds before giving up. Default: 3
    pub max_patch_rounds: usize,

    /// Leftover fragments smaller than this are treated as numerical noise.
    /// Default: 1e-4
    pub min_fragment_area: f64,

    /// Distance below which two vertices are considered coincident. Also used
    /// to match triangulation edges against protected boundaries.
    /// Default: 1e-6
    pub vertex_tolerance: f64,

    /// Sine of the turn angle below which a vertex counts as collinear.
    /// Default: 1e-6
    pub collinear_tolerance: f64,

    /// Slack on the convexity test `cross · normal >= -tolerance`, measured on
    /// unit edge directions. Default: 1e-9
    pub convexity_tolerance: f64,

    /// Largest area change vertex stripping may introduce. Default: 1e-6
    pub cleanup_area_tolerance: f64,

    /// Pieces with less area than this are dropped. Default: 1e-9
    pub min_piece_area: f64,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self {
            area_tolerance: 5e-3,
            max_patch_rounds: 3,
            min_fragment_area: 1e-4,
            vertex_tolerance: 1e-6,
            collinear_tolerance: 1e-6,
            convexity_tolerance: 1e-9,
            cleanup_area_tolerance: 1e-6,
            min_piece_area: 1e-9,
        }
    }
}
