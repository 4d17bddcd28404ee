// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for surface decomposition.

use thiserror::Error;

/// Result type for decomposition operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decomposing a single surface.
///
/// None of these abort a batch: the driver in [`crate::decompose`] turns each
/// one into a per-face outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An edge appears in more than two triangles, triangles disagree on
    /// winding, or the triangulator produced nothing.
    #[error("Degenerate triangulation: {0}")]
    DegenerateTriangulation(String),

    /// Gap patching ran out of rounds before the area tolerance was met.
    #[error(
        "Area mismatch unresolved after {rounds} patch rounds: expected {expected:.6}, got {actual:.6}"
    )]
    AreaMismatchUnresolved {
        expected: f64,
        actual: f64,
        rounds: usize,
    },

    /// The slit polygon walk did not close within its step bound.
    #[error("Polygon reconstruction did not close within {limit} steps")]
    InvalidReconstruction { limit: usize },

    #[error("Invalid face: {0}")]
    InvalidFace(String),

    #[error("Geometry kernel error: {0}")]
    Kernel(String),
}
