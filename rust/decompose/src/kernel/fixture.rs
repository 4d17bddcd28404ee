// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deterministic kernel returning pre-recorded results.
//!
//! Pins a triangulation (and optionally the boolean-cut fragments of each
//! patch round) so decomposition logic can be checked against literal
//! fixtures, independent of any triangulator's choices.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Face, GeometryKernel};
use crate::error::Result;
use crate::vertex::Triangle;

#[derive(Debug, Default)]
pub struct FixtureKernel {
    triangles: Vec<Triangle>,
    /// Fragments returned by successive `boolean_cut` calls
    rounds: Vec<Vec<Face>>,
    cuts: AtomicUsize,
}

impl FixtureKernel {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            ..Default::default()
        }
    }

    /// Queue the fragments the next `boolean_cut` call returns. Calls past
    /// the last queued round return no fragments.
    pub fn with_cut_round(mut self, fragments: Vec<Face>) -> Self {
        self.rounds.push(fragments);
        self
    }

    /// Number of `boolean_cut` calls served so far
    pub fn cut_calls(&self) -> usize {
        self.cuts.load(Ordering::Relaxed)
    }
}

impl GeometryKernel for FixtureKernel {
    fn triangulate(&self, _face: &Face) -> Result<Vec<Triangle>> {
        Ok(self.triangles.clone())
    }

    fn boolean_cut(&self, _face: &Face, _tools: &[Face]) -> Result<Vec<Face>> {
        let round = self.cuts.fetch_add(1, Ordering::Relaxed);
        Ok(self.rounds.get(round).cloned().unwrap_or_default())
    }
}
