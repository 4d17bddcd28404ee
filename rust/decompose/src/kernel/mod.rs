// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry kernel interface
//!
//! The decomposition only needs a handful of kernel operations. They are
//! expressed as a trait so the graph stages can be tested against a
//! deterministic fixture, while production code runs on earcut and i_overlay.

mod fixture;
mod planar;

pub use fixture::FixtureKernel;
pub use planar::PlanarKernel;

use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::polygon::{newell_normal, polygon_area, Polygon};
use crate::vertex::{Triangle, Vertex};

/// A planar face: an outer loop plus zero or more holes.
///
/// Holes wind opposite to the outer loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    pub outer: Polygon,
    pub holes: Vec<Polygon>,
}

impl Face {
    pub fn new(outer: Polygon) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Polygon, holes: Vec<Polygon>) -> Self {
        Self { outer, holes }
    }

    #[inline]
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Number of boundary loops (outer + holes)
    #[inline]
    pub fn loop_count(&self) -> usize {
        1 + self.holes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }

    /// Outer loop followed by every hole
    pub fn loops(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

/// Operations the decomposition consumes from a geometry kernel.
pub trait GeometryKernel {
    /// Triangulate a face (holes included). Triangles must wind consistently
    /// with [`GeometryKernel::face_normal`] and reuse the face's vertices
    /// exactly.
    fn triangulate(&self, face: &Face) -> Result<Vec<Triangle>>;

    /// Triangulate a face so that every edge of every loop in `constraints`
    /// is also an edge of the triangulation. Constraint loops are closed
    /// regions inside the face; their vertices become interior vertices.
    ///
    /// Kernels without constraint support ignore `constraints`.
    fn triangulate_constrained(&self, face: &Face, _constraints: &[Polygon]) -> Result<Vec<Triangle>> {
        self.triangulate(face)
    }

    /// Fragments of `face` not covered by the union of `tools`
    fn boolean_cut(&self, face: &Face, tools: &[Face]) -> Result<Vec<Face>>;

    /// Build a hole-free face from a boundary loop
    fn make_polygon(&self, points: &[Vertex]) -> Result<Face> {
        if points.len() < 3 {
            return Err(Error::InvalidFace(format!(
                "Need at least 3 points to build a face, got {}",
                points.len()
            )));
        }
        Ok(Face::new(points.to_vec()))
    }

    /// Unit normal of the outer loop, following its winding
    fn face_normal(&self, face: &Face) -> Result<Vector3<f64>> {
        newell_normal(&face.outer)
            .ok_or_else(|| Error::InvalidFace("Outer loop has no defined normal".to_string()))
    }

    /// Outer area minus hole areas
    fn face_area(&self, face: &Face) -> f64 {
        let holes: f64 = face.holes.iter().map(|h| polygon_area(h)).sum();
        (polygon_area(&face.outer) - holes).abs()
    }
}
