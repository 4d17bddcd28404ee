// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite Surface Decomposition
//!
//! Turns planar building surfaces that contain holes (window and door
//! openings) or reflex corners into simple, hole-free, convex pieces before
//! they are handed to a simulation engine.
//!
//! The pipeline per surface is:
//! 1. triangulate the face through a [`GeometryKernel`]
//! 2. classify triangulation edges into boundary and diagonal edges
//! 3. bridge holes with a spanning tree of diagonals and walk the result
//!    into one slit polygon
//! 4. fuse triangles back into convex pieces, never splitting protected
//!    regions
//! 5. patch any area lost to numerical noise against the original face

pub mod cleanup;
pub mod config;
pub mod decompose;
pub mod error;
pub mod fuse;
pub mod holes;
pub mod kernel;
pub mod polygon;
pub mod reconcile;
pub mod triangulation;
pub mod union_find;
pub mod vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use config::DecomposeConfig;
pub use decompose::{
    BatchReport, BatchSummary, Decomposition, FaceOutcome, Surface, SurfaceDecomposer,
};
pub use error::{Error, Result};
pub use fuse::fuse_triangles;
pub use holes::{remove_holes, SlitPolygon};
pub use kernel::{Face, FixtureKernel, GeometryKernel, PlanarKernel};
pub use polygon::{PlaneBasis, Polygon};
pub use triangulation::{classify_edges, EdgeClassification};
pub use union_find::UnionFind;
pub use vertex::{Edge, Triangle, Vertex};
