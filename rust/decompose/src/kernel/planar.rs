// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Production kernel: earcutr triangulation and i_overlay booleans, both run
//! in the face's own 2D frame.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::{Point2, Vector3};

use super::{Face, GeometryKernel};
use crate::cleanup::{orient_to, sanitize_loop};
use crate::error::{Error, Result};
use crate::polygon::{polygon_area, PlaneBasis, Polygon};
use crate::vertex::{Triangle, Vertex};

/// Contours with less area than this are dropped from boolean output
const MIN_CONTOUR_AREA: f64 = 1e-12;

/// Boolean output within this distance of an input vertex is moved onto it
const SNAP_TOLERANCE: f64 = 1e-6;

/// Kernel for planar faces backed by earcutr and i_overlay
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarKernel;

impl GeometryKernel for PlanarKernel {
    fn triangulate(&self, face: &Face) -> Result<Vec<Triangle>> {
        if face.outer.len() < 3 {
            return Err(Error::InvalidFace(
                "Need at least 3 points in outer boundary".to_string(),
            ));
        }

        let normal = self.face_normal(face)?;
        let basis = PlaneBasis::from_normal(&normal);
        let origin = face.outer[0];

        // earcutr takes one flat coordinate list; holes start at the given
        // vertex indices
        let mut coords = Vec::with_capacity(face.vertex_count() * 2);
        let mut vertices = Vec::with_capacity(face.vertex_count());
        let mut hole_indices = Vec::with_capacity(face.holes.len());

        for (i, ring) in face.loops().filter(|l| l.len() >= 3).enumerate() {
            if i > 0 {
                hole_indices.push(vertices.len());
            }
            for v in ring {
                let p = basis.project(&origin, v);
                coords.extend([p.x, p.y]);
                vertices.push(*v);
            }
        }

        let indices = earcutr::earcut(&coords, &hole_indices, 2)
            .map_err(|e| Error::Kernel(format!("earcut failed: {:?}", e)))?;

        Ok(indices
            .chunks_exact(3)
            .map(|c| Triangle::new(vertices[c[0]], vertices[c[1]], vertices[c[2]]).oriented_to(&normal))
            .collect())
    }

    /// Splits the face along the constraint loops and triangulates every
    /// region on its own. Regions meet along the constraint edges, so those
    /// edges end up shared by one triangle on each side.
    fn triangulate_constrained(&self, face: &Face, constraints: &[Polygon]) -> Result<Vec<Triangle>> {
        let normal = self.face_normal(face)?;
        let tools: Vec<Face> = constraints
            .iter()
            .map(|c| sanitize_loop(c))
            .filter(|c| c.len() >= 3)
            .map(|c| Face::new(orient_to(&c, &normal)))
            .collect();
        if tools.is_empty() {
            return self.triangulate(face);
        }

        let mut anchors: Vec<Vertex> = face.loops().chain(constraints.iter()).flatten().copied().collect();

        let mut regions: Vec<Face> = self
            .boolean_cut(face, &tools)?
            .iter()
            .map(|region| snap_face(region, &anchors))
            .collect();
        anchors.extend(regions.iter().flat_map(|r| r.loops()).flatten().copied());

        // Each constraint keeps the part inside the face and not already
        // claimed by an earlier constraint
        for (i, tool) in tools.iter().enumerate() {
            let mut covered = self.boolean_cut(tool, std::slice::from_ref(face))?;
            covered.extend(tools[..i].iter().cloned());
            for inside in self.boolean_cut(tool, &covered)? {
                regions.push(snap_face(&inside, &anchors));
            }
        }

        let mut triangles = Vec::new();
        for region in regions.iter().filter(|r| r.outer.len() >= 3) {
            triangles.extend(self.triangulate(region)?.into_iter().map(|t| t.oriented_to(&normal)));
        }

        tracing::debug!(
            constraints = tools.len(),
            regions = regions.len(),
            triangles = triangles.len(),
            "Constrained triangulation"
        );
        Ok(triangles)
    }

    fn boolean_cut(&self, face: &Face, tools: &[Face]) -> Result<Vec<Face>> {
        if tools.is_empty() {
            return Ok(vec![face.clone()]);
        }

        let normal = self.face_normal(face)?;
        let basis = PlaneBasis::from_normal(&normal);
        let origin = face.outer[0];

        let subject = face_to_paths(face, &basis, &origin);
        let clip: Vec<Vec<[f64; 2]>> = tools
            .iter()
            .flat_map(|tool| face_to_paths(tool, &basis, &origin))
            .collect();

        // One entry per resulting shape, its outer contour first
        let shapes = subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);

        let reversed = -normal;
        let mut fragments = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let mut contours = shape
                .iter()
                .map(|contour| lift_path(contour, &basis, &origin))
                .filter(|contour| polygon_area(contour) > MIN_CONTOUR_AREA);

            let Some(outer) = contours.next() else {
                continue;
            };
            let holes = contours.map(|hole| orient_to(&hole, &reversed)).collect();
            fragments.push(Face::with_holes(orient_to(&outer, &normal), holes));
        }

        Ok(fragments)
    }
}

/// Face loops as i_overlay paths in the frame of `basis`: outer loop
/// counter-clockwise around the basis normal, holes clockwise, so the
/// non-zero fill rule leaves holes empty.
fn face_to_paths(face: &Face, basis: &PlaneBasis, origin: &Vertex) -> Vec<Vec<[f64; 2]>> {
    let reversed = -basis.normal;
    face.loops()
        .filter(|l| l.len() >= 3)
        .enumerate()
        .map(|(i, ring)| {
            let direction: &Vector3<f64> = if i == 0 { &basis.normal } else { &reversed };
            orient_to(ring, direction)
                .iter()
                .map(|v| {
                    let p = basis.project(origin, v);
                    [p.x, p.y]
                })
                .collect()
        })
        .collect()
}

fn lift_path(path: &[[f64; 2]], basis: &PlaneBasis, origin: &Vertex) -> Polygon {
    path.iter()
        .map(|p| basis.lift(origin, &Point2::new(p[0], p[1])))
        .collect()
}

/// Move boolean output back onto the input vertices it came from, so that
/// regions cut from the same face share exact coordinates.
fn snap_face(face: &Face, anchors: &[Vertex]) -> Face {
    let holes = face
        .holes
        .iter()
        .map(|hole| snap_loop(hole, anchors))
        .filter(|hole| hole.len() >= 3)
        .collect();
    Face::with_holes(snap_loop(&face.outer, anchors), holes)
}

fn snap_loop(points: &[Vertex], anchors: &[Vertex]) -> Polygon {
    let snapped: Polygon = points.iter().map(|v| snap(v, anchors)).collect();
    sanitize_loop(&snapped)
}

fn snap(v: &Vertex, anchors: &[Vertex]) -> Vertex {
    anchors
        .iter()
        .map(|a| (a, a.distance(v)))
        .filter(|(_, d)| *d < SNAP_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(*v, |(a, _)| *a)
}
