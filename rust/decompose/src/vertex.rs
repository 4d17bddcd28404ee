// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by every decomposition stage.
//!
//! Vertices are compared by exact coordinate equality. Triangulators reuse
//! the input coordinates verbatim, so two triangles touching the same corner
//! produce bit-identical vertices, and the graph stages can key maps on them.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on the surface plane, usable as a map key.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Vector from `self` to `other`
    #[inline]
    pub fn to(&self, other: &Vertex) -> Vector3<f64> {
        Vector3::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }

    #[inline]
    pub fn distance(&self, other: &Vertex) -> f64 {
        self.to(other).norm()
    }

    /// Coordinates with -0.0 folded into 0.0 so equality and hashing agree.
    #[inline]
    fn canonical(&self) -> [f64; 3] {
        let fold = |v: f64| if v == 0.0 { 0.0 } else { v };
        [fold(self.x), fold(self.y), fold(self.z)]
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        let a = self.canonical();
        let b = other.canonical();
        a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.canonical() {
            c.to_bits().hash(state);
        }
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.canonical();
        let b = other.canonical();
        a[0].total_cmp(&b[0])
            .then_with(|| a[1].total_cmp(&b[1]))
            .then_with(|| a[2].total_cmp(&b[2]))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(p: Point3<f64>) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<(f64, f64, f64)> for Vertex {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// An edge between two vertices.
///
/// As stored it is directed. [`Edge::normalized`] gives the undirected form,
/// so `(a, b)` and `(b, a)` share one map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: Vertex,
    pub end: Vertex,
}

impl Edge {
    #[inline]
    pub const fn new(start: Vertex, end: Vertex) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Orders the endpoints by value
    #[inline]
    pub fn normalized(&self) -> Self {
        if self.start <= self.end {
            *self
        } else {
            self.reversed()
        }
    }

    pub fn midpoint(&self) -> Vertex {
        Vertex::new(
            (self.start.x + self.end.x) * 0.5,
            (self.start.y + self.end.y) * 0.5,
            (self.start.z + self.end.z) * 0.5,
        )
    }
}

/// One triangulation primitive. Its winding follows the face normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle(pub [Vertex; 3]);

impl Triangle {
    #[inline]
    pub const fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self([a, b, c])
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 3] {
        &self.0
    }

    /// Directed edges in winding order
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.0;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Unnormalized normal; its length is twice the triangle area.
    #[inline]
    pub fn cross(&self) -> Vector3<f64> {
        let [a, b, c] = &self.0;
        a.to(b).cross(&a.to(c))
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.cross().norm() * 0.5
    }

    #[inline]
    pub fn has_repeated_vertex(&self) -> bool {
        let [a, b, c] = &self.0;
        a == b || b == c || c == a
    }

    #[inline]
    pub fn flipped(&self) -> Self {
        let [a, b, c] = self.0;
        Self([a, c, b])
    }

    /// Flips the winding if it disagrees with `normal`
    pub fn oriented_to(&self, normal: &Vector3<f64>) -> Self {
        if self.cross().dot(normal) < 0.0 {
            self.flipped()
        } else {
            *self
        }
    }
}
