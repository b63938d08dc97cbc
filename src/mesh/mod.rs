//! Mesh data model shared by every pipeline stage
//!
//! All stages work on [`MeshBuffer`], an indexed triangle list in double
//! precision. Each stage takes ownership of the buffer it receives and hands
//! a new one to the next; nothing is shared between stages.
//!
//! Orientation convention: triangles are counter-clockwise when viewed from
//! outside the surface, so `(v1 - v0) x (v2 - v0)` points outward.

mod bounds;
mod render;

pub use bounds::MeshBounds;
pub use render::RenderData;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Squared length below which a cross product is treated as zero
const DEGENERATE_AREA_SQ: f64 = 1e-24;

/// A single triangle by value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [DVec3; 3],
}

impl Triangle {
    pub const fn new(a: DVec3, b: DVec3, c: DVec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Unnormalised normal; its length is twice the triangle area
    #[inline]
    pub fn cross(&self) -> DVec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a)
    }

    /// Unit normal, or zero for a degenerate triangle
    #[inline]
    pub fn normal(&self) -> DVec3 {
        self.cross().normalize_or_zero()
    }

    #[inline]
    pub fn area(&self) -> f64 {
        0.5 * self.cross().length()
    }

    #[inline]
    pub fn centroid(&self) -> DVec3 {
        let [a, b, c] = self.vertices;
        (a + b + c) / 3.0
    }

    /// Length of the longest edge (3D chord, not arc)
    pub fn longest_edge(&self) -> f64 {
        let [a, b, c] = self.vertices;
        a.distance(b).max(b.distance(c)).max(c.distance(a))
    }

    pub fn is_degenerate(&self) -> bool {
        self.cross().length_squared() <= DEGENERATE_AREA_SQ
    }

    /// Whether the triangle faces away from `center`
    ///
    /// Uses the sign of `normal · (centroid - center)`. Degenerate triangles
    /// count as outward.
    pub fn faces_away_from(&self, center: DVec3) -> bool {
        self.cross().dot(self.centroid() - center) >= 0.0
    }

    /// Swap the last two vertices so the triangle faces away from `center`
    ///
    /// Returns `true` when the winding was changed.
    pub fn ensure_outward(&mut self, center: DVec3) -> bool {
        if self.faces_away_from(center) {
            false
        } else {
            self.vertices.swap(1, 2);
            true
        }
    }
}

/// Vertex normal strategy applied when a mesh is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shading {
    /// Area-weighted per-vertex normals
    #[default]
    Smooth,
    /// Faceted: no shared vertex normals, use per-face normals
    Flat,
}

/// Indexed triangle mesh in double precision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    /// Vertex positions
    pub positions: Vec<DVec3>,
    /// Triangles as index triples into `positions`
    pub indices: Vec<[u32; 3]>,
    /// Optional per-vertex normals, parallel to `positions`
    pub normals: Option<Vec<DVec3>>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unindexed mesh with three fresh vertices per triangle
    pub fn from_triangles<I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = Triangle>,
    {
        let mut mesh = Self::new();
        for triangle in triangles {
            mesh.push_triangle(triangle);
        }
        mesh
    }

    /// Append a triangle with its own three vertices
    pub fn push_triangle(&mut self, triangle: Triangle) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&triangle.vertices);
        self.indices.push([base, base + 1, base + 2]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Triangle `i` by value
    #[inline]
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.indices[i];
        Triangle::new(
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.indices.len()).map(move |i| self.triangle(i))
    }

    /// Append another mesh, re-basing its indices
    ///
    /// Normals survive only when both sides carry them (or `self` is empty).
    pub fn append(&mut self, other: MeshBuffer) {
        let base = self.positions.len() as u32;
        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut ours), Some(theirs)) => {
                ours.extend(theirs);
                Some(ours)
            }
            (None, theirs) if self.positions.is_empty() => theirs,
            _ => None,
        };
        self.positions.extend(other.positions);
        self.indices.extend(
            other
                .indices
                .into_iter()
                .map(|[a, b, c]| [a + base, b + base, c + base]),
        );
    }

    /// The same surface facing the other way
    ///
    /// The first index of every triangle stays in place.
    pub fn inverted(mut self) -> Self {
        for tri in &mut self.indices {
            tri.swap(1, 2);
        }
        if let Some(normals) = &mut self.normals {
            for n in normals {
                *n = -*n;
            }
        }
        self
    }

    /// Sum of the triangles' area vectors
    ///
    /// Vanishes for a closed surface.
    pub fn vector_area(&self) -> DVec3 {
        self.triangles().map(|t| t.cross() * 0.5).sum()
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }

    /// Signed enclosed volume (divergence theorem)
    ///
    /// Positive for a closed surface wound outward.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|t| {
                let [a, b, c] = t.vertices;
                a.dot(b.cross(c))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Unit normal of every triangle
    pub fn face_normals(&self) -> Vec<DVec3> {
        self.triangles().map(|t| t.normal()).collect()
    }

    /// Recompute area-weighted vertex normals
    ///
    /// Vertices used by no triangle fall back to their radial direction.
    pub fn compute_smooth_normals(&mut self) {
        let mut normals = vec![DVec3::ZERO; self.positions.len()];
        for &[a, b, c] in &self.indices {
            let n = Triangle::new(
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            )
            .cross();
            normals[a as usize] += n;
            normals[b as usize] += n;
            normals[c as usize] += n;
        }
        for (n, p) in normals.iter_mut().zip(&self.positions) {
            *n = n.try_normalize().unwrap_or_else(|| p.normalize_or_zero());
        }
        self.normals = Some(normals);
    }

    /// Translate every vertex by `offset`
    pub fn translate(&mut self, offset: DVec3) {
        if offset == DVec3::ZERO {
            return;
        }
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Convert to engine-ready `f32` buffers with a uniform vertex colour
    pub fn to_render_data(&self, color: [f32; 4]) -> RenderData {
        RenderData::from_mesh(self, color)
    }
}
