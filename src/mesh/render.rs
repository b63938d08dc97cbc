//! Engine-agnostic render buffers

use glam::DVec3;

use super::MeshBuffer;

/// Render-ready mesh data
///
/// Flat `f32` arrays suitable for any rendering engine:
/// - Bevy: Convert to `Mesh` with attributes
/// - Godot: Convert to `ArrayMesh`
/// - wgpu: Use directly as vertex buffers
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals; empty for flat-shaded meshes
    pub normals: Vec<[f32; 3]>,
    /// Vertex colors (RGBA)
    pub colors: Vec<[f32; 4]>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl RenderData {
    /// Narrow a [`MeshBuffer`] to `f32`, painting every vertex with `color`
    pub fn from_mesh(mesh: &MeshBuffer, color: [f32; 4]) -> Self {
        let narrow = |v: &DVec3| v.as_vec3().to_array();

        Self {
            positions: mesh.positions.iter().map(narrow).collect(),
            normals: mesh
                .normals
                .as_ref()
                .map(|normals| normals.iter().map(narrow).collect())
                .unwrap_or_default(),
            colors: vec![color; mesh.positions.len()],
            indices: mesh.indices.iter().flatten().copied().collect(),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
