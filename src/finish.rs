//! Mesh finishing: apex removal, vertex welding and normals
//!
//! Carving leaves cone walls that all touch the cone tip. [`finish`] drops
//! every triangle with a vertex near that tip, welds coincident vertices into
//! an indexed mesh and only then computes normals.
//!
//! Welding only sees vertices still referenced after apex removal, and is
//! greedy in order of first use: each vertex merges into the nearest earlier
//! surviving vertex closer than the tolerance, or survives itself. Survivors
//! are therefore original vertices clear of the apex and pairwise at least
//! one tolerance apart, so finishing a finished mesh changes nothing.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::mesh::{MeshBuffer, Shading};

/// Default distance under which two vertices are merged, in world units
pub const DEFAULT_WELD_TOLERANCE: f64 = 0.001;

/// Options for [`finish`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishOptions {
    /// Apex proximity and weld distance
    pub tolerance: f64,
    /// Normal strategy
    pub shading: Shading,
}

impl Default for FinishOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_WELD_TOLERANCE,
            shading: Shading::Smooth,
        }
    }
}

/// Finish a carved mesh for rendering
///
/// # Arguments
///
/// * `mesh` - Carved mesh, indexed or not
/// * `apex` - Cone tip whose incident triangles are removed
/// * `options` - Tolerance and shading
///
/// # Errors
///
/// Returns `DegenerateGeometry` if an index points past the vertex buffer.
pub fn finish(mesh: MeshBuffer, apex: DVec3, options: &FinishOptions) -> Result<MeshBuffer> {
    let n = mesh.positions.len() as u32;
    if let Some(&bad) = mesh.indices.iter().flatten().find(|&&i| i >= n) {
        return Err(SynthesisError::degenerate(format!(
            "index {} out of range for {} vertices",
            bad, n
        )));
    }

    let before = mesh.triangle_count();
    let stripped = remove_apex(mesh, apex, options.tolerance);
    let mut welded = weld(stripped, options.tolerance);

    match options.shading {
        Shading::Smooth => welded.compute_smooth_normals(),
        Shading::Flat => welded.normals = None,
    }

    log::debug!(
        "finish: {} -> {} triangles, {} vertices",
        before,
        welded.triangle_count(),
        welded.vertex_count()
    );
    Ok(welded)
}

/// Drop every triangle with any vertex within `tolerance` of `apex`
///
/// Whole triangles go; vertices are left for [`weld`] to compact. Indices
/// must be in range.
pub(crate) fn remove_apex(mut mesh: MeshBuffer, apex: DVec3, tolerance: f64) -> MeshBuffer {
    let near: Vec<bool> = mesh
        .positions
        .iter()
        .map(|p| p.distance(apex) < tolerance)
        .collect();
    mesh.indices
        .retain(|tri| !tri.iter().any(|&i| near[i as usize]));
    mesh
}

/// Merge vertices closer than `tolerance` and compact the buffer
///
/// Unreferenced vertices are removed first so they can never absorb a kept
/// one. Triangles that collapse are dropped and the surviving vertices are
/// renumbered in order of first use. Any normals are discarded since they no
/// longer match the topology. Indices must be in range.
pub(crate) fn weld(mesh: MeshBuffer, tolerance: f64) -> MeshBuffer {
    let mesh = compact(mesh);
    let representative = weld_map(&mesh.positions, tolerance);

    let mut remap: Vec<Option<u32>> = vec![None; mesh.positions.len()];
    let mut positions = Vec::new();
    let mut indices = Vec::with_capacity(mesh.indices.len());

    for tri in &mesh.indices {
        let [a, b, c] = tri.map(|i| representative[i as usize]);
        if a == b || b == c || c == a {
            continue;
        }
        indices.push([a, b, c].map(|r| {
            *remap[r].get_or_insert_with(|| {
                positions.push(mesh.positions[r]);
                (positions.len() - 1) as u32
            })
        }));
    }

    MeshBuffer {
        positions,
        indices,
        normals: None,
    }
}

/// Drop unreferenced vertices, renumbering in order of first use
fn compact(mesh: MeshBuffer) -> MeshBuffer {
    let mut remap: Vec<Option<u32>> = vec![None; mesh.positions.len()];
    let mut positions = Vec::new();
    let indices = mesh
        .indices
        .iter()
        .map(|tri| {
            tri.map(|i| {
                *remap[i as usize].get_or_insert_with(|| {
                    positions.push(mesh.positions[i as usize]);
                    (positions.len() - 1) as u32
                })
            })
        })
        .collect();

    MeshBuffer {
        positions,
        indices,
        normals: None,
    }
}

/// For every vertex, the index of the vertex it welds into
#[cfg(feature = "spatial-index")]
fn weld_map(positions: &[DVec3], tolerance: f64) -> Vec<usize> {
    use crate::spatial::SpatialIndex;

    let index = SpatialIndex::new(positions);
    let mut representative: Vec<usize> = Vec::with_capacity(positions.len());

    for (i, &p) in positions.iter().enumerate() {
        let nearest = index
            .within_radius(p, tolerance)
            .into_iter()
            .filter(|&j| j < i && representative[j] == j)
            .map(|j| (p.distance_squared(positions[j]), j))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        representative.push(nearest.map_or(i, |(_, j)| j));
    }
    representative
}

#[cfg(not(feature = "spatial-index"))]
fn weld_map(positions: &[DVec3], tolerance: f64) -> Vec<usize> {
    let tolerance_sq = tolerance * tolerance;
    let mut survivors: Vec<usize> = Vec::new();
    let mut representative: Vec<usize> = Vec::with_capacity(positions.len());

    for (i, &p) in positions.iter().enumerate() {
        let nearest = survivors
            .iter()
            .map(|&j| (p.distance_squared(positions[j]), j))
            .filter(|&(d, _)| d < tolerance_sq)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        match nearest {
            Some((_, j)) => representative.push(j),
            None => {
                survivors.push(i);
                representative.push(i);
            }
        }
    }
    representative
}
