//! Solid cone closing a region's caps at the globe centre
//!
//! The cone of a footprint is bounded by its subdivided cap and by walls
//! running from the globe centre (the tip) to every rim edge. Wall planes
//! pass through the centre, so the cone's footprint on any sphere is exactly
//! the cap's footprint. The cap itself is pushed radially outward until all
//! of its facets clear the bounding shell; carving then never sees the cap.

use glam::DVec3;

use super::cap::Cap;
use crate::error::{Result, SynthesisError};
use crate::mesh::{MeshBuffer, Triangle};

/// Extra reach of the cap beyond the shell, as a fraction of the shell radius
pub const CONE_REACH_MARGIN: f64 = 0.05;

/// Merge the caps of one region into a single closed, outward-wound cone
///
/// Every wall triangle lists the tip (the origin) as its first vertex.
///
/// # Arguments
///
/// * `caps` - One cap per polygon of the region
/// * `shell_radius` - Radius the cap facets must clear
///
/// # Errors
///
/// Returns `DegenerateGeometry` if there are no usable cap facets or a facet
/// plane passes through the globe centre.
pub fn build_cone(caps: &[Cap], shell_radius: f64) -> Result<MeshBuffer> {
    let min_plane_distance = caps
        .iter()
        .flat_map(|cap| cap.leaves.iter())
        .filter(|leaf| !leaf.triangle.is_degenerate())
        .map(|leaf| leaf.triangle.normal().dot(leaf.triangle.vertices[0]))
        .fold(f64::INFINITY, f64::min);

    if !min_plane_distance.is_finite() {
        return Err(SynthesisError::degenerate("region has no cap facets"));
    }
    if min_plane_distance <= 1e-9 {
        return Err(SynthesisError::degenerate(format!(
            "cap facet plane passes within {:e} of the globe centre",
            min_plane_distance
        )));
    }

    let scale = shell_radius * (1.0 + CONE_REACH_MARGIN) / min_plane_distance;
    let mut cone = MeshBuffer::new();

    for cap in caps {
        for leaf in cap.leaves.iter().filter(|l| !l.triangle.is_degenerate()) {
            let [a, b, c] = leaf.triangle.vertices;
            cone.push_triangle(Triangle::new(a * scale, b * scale, c * scale));
        }
        for (from, to) in cap.rim_edges() {
            cone.push_triangle(Triangle::new(DVec3::ZERO, to * scale, from * scale));
        }
    }

    log::debug!(
        "cone: {} triangles, cap scaled by {:.4}",
        cone.triangle_count(),
        scale
    );
    Ok(cone)
}
