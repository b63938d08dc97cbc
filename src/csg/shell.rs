//! Bounding shell: a closed UV sphere

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::error::{Result, SynthesisError};
use crate::mesh::MeshBuffer;

/// Build a closed, outward-wound UV sphere
///
/// Vertices are laid out in `height_segments + 1` rings of
/// `width_segments + 1` vertices, poles included, the seam column repeated.
/// Pole rows emit a single triangle per cell so no triangle is degenerate.
///
/// # Errors
///
/// Returns `Configuration` if `radius` is not positive or the segment counts
/// are below 3 (width) or 2 (height).
pub fn bounding_shell(radius: f64, width_segments: u32, height_segments: u32) -> Result<MeshBuffer> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(SynthesisError::config(format!(
            "shell radius must be positive (got {})",
            radius
        )));
    }
    if width_segments < 3 || height_segments < 2 {
        return Err(SynthesisError::config(format!(
            "shell needs at least 3x2 segments (got {}x{})",
            width_segments, height_segments
        )));
    }

    let (w, h) = (width_segments, height_segments);
    let row = w + 1;

    let mut positions = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    for iy in 0..=h {
        let theta = iy as f64 / h as f64 * PI;
        for ix in 0..=w {
            let phi = ix as f64 / w as f64 * TAU;
            positions.push(DVec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ));
        }
    }

    let mut indices = Vec::with_capacity((2 * w * (h - 1)) as usize);
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.push([a, b, d]);
            }
            if iy != h - 1 {
                indices.push([b, c, d]);
            }
        }
    }

    log::debug!(
        "bounding shell r={} {}x{}: {} triangles",
        radius,
        w,
        h,
        indices.len()
    );

    Ok(MeshBuffer {
        positions,
        indices,
        normals: None,
    })
}
