//! Shell carving with constructive solid geometry
//!
//! The carver keeps the part of the bounding shell that lies inside a
//! region's cone. It does so by subtracting the cone's complement (the same
//! cone, wound inward) from the shell, which leaves the curved shell patch
//! over the footprint plus the cone walls inside the shell. Wall pieces all
//! lie in planes through the cone tip and are dropped before returning.
//!
//! Boolean operations sit behind [`MeshBoolean`] so another solver can be
//! dropped in; [`CsgBoolean`] over `csgrs` is the built-in one.

mod boolean;
mod shell;

pub use boolean::CsgBoolean;
pub use shell::bounding_shell;

use glam::DVec3;

use crate::error::{Result, SynthesisError};
use crate::mesh::MeshBuffer;

/// Relative tolerance on the vector-area sum of a closed surface
pub const CLOSURE_TOLERANCE: f64 = 1e-6;

/// Relative distance under which a facet plane passes through the cone tip
pub const WALL_PLANE_TOLERANCE: f64 = 1e-7;

/// Boolean operations on closed, outward-wound meshes
///
/// Implementations may assume both operands pass [`validate_solid`].
pub trait MeshBoolean: Send + Sync {
    /// Compute the union of two solids (A ∪ B)
    fn union(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer>;

    /// Compute the intersection of two solids (A ∩ B)
    fn intersection(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer>;

    /// Subtract solid B from solid A (A \ B)
    fn difference(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer>;
}

/// Check that `mesh` bounds a solid: finite, closed and wound outward
///
/// Closure is tested through the vector-area sum, which vanishes for any
/// closed surface and tolerates T-junctions left by adaptive subdivision.
///
/// # Errors
///
/// Returns `DegenerateGeometry` naming `what` and the violated condition.
pub fn validate_solid(mesh: &MeshBuffer, what: &str) -> Result<()> {
    if mesh.is_empty() {
        return Err(SynthesisError::degenerate(format!("{} is empty", what)));
    }
    let n = mesh.positions.len() as u32;
    if mesh.indices.iter().flatten().any(|&i| i >= n) {
        return Err(SynthesisError::degenerate(format!(
            "{} has out-of-range indices",
            what
        )));
    }
    if !mesh.positions.iter().all(|p| p.is_finite()) {
        return Err(SynthesisError::degenerate(format!(
            "{} has non-finite vertices",
            what
        )));
    }

    let area = mesh.surface_area();
    let open = mesh.vector_area().length();
    if !(area > 0.0) || open > CLOSURE_TOLERANCE * area {
        return Err(SynthesisError::degenerate(format!(
            "{} is not closed (open area {:e} of {:e})",
            what, open, area
        )));
    }
    if mesh.signed_volume() <= 0.0 {
        return Err(SynthesisError::degenerate(format!(
            "{} is inverted",
            what
        )));
    }
    Ok(())
}

/// Carve a region patch out of the bounding shell
///
/// Both operands must be closed and outward-wound, and the cone's tip must
/// sit at the origin. The result is the part of the shell inside `cone`
/// with the cone walls dropped.
///
/// # Errors
///
/// Returns `DegenerateGeometry` when either operand fails
/// [`validate_solid`], or whatever the solver reports.
pub fn carve<B>(boolean: &B, shell: &MeshBuffer, cone: &MeshBuffer) -> Result<MeshBuffer>
where
    B: MeshBoolean + ?Sized,
{
    validate_solid(shell, "bounding shell")?;
    validate_solid(cone, "region cone")?;

    let complement = cone.clone().inverted();
    let carved = boolean.difference(shell, &complement)?;
    let patch = strip_walls(&carved, DVec3::ZERO);

    log::debug!(
        "carve: shell {} + cone {} -> {} triangles, {} wall pieces dropped",
        shell.triangle_count(),
        cone.triangle_count(),
        patch.triangle_count(),
        carved.triangle_count() - patch.triangle_count()
    );
    Ok(patch)
}

/// Keep the triangles whose plane stays clear of `tip`
fn strip_walls(mesh: &MeshBuffer, tip: DVec3) -> MeshBuffer {
    MeshBuffer::from_triangles(mesh.triangles().filter(|t| {
        let reach = t
            .vertices
            .iter()
            .map(|v| v.distance(tip))
            .fold(0.0, f64::max);
        (t.vertices[0] - tip).dot(t.normal()).abs() > WALL_PLANE_TOLERANCE * reach
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoCoordinate;
    use crate::mesh::tests::unit_cube;
    use crate::mesh::Triangle;
    use crate::tessellation::{build_cap, build_cone, SubdivisionBudget};
    use glam::DVec3;

    #[test]
    fn test_validate_accepts_cube() {
        assert!(validate_solid(&unit_cube(), "cube").is_ok());
    }

    #[test]
    fn test_validate_rejects_open_mesh() {
        let mut cube = unit_cube();
        cube.indices.pop();
        let err = validate_solid(&cube, "cube").unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_validate_rejects_inverted_mesh() {
        let err = validate_solid(&unit_cube().inverted(), "cube").unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn test_validate_rejects_empty_and_nan() {
        assert!(validate_solid(&MeshBuffer::new(), "nothing").is_err());

        let mut cube = unit_cube();
        cube.positions[0].x = f64::NAN;
        assert!(validate_solid(&cube, "cube").is_err());
    }

    #[test]
    fn test_carve_rejects_inverted_cone() {
        let shell = bounding_shell(2.0, 8, 4).unwrap();
        let err = carve(&CsgBoolean, &shell, &unit_cube().inverted()).unwrap_err();
        assert!(matches!(err, SynthesisError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_carve_keeps_patch_inside_footprint() {
        let ring: Vec<GeoCoordinate> = [[0.0, 0.0], [0.0, 20.0], [20.0, 20.0], [20.0, 0.0]]
            .into_iter()
            .map(GeoCoordinate::from)
            .collect();
        let budget = SubdivisionBudget::new(1, 1e-6).unwrap();
        let cap = build_cap(&ring, &budget, 10.0).unwrap();
        let cone = build_cone(std::slice::from_ref(&cap), 11.0).unwrap();
        let shell = bounding_shell(11.0, 24, 12).unwrap();

        let carved = carve(&CsgBoolean, &shell, &cone).unwrap();
        assert!(!carved.is_empty());

        // only the patch remains: on the shell, over the footprint
        for t in carved.triangles() {
            for v in t.vertices {
                assert!(v.length() <= 11.0 + 1e-6 && v.length() > 10.5);
                assert!(v.normalize().dot(cap.apex) > 0.9);
            }
        }
    }

    #[test]
    fn test_strip_walls_keeps_offset_facets() {
        let mesh = MeshBuffer::from_triangles([
            Triangle::new(DVec3::ZERO, DVec3::X, DVec3::Y),
            Triangle::new(DVec3::X * 2.0, DVec3::new(3.0, 1.0, 0.0), DVec3::new(2.0, 1.0, 0.0)),
            Triangle::new(DVec3::Z, DVec3::new(1.0, 0.0, 1.0), DVec3::new(0.0, 1.0, 1.0)),
        ]);
        let kept = strip_walls(&mesh, DVec3::ZERO);
        assert_eq!(kept.triangle_count(), 1);
        assert!(kept.positions.iter().all(|p| p.z == 1.0));
    }
}
