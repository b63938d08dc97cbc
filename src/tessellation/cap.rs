//! Surface cap of a polygon footprint
//!
//! A cap is the footprint's outer ring triangulated on the sphere and
//! subdivided at the globe radius. The fan from the ring centroid is used
//! whenever it covers the footprint exactly (the ring is star-shaped around
//! its centroid). Other rings are ear-clipped in the gnomonic projection
//! about the centroid, where great-circle edges are straight lines.

use glam::DVec3;

use super::fan::{build_fan, is_consistent_fan};
use super::subdivide::{subdivide_leaves, Leaf, SubdivisionBudget};
use crate::error::{Result, SynthesisError};
use crate::geo::{
    centroid_direction, open_ring, project, DirectionVector, GeoCoordinate, GnomonicFrame,
};
use crate::mesh::Triangle;

/// Ring points must lie at least this far in front of the centroid's horizon
const HORIZON_EPSILON: f64 = 1e-9;

/// Fan triangles only ever have their ring edge on the boundary
const FAN_RIM: [bool; 3] = [false, true, false];

/// A triangulated, subdivided footprint
#[derive(Debug, Clone)]
pub struct Cap {
    /// Ring centroid on the unit sphere
    pub apex: DirectionVector,
    /// Leaves at the globe radius; rim edges trace the ring
    pub leaves: Vec<Leaf>,
}

impl Cap {
    /// Iterator over the rim edges as `(from, to)` pairs
    ///
    /// Pairs follow each leaf's outward winding.
    pub fn rim_edges(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        self.leaves.iter().flat_map(|leaf| {
            (0..3).filter(move |&k| leaf.rim[k]).map(move |k| {
                (
                    leaf.triangle.vertices[k],
                    leaf.triangle.vertices[(k + 1) % 3],
                )
            })
        })
    }
}

/// Triangulate and subdivide the footprint of `ring`
///
/// # Arguments
///
/// * `ring` - Outer ring in GeoJSON order; the closing point may be present
/// * `budget` - Subdivision limits
/// * `radius` - Globe radius the leaves are placed on
///
/// # Errors
///
/// Returns `DegenerateGeometry` if the ring has fewer than three distinct
/// points, spans a hemisphere or more, or cannot be triangulated.
pub fn build_cap(ring: &[GeoCoordinate], budget: &SubdivisionBudget, radius: f64) -> Result<Cap> {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return Err(SynthesisError::degenerate(format!(
            "ring has {} distinct points, need at least 3",
            ring.len()
        )));
    }

    let directions: Vec<DirectionVector> = ring.iter().map(|&c| project(c)).collect();
    let apex = centroid_direction(&directions)
        .ok_or_else(|| SynthesisError::degenerate("ring centroid is undefined"))?;
    if directions.iter().any(|d| d.dot(apex) <= HORIZON_EPSILON) {
        return Err(SynthesisError::degenerate(
            "footprint spans a hemisphere or more",
        ));
    }

    let fan = build_fan(&ring, apex);
    let base: Vec<(Triangle, [bool; 3])> = if is_consistent_fan(&fan) {
        fan.triangles()
            .filter(|t| !t.is_degenerate())
            .map(|t| (t, FAN_RIM))
            .collect()
    } else {
        log::warn!(
            "footprint with {} points is not star-shaped, ear clipping instead",
            ring.len()
        );
        ear_clip(&directions, apex)?
    };

    let leaves: Vec<Leaf> = base
        .into_iter()
        .flat_map(|(triangle, rim)| subdivide_leaves(triangle, rim, budget, radius))
        .collect();

    log::debug!(
        "cap of {} ring points -> {} leaves",
        ring.len(),
        leaves.len()
    );

    Ok(Cap { apex, leaves })
}

/// Ear-clip the ring in the gnomonic plane about `apex`
fn ear_clip(directions: &[DirectionVector], apex: DirectionVector) -> Result<Vec<(Triangle, [bool; 3])>> {
    let frame = GnomonicFrame::new(apex);
    let mut flat = Vec::with_capacity(directions.len() * 2);
    for &d in directions {
        let [x, y] = frame
            .project(d)
            .ok_or_else(|| SynthesisError::degenerate("ring point behind the gnomonic horizon"))?;
        flat.push(x);
        flat.push(y);
    }

    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| SynthesisError::degenerate(format!("ear clipping failed: {:?}", e)))?;
    if indices.is_empty() {
        return Err(SynthesisError::degenerate("ear clipping produced no triangles"));
    }

    let n = directions.len();
    let on_ring = |i: usize, j: usize| (i + 1) % n == j || (j + 1) % n == i;

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (i, j, k) = (tri[0], tri[1], tri[2]);
        let mut triangle = Triangle::new(directions[i], directions[j], directions[k]);
        if triangle.is_degenerate() {
            continue;
        }
        let mut rim = [on_ring(i, j), on_ring(j, k), on_ring(k, i)];
        if triangle.ensure_outward(DVec3::ZERO) {
            rim = [rim[2], rim[1], rim[0]];
        }
        triangles.push((triangle, rim));
    }
    Ok(triangles)
}
