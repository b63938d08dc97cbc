//! Triangle fan from a shared apex to a polygon ring

use glam::DVec3;

use crate::geo::{project, DirectionVector, GeoCoordinate};
use crate::mesh::{MeshBuffer, Triangle};

/// Build a closed triangle fan from `apex` to every edge of `ring`
///
/// Every ring coordinate is projected onto the unit sphere. The apex is
/// vertex 0 and ring point `i` is vertex `i + 1`. One triangle is emitted per
/// ring point, the last one wrapping back to the first ring point, so a
/// ring of N coordinates gives N triangles over N + 1 vertices. A GeoJSON
/// ring whose closing point repeats the first yields one zero-area triangle;
/// strip it with [`open_ring`](crate::geo::open_ring) first if that matters.
///
/// Each triangle is wound so that its normal points away from the globe
/// centre (`normal · centroid >= 0`), whatever the ring's own orientation.
///
/// # Example
///
/// ```
/// use globe_regions::geo::{project, GeoCoordinate};
/// use globe_regions::tessellation::build_fan;
///
/// let ring = [
///     GeoCoordinate::new(0.0, 0.0),
///     GeoCoordinate::new(0.0, 10.0),
///     GeoCoordinate::new(10.0, 10.0),
///     GeoCoordinate::new(10.0, 0.0),
/// ];
/// let fan = build_fan(&ring, project(GeoCoordinate::new(5.0, 5.0)));
/// assert_eq!(fan.triangle_count(), 4);
/// assert_eq!(fan.vertex_count(), 5);
/// ```
pub fn build_fan(ring: &[GeoCoordinate], apex: DirectionVector) -> MeshBuffer {
    let n = ring.len() as u32;

    let mut positions = Vec::with_capacity(ring.len() + 1);
    positions.push(apex);
    positions.extend(ring.iter().map(|&c| project(c)));

    let mut indices = Vec::with_capacity(ring.len());
    for i in 1..=n {
        let next = (i % n) + 1;
        let mut tri = [0, i, next];
        let triangle = Triangle::new(
            positions[0],
            positions[i as usize],
            positions[next as usize],
        );
        if !triangle.faces_away_from(DVec3::ZERO) {
            tri.swap(1, 2);
        }
        indices.push(tri);
    }

    MeshBuffer {
        positions,
        indices,
        normals: None,
    }
}

/// Whether every fan triangle would keep the ring's own orientation
///
/// A fan over a ring that is star-shaped around its apex needs either no
/// winding corrections or a correction on every triangle. A mix means some
/// triangles overlap, and the fan does not cover the footprint exactly.
pub(crate) fn is_consistent_fan(fan: &MeshBuffer) -> bool {
    let mut kept = 0usize;
    let mut swapped = 0usize;
    let n = fan.indices.len() as u32;
    for (i, tri) in fan.indices.iter().enumerate() {
        let expected_next = ((i as u32 + 1) % n) + 1;
        if fan.triangle(i).is_degenerate() {
            continue;
        }
        if tri[2] == expected_next {
            kept += 1;
        } else {
            swapped += 1;
        }
    }
    kept == 0 || swapped == 0
}
