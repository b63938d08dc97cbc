//! Adaptive triangle subdivision on the sphere
//!
//! Triangles are split 1-to-4 at their edge midpoints until either the depth
//! budget runs out or the longest edge is shorter than the minimum edge
//! length. Midpoints come from spherical linear interpolation and are scaled
//! back to the working radius, so every generated vertex sits exactly on the
//! sphere no matter how deep the split goes.
//!
//! The split runs on an explicit work stack; stack depth never grows with
//! the subdivision depth.

use std::f64::consts::PI;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::mesh::{MeshBuffer, Triangle};

/// Deepest subdivision accepted by [`SubdivisionBudget::new`]
///
/// Each level multiplies the triangle count by four.
pub const MAX_SUBDIVISION_DEPTH: u32 = 12;

/// Sines below this are treated as a zero angle (identical or antipodal)
const NEAR_ZERO_SINE: f64 = 1e-9;

/// How far the subdivider may go: a depth limit and an edge-length floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubdivisionBudget {
    /// Maximum number of 1-to-4 splits along any chain
    pub max_depth: u32,
    /// Triangles whose longest edge is shorter than this are not split
    pub min_edge_length: f64,
}

impl SubdivisionBudget {
    /// Create a budget
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `max_depth` exceeds
    /// [`MAX_SUBDIVISION_DEPTH`] or `min_edge_length` is not a positive
    /// finite number.
    pub fn new(max_depth: u32, min_edge_length: f64) -> Result<Self> {
        if max_depth > MAX_SUBDIVISION_DEPTH {
            return Err(SynthesisError::config(format!(
                "subdivision depth must be <= {} (got {})",
                MAX_SUBDIVISION_DEPTH, max_depth
            )));
        }
        if !(min_edge_length > 0.0 && min_edge_length.is_finite()) {
            return Err(SynthesisError::config(format!(
                "minimum edge length must be positive (got {})",
                min_edge_length
            )));
        }
        Ok(Self {
            max_depth,
            min_edge_length,
        })
    }
}

impl Default for SubdivisionBudget {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_edge_length: 0.05,
        }
    }
}

/// A subdivided triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub triangle: Triangle,
    /// Number of splits between the input triangle and this leaf
    pub depth: u32,
    /// Which edges lie on the input triangle's flagged edges.
    /// Edge `k` runs from vertex `k` to vertex `k + 1`.
    pub rim: [bool; 3],
}

/// Spherical linear interpolation between two directions
///
/// Returns a unit vector on the great-circle arc from `a` to `b`. Inputs
/// need not be normalised. Degenerate cases resolve deterministically:
///
/// - a zero input is replaced by the other input (both zero gives `+X`)
/// - identical directions return `a`
/// - antipodal directions rotate `a` by `t * π` towards
///   `a.any_orthonormal_vector()`
///
/// ```
/// use glam::DVec3;
/// use globe_regions::tessellation::slerp;
///
/// let mid = slerp(DVec3::X, DVec3::Y, 0.5);
/// let expected = DVec3::new(1.0, 1.0, 0.0).normalize();
/// assert!((mid - expected).length() < 1e-12);
/// ```
pub fn slerp(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    let (a, b) = match (a.try_normalize(), b.try_normalize()) {
        (Some(a), Some(b)) => (a, b),
        (Some(a), None) => return a,
        (None, Some(b)) => return b,
        (None, None) => return DVec3::X,
    };

    let dot = a.dot(b).clamp(-1.0, 1.0);
    let theta = dot.acos();
    let sin_theta = theta.sin();

    if sin_theta < NEAR_ZERO_SINE {
        if dot > 0.0 {
            return a;
        }
        let perp = a.any_orthonormal_vector();
        let angle = t * PI;
        return a * angle.cos() + perp * angle.sin();
    }

    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    (a * wa + b * wb).normalize()
}

/// Subdivide one triangle and return its leaves as an unindexed mesh
///
/// The input vertices are first pushed onto the sphere of `radius`.
pub fn subdivide(triangle: &Triangle, budget: &SubdivisionBudget, radius: f64) -> MeshBuffer {
    MeshBuffer::from_triangles(
        subdivide_leaves(*triangle, [false; 3], budget, radius)
            .into_iter()
            .map(|leaf| leaf.triangle),
    )
}

/// Subdivide one triangle, tracking which leaf edges lie on flagged edges
///
/// `rim` flags edges of the input triangle (edge `k` is vertex `k` to
/// `k + 1`); every leaf edge that is a piece of a flagged edge is flagged in
/// turn. Leaves come out wound outward and in depth-first order.
pub fn subdivide_leaves(
    triangle: Triangle,
    rim: [bool; 3],
    budget: &SubdivisionBudget,
    radius: f64,
) -> Vec<Leaf> {
    let [a, b, c] = triangle.vertices;
    let root = Triangle::new(
        a.normalize_or_zero() * radius,
        b.normalize_or_zero() * radius,
        c.normalize_or_zero() * radius,
    );

    let mut leaves = Vec::new();
    let mut stack = vec![oriented(root, rim, 0)];

    while let Some((tri, rim, depth)) = stack.pop() {
        if depth >= budget.max_depth || tri.longest_edge() < budget.min_edge_length {
            leaves.push(Leaf {
                triangle: tri,
                depth,
                rim,
            });
            continue;
        }

        let [v0, v1, v2] = tri.vertices;
        let m01 = slerp(v0, v1, 0.5) * radius;
        let m12 = slerp(v1, v2, 0.5) * radius;
        let m20 = slerp(v2, v0, 0.5) * radius;
        let [r0, r1, r2] = rim;

        let children = [
            (Triangle::new(v0, m01, m20), [r0, false, r2]),
            (Triangle::new(m01, v1, m12), [r0, r1, false]),
            (Triangle::new(m12, v2, m20), [r1, r2, false]),
            (Triangle::new(m20, m01, m12), [false; 3]),
        ];
        for (child, child_rim) in children.into_iter().rev() {
            stack.push(oriented(child, child_rim, depth + 1));
        }
    }

    leaves
}

fn oriented(mut tri: Triangle, rim: [bool; 3], depth: u32) -> (Triangle, [bool; 3], u32) {
    if tri.ensure_outward(DVec3::ZERO) {
        // v1 and v2 swapped: edge 0 and edge 2 trade places
        (tri, [rim[2], rim[1], rim[0]], depth)
    } else {
        (tri, rim, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_direction(rng: &mut ChaCha8Rng) -> DVec3 {
        loop {
            let v = DVec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if let Some(v) = v.try_normalize() {
                return v;
            }
        }
    }

    /// A small outward triangle around a random direction
    fn random_triangle(rng: &mut ChaCha8Rng, spread: f64) -> Triangle {
        let c = random_direction(rng);
        let e1 = c.any_orthonormal_vector();
        let e2 = c.cross(e1);
        let mut t = Triangle::new(
            c + e1 * spread,
            c + (e2 * 0.87 - e1 * 0.5) * spread,
            c + (-e2 * 0.87 - e1 * 0.5) * spread,
        );
        t.ensure_outward(DVec3::ZERO);
        t
    }

    #[test]
    fn test_slerp_endpoints_and_midpoint() {
        let a = DVec3::new(1.0, 2.0, 3.0).normalize();
        let b = DVec3::new(-2.0, 0.5, 1.0).normalize();
        assert!((slerp(a, b, 0.0) - a).length() < 1e-12);
        assert!((slerp(a, b, 1.0) - b).length() < 1e-12);

        let mid = slerp(a, b, 0.5);
        assert!((mid.length() - 1.0).abs() < 1e-12);
        assert!((mid.angle_between(a) - mid.angle_between(b)).abs() < 1e-12);
    }

    #[test]
    fn test_slerp_identical_returns_first() {
        let a = DVec3::new(0.3, -0.4, 0.5);
        assert!((slerp(a, a * 7.0, 0.5) - a.normalize()).length() < 1e-12);
    }

    #[test]
    fn test_slerp_antipodal_is_finite_and_deterministic() {
        let a = DVec3::Y;
        let mid = slerp(a, -a, 0.5);
        assert!(mid.is_finite());
        assert!((mid.length() - 1.0).abs() < 1e-12);
        assert!(mid.dot(a).abs() < 1e-12);
        assert_eq!(mid, slerp(a, -a, 0.5));
        assert!((mid - a.any_orthonormal_vector()).length() < 1e-12);
    }

    #[test]
    fn test_slerp_zero_inputs() {
        assert_eq!(slerp(DVec3::ZERO, DVec3::Z * 2.0, 0.5), DVec3::Z);
        assert_eq!(slerp(DVec3::ZERO, DVec3::ZERO, 0.5), DVec3::X);
    }

    #[test]
    fn test_budget_validation() {
        assert!(SubdivisionBudget::new(3, 0.05).is_ok());
        assert!(SubdivisionBudget::new(MAX_SUBDIVISION_DEPTH + 1, 0.05).is_err());
        assert!(SubdivisionBudget::new(3, 0.0).is_err());
        assert!(SubdivisionBudget::new(3, f64::NAN).is_err());
        assert_eq!(SubdivisionBudget::default().max_depth, 3);
    }

    #[test]
    fn test_vertices_stay_on_sphere() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let radius = 100.0;
        let budget = SubdivisionBudget::new(5, 1e-3).unwrap();

        for _ in 0..50 {
            let spread = rng.gen_range(0.01..0.5);
            let tri = random_triangle(&mut rng, spread);
            for leaf in subdivide_leaves(tri, [false; 3], &budget, radius) {
                for v in leaf.triangle.vertices {
                    assert!((v.length() - radius).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_leaves_respect_budget() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let radius = 100.0;

        for _ in 0..50 {
            let depth = rng.gen_range(0..=4);
            let min_edge = rng.gen_range(0.5..20.0);
            let budget = SubdivisionBudget::new(depth, min_edge).unwrap();
            let spread = rng.gen_range(0.02..0.4);
            let tri = random_triangle(&mut rng, spread);

            for leaf in subdivide_leaves(tri, [false; 3], &budget, radius) {
                assert!(leaf.depth <= depth);
                assert!(
                    leaf.triangle.longest_edge() < min_edge || leaf.depth == depth,
                    "leaf at depth {} has edge {}",
                    leaf.depth,
                    leaf.triangle.longest_edge()
                );
            }
        }
    }

    #[test]
    fn test_leaves_are_outward() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let budget = SubdivisionBudget::new(4, 1e-6).unwrap();
        for _ in 0..20 {
            let tri = random_triangle(&mut rng, 0.3);
            for leaf in subdivide_leaves(tri, [false; 3], &budget, 1.0) {
                assert!(leaf.triangle.faces_away_from(DVec3::ZERO));
            }
        }
    }

    #[test]
    fn test_full_split_counts() {
        let tri = Triangle::new(DVec3::X, DVec3::Y, DVec3::Z);
        let budget = SubdivisionBudget::new(2, 1e-6).unwrap();
        let mesh = subdivide(&tri, &budget, 10.0);
        assert_eq!(mesh.triangle_count(), 16);

        let budget = SubdivisionBudget::new(0, 1e-6).unwrap();
        assert_eq!(subdivide(&tri, &budget, 10.0).triangle_count(), 1);
    }

    #[test]
    fn test_min_edge_stops_early() {
        let tri = Triangle::new(DVec3::X, DVec3::Y, DVec3::Z);
        // longest edge at radius 1 is sqrt(2)
        let budget = SubdivisionBudget::new(6, 2.0).unwrap();
        assert_eq!(subdivide(&tri, &budget, 1.0).triangle_count(), 1);
    }

    #[test]
    fn test_rim_edges_tile_the_flagged_edge() {
        let tri = Triangle::new(DVec3::X, DVec3::Y, DVec3::Z);
        let budget = SubdivisionBudget::new(3, 1e-6).unwrap();
        let leaves = subdivide_leaves(tri, [false, true, false], &budget, 1.0);

        let mut rim_length = 0.0;
        for leaf in &leaves {
            for k in 0..3 {
                if leaf.rim[k] {
                    let a = leaf.triangle.vertices[k];
                    let b = leaf.triangle.vertices[(k + 1) % 3];
                    // both ends lie on the great circle through Y and Z
                    assert!(a.x.abs() < 1e-12 && b.x.abs() < 1e-12);
                    rim_length += a.distance(b);
                }
            }
        }
        assert_eq!(leaves.iter().flat_map(|l| l.rim).filter(|&r| r).count(), 8);
        // 8 chords approximating a quarter circle
        let expected = 8.0 * 2.0 * (PI / 32.0).sin();
        assert!((rim_length - expected).abs() < 1e-9);
    }
}
