//! Bounding volumes for finished meshes

use glam::DVec3;
use parry3d::bounding_volume::{Aabb, BoundingSphere, BoundingVolume};
use parry3d::math::Point;

use super::MeshBuffer;

/// Axis-aligned box plus enclosing sphere of a mesh
///
/// Stored in `f32` like the render buffers; used by the rendering layer for
/// culling and picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub aabb: Aabb,
    pub sphere: BoundingSphere,
}

impl MeshBounds {
    /// Compute bounds for the vertices of `mesh`
    ///
    /// Returns `None` for a mesh without vertices.
    pub fn from_mesh(mesh: &MeshBuffer) -> Option<Self> {
        let first = *mesh.positions.first()?;
        let (mins, maxs) = mesh
            .positions
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));

        let aabb = Aabb::new(to_point(mins), to_point(maxs));
        Some(Self {
            aabb,
            sphere: aabb.bounding_sphere(),
        })
    }

    /// Smallest bounds containing both `self` and `other`
    pub fn merged(&self, other: &MeshBounds) -> MeshBounds {
        let aabb = self.aabb.merged(&other.aabb);
        Self {
            aabb,
            sphere: aabb.bounding_sphere(),
        }
    }

    pub fn contains_point(&self, p: DVec3) -> bool {
        self.aabb.contains_local_point(&to_point(p))
    }
}

fn to_point(v: DVec3) -> Point<f32> {
    Point::new(v.x as f32, v.y as f32, v.z as f32)
}
