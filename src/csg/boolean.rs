//! [`MeshBoolean`] backed by the `csgrs` solid modeller

use csgrs::csg::CSG;
use csgrs::polygon::Polygon as CsgPolygon;
use csgrs::vertex::Vertex as CsgVertex;
use glam::DVec3;
use nalgebra::{Point3, Vector3};

use super::MeshBoolean;
use crate::error::Result;
use crate::mesh::{MeshBuffer, Triangle};

/// Boolean solver over `csgrs` polygon solids
///
/// Operands are handed over as triangle soups. Results come back unindexed;
/// every convex output polygon is fan-triangulated from its first vertex and
/// slivers with no area are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsgBoolean;

impl MeshBoolean for CsgBoolean {
    fn union(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer> {
        Ok(from_csg(&to_csg(a).union(&to_csg(b))))
    }

    fn intersection(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer> {
        Ok(from_csg(&to_csg(a).intersection(&to_csg(b))))
    }

    fn difference(&self, a: &MeshBuffer, b: &MeshBuffer) -> Result<MeshBuffer> {
        Ok(from_csg(&to_csg(a).difference(&to_csg(b))))
    }
}

fn point(v: DVec3) -> Point3<f64> {
    Point3::new(v.x, v.y, v.z)
}

/// One `csgrs` polygon per non-degenerate triangle
pub(crate) fn to_csg(mesh: &MeshBuffer) -> CSG<()> {
    let polygons: Vec<CsgPolygon<()>> = mesh
        .triangles()
        .filter(|t| !t.is_degenerate())
        .map(|t| {
            let n = t.normal();
            let normal = Vector3::new(n.x, n.y, n.z);
            let vertices = t
                .vertices
                .iter()
                .map(|&v| CsgVertex::new(point(v), normal))
                .collect();
            CsgPolygon::new(vertices, None)
        })
        .collect();
    CSG::from_polygons(&polygons)
}

pub(crate) fn from_csg(csg: &CSG<()>) -> MeshBuffer {
    let mut mesh = MeshBuffer::new();
    for polygon in &csg.polygons {
        let v: Vec<DVec3> = polygon
            .vertices
            .iter()
            .map(|v| DVec3::new(v.pos.x, v.pos.y, v.pos.z))
            .collect();
        for i in 1..v.len().saturating_sub(1) {
            let triangle = Triangle::new(v[0], v[i], v[i + 1]);
            if !triangle.is_degenerate() {
                mesh.push_triangle(triangle);
            }
        }
    }
    mesh
}
