use cad_kernel::{Point3d, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::TessError;
use crate::tessellation::Tessellation;

/// Span of triangles in a [`TriangleMesh`] that came from one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRange {
    pub face: usize,
    pub start: u32,
    pub count: u32,
}

/// Flat indexed triangle mesh in global point order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Area-weighted vertex normals [nx, ny, nz, ...]
    pub normals: Vec<f32>,
    /// Triangle indices, 0-based.
    pub indices: Vec<u32>,
    pub face_ranges: Vec<FaceRange>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertex_count() as u32;
        let tri_offset = self.triangle_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
        self.face_ranges.extend(other.face_ranges.iter().map(|r| FaceRange {
            start: r.start + tri_offset,
            ..*r
        }));
    }
}

impl Tessellation {
    /// Render-ready mesh of a finalized tessellation. Vertex `i` is global
    /// point `i + 1`.
    pub fn to_triangle_mesh(&self) -> Result<TriangleMesh, TessError> {
        let points = self.global_points()?;
        let mut normals = vec![Vec3::ZERO; points.len()];
        let mut mesh = TriangleMesh::new();
        for p in points {
            mesh.positions
                .extend([p.xyz.x as f32, p.xyz.y as f32, p.xyz.z as f32]);
        }

        for f in 0..self.face_count() {
            let face = self.face(f)?;
            let start = mesh.triangle_count() as u32;
            for tri in &face.triangles {
                let mut g = [0usize; 3];
                for c in 0..3 {
                    g[c] = self.global_index_of_face_point(f, tri[c])? - 1;
                }
                let [a, b, c]: [Point3d; 3] = g.map(|i| points[i].xyz);
                let n = (b - a).cross(&(c - a));
                for &i in &g {
                    normals[i] = normals[i] + n;
                    mesh.indices.push(i as u32);
                }
            }
            mesh.face_ranges.push(FaceRange {
                face: f,
                start,
                count: mesh.triangle_count() as u32 - start,
            });
        }

        for n in normals {
            let n = n.normalized().unwrap_or(Vec3::ZERO);
            mesh.normals.extend([n.x as f32, n.y as f32, n.z as f32]);
        }
        Ok(mesh)
    }
}
