//! STL export of a reconciled body's triangle mesh, binary and ASCII.

use cad_tessellation::TriangleMesh;

use crate::helpers::HarnessError;

/// Triangles of `mesh` as corner positions plus unit facet normal, after
/// checking every index.
fn facets(mesh: &TriangleMesh) -> Result<Vec<([f32; 3], [[f32; 3]; 3])>, HarnessError> {
    if mesh.triangle_count() == 0 {
        return Err(HarnessError::StlError {
            reason: "mesh has no triangles".to_string(),
        });
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(HarnessError::StlError {
            reason: format!("index {idx} out of range (vertex count = {vertex_count})"),
        });
    }

    let at = |i: u32| {
        let i = i as usize * 3;
        [mesh.positions[i], mesh.positions[i + 1], mesh.positions[i + 2]]
    };
    Ok(mesh
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let corners = [at(tri[0]), at(tri[1]), at(tri[2])];
            let [p0, p1, p2] = corners;
            let a = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
            let b = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
            let n = [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            let normal = if len > 1e-12 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 0.0, 1.0]
            };
            (normal, corners)
        })
        .collect())
}

/// Export a TriangleMesh as a binary STL file.
///
/// Binary STL format:
/// - 80-byte header (arbitrary text)
/// - u32 triangle count (little-endian)
/// - For each triangle: 3×f32 normal + 3×(3×f32 vertex) + u16 attribute = 50 bytes
pub fn export_binary_stl(mesh: &TriangleMesh, name: &str) -> Result<Vec<u8>, HarnessError> {
    let facets = facets(mesh)?;
    let mut buf = Vec::with_capacity(84 + facets.len() * 50);

    let header = format!("binary STL: {name}");
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(80)]);
    buf.resize(80, 0u8);
    buf.extend_from_slice(&(facets.len() as u32).to_le_bytes());

    for (normal, corners) in &facets {
        for c in normal.iter().chain(corners.iter().flatten()) {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

/// Export a TriangleMesh as an ASCII STL string.
pub fn export_ascii_stl(mesh: &TriangleMesh, name: &str) -> Result<String, HarnessError> {
    let facets = facets(mesh)?;
    let mut out = String::with_capacity(facets.len() * 300);
    out.push_str(&format!("solid {name}\n"));
    for ([nx, ny, nz], corners) in &facets {
        out.push_str(&format!("  facet normal {nx} {ny} {nz}\n"));
        out.push_str("    outer loop\n");
        for [x, y, z] in corners {
            out.push_str(&format!("      vertex {x} {y} {z}\n"));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    out.push_str(&format!("endsolid {name}\n"));
    Ok(out)
}
