//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets tests collect all failures in one pass.

use std::collections::{HashMap, HashSet};

use cad_kernel::{CadKernel, Point3d};
use cad_tessellation::TriangleMesh;
use mesh_reconcile::{orientation_dot, BodyMesh, FlatMesh};
use mesh_types::{EntityRef, GeneratorId};
use serde::Serialize;

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::pass(name, detail)
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::fail(name, detail)
        }
    }
}

// ── Numbering Oracles ───────────────────────────────────────────────────────

/// Check the finalized point count of a body.
pub fn check_point_count(body: &BodyMesh, expected: usize) -> OracleVerdict {
    let actual = body.index_map.len();
    if actual == expected {
        OracleVerdict::pass_val("point_count", format!("{actual} points"), actual as f64)
    } else {
        OracleVerdict::fail_val(
            "point_count",
            format!("expected {expected} points, got {actual}"),
            actual as f64,
        )
    }
}

/// Check that no generator ID is claimed by two global points.
pub fn check_unique_generator_ids(body: &BodyMesh) -> OracleVerdict {
    let mut seen: HashMap<GeneratorId, usize> = HashMap::new();
    for (global, id) in body.index_map.iter() {
        if let Some(first) = seen.insert(id, global) {
            return OracleVerdict::fail(
                "unique_generator_ids",
                format!("generator vertex {id} maps to points {first} and {global}"),
            );
        }
    }
    OracleVerdict::pass("unique_generator_ids", format!("{} distinct IDs", seen.len()))
}

/// Check that each global point sits where the generator put the vertex it
/// maps back to.
pub fn check_round_trip(body: &BodyMesh, mesh: &FlatMesh, tolerance: f64) -> OracleVerdict {
    let by_id: HashMap<GeneratorId, Point3d> = mesh
        .vertices
        .iter()
        .map(|v| (v.id, Point3d::from_array(v.xyz)))
        .collect();
    let points = match body.tessellation.global_points() {
        Ok(points) => points,
        Err(err) => return OracleVerdict::fail("round_trip", err.to_string()),
    };

    let mut worst = 0.0f64;
    for (global, id) in body.index_map.iter() {
        let Some(expected) = by_id.get(&id) else {
            return OracleVerdict::fail("round_trip", format!("point {global} maps to unknown vertex {id}"));
        };
        let Some(actual) = points.get(global - 1) else {
            return OracleVerdict::fail("round_trip", format!("index map entry {global} has no point"));
        };
        worst = worst.max(actual.xyz.distance_to(expected));
    }

    if worst <= tolerance {
        OracleVerdict::pass_val("round_trip", format!("max deviation {worst:e}"), worst)
    } else {
        OracleVerdict::fail_val(
            "round_trip",
            format!("max deviation {worst:e} exceeds {tolerance:e}"),
            worst,
        )
    }
}

// ── Edge and Face Oracles ───────────────────────────────────────────────────

/// Check that every installed edge has strictly increasing parameters.
pub fn check_edges_monotone(body: &BodyMesh) -> OracleVerdict {
    let tess = &body.tessellation;
    let mut checked = 0usize;
    for e in 0..tess.edge_count() {
        if tess.is_edge_degenerate(e) {
            continue;
        }
        let edge = match tess.edge(e) {
            Ok(edge) => edge,
            Err(err) => return OracleVerdict::fail("edges_monotone", err.to_string()),
        };
        if let Some(k) = edge.params.windows(2).position(|w| w[1] <= w[0]) {
            return OracleVerdict::fail(
                "edges_monotone",
                format!("{} decreases at point {}", EntityRef::edge(body.body, e), k + 1),
            );
        }
        checked += 1;
    }
    OracleVerdict::pass("edges_monotone", format!("{checked} edges increasing"))
}

/// Check that the first triangle of every face agrees with the oriented
/// surface normal.
pub fn check_orientation<K: CadKernel + ?Sized>(kernel: &K, body: &BodyMesh) -> OracleVerdict {
    let tess = &body.tessellation;
    let mut reversed = Vec::new();
    for f in 0..tess.face_count() {
        let face = EntityRef::face(body.body, f);
        let dot = tess
            .face(f)
            .map_err(|e| e.to_string())
            .and_then(|data| {
                orientation_dot(kernel, face, &data.points, &data.uvs, &data.triangles).map_err(|e| e.to_string())
            });
        match dot {
            Ok(Some(d)) if d < 0.0 => reversed.push(f),
            Ok(_) => {}
            Err(err) => return OracleVerdict::fail("orientation", format!("{face}: {err}")),
        }
    }

    if reversed.is_empty() {
        OracleVerdict::pass("orientation", format!("{} faces aligned", tess.face_count()))
    } else {
        OracleVerdict::fail("orientation", format!("faces {reversed:?} point inward"))
    }
}

/// Check that every element carries a boundary tag.
pub fn check_tags_assigned(body: &BodyMesh) -> OracleVerdict {
    let untagged = body.elements.iter().filter(|e| e.tag.is_none()).count();
    if untagged == 0 {
        OracleVerdict::pass("tags_assigned", format!("{} elements tagged", body.elements.len()))
    } else {
        OracleVerdict::fail(
            "tags_assigned",
            format!("{untagged} of {} elements untagged", body.elements.len()),
        )
    }
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Check that each triangle side in `mesh` is shared by exactly two
/// triangles with opposite direction. Index-based: the mesh is expected to
/// be globally numbered.
pub fn check_watertight_mesh(mesh: &TriangleMesh) -> OracleVerdict {
    let mut directed: HashSet<(u32, u32)> = HashSet::new();
    let mut undirected: HashMap<(u32, u32), usize> = HashMap::new();
    let mut repeated = 0usize;

    for tri in mesh.indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            if !directed.insert((a, b)) {
                repeated += 1;
            }
            *undirected.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let unpaired = undirected.values().filter(|&&c| c != 2).count();
    if unpaired == 0 && repeated == 0 {
        OracleVerdict::pass("watertight_mesh", format!("all {} edges paired", undirected.len()))
    } else {
        OracleVerdict::fail(
            "watertight_mesh",
            format!(
                "{unpaired} unpaired and {repeated} same-direction edges out of {}",
                undirected.len()
            ),
        )
    }
}

/// Check that stored normals agree with triangle winding.
pub fn check_consistent_normals(mesh: &TriangleMesh) -> OracleVerdict {
    let p = &mesh.positions;
    let n = &mesh.normals;
    let mut inconsistent = 0usize;

    for tri in mesh.indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let [i0, i1, i2] = [tri[0], tri[1], tri[2]].map(|i| i as usize * 3);
        if [i0, i1, i2].iter().any(|&i| i + 2 >= p.len() || i + 2 >= n.len()) {
            inconsistent += 1;
            continue;
        }
        let a = [p[i1] - p[i0], p[i1 + 1] - p[i0 + 1], p[i1 + 2] - p[i0 + 2]];
        let b = [p[i2] - p[i0], p[i2 + 1] - p[i0 + 1], p[i2 + 2] - p[i0 + 2]];
        let g = [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]];
        let s: [f32; 3] = std::array::from_fn(|c| n[i0 + c] + n[i1 + c] + n[i2 + c]);
        if g[0] * s[0] + g[1] * s[1] + g[2] * s[2] < 0.0 {
            inconsistent += 1;
        }
    }

    let total = mesh.triangle_count();
    if inconsistent == 0 {
        OracleVerdict::pass(
            "consistent_normals",
            format!("all {total} triangles have consistent winding"),
        )
    } else {
        OracleVerdict::fail(
            "consistent_normals",
            format!("{inconsistent} of {total} triangles have reversed normals"),
        )
    }
}

/// Check that face ranges tile the index buffer without gaps.
pub fn check_face_range_coverage(mesh: &TriangleMesh) -> OracleVerdict {
    let mut next = 0u32;
    for range in &mesh.face_ranges {
        if range.start != next {
            return OracleVerdict::fail(
                "face_range_coverage",
                format!("face {} starts at {} instead of {next}", range.face, range.start),
            );
        }
        next += range.count;
    }
    if next as usize == mesh.triangle_count() {
        OracleVerdict::pass("face_range_coverage", format!("{} ranges", mesh.face_ranges.len()))
    } else {
        OracleVerdict::fail(
            "face_range_coverage",
            format!("ranges cover {next} of {} triangles", mesh.triangle_count()),
        )
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Run the checks that apply to any reconciled body.
pub fn run_body_checks<K: CadKernel + ?Sized>(kernel: &K, body: &BodyMesh, mesh: &FlatMesh) -> Vec<OracleVerdict> {
    vec![
        check_unique_generator_ids(body),
        check_round_trip(body, mesh, 1e-9),
        check_edges_monotone(body),
        check_orientation(kernel, body),
        check_tags_assigned(body),
    ]
}

/// Run the checks that apply to the render mesh of a closed body.
pub fn run_closed_mesh_checks(mesh: &TriangleMesh) -> Vec<OracleVerdict> {
    vec![
        check_watertight_mesh(mesh),
        check_consistent_normals(mesh),
        check_face_range_coverage(mesh),
    ]
}
