//! Helper functions: error type, model fixtures, small lookups.

use cad_kernel::topology::primitives::{make_box, make_cylinder, make_disc, make_pillow, make_plate};
use cad_kernel::{BrepModel, KernelError, Point3d, Vec3};
use cad_tessellation::TessError;
use mesh_reconcile::{AttributeIndexMap, FlatMesh, ReconcileError};
use mesh_types::{GeneratorId, RawMeshVertex};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("tessellation error: {0}")]
    Tessellation(#[from] TessError),

    #[error("generator error: {reason}")]
    Generator { reason: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("STL error: {reason}")]
    StlError { reason: String },

    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

// ── Model Fixtures ──────────────────────────────────────────────────────────

/// Unit cube at the origin.
pub fn unit_box() -> BrepModel {
    BrepModel::with_bodies(vec![make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))])
}

/// Unit cube (body 0) plus a 2x1 wake sheet (body 1) trailing from the
/// cube's edge `x = 1, z = 0`. The sheet's edge 3 lies on cube edge 5.
pub fn box_with_wake() -> BrepModel {
    BrepModel::with_bodies(vec![
        make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0)),
        make_plate(Point3d::new(1.0, 0.0, 0.0), Vec3::X * 2.0, Vec3::Y, "wake"),
    ])
}

/// Closed cylinder of radius 1 and height 2 standing on the origin.
pub fn unit_cylinder() -> BrepModel {
    BrepModel::with_bodies(vec![make_cylinder(Point3d::ORIGIN, Vec3::Z, 1.0, 2.0)])
}

/// The unit cylinder (body 0) with a lid sheet (body 1) spanning its top
/// circle. The lid's only edge is a closed circle lying on cylinder edge 1.
pub fn cylinder_with_lid() -> BrepModel {
    BrepModel::with_bodies(vec![
        make_cylinder(Point3d::ORIGIN, Vec3::Z, 1.0, 2.0),
        make_disc(Point3d::new(0.0, 0.0, 2.0), Vec3::Z, 1.0, "lid"),
    ])
}

/// Two B-spline domes over `[0,2]^2` meeting at a square rim.
pub fn pillow() -> BrepModel {
    BrepModel::with_bodies(vec![make_pillow(2.0, 0.5)])
}

/// Registry of every boundary name in `model`.
pub fn registry_for(model: &BrepModel) -> Result<AttributeIndexMap, HarnessError> {
    Ok(AttributeIndexMap::from_kernel(model)?)
}

// ── Lookups ─────────────────────────────────────────────────────────────────

/// Find a vertex of `mesh` by generator ID.
pub fn vertex_by_id(mesh: &FlatMesh, id: GeneratorId) -> Option<&RawMeshVertex> {
    mesh.vertices.iter().find(|v| v.id == id)
}

/// Distance between a flat-mesh vertex and a point.
pub fn vertex_distance(vertex: &RawMeshVertex, point: &Point3d) -> f64 {
    Point3d::from_array(vertex.xyz).distance_to(point)
}

/// Expected point count of an `n`-division synthetic mesh of a box.
pub fn box_point_count(n: usize) -> usize {
    8 + 12 * (n - 1) + 6 * (n - 1) * (n - 1)
}

/// Expected point count of an `n`-division synthetic mesh of a rectangular sheet.
pub fn plate_point_count(n: usize) -> usize {
    4 + 4 * (n - 1) + (n - 1) * (n - 1)
}

/// Expected point count of an `n`-division synthetic mesh of a capped cylinder.
pub fn cylinder_point_count(n: usize) -> usize {
    2 + 3 * (n - 1) + (n - 1) * (n - 1) + 2
}

/// Expected point count of an `n`-division synthetic mesh of a disc.
pub fn disc_point_count(n: usize) -> usize {
    1 + (n - 1) + 1
}

/// Expected point count of an `n`-division synthetic mesh of the pillow.
pub fn pillow_point_count(n: usize) -> usize {
    4 + 4 * (n - 1) + 2 * (n - 1) * (n - 1)
}
