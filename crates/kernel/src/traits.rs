//! The kernel query surface consumed by tessellation and reconciliation.
//!
//! Every method is read-only; callers borrow the model for the duration of
//! a run and never mutate it.

use mesh_types::{BodyKind, EntityKind, EntityRef, Sense};

use crate::geometry::{Interval, Periodicity, Point3d, SurfaceDerivs, UvBox};
use crate::types::{EdgeNodes, KernelError};

/// Read-only topology and geometry queries over a set of bodies.
/// Implemented by [`crate::BrepModel`].
pub trait CadKernel {
    /// Number of bodies in the model.
    fn body_count(&self) -> usize;

    /// Topological classification of a body.
    fn body_kind(&self, body: usize) -> Result<BodyKind, KernelError>;

    /// Number of entities of `kind` in `body`.
    fn entity_count(&self, body: usize, kind: EntityKind) -> Result<usize, KernelError>;

    /// Surface position and first partials at `uv`.
    fn face_eval(&self, face: EntityRef, uv: [f64; 2]) -> Result<SurfaceDerivs, KernelError>;

    /// Trimmed parametric range of a face.
    fn face_range(&self, face: EntityRef) -> Result<UvBox, KernelError>;

    /// Periods of the face's underlying surface.
    fn face_periodicity(&self, face: EntityRef) -> Result<Periodicity, KernelError>;

    /// Orientation of the face relative to its surface.
    fn face_sense(&self, face: EntityRef) -> Result<Sense, KernelError>;

    /// Whether the face surface is already a B-spline.
    fn face_is_bspline(&self, face: EntityRef) -> Result<bool, KernelError>;

    /// Parameter range of the face's B-spline proxy surface.
    fn face_proxy_range(&self, face: EntityRef) -> Result<UvBox, KernelError>;

    /// Edge indices of the face loop, in loop order. Seam edges appear twice.
    fn face_edges(&self, face: EntityRef) -> Result<Vec<usize>, KernelError>;

    /// Position on the edge's curve at parameter `t`.
    fn edge_eval(&self, edge: EntityRef, t: f64) -> Result<Point3d, KernelError>;

    /// Parameter of the closest curve point to `point`.
    fn edge_inverse_eval(&self, edge: EntityRef, point: &Point3d) -> Result<f64, KernelError>;

    /// Parameter range of the edge.
    fn edge_range(&self, edge: EntityRef) -> Result<Interval, KernelError>;

    fn edge_is_degenerate(&self, edge: EntityRef) -> Result<bool, KernelError>;

    fn edge_is_periodic(&self, edge: EntityRef) -> Result<bool, KernelError>;

    fn edge_nodes(&self, edge: EntityRef) -> Result<EdgeNodes, KernelError>;

    fn node_point(&self, node: EntityRef) -> Result<Point3d, KernelError>;

    /// Whether two entities share the same underlying geometry within the
    /// kernel tolerance. Entities of different kinds never match.
    fn same_geometry(&self, a: EntityRef, b: EntityRef) -> Result<bool, KernelError>;

    /// Boundary name attribute attached to an entity, if any.
    fn boundary_name(&self, entity: EntityRef) -> Result<Option<&str>, KernelError>;

    fn face_count(&self, body: usize) -> Result<usize, KernelError> {
        self.entity_count(body, EntityKind::Face)
    }

    fn edge_count(&self, body: usize) -> Result<usize, KernelError> {
        self.entity_count(body, EntityKind::Edge)
    }

    fn node_count(&self, body: usize) -> Result<usize, KernelError> {
        self.entity_count(body, EntityKind::Node)
    }
}
