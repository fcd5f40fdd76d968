//! Per-body snapshot of the topology and parameter ranges the classifier
//! and builder read repeatedly.

use cad_kernel::{CadKernel, EdgeNodes, Interval, Periodicity, UvBox};
use mesh_types::{BodyKind, EntityRef, Sense};
use tracing::{debug, instrument, warn};

use crate::config::ToleranceConfig;
use crate::error::{ReconcileError, Result};

/// Cached parametric data for one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceInfo {
    /// Box the generator's normalized uv is relative to: the trim range for
    /// B-spline faces, the proxy range otherwise.
    pub uv_box: UvBox,
    pub trim: UvBox,
    pub proxy: UvBox,
    pub periodicity: Periodicity,
    /// Added to every un-normalized uv on this face.
    pub offset: [f64; 2],
    pub sense: Sense,
    pub is_bspline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeInfo {
    pub range: Interval,
    pub nodes: EdgeNodes,
    pub degenerate: bool,
    pub periodic: bool,
}

/// Faces, edges and node count of one body.
#[derive(Debug, Clone)]
pub struct GeometryTopologyCache {
    pub body: usize,
    pub kind: BodyKind,
    faces: Vec<FaceInfo>,
    edges: Vec<EdgeInfo>,
    node_count: usize,
}

/// Offset moving a proxy parameter range onto the trimmed range.
///
/// Per direction: when `trim.lo - proxy.lo` exceeds `tol` the offset is one
/// period up, when it is below `-tol` one period down, otherwise zero.
/// Non-periodic directions always get zero.
pub fn periodic_offset(trim: &UvBox, proxy: &UvBox, periodicity: &Periodicity, tol: f64) -> [f64; 2] {
    let mut offset = [0.0; 2];
    for (dir, slot) in offset.iter_mut().enumerate() {
        let Some(period) = periodicity.period(dir) else {
            continue;
        };
        let delta = trim.axis(dir).lo - proxy.axis(dir).lo;
        if delta > tol {
            *slot = period;
        } else if delta < -tol {
            *slot = -period;
        }
    }
    offset
}

impl GeometryTopologyCache {
    #[instrument(skip(kernel, tolerance))]
    pub fn build<K: CadKernel + ?Sized>(kernel: &K, body: usize, tolerance: &ToleranceConfig) -> Result<Self> {
        let kind = kernel.body_kind(body)?;

        let mut faces = Vec::new();
        for f in 0..kernel.face_count(body)? {
            let face = EntityRef::face(body, f);
            let trim = kernel.face_range(face)?;
            let is_bspline = kernel.face_is_bspline(face)?;
            let periodicity = kernel.face_periodicity(face)?;
            let (proxy, offset) = if is_bspline {
                (trim, [0.0, 0.0])
            } else {
                let proxy = kernel.face_proxy_range(face)?;
                (proxy, periodic_offset(&trim, &proxy, &periodicity, tolerance.periodic))
            };
            if offset != [0.0, 0.0] {
                warn!(face = f, du = offset[0], dv = offset[1], "periodic offset applied");
            }
            faces.push(FaceInfo {
                uv_box: proxy,
                trim,
                proxy,
                periodicity,
                offset,
                sense: kernel.face_sense(face)?,
                is_bspline,
            });
        }

        let mut edges = Vec::new();
        for e in 0..kernel.edge_count(body)? {
            let edge = EntityRef::edge(body, e);
            edges.push(EdgeInfo {
                range: kernel.edge_range(edge)?,
                nodes: kernel.edge_nodes(edge)?,
                degenerate: kernel.edge_is_degenerate(edge)?,
                periodic: kernel.edge_is_periodic(edge)?,
            });
        }

        let cache = Self {
            body,
            kind,
            faces,
            edges,
            node_count: kernel.node_count(body)?,
        };
        debug!(
            faces = cache.face_count(),
            edges = cache.edge_count(),
            nodes = cache.node_count(),
            "topology cached"
        );
        Ok(cache)
    }

    /// Caches for every body of the model, in body order.
    pub fn build_all<K: CadKernel + ?Sized>(kernel: &K, tolerance: &ToleranceConfig) -> Result<Vec<Self>> {
        (0..kernel.body_count())
            .map(|b| Self::build(kernel, b, tolerance))
            .collect()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn face(&self, face: usize) -> Result<&FaceInfo> {
        self.faces.get(face).ok_or(ReconcileError::BadEntityIndex {
            entity: EntityRef::face(self.body, face),
        })
    }

    pub fn edge(&self, edge: usize) -> Result<&EdgeInfo> {
        self.edges.get(edge).ok_or(ReconcileError::BadEntityIndex {
            entity: EntityRef::edge(self.body, edge),
        })
    }

    pub fn check_node(&self, node: usize) -> Result<()> {
        if node < self.node_count {
            Ok(())
        } else {
            Err(ReconcileError::BadEntityIndex {
                entity: EntityRef::node(self.body, node),
            })
        }
    }

    /// Check an entity reference against this body's declared bounds.
    pub fn check(&self, entity: EntityRef) -> Result<()> {
        let bad = ReconcileError::BadEntityIndex { entity };
        if entity.body != self.body {
            return Err(bad);
        }
        match entity.kind {
            mesh_types::EntityKind::Node => self.check_node(entity.index),
            mesh_types::EntityKind::Edge => self.edge(entity.index).map(|_| ()),
            mesh_types::EntityKind::Face => self.face(entity.index).map(|_| ()),
        }
    }

    pub fn faces(&self) -> impl Iterator<Item = (usize, &FaceInfo)> {
        self.faces.iter().enumerate()
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, &EdgeInfo)> {
        self.edges.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cad_kernel::topology::primitives::{make_box, make_cylinder};
    use cad_kernel::{BrepModel, Point3d, Vec3};
    use std::f64::consts::{PI, TAU};

    #[test]
    fn full_turn_cylinder_gets_one_period() {
        let trim = UvBox::from_bounds(0.0, TAU, 0.0, 1.0);
        let proxy = UvBox::from_bounds(-PI, PI, 0.0, 1.0);
        let periodicity = Periodicity { u: Some(TAU), v: None };
        let offset = periodic_offset(&trim, &proxy, &periodicity, 1e-4);
        assert_eq!(offset, [TAU, 0.0]);
        let back = periodic_offset(&proxy, &trim, &periodicity, 1e-4);
        assert_eq!(back, [-TAU, 0.0]);
    }

    #[test]
    fn sub_tolerance_mismatch_is_ignored() {
        let trim = UvBox::from_bounds(0.0, TAU, 0.0, 1.0);
        let proxy = UvBox::from_bounds(-5e-5, TAU, 0.0, 1.0);
        let periodicity = Periodicity { u: Some(TAU), v: None };
        assert_eq!(periodic_offset(&trim, &proxy, &periodicity, 1e-4), [0.0, 0.0]);
    }

    #[test]
    fn non_periodic_direction_never_shifts() {
        let trim = UvBox::from_bounds(0.0, 1.0, 5.0, 6.0);
        let proxy = UvBox::from_bounds(0.0, 1.0, 0.0, 1.0);
        assert_eq!(periodic_offset(&trim, &proxy, &Periodicity::default(), 1e-4), [0.0, 0.0]);
    }

    #[test]
    fn cylinder_cache_records_wall_offset() {
        let model = BrepModel::with_bodies(vec![make_cylinder(Point3d::ORIGIN, Vec3::Z, 1.0, 1.0)]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        let wall = cache.face(0).unwrap();
        assert_relative_eq!(wall.offset[0], TAU);
        assert_eq!(wall.offset[1], 0.0);
        assert_relative_eq!(wall.uv_box.u.lo, -PI);
        let cap = cache.face(1).unwrap();
        assert_eq!(cap.offset, [0.0, 0.0]);
        assert!(cache.edge(0).unwrap().periodic);
    }

    #[test]
    fn out_of_range_entities_are_rejected() {
        let model = BrepModel::with_bodies(vec![make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        assert_eq!(cache.face_count(), 6);
        assert!(matches!(cache.face(6), Err(ReconcileError::BadEntityIndex { .. })));
        assert!(matches!(cache.edge(12), Err(ReconcileError::BadEntityIndex { .. })));
        assert!(cache.check_node(7).is_ok());
        assert!(cache.check(EntityRef::face(1, 0)).is_err());
    }
}
