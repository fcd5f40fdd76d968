//! Resolving generator vertices to their owning entity and parameter.

use std::collections::HashMap;

use cad_kernel::Point3d;
use mesh_types::{EntityKind, EntityRef, GeneratorId, ParamCoord, RawMeshVertex};
use tracing::{debug, instrument};

use crate::cache::GeometryTopologyCache;
use crate::error::{ReconcileError, Result};

/// A generator vertex with its owner checked and its parameter expressed in
/// the owner's own parameter space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedVertex {
    pub id: GeneratorId,
    pub owner: EntityRef,
    pub xyz: Point3d,
    pub param: ParamCoord,
}

/// Classifies vertices of one body against its cache.
#[derive(Debug, Clone, Copy)]
pub struct VertexClassifier<'a> {
    cache: &'a GeometryTopologyCache,
}

impl<'a> VertexClassifier<'a> {
    pub fn new(cache: &'a GeometryTopologyCache) -> Self {
        Self { cache }
    }

    pub fn classify(&self, vertex: &RawMeshVertex) -> Result<ClassifiedVertex> {
        let owner = vertex.owner;
        self.cache.check(owner)?;

        let expected = owner.kind.parametric_dim();
        let param = match (owner.kind, vertex.param) {
            (EntityKind::Node, _) => ParamCoord::None,
            (EntityKind::Edge, ParamCoord::Curve(s)) => ParamCoord::Curve(self.edge_parameter(owner.index, s)?),
            (EntityKind::Face, ParamCoord::Surface(st)) => {
                ParamCoord::Surface(self.face_parameter(owner.index, st)?)
            }
            (_, ParamCoord::None) => ParamCoord::None,
            (_, other) => {
                return Err(ReconcileError::inconsistent(format!(
                    "vertex {} on {owner} carries a {}-d parameter, expected {expected}-d",
                    vertex.id,
                    other.dim()
                )));
            }
        };

        Ok(ClassifiedVertex {
            id: vertex.id,
            owner,
            xyz: Point3d::from_array(vertex.xyz),
            param,
        })
    }

    /// Un-normalize a generator edge parameter against the edge's t-range.
    pub fn edge_parameter(&self, edge: usize, s: f64) -> Result<f64> {
        Ok(self.cache.edge(edge)?.range.denormalize(s))
    }

    /// Un-normalize a generator uv against the face's parameter box and
    /// apply the face's periodic offset.
    pub fn face_parameter(&self, face: usize, st: [f64; 2]) -> Result<[f64; 2]> {
        let info = self.cache.face(face)?;
        let [u, v] = info.uv_box.denormalize(st);
        Ok([u + info.offset[0], v + info.offset[1]])
    }
}

/// Every vertex of a flat mesh, classified and keyed by generator ID.
#[derive(Debug, Clone, Default)]
pub struct VertexTable {
    vertices: HashMap<GeneratorId, ClassifiedVertex>,
}

impl VertexTable {
    #[instrument(skip_all, fields(vertices = vertices.len()))]
    pub fn classify_all(vertices: &[RawMeshVertex], caches: &[GeometryTopologyCache]) -> Result<Self> {
        let mut table = HashMap::with_capacity(vertices.len());
        for vertex in vertices {
            let cache = caches
                .get(vertex.owner.body)
                .ok_or(ReconcileError::BadEntityIndex { entity: vertex.owner })?;
            let classified = VertexClassifier::new(cache).classify(vertex)?;
            if table.insert(vertex.id, classified).is_some() {
                return Err(ReconcileError::inconsistent(format!(
                    "generator vertex {} declared twice",
                    vertex.id
                )));
            }
        }
        debug!(count = table.len(), "vertices classified");
        Ok(Self { vertices: table })
    }

    pub fn get(&self, id: GeneratorId) -> Result<&ClassifiedVertex> {
        self.vertices
            .get(&id)
            .ok_or_else(|| ReconcileError::inconsistent(format!("unknown generator vertex {id}")))
    }

    pub fn xyz(&self, id: GeneratorId) -> Result<Point3d> {
        self.get(id).map(|v| v.xyz)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToleranceConfig;
    use approx::assert_relative_eq;
    use cad_kernel::topology::primitives::{make_box, make_cylinder};
    use cad_kernel::BrepModel;
    use cad_kernel::Vec3;
    use std::f64::consts::{PI, TAU};

    fn cylinder_cache() -> GeometryTopologyCache {
        let model = BrepModel::with_bodies(vec![make_cylinder(Point3d::ORIGIN, Vec3::Z, 1.0, 2.0)]);
        GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap()
    }

    fn vertex(owner: EntityRef, param: ParamCoord) -> RawMeshVertex {
        RawMeshVertex {
            id: 42,
            xyz: [1.0, 0.0, 0.0],
            owner,
            param,
        }
    }

    #[test]
    fn edge_parameter_is_unnormalized() {
        let cache = cylinder_cache();
        let c = VertexClassifier::new(&cache);
        let v = c.classify(&vertex(EntityRef::edge(0, 0), ParamCoord::Curve(0.25))).unwrap();
        match v.param {
            ParamCoord::Curve(t) => assert_relative_eq!(t, TAU / 4.0),
            other => panic!("unexpected {other:?}"),
        }
        // Seam line runs along the height.
        assert_relative_eq!(c.edge_parameter(2, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn periodic_face_uv_is_shifted() {
        let cache = cylinder_cache();
        let c = VertexClassifier::new(&cache);
        let [u, v] = c.face_parameter(0, [0.5, 0.5]).unwrap();
        // Proxy [-PI, PI] center is 0, shifted by one period.
        assert_relative_eq!(u, TAU, epsilon = 1e-12);
        assert_relative_eq!(v, 1.0);
        let [u0, _] = c.face_parameter(0, [0.0, 0.0]).unwrap();
        assert_relative_eq!(u0, -PI + TAU, epsilon = 1e-12);
    }

    #[test]
    fn node_vertex_needs_no_parameter() {
        let cache = cylinder_cache();
        let v = VertexClassifier::new(&cache)
            .classify(&vertex(EntityRef::node(0, 1), ParamCoord::None))
            .unwrap();
        assert_eq!(v.param, ParamCoord::None);
        assert_eq!(v.xyz, Point3d::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn face_index_past_bounds_is_bad_entity_index() {
        let model = BrepModel::with_bodies(vec![make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        let err = VertexClassifier::new(&cache)
            .classify(&vertex(EntityRef::face(0, 99), ParamCoord::Surface([0.5, 0.5])))
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::BadEntityIndex { entity } if entity == EntityRef::face(0, 99)
        ));
    }

    #[test]
    fn mismatched_parameter_dimension_is_inconsistent() {
        let cache = cylinder_cache();
        let err = VertexClassifier::new(&cache)
            .classify(&vertex(EntityRef::edge(0, 0), ParamCoord::Surface([0.0, 0.0])))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Inconsistent { .. }));
    }

    #[test]
    fn duplicate_ids_are_inconsistent() {
        let cache = cylinder_cache();
        let v = vertex(EntityRef::node(0, 0), ParamCoord::None);
        let err = VertexTable::classify_all(&[v, v], std::slice::from_ref(&cache)).unwrap_err();
        assert!(matches!(err, ReconcileError::Inconsistent { .. }));
        let table = VertexTable::classify_all(&[v], std::slice::from_ref(&cache)).unwrap();
        assert!(table.get(7).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn vertex_on_unknown_body_is_rejected() {
        let cache = cylinder_cache();
        let v = vertex(EntityRef::node(3, 0), ParamCoord::None);
        let err = VertexTable::classify_all(&[v], std::slice::from_ref(&cache)).unwrap_err();
        assert!(matches!(err, ReconcileError::BadEntityIndex { .. }));
    }
}
