//! Boundary tags for faces and edges, and stamping them onto elements.

use cad_kernel::CadKernel;
use mesh_types::{EntityKind, EntityRef, MeshElement};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::attributes::AttributeIndexMap;
use crate::cache::GeometryTopologyCache;
use crate::error::{ReconcileError, Result};

/// Resolved boundary IDs of one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryTags {
    pub body: usize,
    faces: Vec<i32>,
    /// `None` for degenerate edges and when edges are not tagged.
    edges: Vec<Option<i32>>,
}

fn resolve<K: CadKernel + ?Sized>(kernel: &K, registry: &AttributeIndexMap, entity: EntityRef) -> Result<i32> {
    let name = kernel.boundary_name(entity)?;
    name.and_then(|n| registry.lookup(n))
        .ok_or_else(|| ReconcileError::MissingBoundaryName {
            entity,
            name: name.map(str::to_string),
        })
}

/// Look up the boundary ID of every face and, with `tag_edges`, every
/// non-degenerate edge of the cached body.
#[instrument(skip(kernel, cache, registry), fields(body = cache.body))]
pub fn assign_boundary_tags<K: CadKernel + ?Sized>(
    kernel: &K,
    cache: &GeometryTopologyCache,
    registry: &AttributeIndexMap,
    tag_edges: bool,
) -> Result<BoundaryTags> {
    let body = cache.body;
    let faces = (0..cache.face_count())
        .map(|f| resolve(kernel, registry, EntityRef::face(body, f)))
        .collect::<Result<Vec<_>>>()?;

    let mut edges = vec![None; cache.edge_count()];
    if tag_edges {
        for (e, info) in cache.edges() {
            if !info.degenerate {
                edges[e] = Some(resolve(kernel, registry, EntityRef::edge(body, e))?);
            }
        }
    }
    debug!(faces = faces.len(), tag_edges, "boundary tags resolved");
    Ok(BoundaryTags { body, faces, edges })
}

impl BoundaryTags {
    pub fn face_tag(&self, face: usize) -> Option<i32> {
        self.faces.get(face).copied()
    }

    pub fn edge_tag(&self, edge: usize) -> Option<i32> {
        self.edges.get(edge).copied().flatten()
    }

    /// Set each element's tag from its owning face or edge.
    pub fn stamp(&self, elements: &mut [MeshElement]) -> Result<()> {
        for element in elements {
            let owner = element.owner;
            let bad = || ReconcileError::BadEntityIndex { entity: owner };
            if owner.body != self.body {
                return Err(bad());
            }
            element.tag = match owner.kind {
                EntityKind::Face => Some(*self.faces.get(owner.index).ok_or_else(bad)?),
                EntityKind::Edge => *self.edges.get(owner.index).ok_or_else(bad)?,
                EntityKind::Node => None,
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToleranceConfig;
    use cad_kernel::topology::primitives::{make_box, make_plate};
    use cad_kernel::{BrepModel, Point3d, Vec3};

    fn box_setup() -> (BrepModel, GeometryTopologyCache) {
        let model = BrepModel::with_bodies(vec![make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        (model, cache)
    }

    #[test]
    fn faces_resolve_through_registry() {
        let (model, cache) = box_setup();
        let registry = AttributeIndexMap::from_kernel(&model).unwrap();
        let tags = assign_boundary_tags(&model, &cache, &registry, false).unwrap();
        assert_eq!(tags.face_tag(0), registry.lookup("xmin"));
        assert_eq!(tags.face_tag(5), registry.lookup("zmax"));
        assert_eq!(tags.edge_tag(0), None);

        let tags = assign_boundary_tags(&model, &cache, &registry, true).unwrap();
        assert_eq!(tags.edge_tag(3), registry.lookup("box_edge"));
    }

    #[test]
    fn unregistered_name_is_missing() {
        let (model, cache) = box_setup();
        let registry: AttributeIndexMap = ["xmin", "xmax"].into_iter().collect();
        match assign_boundary_tags(&model, &cache, &registry, false) {
            Err(ReconcileError::MissingBoundaryName { entity, name }) => {
                assert_eq!(entity, EntityRef::face(0, 2));
                assert_eq!(name.as_deref(), Some("ymin"));
            }
            other => panic!("expected MissingBoundaryName, got {other:?}"),
        }
    }

    #[test]
    fn unnamed_edge_is_missing_in_area_mode() {
        let model = BrepModel::with_bodies(vec![make_plate(Point3d::ORIGIN, Vec3::X, Vec3::Y, "plate")]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        let registry = AttributeIndexMap::from_kernel(&model).unwrap();
        assert!(assign_boundary_tags(&model, &cache, &registry, false).is_ok());
        assert!(matches!(
            assign_boundary_tags(&model, &cache, &registry, true),
            Err(ReconcileError::MissingBoundaryName { name: None, .. })
        ));
    }

    #[test]
    fn stamp_uses_owner() {
        let (model, cache) = box_setup();
        let registry = AttributeIndexMap::from_kernel(&model).unwrap();
        let tags = assign_boundary_tags(&model, &cache, &registry, true).unwrap();
        let mut elements = vec![
            MeshElement::triangle(EntityRef::face(0, 1), [1, 2, 3]),
            MeshElement::line(EntityRef::edge(0, 0), [1, 2]),
        ];
        tags.stamp(&mut elements).unwrap();
        assert_eq!(elements[0].tag, registry.lookup("xmax"));
        assert_eq!(elements[1].tag, registry.lookup("box_edge"));

        let mut stray = vec![MeshElement::triangle(EntityRef::face(0, 6), [1, 2, 3])];
        assert!(matches!(tags.stamp(&mut stray), Err(ReconcileError::BadEntityIndex { .. })));
    }
}
