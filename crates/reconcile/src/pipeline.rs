//! End-to-end reconciliation of a flat generator mesh against a model.

use cad_kernel::CadKernel;
use cad_tessellation::Tessellation;
use mesh_types::MeshElement;
use tracing::{info, instrument};

use crate::attributes::AttributeIndexMap;
use crate::boundary::{assign_boundary_tags, BoundaryTags};
use crate::builder::TessellationBuilder;
use crate::cache::GeometryTopologyCache;
use crate::classify::VertexTable;
use crate::config::ReconcileConfig;
use crate::equivalence::{match_edges, EdgeAliases};
use crate::error::Result;
use crate::flat_mesh::{FlatMesh, MeshBlocks};
use crate::index_map::IndexMap;

/// Everything produced for one body.
#[derive(Debug, Clone)]
pub struct BodyMesh {
    pub body: usize,
    pub tessellation: Tessellation,
    pub index_map: IndexMap,
    pub tags: BoundaryTags,
    /// Face triangles (and edge segments in area mode) in generator IDs,
    /// stamped with boundary tags.
    pub elements: Vec<MeshElement>,
    pub flipped_faces: usize,
    pub reused_edges: usize,
}

/// Result of a successful [`reconcile`] run, owned by the caller.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub bodies: Vec<BodyMesh>,
    pub aliases: EdgeAliases,
}

impl Reconciled {
    pub fn body(&self, body: usize) -> Option<&BodyMesh> {
        self.bodies.iter().find(|b| b.body == body)
    }

    pub fn total_points(&self) -> usize {
        self.bodies.iter().map(|b| b.index_map.len()).sum()
    }
}

/// Re-attach `mesh` to the bodies of `kernel`.
///
/// Runs the cache, classification, equivalence, build, index-map and
/// boundary stages in order and stops at the first error.
#[instrument(skip_all, fields(bodies = kernel.body_count(), vertices = mesh.vertices.len()))]
pub fn reconcile<K: CadKernel + ?Sized>(
    kernel: &K,
    mesh: &FlatMesh,
    registry: &AttributeIndexMap,
    config: &ReconcileConfig,
) -> Result<Reconciled> {
    let caches = GeometryTopologyCache::build_all(kernel, &config.tolerance)?;
    let vertices = VertexTable::classify_all(&mesh.vertices, &caches)?;
    let blocks = MeshBlocks::new(mesh, &caches)?;
    let aliases = match_edges(kernel)?;

    let mut bodies = Vec::with_capacity(caches.len());
    for cache in &caches {
        let built = TessellationBuilder::new(kernel, cache, &config.tolerance)?
            .install_edges(&blocks, &aliases, &vertices)?
            .install_faces(&blocks, &vertices)?
            .finalize()?;
        let index_map = built.index_map()?;
        let tags = assign_boundary_tags(kernel, cache, registry, config.tag_edges)?;
        let mut elements = built.elements(config.tag_edges);
        tags.stamp(&mut elements)?;

        bodies.push(BodyMesh {
            body: cache.body,
            flipped_faces: built.flipped_faces(),
            reused_edges: built.reused_edges(),
            tessellation: built.into_tessellation(),
            index_map,
            tags,
            elements,
        });
    }

    let reconciled = Reconciled { bodies, aliases };
    info!(
        bodies = reconciled.bodies.len(),
        points = reconciled.total_points(),
        "reconciliation complete"
    );
    Ok(reconciled)
}
