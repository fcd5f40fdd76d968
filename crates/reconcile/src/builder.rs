//! Staged assembly of one body's tessellation from generator blocks.
//!
//! The stages are distinct types, `Empty -> EdgesInstalled -> Faceted ->
//! Finalized`, and every transition consumes the builder. A failed stage
//! drops the partially built tessellation with it.

use cad_kernel::{CadKernel, EdgeNodes, Point3d};
use cad_tessellation::{TessError, Tessellation};
use mesh_types::{EntityRef, GeneratorId, MeshElement};
use tracing::{debug, info, instrument};

use crate::cache::{EdgeInfo, GeometryTopologyCache};
use crate::classify::{VertexClassifier, VertexTable};
use crate::config::ToleranceConfig;
use crate::equivalence::EdgeAliases;
use crate::error::{ReconcileError, Result};
use crate::flat_mesh::{Connector, Domain, MeshBlocks};
use crate::index_map::{build_index_map, IndexMap};
use crate::orientation::correct_orientation;

/// No data installed yet.
#[derive(Debug)]
pub struct Empty;

/// Every non-degenerate edge carries its points.
#[derive(Debug)]
pub struct EdgesInstalled {
    reused_edges: usize,
}

/// Every face carries its triangulation.
#[derive(Debug)]
pub struct Faceted {
    reused_edges: usize,
    flipped_faces: usize,
}

/// Closed and globally numbered.
#[derive(Debug)]
pub struct Finalized {
    point_count: usize,
    reused_edges: usize,
    flipped_faces: usize,
}

/// Builds the tessellation of one body, keeping the generator vertex ID of
/// every installed edge and face point.
#[derive(Debug)]
pub struct TessellationBuilder<'a, K: ?Sized, S> {
    kernel: &'a K,
    cache: &'a GeometryTopologyCache,
    tolerance: ToleranceConfig,
    tess: Tessellation,
    /// Generator ID per edge point, by edge.
    edge_ids: Vec<Vec<GeneratorId>>,
    /// Generator ID per stored (renumbered) face point, by face.
    face_ids: Vec<Vec<GeneratorId>>,
    state: S,
}

/// Edge rows as (generator ID, position, parameter).
type EdgeRows = Vec<(GeneratorId, Point3d, f64)>;

fn install_failed(body: usize, err: TessError) -> ReconcileError {
    ReconcileError::inconsistent(format!("body {body}: {err}"))
}

/// Reverse rows running against the curve direction, then require strictly
/// increasing parameters.
fn orient_rows(edge: EntityRef, mut rows: EdgeRows) -> Result<EdgeRows> {
    if rows.len() < 2 {
        return Err(ReconcileError::inconsistent(format!(
            "{edge} has {} points, needs at least 2",
            rows.len()
        )));
    }
    if rows[rows.len() - 1].2 < rows[0].2 {
        rows.reverse();
    }
    if let Some(k) = rows.windows(2).position(|w| w[1].2 <= w[0].2) {
        return Err(ReconcileError::inconsistent(format!(
            "{edge}: parameters not monotone at point {}",
            k + 1
        )));
    }
    Ok(rows)
}

impl<'a, K: ?Sized, S> TessellationBuilder<'a, K, S> {
    fn advance<T>(self, state: T) -> TessellationBuilder<'a, K, T> {
        TessellationBuilder {
            kernel: self.kernel,
            cache: self.cache,
            tolerance: self.tolerance,
            tess: self.tess,
            edge_ids: self.edge_ids,
            face_ids: self.face_ids,
            state,
        }
    }

    pub fn body(&self) -> usize {
        self.cache.body
    }

    /// The tessellation as installed so far.
    pub fn tessellation(&self) -> &Tessellation {
        &self.tess
    }

    pub fn edge_generator_ids(&self, edge: usize) -> Option<&[GeneratorId]> {
        self.edge_ids.get(edge).map(Vec::as_slice)
    }

    pub fn face_generator_ids(&self, face: usize) -> Option<&[GeneratorId]> {
        self.face_ids.get(face).map(Vec::as_slice)
    }
}

impl<'a, K: CadKernel + ?Sized> TessellationBuilder<'a, K, Empty> {
    pub fn new(kernel: &'a K, cache: &'a GeometryTopologyCache, tolerance: &ToleranceConfig) -> Result<Self> {
        let tess = Tessellation::for_body(kernel, cache.body, tolerance.coincidence)?;
        Ok(Self {
            kernel,
            cache,
            tolerance: *tolerance,
            tess,
            edge_ids: vec![Vec::new(); cache.edge_count()],
            face_ids: vec![Vec::new(); cache.face_count()],
            state: Empty,
        })
    }

    /// Install every non-degenerate edge. Sheet edges aliased to a solid
    /// edge take the solid edge's points, re-parameterized on their own curve.
    #[instrument(skip_all, fields(body = self.cache.body))]
    pub fn install_edges(
        mut self,
        blocks: &MeshBlocks<'_>,
        aliases: &EdgeAliases,
        vertices: &VertexTable,
    ) -> Result<TessellationBuilder<'a, K, EdgesInstalled>> {
        let cache = self.cache;
        let body = cache.body;
        let classifier = VertexClassifier::new(cache);
        let mut installed = 0usize;
        let mut reused = 0usize;

        for (e, info) in cache.edges() {
            let edge = EntityRef::edge(body, e);
            if info.degenerate {
                if blocks.connector(body, e).is_some() {
                    debug!(%edge, "connector for degenerate edge ignored");
                }
                continue;
            }
            let rows = match aliases.donor(body, e) {
                Some((db, de)) => {
                    let donor = blocks.connector(db, de).ok_or_else(|| {
                        ReconcileError::inconsistent(format!(
                            "no connector for {}, which {edge} reuses",
                            EntityRef::edge(db, de)
                        ))
                    })?;
                    reused += 1;
                    self.reused_rows(edge, info, donor, vertices)?
                }
                None => {
                    let connector = blocks
                        .connector(body, e)
                        .ok_or_else(|| ReconcileError::inconsistent(format!("no connector for {edge}")))?;
                    own_rows(&classifier, edge, connector, vertices)?
                }
            };
            let rows = orient_rows(edge, rows)?;

            let mut ids = Vec::with_capacity(rows.len());
            let mut points = Vec::with_capacity(rows.len());
            let mut params = Vec::with_capacity(rows.len());
            for (id, p, t) in rows {
                ids.push(id);
                points.push(p);
                params.push(t);
            }
            self.tess
                .set_edge(e, points, params)
                .map_err(|err| install_failed(body, err))?;
            self.edge_ids[e] = ids;
            installed += 1;
        }

        info!(edges = installed, reused, "edges installed");
        Ok(self.advance(EdgesInstalled { reused_edges: reused }))
    }

    fn reused_rows(
        &self,
        edge: EntityRef,
        info: &EdgeInfo,
        donor: &Connector,
        vertices: &VertexTable,
    ) -> Result<EdgeRows> {
        let mut rows = EdgeRows::with_capacity(donor.points.len());
        for p in &donor.points {
            let xyz = vertices.xyz(p.id)?;
            let t = self.kernel.edge_inverse_eval(edge, &xyz)?;
            rows.push((p.id, xyz, t));
        }

        // Both ends of a closed edge sit on its node; the interior decides
        // which end is which.
        let n = rows.len();
        if matches!(info.nodes, EdgeNodes::One(_)) && n >= 3 {
            let ascending = rows[1].2 <= rows[n - 2].2;
            let (first, last) = if ascending {
                (info.range.lo, info.range.hi)
            } else {
                (info.range.hi, info.range.lo)
            };
            rows[0].2 = first;
            rows[n - 1].2 = last;
        }

        for (id, xyz, t) in &rows {
            let on_curve = self.kernel.edge_eval(edge, *t)?;
            if on_curve.distance_to(xyz) > self.tolerance.identity {
                return Err(ReconcileError::inconsistent(format!(
                    "generator vertex {id} reused on {edge} lies off the curve"
                )));
            }
        }
        Ok(rows)
    }
}

fn own_rows(
    classifier: &VertexClassifier<'_>,
    edge: EntityRef,
    connector: &Connector,
    vertices: &VertexTable,
) -> Result<EdgeRows> {
    connector
        .points
        .iter()
        .map(|p| Ok((p.id, vertices.xyz(p.id)?, classifier.edge_parameter(edge.index, p.t)?)))
        .collect()
}

impl<'a, K: CadKernel + ?Sized> TessellationBuilder<'a, K, EdgesInstalled> {
    /// Install every face, orientation-corrected, and re-key the generator
    /// IDs to the container's stored point order.
    #[instrument(skip_all, fields(body = self.cache.body))]
    pub fn install_faces(
        mut self,
        blocks: &MeshBlocks<'_>,
        vertices: &VertexTable,
    ) -> Result<TessellationBuilder<'a, K, Faceted>> {
        let cache = self.cache;
        let body = cache.body;
        let classifier = VertexClassifier::new(cache);
        let mut flipped = 0usize;

        for f in 0..cache.face_count() {
            let domain = blocks.domain(body, f).ok_or_else(|| {
                ReconcileError::inconsistent(format!("no domain for {}", EntityRef::face(body, f)))
            })?;
            if self.install_face(f, domain, &classifier, vertices)? {
                flipped += 1;
            }
        }

        info!(faces = cache.face_count(), flipped, "faces installed");
        let reused_edges = self.state.reused_edges;
        Ok(self.advance(Faceted {
            reused_edges,
            flipped_faces: flipped,
        }))
    }

    fn install_face(
        &mut self,
        f: usize,
        domain: &Domain,
        classifier: &VertexClassifier<'_>,
        vertices: &VertexTable,
    ) -> Result<bool> {
        let body = self.cache.body;
        let face = EntityRef::face(body, f);

        let ids: Vec<GeneratorId> = domain.points.iter().map(|p| p.id).collect();
        let points = domain
            .points
            .iter()
            .map(|p| vertices.xyz(p.id))
            .collect::<Result<Vec<_>>>()?;
        let uvs = domain
            .points
            .iter()
            .map(|p| classifier.face_parameter(f, p.uv))
            .collect::<Result<Vec<_>>>()?;

        let mut triangles = domain.triangles.clone();
        for (k, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&i| i >= points.len()) {
                return Err(ReconcileError::inconsistent(format!(
                    "{face}: triangle {k} indexes past {} points",
                    points.len()
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(ReconcileError::inconsistent(format!(
                    "{face}: triangle {k} repeats a corner"
                )));
            }
        }

        let flipped = correct_orientation(self.kernel, face, &points, &uvs, &mut triangles)?;
        self.tess
            .set_face(f, points, uvs, triangles.clone())
            .map_err(|err| install_failed(body, err))?;

        // Triangle order survives installation; corner k of triangle i still
        // names the same generator vertex.
        let stored = self.tess.face(f).map_err(|err| install_failed(body, err))?;
        let mut rekeyed: Vec<Option<GeneratorId>> = vec![None; stored.points.len()];
        for (old, new) in triangles.iter().zip(&stored.triangles) {
            for c in 0..3 {
                rekeyed[new[c]] = Some(ids[old[c]]);
            }
        }
        self.face_ids[f] = rekeyed
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                id.ok_or_else(|| ReconcileError::inconsistent(format!("{face}: stored point {i} has no triangle")))
            })
            .collect::<Result<_>>()?;

        debug!(
            %face,
            points = stored.points.len(),
            triangles = stored.triangles.len(),
            flipped,
            "face installed"
        );
        Ok(flipped)
    }
}

impl<'a, K: CadKernel + ?Sized> TessellationBuilder<'a, K, Faceted> {
    /// Close the tessellation. Fails with `NotWatertight` when the installed
    /// faces do not close up along their edges.
    #[instrument(skip_all, fields(body = self.cache.body))]
    pub fn finalize(mut self) -> Result<TessellationBuilder<'a, K, Finalized>> {
        let body = self.cache.body;
        let point_count = self
            .tess
            .finalize()
            .map_err(|source| ReconcileError::NotWatertight { body, source })?;
        info!(points = point_count, "tessellation finalized");
        let Faceted {
            reused_edges,
            flipped_faces,
        } = self.state;
        Ok(self.advance(Finalized {
            point_count,
            reused_edges,
            flipped_faces,
        }))
    }
}

impl<'a, K: CadKernel + ?Sized> TessellationBuilder<'a, K, Finalized> {
    pub fn point_count(&self) -> usize {
        self.state.point_count
    }

    pub fn flipped_faces(&self) -> usize {
        self.state.flipped_faces
    }

    pub fn reused_edges(&self) -> usize {
        self.state.reused_edges
    }

    /// Global vertex index to generator vertex ID.
    pub fn index_map(&self) -> Result<IndexMap> {
        build_index_map(&self.tess, &self.face_ids)
    }

    /// Face triangles, and edge segments when `include_edges` is set, in
    /// generator vertex IDs. Tags are left for the boundary assigner.
    pub fn elements(&self, include_edges: bool) -> Vec<MeshElement> {
        let body = self.cache.body;
        let mut elements = Vec::new();
        for (f, ids) in self.face_ids.iter().enumerate() {
            let Ok(face) = self.tess.face(f) else {
                continue;
            };
            let owner = EntityRef::face(body, f);
            elements.extend(
                face.triangles
                    .iter()
                    .map(|t| MeshElement::triangle(owner, [ids[t[0]], ids[t[1]], ids[t[2]]])),
            );
        }
        if include_edges {
            for (e, ids) in self.edge_ids.iter().enumerate() {
                let owner = EntityRef::edge(body, e);
                elements.extend(ids.windows(2).map(|w| MeshElement::line(owner, [w[0], w[1]])));
            }
        }
        elements
    }

    pub fn into_tessellation(self) -> Tessellation {
        self.tess
    }
}
