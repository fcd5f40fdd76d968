//! Synthetic stand-in for an external surface mesher.
//!
//! Produces a [`FlatMesh`] for any model the way a generator would report
//! it: one global vertex list with owners and normalized parameters, one
//! connector per edge and one triangulated domain per face. Vertices shared
//! between entities (and between bodies) are merged by position, so a sheet
//! edge lying on a solid edge reuses the solid's vertex IDs.
//!
//! Faces bounded by a single closed edge are fanned from their center.
//! Every other face is gridded over its trim box, which suits the boxes,
//! plates, cylinder walls and B-spline patches the fixtures build.
//!
//! Face coordinates are normalized against the proxy box with the periodic
//! offset undone, so by default a full-turn cylinder wall reports `u` in
//! `[-0.5, 0.5]`. With [`GeneratorOptions::wrap_periodic`] such coordinates
//! are folded into `[0, 1)` instead, and reconcile one period away from the
//! trim range.

use cad_kernel::{CadKernel, EdgeNodes, Point3d};
use mesh_reconcile::{
    Connector, ConnectorPoint, Domain, DomainPoint, FlatMesh, GeometryTopologyCache, ToleranceConfig,
};
use mesh_types::{BodyKind, EntityRef, GeneratorId, ParamCoord, RawMeshVertex};
use tracing::{debug, instrument};

use crate::helpers::HarnessError;

/// Positions closer than this share one generator vertex.
const MERGE_DISTANCE: f64 = 1e-9;

/// Knobs for [`generate`].
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Segments per edge and cells per face direction.
    pub divisions: usize,
    /// Permute generator IDs with this seed; `None` numbers in creation order.
    pub shuffle: Option<u64>,
    /// First generator ID handed out.
    pub first_id: GeneratorId,
    /// Emit every connector from its last point to its first.
    pub reverse_connectors: bool,
    /// Faces whose triangles are emitted with reversed winding.
    pub flip_faces: Vec<EntityRef>,
    /// Fold face coordinates of offset directions into `[0, 1)`.
    pub wrap_periodic: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            divisions: 4,
            shuffle: Some(0x5eed),
            first_id: 1000,
            reverse_connectors: false,
            flip_faces: Vec::new(),
            wrap_periodic: false,
        }
    }
}

impl GeneratorOptions {
    pub fn with_divisions(divisions: usize) -> Self {
        Self {
            divisions,
            ..Self::default()
        }
    }

    pub fn flip(mut self, face: EntityRef) -> Self {
        self.flip_faces.push(face);
        self
    }

    pub fn reversed_connectors(mut self) -> Self {
        self.reverse_connectors = true;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.shuffle = None;
        self
    }

    pub fn wrapped(mut self) -> Self {
        self.wrap_periodic = true;
        self
    }
}

/// Vertices registered so far, keyed by position.
#[derive(Default)]
struct VertexPool {
    points: Vec<Point3d>,
    owners: Vec<(EntityRef, ParamCoord)>,
}

impl VertexPool {
    /// Slot of the vertex at `xyz`, registering it with `owner` if new.
    fn intern(&mut self, xyz: Point3d, owner: EntityRef, param: ParamCoord) -> usize {
        if let Some(slot) = self.points.iter().position(|p| p.distance_to(&xyz) < MERGE_DISTANCE) {
            return slot;
        }
        self.points.push(xyz);
        self.owners.push((owner, param));
        self.points.len() - 1
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

struct PendingConnector {
    edge: EntityRef,
    points: Vec<(usize, f64)>,
}

struct PendingDomain {
    face: EntityRef,
    points: Vec<(usize, [f64; 2])>,
    triangles: Vec<[usize; 3]>,
}

/// Mesh every body of `kernel`.
#[instrument(skip_all, fields(bodies = kernel.body_count(), divisions = options.divisions))]
pub fn generate<K: CadKernel + ?Sized>(kernel: &K, options: &GeneratorOptions) -> Result<FlatMesh, HarnessError> {
    let n = options.divisions;
    if n == 0 {
        return Err(HarnessError::Generator {
            reason: "divisions must be positive".into(),
        });
    }
    let caches = GeometryTopologyCache::build_all(kernel, &ToleranceConfig::default())?;

    // Solids register first so shared vertices are owned by solid entities.
    let mut order: Vec<usize> = (0..kernel.body_count()).collect();
    order.sort_by_key(|&b| kernel.body_kind(b).map(|k| k != BodyKind::Solid).unwrap_or(true));

    let mut pool = VertexPool::default();
    for &b in &order {
        for v in 0..kernel.node_count(b)? {
            let node = EntityRef::node(b, v);
            pool.intern(kernel.node_point(node)?, node, ParamCoord::None);
        }
    }

    let mut connectors = Vec::new();
    for &b in &order {
        for (e, info) in caches[b].edges() {
            if info.degenerate {
                continue;
            }
            let edge = EntityRef::edge(b, e);
            if matches!(info.nodes, EdgeNodes::One(_)) && n < 3 {
                return Err(HarnessError::Generator {
                    reason: format!("closed {edge} needs at least 3 divisions"),
                });
            }
            let mut points = Vec::with_capacity(n + 1);
            for k in 0..=n {
                let s = k as f64 / n as f64;
                let xyz = kernel.edge_eval(edge, info.range.denormalize(s))?;
                points.push((pool.intern(xyz, edge, ParamCoord::Curve(s)), s));
            }
            if options.reverse_connectors {
                points.reverse();
            }
            connectors.push(PendingConnector { edge, points });
        }
    }

    let mut domains = Vec::new();
    for &b in &order {
        let cache = &caches[b];
        for f in 0..cache.face_count() {
            let face = EntityRef::face(b, f);
            let mut domain = match closed_single_edge(kernel, face)? {
                Some(edge) => fan_domain(kernel, cache, face, edge, n, options.wrap_periodic, &mut pool)?,
                None => grid_domain(kernel, cache, face, n, options.wrap_periodic, &mut pool)?,
            };
            if options.flip_faces.contains(&face) {
                for tri in &mut domain.triangles {
                    tri.swap(1, 2);
                }
            }
            domains.push(domain);
        }
    }

    let ids = assign_ids(pool.len(), options);
    debug!(vertices = pool.len(), connectors = connectors.len(), domains = domains.len(), "synthetic mesh generated");

    let vertices = pool
        .points
        .iter()
        .zip(&pool.owners)
        .zip(&ids)
        .map(|((xyz, &(owner, param)), &id)| RawMeshVertex {
            id,
            xyz: xyz.to_array(),
            owner,
            param,
        })
        .collect();

    let mut connectors: Vec<Connector> = connectors
        .into_iter()
        .map(|c| Connector {
            body: c.edge.body,
            edge: c.edge.index,
            points: c.points.iter().map(|&(slot, t)| ConnectorPoint { id: ids[slot], t }).collect(),
        })
        .collect();
    connectors.sort_by_key(|c| (c.body, c.edge));

    let mut domains: Vec<Domain> = domains
        .into_iter()
        .map(|d| Domain {
            body: d.face.body,
            face: d.face.index,
            points: d.points.iter().map(|&(slot, uv)| DomainPoint { id: ids[slot], uv }).collect(),
            triangles: d.triangles,
        })
        .collect();
    domains.sort_by_key(|d| (d.body, d.face));

    Ok(FlatMesh {
        vertices,
        connectors,
        domains,
    })
}

/// The loop edge of `face` if its loop is one closed edge.
fn closed_single_edge<K: CadKernel + ?Sized>(kernel: &K, face: EntityRef) -> Result<Option<EntityRef>, HarnessError> {
    let edges = kernel.face_edges(face)?;
    let [e] = edges.as_slice() else {
        return Ok(None);
    };
    let edge = EntityRef::edge(face.body, *e);
    Ok(match kernel.edge_nodes(edge)? {
        EdgeNodes::One(_) => Some(edge),
        EdgeNodes::Two(..) => None,
    })
}

/// Generator uv of a trim-space parameter: undo the periodic offset and
/// normalize against the face's parameter box. With `wrap`, directions
/// carrying an offset are folded into `[0, 1)`.
fn generator_uv(
    cache: &GeometryTopologyCache,
    face: usize,
    uv: [f64; 2],
    wrap: bool,
) -> Result<[f64; 2], HarnessError> {
    let info = cache.face(face)?;
    let mut st = info.uv_box.normalize([uv[0] - info.offset[0], uv[1] - info.offset[1]]);
    if wrap {
        for k in 0..2 {
            if info.offset[k] != 0.0 {
                st[k] = st[k].rem_euclid(1.0);
            }
        }
    }
    Ok(st)
}

fn grid_domain<K: CadKernel + ?Sized>(
    kernel: &K,
    cache: &GeometryTopologyCache,
    face: EntityRef,
    n: usize,
    wrap: bool,
    pool: &mut VertexPool,
) -> Result<PendingDomain, HarnessError> {
    let trim = cache.face(face.index)?.trim;
    let mut points = Vec::with_capacity((n + 1) * (n + 1));
    for i in 0..=n {
        for j in 0..=n {
            let uv = trim.denormalize([i as f64 / n as f64, j as f64 / n as f64]);
            let st = generator_uv(cache, face.index, uv, wrap)?;
            let xyz = kernel.face_eval(face, uv)?.point;
            points.push((pool.intern(xyz, face, ParamCoord::Surface(st)), st));
        }
    }

    let at = |i: usize, j: usize| i * (n + 1) + j;
    let mut triangles = Vec::with_capacity(2 * n * n);
    for i in 0..n {
        for j in 0..n {
            let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }
    Ok(PendingDomain { face, points, triangles })
}

/// Fan from the trim center to `n` points on the closed loop edge. The
/// rim uvs come from projecting onto the tangent plane at the center, which
/// is exact for planar faces.
fn fan_domain<K: CadKernel + ?Sized>(
    kernel: &K,
    cache: &GeometryTopologyCache,
    face: EntityRef,
    edge: EntityRef,
    n: usize,
    wrap: bool,
    pool: &mut VertexPool,
) -> Result<PendingDomain, HarnessError> {
    let center = cache.face(face.index)?.trim.center();
    let frame = kernel.face_eval(face, center)?;
    let range = kernel.edge_range(edge)?;

    let st = generator_uv(cache, face.index, center, wrap)?;
    let mut points = vec![(pool.intern(frame.point, face, ParamCoord::Surface(st)), st)];
    for k in 0..n {
        let xyz = kernel.edge_eval(edge, range.denormalize(k as f64 / n as f64))?;
        let d = xyz - frame.point;
        let uv = [
            center[0] + d.dot(&frame.du) / frame.du.length_squared(),
            center[1] + d.dot(&frame.dv) / frame.dv.length_squared(),
        ];
        let st = generator_uv(cache, face.index, uv, wrap)?;
        points.push((pool.intern(xyz, face, ParamCoord::Surface(st)), st));
    }

    let triangles = (0..n).map(|k| [0, 1 + k, 1 + (k + 1) % n]).collect();
    Ok(PendingDomain { face, points, triangles })
}

/// Generator ID of every pool slot.
fn assign_ids(count: usize, options: &GeneratorOptions) -> Vec<GeneratorId> {
    let Some(seed) = options.shuffle else {
        return (0..count as u64).map(|k| options.first_id + k).collect();
    };
    let mut slots: Vec<usize> = (0..count).collect();
    slots.sort_by_key(|&k| ((k as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ seed, k));
    let mut ids = vec![0; count];
    for (rank, slot) in slots.into_iter().enumerate() {
        ids[slot] = options.first_id + rank as u64;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{box_with_wake, unit_box, unit_cylinder};
    use std::collections::HashSet;

    #[test]
    fn box_mesh_shares_edge_vertices_between_faces() {
        let model = unit_box();
        let mesh = generate(&model, &GeneratorOptions::with_divisions(2)).unwrap();
        // 8 corners, 12 edge midpoints, 6 face centers.
        assert_eq!(mesh.vertices.len(), 26);
        assert_eq!(mesh.connectors.len(), 12);
        assert_eq!(mesh.domains.len(), 6);
        assert!(mesh.domains.iter().all(|d| d.triangles.len() == 8));
    }

    #[test]
    fn shuffled_ids_are_a_permutation() {
        let model = unit_box();
        let mesh = generate(&model, &GeneratorOptions::with_divisions(3)).unwrap();
        let ids: HashSet<GeneratorId> = mesh.vertices.iter().map(|v| v.id).collect();
        assert_eq!(ids.len(), mesh.vertices.len());
        let expected: HashSet<GeneratorId> = (1000..1000 + mesh.vertices.len() as u64).collect();
        assert_eq!(ids, expected);
        assert!(mesh.vertices.iter().zip(1000u64..).any(|(v, k)| v.id != k));
    }

    #[test]
    fn wake_edge_reuses_box_vertex_ids() {
        let model = box_with_wake();
        let mesh = generate(&model, &GeneratorOptions::with_divisions(2)).unwrap();
        let ids = |body: usize, edge: usize| -> HashSet<GeneratorId> {
            let c = mesh.connectors.iter().find(|c| c.body == body && c.edge == edge).unwrap();
            c.points.iter().map(|p| p.id).collect()
        };
        assert_eq!(ids(1, 3), ids(0, 5));
        let shared = mesh.vertices.iter().filter(|v| ids(1, 3).contains(&v.id));
        assert!(shared.into_iter().all(|v| v.owner.body == 0));
    }

    #[test]
    fn cylinder_caps_are_fans_and_wall_is_a_grid() {
        let model = unit_cylinder();
        let mesh = generate(&model, &GeneratorOptions::with_divisions(4)).unwrap();
        let wall = &mesh.domains[0];
        assert_eq!(wall.points.len(), 25);
        // Seam columns carry the same IDs at both ends of the wall's u range.
        assert_eq!(wall.points[0].id, wall.points[20].id);
        assert!((wall.points[20].uv[0] - wall.points[0].uv[0] - 1.0).abs() < 1e-12);
        let cap = &mesh.domains[1];
        assert_eq!(cap.points.len(), 5);
        assert_eq!(cap.triangles.len(), 4);
    }

    #[test]
    fn wrapped_wall_coordinates_stay_in_the_unit_interval() {
        let model = unit_cylinder();
        let plain = generate(&model, &GeneratorOptions::with_divisions(4)).unwrap();
        let wrapped = generate(&model, &GeneratorOptions::with_divisions(4).wrapped()).unwrap();

        let wall_u = |mesh: &FlatMesh| mesh.domains[0].points.iter().map(|p| p.uv[0]).collect::<Vec<_>>();
        assert!(wall_u(&plain).iter().any(|&u| u < 0.0));
        let u = wall_u(&wrapped);
        assert!(u.iter().all(|&u| (0.0..=1.0).contains(&u)));
        // Seam columns fold onto the same coordinate.
        assert!((u[0] - u[20]).abs() < 1e-12);
        // Same connectivity; the caps are untouched.
        assert_eq!(plain.domains[0].triangles, wrapped.domains[0].triangles);
        assert_eq!(plain.domains[1], wrapped.domains[1]);

        for v in &wrapped.vertices {
            if let ParamCoord::Surface(st) = v.param {
                assert!(st.iter().all(|&c| (0.0..=1.0).contains(&c)), "vertex {} at {st:?}", v.id);
            }
        }
    }

    #[test]
    fn closed_edge_needs_three_divisions() {
        let model = unit_cylinder();
        let err = generate(&model, &GeneratorOptions::with_divisions(2)).unwrap_err();
        assert!(matches!(err, HarnessError::Generator { .. }));
    }

    #[test]
    fn flipped_face_reverses_winding() {
        let model = unit_box();
        let face = EntityRef::face(0, 5);
        let plain = generate(&model, &GeneratorOptions::with_divisions(1)).unwrap();
        let flipped = generate(&model, &GeneratorOptions::with_divisions(1).flip(face)).unwrap();
        let a = &plain.domains[5].triangles[0];
        let b = &flipped.domains[5].triangles[0];
        assert_eq!([a[0], a[2], a[1]], *b);
    }
}
