use std::collections::BTreeMap;

use cad_kernel::{CadKernel, EdgeNodes, KernelError, Point3d};
use mesh_types::EntityRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::TessError;

/// Discretization of one edge: points with strictly increasing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTess {
    pub points: Vec<Point3d>,
    pub params: Vec<f64>,
}

/// A point on an installed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgePointRef {
    pub edge: usize,
    pub index: usize,
}

/// Stored triangulation of one face, after renumbering.
///
/// Boundary points come first in loop order, followed by interior points in
/// the order they were supplied. Points no triangle referenced are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceTess {
    pub points: Vec<Point3d>,
    pub uvs: Vec<[f64; 2]>,
    pub triangles: Vec<[usize; 3]>,
    /// Edge point each boundary point coincides with; `None` for interior points.
    pub boundary: Vec<Option<EdgePointRef>>,
}

impl FaceTess {
    pub fn boundary_count(&self) -> usize {
        self.boundary.iter().filter(|b| b.is_some()).count()
    }
}

/// Where a global point lives in the body topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLocation {
    Node { node: usize },
    Edge { edge: usize, index: usize },
    Face { face: usize, index: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalPoint {
    pub location: PointLocation,
    pub xyz: Point3d,
}

/// Topology snapshot taken from the kernel when the container is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Topology {
    face_edges: Vec<Vec<usize>>,
    edge_nodes: Vec<EdgeNodes>,
    degenerate: Vec<bool>,
    node_points: Vec<Point3d>,
}

/// 1-based global indices, filled in by [`Tessellation::finalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Numbering {
    edge: Vec<Vec<usize>>,
    face: Vec<Vec<usize>>,
    points: Vec<GlobalPoint>,
}

/// Tessellation of a single body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tessellation {
    body: usize,
    tolerance: f64,
    topology: Topology,
    edges: Vec<Option<EdgeTess>>,
    faces: Vec<Option<FaceTess>>,
    numbering: Option<Numbering>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

fn push_point(points: &mut Vec<GlobalPoint>, location: PointLocation, xyz: Point3d) -> usize {
    points.push(GlobalPoint { location, xyz });
    points.len()
}

impl Tessellation {
    /// Empty tessellation for `body`. Face points within `tolerance` of an
    /// installed edge point are treated as lying on that edge.
    pub fn for_body<K: CadKernel + ?Sized>(
        kernel: &K,
        body: usize,
        tolerance: f64,
    ) -> Result<Self, KernelError> {
        let face_count = kernel.face_count(body)?;
        let edge_count = kernel.edge_count(body)?;

        let face_edges = (0..face_count)
            .map(|f| kernel.face_edges(EntityRef::face(body, f)))
            .collect::<Result<Vec<_>, _>>()?;
        let edge_nodes = (0..edge_count)
            .map(|e| kernel.edge_nodes(EntityRef::edge(body, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let degenerate = (0..edge_count)
            .map(|e| kernel.edge_is_degenerate(EntityRef::edge(body, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let node_points = (0..kernel.node_count(body)?)
            .map(|n| kernel.node_point(EntityRef::node(body, n)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            body,
            tolerance,
            topology: Topology {
                face_edges,
                edge_nodes,
                degenerate,
                node_points,
            },
            edges: vec![None; edge_count],
            faces: vec![None; face_count],
            numbering: None,
        })
    }

    pub fn body(&self) -> usize {
        self.body
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_edge_degenerate(&self, edge: usize) -> bool {
        self.topology.degenerate.get(edge).copied().unwrap_or(false)
    }

    pub fn is_finalized(&self) -> bool {
        self.numbering.is_some()
    }

    fn ensure_open(&self) -> Result<(), TessError> {
        if self.is_finalized() {
            Err(TessError::Finalized)
        } else {
            Ok(())
        }
    }

    fn first_missing_edge(&self) -> Option<usize> {
        (0..self.edges.len()).find(|&e| !self.topology.degenerate[e] && self.edges[e].is_none())
    }

    /// Install the discretization of one edge. The first and last points
    /// must lie within tolerance of the edge's start and end nodes.
    pub fn set_edge(&mut self, edge: usize, points: Vec<Point3d>, params: Vec<f64>) -> Result<(), TessError> {
        self.ensure_open()?;
        if edge >= self.edges.len() {
            return Err(TessError::BadIndex { what: "edge", index: edge });
        }
        if self.topology.degenerate[edge] {
            return Err(TessError::DegenerateEdge { edge });
        }
        if self.faces.iter().any(Option::is_some) {
            return Err(TessError::EdgesFrozen);
        }
        if self.edges[edge].is_some() {
            return Err(TessError::AlreadyInstalled { what: "edge", index: edge });
        }
        if points.len() != params.len() {
            return Err(TessError::LengthMismatch {
                what: "edge point/parameter",
                left: points.len(),
                right: params.len(),
            });
        }
        if points.len() < 2 {
            return Err(TessError::TooFewPoints {
                edge,
                count: points.len(),
            });
        }
        if let Some(i) = params.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TessError::NotMonotone { edge, index: i + 1 });
        }
        let nodes = self.topology.edge_nodes[edge];
        for (end, node) in [(0, nodes.start()), (points.len() - 1, nodes.end())] {
            let gap = points[end].distance_to(&self.topology.node_points[node]);
            if gap > self.tolerance {
                return Err(TessError::EndpointOffNode { edge, node, gap });
            }
        }

        debug!(body = self.body, edge, points = points.len(), "edge installed");
        self.edges[edge] = Some(EdgeTess { points, params });
        Ok(())
    }

    /// Install the triangulation of one face. Every non-degenerate edge must
    /// already be installed. The stored point order may differ from the
    /// supplied one; query [`Tessellation::face`] for the result. Triangle
    /// order is preserved.
    pub fn set_face(
        &mut self,
        face: usize,
        points: Vec<Point3d>,
        uvs: Vec<[f64; 2]>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<(), TessError> {
        self.ensure_open()?;
        if face >= self.faces.len() {
            return Err(TessError::BadIndex { what: "face", index: face });
        }
        if self.faces[face].is_some() {
            return Err(TessError::AlreadyInstalled { what: "face", index: face });
        }
        if let Some(edge) = self.first_missing_edge() {
            return Err(TessError::EdgesIncomplete { edge });
        }
        if points.len() != uvs.len() {
            return Err(TessError::LengthMismatch {
                what: "face point/uv",
                left: points.len(),
                right: uvs.len(),
            });
        }
        if triangles.is_empty() {
            return Err(TessError::EmptyFace { face });
        }
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i >= points.len()) {
                return Err(TessError::BadIndex {
                    what: "face point",
                    index: bad,
                });
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(TessError::DegenerateTriangle { face, triangle: t });
            }
        }

        let mut used = vec![false; points.len()];
        for tri in &triangles {
            for &i in tri {
                used[i] = true;
            }
        }

        let matches: Vec<Option<(usize, EdgePointRef)>> =
            points.iter().map(|p| self.match_edge_point(face, p)).collect();

        // Boundary points sorted by (loop position, edge point index), then
        // interior points in supplied order.
        let mut boundary: Vec<(usize, usize, usize)> = Vec::new();
        let mut interior: Vec<usize> = Vec::new();
        for old in (0..points.len()).filter(|&i| used[i]) {
            match matches[old] {
                Some((pos, r)) => boundary.push((pos, r.index, old)),
                None => interior.push(old),
            }
        }
        boundary.sort_unstable();
        let order: Vec<usize> = boundary.iter().map(|b| b.2).chain(interior).collect();

        let mut new_index = vec![0usize; points.len()];
        for (new, &old) in order.iter().enumerate() {
            new_index[old] = new;
        }

        let tess = FaceTess {
            points: order.iter().map(|&o| points[o]).collect(),
            uvs: order.iter().map(|&o| uvs[o]).collect(),
            triangles: triangles
                .iter()
                .map(|t| [new_index[t[0]], new_index[t[1]], new_index[t[2]]])
                .collect(),
            boundary: order.iter().map(|&o| matches[o].map(|m| m.1)).collect(),
        };
        debug!(
            body = self.body,
            face,
            points = tess.points.len(),
            boundary = tess.boundary_count(),
            dropped = points.len() - tess.points.len(),
            "face installed"
        );
        self.faces[face] = Some(tess);
        Ok(())
    }

    fn match_edge_point(&self, face: usize, p: &Point3d) -> Option<(usize, EdgePointRef)> {
        for (pos, &edge) in self.topology.face_edges[face].iter().enumerate() {
            if self.topology.degenerate[edge] {
                continue;
            }
            let Some(et) = self.edges[edge].as_ref() else {
                continue;
            };
            if let Some(index) = et.points.iter().position(|q| q.distance_to(p) < self.tolerance) {
                return Some((pos, EdgePointRef { edge, index }));
            }
        }
        None
    }

    /// Validate closure and assign global numbering. Returns the number of
    /// global points. Can only succeed once.
    #[instrument(skip(self), fields(body = self.body))]
    pub fn finalize(&mut self) -> Result<usize, TessError> {
        self.ensure_open()?;
        if let Some(edge) = self.first_missing_edge() {
            return Err(TessError::MissingEdge { edge });
        }
        if let Some(face) = self.faces.iter().position(Option::is_none) {
            return Err(TessError::MissingFace { face });
        }

        let mut points: Vec<GlobalPoint> = Vec::new();
        let mut node_global: Vec<Option<usize>> = vec![None; self.topology.node_points.len()];
        let mut edge_global: Vec<Vec<usize>> = vec![Vec::new(); self.edges.len()];

        for (e, slot) in self.edges.iter().enumerate() {
            let Some(et) = slot else {
                continue;
            };
            let nodes = self.topology.edge_nodes[e];
            let last = et.points.len() - 1;
            let mut globals = Vec::with_capacity(et.points.len());
            for (k, p) in et.points.iter().enumerate() {
                let g = if k == 0 || k == last {
                    let node = if k == 0 { nodes.start() } else { nodes.end() };
                    match node_global[node] {
                        Some(g) => g,
                        None => {
                            let g = push_point(&mut points, PointLocation::Node { node }, *p);
                            node_global[node] = Some(g);
                            g
                        }
                    }
                } else {
                    push_point(&mut points, PointLocation::Edge { edge: e, index: k }, *p)
                };
                globals.push(g);
            }
            edge_global[e] = globals;
        }

        let mut face_global: Vec<Vec<usize>> = Vec::with_capacity(self.faces.len());
        for (f, slot) in self.faces.iter().enumerate() {
            let Some(ft) = slot else {
                return Err(TessError::MissingFace { face: f });
            };
            let mut globals = Vec::with_capacity(ft.points.len());
            for (i, b) in ft.boundary.iter().enumerate() {
                let g = match b {
                    Some(r) => edge_global[r.edge][r.index],
                    None => push_point(&mut points, PointLocation::Face { face: f, index: i }, ft.points[i]),
                };
                globals.push(g);
            }
            self.check_closed(f, ft, &globals, &edge_global)?;
            face_global.push(globals);
        }

        let count = points.len();
        info!(points = count, faces = self.faces.len(), "tessellation finalized");
        self.numbering = Some(Numbering {
            edge: edge_global,
            face: face_global,
            points,
        });
        Ok(count)
    }

    /// Every once-used triangle side must be a segment of an edge the loop
    /// visits once, and every such segment must be used exactly once. Edges
    /// visited twice (seams) close the face onto itself.
    fn check_closed(
        &self,
        face: usize,
        ft: &FaceTess,
        globals: &[usize],
        edge_global: &[Vec<usize>],
    ) -> Result<(), TessError> {
        let mut sides: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for tri in &ft.triangles {
            for c in 0..3 {
                let side = ordered(globals[tri[c]], globals[tri[(c + 1) % 3]]);
                *sides.entry(side).or_insert(0) += 1;
            }
        }

        let mut visits: BTreeMap<usize, usize> = BTreeMap::new();
        for &e in &self.topology.face_edges[face] {
            if !self.topology.degenerate[e] {
                *visits.entry(e).or_insert(0) += 1;
            }
        }
        let mut expected: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for (&e, _) in visits.iter().filter(|(_, n)| **n == 1) {
            for w in edge_global[e].windows(2) {
                expected.insert(ordered(w[0], w[1]), e);
            }
        }

        for (&(a, b), &count) in &sides {
            if count > 2 {
                return Err(TessError::NonManifold { face, a, b });
            }
            if count == 1 && !expected.contains_key(&(a, b)) {
                return Err(TessError::OpenBoundary { face, a, b });
            }
        }
        for (&(a, b), &edge) in &expected {
            if sides.get(&(a, b)) != Some(&1) {
                return Err(TessError::UnmatchedEdge { face, edge, a, b });
            }
        }
        Ok(())
    }

    /// Total global point count once finalized.
    pub fn point_count(&self) -> Option<usize> {
        self.numbering.as_ref().map(|n| n.points.len())
    }

    pub fn edge(&self, edge: usize) -> Result<&EdgeTess, TessError> {
        self.edges
            .get(edge)
            .ok_or(TessError::BadIndex { what: "edge", index: edge })?
            .as_ref()
            .ok_or(TessError::MissingEdge { edge })
    }

    pub fn face(&self, face: usize) -> Result<&FaceTess, TessError> {
        self.faces
            .get(face)
            .ok_or(TessError::BadIndex { what: "face", index: face })?
            .as_ref()
            .ok_or(TessError::MissingFace { face })
    }

    fn numbering(&self) -> Result<&Numbering, TessError> {
        self.numbering.as_ref().ok_or(TessError::NotFinalized)
    }

    /// 1-based global index of a stored face point.
    pub fn global_index_of_face_point(&self, face: usize, local: usize) -> Result<usize, TessError> {
        self.numbering()?
            .face
            .get(face)
            .ok_or(TessError::BadIndex { what: "face", index: face })?
            .get(local)
            .copied()
            .ok_or(TessError::BadIndex {
                what: "face point",
                index: local,
            })
    }

    /// 1-based global index of a stored edge point.
    pub fn global_index_of_edge_point(&self, edge: usize, local: usize) -> Result<usize, TessError> {
        self.numbering()?
            .edge
            .get(edge)
            .ok_or(TessError::BadIndex { what: "edge", index: edge })?
            .get(local)
            .copied()
            .ok_or(TessError::BadIndex {
                what: "edge point",
                index: local,
            })
    }

    /// The point with 1-based global index `global`.
    pub fn global_point(&self, global: usize) -> Result<&GlobalPoint, TessError> {
        let numbering = self.numbering()?;
        global
            .checked_sub(1)
            .and_then(|i| numbering.points.get(i))
            .ok_or(TessError::BadIndex {
                what: "global point",
                index: global,
            })
    }

    pub fn global_points(&self) -> Result<&[GlobalPoint], TessError> {
        Ok(&self.numbering()?.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cad_kernel::topology::primitives::{make_cylinder, make_plate};
    use cad_kernel::{BrepModel, Vec3};
    use std::f64::consts::TAU;

    const TOL: f64 = 1e-7;

    fn plate_model() -> BrepModel {
        BrepModel::with_bodies(vec![make_plate(Point3d::ORIGIN, Vec3::X, Vec3::Y, "plate")])
    }

    fn corners() -> [Point3d; 4] {
        [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ]
    }

    fn install_plate_edges(tess: &mut Tessellation) {
        let c = corners();
        for e in 0..4 {
            tess.set_edge(e, vec![c[e], c[(e + 1) % 4]], vec![0.0, 1.0]).unwrap();
        }
    }

    /// Fan around the center, supplied as [center, c2, c0, c3, c1].
    fn plate_fan() -> (Vec<Point3d>, Vec<[f64; 2]>, Vec<[usize; 3]>) {
        let c = corners();
        let points = vec![Point3d::new(0.5, 0.5, 0.0), c[2], c[0], c[3], c[1]];
        let uvs = points.iter().map(|p| [p.x, p.y]).collect();
        let triangles = vec![[0, 2, 4], [0, 4, 1], [0, 1, 3], [0, 3, 2]];
        (points, uvs, triangles)
    }

    #[test]
    fn face_points_are_renumbered_boundary_first() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        install_plate_edges(&mut tess);
        let (points, uvs, triangles) = plate_fan();
        tess.set_face(0, points, uvs, triangles).unwrap();

        let face = tess.face(0).unwrap();
        assert_eq!(face.boundary_count(), 4);
        assert!(face.boundary[4].is_none());
        assert_eq!(face.points[4], Point3d::new(0.5, 0.5, 0.0));
        assert_eq!(face.points[0], corners()[0]);
        // First triangle was [center, c0, c1]; it keeps its position.
        let t0 = face.triangles[0];
        assert_eq!(face.points[t0[0]], Point3d::new(0.5, 0.5, 0.0));
        assert_eq!(face.points[t0[1]], corners()[0]);
        assert_eq!(face.points[t0[2]], corners()[1]);
    }

    #[test]
    fn finalize_numbers_nodes_then_interior() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        install_plate_edges(&mut tess);
        let (points, uvs, triangles) = plate_fan();
        tess.set_face(0, points, uvs, triangles).unwrap();

        assert_eq!(tess.finalize().unwrap(), 5);
        assert_eq!(tess.point_count(), Some(5));
        assert_eq!(tess.global_index_of_face_point(0, 4).unwrap(), 5);
        let g = tess.global_index_of_edge_point(1, 1).unwrap();
        let p = tess.global_point(g).unwrap();
        assert_eq!(p.xyz, corners()[2]);
        assert!(matches!(p.location, PointLocation::Node { node: 2 }));
        assert!(tess.global_point(0).is_err());
        assert_eq!(tess.finalize(), Err(TessError::Finalized));
    }

    #[test]
    fn missing_triangle_leaves_face_open() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        install_plate_edges(&mut tess);
        let (points, uvs, mut triangles) = plate_fan();
        triangles.pop();
        tess.set_face(0, points, uvs, triangles).unwrap();
        assert!(matches!(
            tess.finalize(),
            Err(TessError::OpenBoundary { .. }) | Err(TessError::UnmatchedEdge { .. })
        ));
        assert!(!tess.is_finalized());
    }

    #[test]
    fn faces_wait_for_edges() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        let c = corners();
        tess.set_edge(0, vec![c[0], c[1]], vec![0.0, 1.0]).unwrap();
        let (points, uvs, triangles) = plate_fan();
        assert_eq!(
            tess.set_face(0, points, uvs, triangles),
            Err(TessError::EdgesIncomplete { edge: 1 })
        );
    }

    #[test]
    fn edge_install_validation() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        let c = corners();
        assert_eq!(
            tess.set_edge(0, vec![c[0]], vec![0.0]),
            Err(TessError::TooFewPoints { edge: 0, count: 1 })
        );
        assert_eq!(
            tess.set_edge(0, vec![c[0], c[1]], vec![1.0, 0.0]),
            Err(TessError::NotMonotone { edge: 0, index: 1 })
        );
        assert!(matches!(tess.set_edge(9, vec![], vec![]), Err(TessError::BadIndex { .. })));
        tess.set_edge(0, vec![c[0], c[1]], vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            tess.set_edge(0, vec![c[0], c[1]], vec![0.0, 1.0]),
            Err(TessError::AlreadyInstalled { .. })
        ));
    }

    #[test]
    fn edge_endpoints_must_sit_on_nodes() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        let c = corners();

        let reversed = tess.set_edge(0, vec![c[1], c[0]], vec![0.0, 1.0]);
        match reversed {
            Err(TessError::EndpointOffNode { edge, node, gap }) => {
                assert_eq!((edge, node), (0, 0));
                assert_relative_eq!(gap, 1.0);
            }
            other => panic!("expected EndpointOffNode, got {other:?}"),
        }

        let short = Point3d::new(0.0, 0.0, 1e-3);
        match tess.set_edge(3, vec![c[3], short], vec![0.0, 1.0]) {
            Err(TessError::EndpointOffNode { node, gap, .. }) => {
                assert_eq!(node, 0);
                assert_relative_eq!(gap, 1e-3, epsilon = 1e-12);
            }
            other => panic!("expected EndpointOffNode, got {other:?}"),
        }

        // Within tolerance is accepted.
        let near = Point3d::new(1.0, 0.0, TOL / 2.0);
        tess.set_edge(0, vec![c[0], near], vec![0.0, 1.0]).unwrap();
    }

    #[test]
    fn repeated_corner_is_rejected() {
        let model = plate_model();
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        install_plate_edges(&mut tess);
        let (points, uvs, _) = plate_fan();
        assert_eq!(
            tess.set_face(0, points, uvs, vec![[0, 2, 2]]),
            Err(TessError::DegenerateTriangle { face: 0, triangle: 0 })
        );
    }

    #[test]
    fn queries_before_finalize_fail() {
        let model = plate_model();
        let tess = Tessellation::for_body(&model, 0, TOL).unwrap();
        assert_eq!(tess.global_index_of_face_point(0, 0), Err(TessError::NotFinalized));
        assert_eq!(tess.point_count(), None);
        assert!(matches!(tess.face(0), Err(TessError::MissingFace { face: 0 })));
    }

    #[test]
    fn cylinder_closes_across_seam() {
        let model = BrepModel::with_bodies(vec![make_cylinder(Point3d::ORIGIN, Vec3::Z, 1.0, 1.0)]);
        let body = &model.bodies[0];
        let mut tess = Tessellation::for_body(&model, 0, TOL).unwrap();

        let n = 4;
        let angles: Vec<f64> = (0..=n).map(|i| TAU * i as f64 / n as f64).collect();
        for edge in [0usize, 1] {
            let pts = angles
                .iter()
                .map(|&a| body.edges[edge].curve.evaluate(a))
                .collect::<Vec<_>>();
            tess.set_edge(edge, pts, angles.clone()).unwrap();
        }
        let n0 = body.nodes[0].point;
        let n1 = body.nodes[1].point;
        tess.set_edge(2, vec![n0, n1], vec![0.0, 1.0]).unwrap();

        // Wall: (n + 1) x 2 grid, the seam column duplicated at u = 0 and u = 2PI.
        let wall = &body.faces[0].surface;
        let mut points = Vec::new();
        let mut uvs = Vec::new();
        for &u in &angles {
            for v in [0.0, 1.0] {
                points.push(wall.evaluate(u, v));
                uvs.push([u, v]);
            }
        }
        let mut triangles = Vec::new();
        for i in 0..n {
            let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
        tess.set_face(0, points, uvs, triangles).unwrap();

        for (face, edge) in [(1usize, 0usize), (2, 1)] {
            let rim: Vec<Point3d> = angles[..n]
                .iter()
                .map(|&a| body.edges[edge].curve.evaluate(a))
                .collect();
            let center = if face == 1 { Point3d::ORIGIN } else { Point3d::new(0.0, 0.0, 1.0) };
            let mut points = vec![center];
            points.extend(rim);
            let uvs = points.iter().map(|p| [p.x, p.y]).collect();
            let triangles = (0..n).map(|i| [0, 1 + i, 1 + (i + 1) % n]).collect();
            tess.set_face(face, points, uvs, triangles).unwrap();
        }

        // 2 nodes + 3 + 3 circle interior points + 2 cap centers.
        assert_eq!(tess.finalize().unwrap(), 10);

        // Both ends of each circle land on one global node point.
        for edge in [0usize, 1] {
            let first = tess.global_index_of_edge_point(edge, 0).unwrap();
            let last = tess.global_index_of_edge_point(edge, n).unwrap();
            assert_eq!(first, last);
            let p = tess.global_point(first).unwrap().xyz;
            assert_relative_eq!(p.distance_to(&body.nodes[edge].point), 0.0, epsilon = 1e-12);
        }
        for g in tess.global_points().unwrap() {
            if let PointLocation::Edge { .. } = g.location {
                assert_relative_eq!(g.xyz.x.hypot(g.xyz.y), 1.0, epsilon = 1e-12);
            }
        }
    }
}
