use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use mesh_types::{BodyKind, EntityKind, EntityRef, Sense};

use crate::geometry::curves::{Circle3d, Curve, Line3d};
use crate::geometry::{Interval, Periodicity, Point3d, Surface, SurfaceDerivs, UvBox};
use crate::traits::CadKernel;
use crate::types::{EdgeNodes, KernelError};
use crate::Tolerance;

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub point: Point3d,
    pub boundary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve,
    pub range: Interval,
    pub nodes: EdgeNodes,
    /// Zero-length edge (e.g. a collapsed side at a cone apex).
    pub degenerate: bool,
    pub boundary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub surface: Surface,
    pub trim: UvBox,
    pub sense: Sense,
    /// Loop edges in loop order.
    pub edges: Vec<usize>,
    pub boundary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub kind: BodyKind,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
}

// ─── Body Builder ───────────────────────────────────────────────────────────

/// Incremental construction of a [`Body`]. Indices returned by each call are
/// the 0-based local indices used by [`EntityRef`].
#[derive(Debug, Default)]
pub struct BodyBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    tolerance: Tolerance,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, point: Point3d) -> usize {
        self.nodes.push(Node {
            point,
            boundary: None,
        });
        self.nodes.len() - 1
    }

    pub fn node_point(&self, node: usize) -> Point3d {
        self.nodes[node].point
    }

    /// Straight edge from node `a` to node `b`, arc-length parametrized.
    /// Coincident nodes produce a degenerate edge.
    pub fn line(&mut self, a: usize, b: usize) -> usize {
        let pa = self.nodes[a].point;
        let pb = self.nodes[b].point;
        let length = pa.distance_to(&pb);
        let degenerate = self.tolerance.is_zero_length(length);
        self.edges.push(Edge {
            curve: Curve::Line(Line3d::from_points(pa, pb)),
            range: Interval::new(0.0, length),
            nodes: EdgeNodes::Two(a, b),
            degenerate,
            boundary: None,
        });
        self.edges.len() - 1
    }

    /// Full circle starting and ending at `node`, which must sit at angle 0.
    pub fn circle(&mut self, circle: Circle3d, node: usize) -> usize {
        self.edges.push(Edge {
            curve: Curve::Circle(circle),
            range: Interval::new(0.0, TAU),
            nodes: EdgeNodes::One(node),
            degenerate: false,
            boundary: None,
        });
        self.edges.len() - 1
    }

    /// Zero-length edge collapsed onto `node`.
    pub fn degenerate(&mut self, node: usize) -> usize {
        let p = self.nodes[node].point;
        self.edges.push(Edge {
            curve: Curve::Line(Line3d::from_points(p, p)),
            range: Interval::new(0.0, 0.0),
            nodes: EdgeNodes::Two(node, node),
            degenerate: true,
            boundary: None,
        });
        self.edges.len() - 1
    }

    pub fn face(&mut self, surface: Surface, trim: UvBox, sense: Sense, edges: Vec<usize>) -> usize {
        self.faces.push(Face {
            surface,
            trim,
            sense,
            edges,
            boundary: None,
        });
        self.faces.len() - 1
    }

    pub fn name_face(&mut self, face: usize, name: &str) -> &mut Self {
        self.faces[face].boundary = Some(name.to_string());
        self
    }

    pub fn name_edge(&mut self, edge: usize, name: &str) -> &mut Self {
        self.edges[edge].boundary = Some(name.to_string());
        self
    }

    pub fn name_node(&mut self, node: usize, name: &str) -> &mut Self {
        self.nodes[node].boundary = Some(name.to_string());
        self
    }

    pub fn build(self, kind: BodyKind) -> Body {
        Body {
            kind,
            nodes: self.nodes,
            edges: self.edges,
            faces: self.faces,
        }
    }
}

// ─── Model ──────────────────────────────────────────────────────────────────

/// In-memory B-rep model: an ordered list of bodies plus the tolerance used
/// for geometric identity tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrepModel {
    pub bodies: Vec<Body>,
    pub tolerance: Tolerance,
}

impl BrepModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bodies(bodies: Vec<Body>) -> Self {
        Self {
            bodies,
            tolerance: Tolerance::default(),
        }
    }

    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn body(&self, body: usize) -> Result<&Body, KernelError> {
        self.bodies.get(body).ok_or(KernelError::BodyNotFound { body })
    }

    pub fn face(&self, face: EntityRef) -> Result<&Face, KernelError> {
        if face.kind != EntityKind::Face {
            return Err(KernelError::EntityNotFound { entity: face });
        }
        self.body(face.body)?
            .faces
            .get(face.index)
            .ok_or(KernelError::EntityNotFound { entity: face })
    }

    pub fn edge(&self, edge: EntityRef) -> Result<&Edge, KernelError> {
        if edge.kind != EntityKind::Edge {
            return Err(KernelError::EntityNotFound { entity: edge });
        }
        self.body(edge.body)?
            .edges
            .get(edge.index)
            .ok_or(KernelError::EntityNotFound { entity: edge })
    }

    pub fn node(&self, node: EntityRef) -> Result<&Node, KernelError> {
        if node.kind != EntityKind::Node {
            return Err(KernelError::EntityNotFound { entity: node });
        }
        self.body(node.body)?
            .nodes
            .get(node.index)
            .ok_or(KernelError::EntityNotFound { entity: node })
    }

    fn same_edge_geometry(&self, a: &Edge, b: &Edge) -> bool {
        if a.degenerate || b.degenerate {
            return false;
        }
        if a.curve.curve_type_name() != b.curve.curve_type_name() {
            return false;
        }
        let tol = self.tolerance.coincidence;
        (0..=4).all(|k| {
            let p = a.curve.evaluate(a.range.denormalize(k as f64 / 4.0));
            let t = b.curve.parameter_of(&p, b.range);
            b.range.contains(t, tol) && b.curve.evaluate(t).distance_to(&p) < tol
        })
    }

    fn same_face_geometry(&self, a: &Face, b: &Face) -> bool {
        if a.surface.surface_type_name() != b.surface.surface_type_name() {
            return false;
        }
        let tol = self.tolerance.coincidence;
        (0..=2).all(|i| {
            (0..=2).all(|j| {
                let st = [i as f64 / 2.0, j as f64 / 2.0];
                let pa = a.surface.evaluate(a.trim.u.denormalize(st[0]), a.trim.v.denormalize(st[1]));
                let pb = b.surface.evaluate(b.trim.u.denormalize(st[0]), b.trim.v.denormalize(st[1]));
                pa.distance_to(&pb) < tol
            })
        })
    }
}

impl CadKernel for BrepModel {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body_kind(&self, body: usize) -> Result<BodyKind, KernelError> {
        Ok(self.body(body)?.kind)
    }

    fn entity_count(&self, body: usize, kind: EntityKind) -> Result<usize, KernelError> {
        let b = self.body(body)?;
        Ok(match kind {
            EntityKind::Node => b.nodes.len(),
            EntityKind::Edge => b.edges.len(),
            EntityKind::Face => b.faces.len(),
        })
    }

    fn face_eval(&self, face: EntityRef, uv: [f64; 2]) -> Result<SurfaceDerivs, KernelError> {
        Ok(self.face(face)?.surface.derivatives(uv[0], uv[1]))
    }

    fn face_range(&self, face: EntityRef) -> Result<UvBox, KernelError> {
        Ok(self.face(face)?.trim)
    }

    fn face_periodicity(&self, face: EntityRef) -> Result<Periodicity, KernelError> {
        Ok(self.face(face)?.surface.periodicity())
    }

    fn face_sense(&self, face: EntityRef) -> Result<Sense, KernelError> {
        Ok(self.face(face)?.sense)
    }

    fn face_is_bspline(&self, face: EntityRef) -> Result<bool, KernelError> {
        Ok(self.face(face)?.surface.is_bspline())
    }

    fn face_proxy_range(&self, face: EntityRef) -> Result<UvBox, KernelError> {
        let f = self.face(face)?;
        Ok(f.surface.proxy_range(&f.trim))
    }

    fn face_edges(&self, face: EntityRef) -> Result<Vec<usize>, KernelError> {
        Ok(self.face(face)?.edges.clone())
    }

    fn edge_eval(&self, edge: EntityRef, t: f64) -> Result<Point3d, KernelError> {
        Ok(self.edge(edge)?.curve.evaluate(t))
    }

    fn edge_inverse_eval(&self, edge: EntityRef, point: &Point3d) -> Result<f64, KernelError> {
        let e = self.edge(edge)?;
        Ok(e.curve.parameter_of(point, e.range))
    }

    fn edge_range(&self, edge: EntityRef) -> Result<Interval, KernelError> {
        Ok(self.edge(edge)?.range)
    }

    fn edge_is_degenerate(&self, edge: EntityRef) -> Result<bool, KernelError> {
        Ok(self.edge(edge)?.degenerate)
    }

    fn edge_is_periodic(&self, edge: EntityRef) -> Result<bool, KernelError> {
        Ok(self.edge(edge)?.curve.period().is_some())
    }

    fn edge_nodes(&self, edge: EntityRef) -> Result<EdgeNodes, KernelError> {
        Ok(self.edge(edge)?.nodes)
    }

    fn node_point(&self, node: EntityRef) -> Result<Point3d, KernelError> {
        Ok(self.node(node)?.point)
    }

    fn same_geometry(&self, a: EntityRef, b: EntityRef) -> Result<bool, KernelError> {
        if a.kind != b.kind {
            return Ok(false);
        }
        match a.kind {
            EntityKind::Node => Ok(self
                .tolerance
                .points_coincident(&self.node(a)?.point, &self.node(b)?.point)),
            EntityKind::Edge => Ok(self.same_edge_geometry(self.edge(a)?, self.edge(b)?)),
            EntityKind::Face => Ok(self.same_face_geometry(self.face(a)?, self.face(b)?)),
        }
    }

    fn boundary_name(&self, entity: EntityRef) -> Result<Option<&str>, KernelError> {
        let name = match entity.kind {
            EntityKind::Node => &self.node(entity)?.boundary,
            EntityKind::Edge => &self.edge(entity)?.boundary,
            EntityKind::Face => &self.face(entity)?.boundary,
        };
        Ok(name.as_deref())
    }
}
