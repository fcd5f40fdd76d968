//! The generator's flat output: vertex, connector and domain records.
//!
//! Text layout, one record per line, `#` comments and blank lines ignored.
//! Body and entity indices are 0-based; triangle corners are 1-based
//! positions within their domain block.
//!
//! ```text
//! vertex <gid> <node|edge|face> <body> <index> <x> <y> <z> [<s> [<t>]]
//! connector <body> <edge> <count>
//! <gid> <t>
//! domain <body> <face> <nverts> <ntris>
//! <gid> <u> <v>
//! <i> <j> <k>
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use mesh_types::{EntityKind, EntityRef, GeneratorId, ParamCoord, RawMeshVertex};
use serde::{Deserialize, Serialize};

use crate::cache::GeometryTopologyCache;
use crate::error::{ReconcileError, Result};

/// Format identifier of the JSON envelope.
pub const FORMAT_NAME: &str = "flat-mesh";
/// Current JSON envelope version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorPoint {
    pub id: GeneratorId,
    /// Normalized edge parameter.
    pub t: f64,
}

/// Ordered vertices the generator placed along one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub body: usize,
    pub edge: usize,
    pub points: Vec<ConnectorPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainPoint {
    pub id: GeneratorId,
    /// Normalized surface parameter.
    pub uv: [f64; 2],
}

/// Triangulation the generator produced for one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub body: usize,
    pub face: usize,
    pub points: Vec<DomainPoint>,
    /// 0-based positions into `points`.
    pub triangles: Vec<[usize; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatMesh {
    pub vertices: Vec<RawMeshVertex>,
    pub connectors: Vec<Connector>,
    pub domains: Vec<Domain>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FlatMeshFile {
    format: String,
    version: u32,
    mesh: FlatMesh,
}

fn io(line: usize, reason: impl Into<String>) -> ReconcileError {
    ReconcileError::Io {
        line,
        reason: reason.into(),
    }
}

fn field<T: FromStr>(tokens: &[&str], i: usize, line: usize, what: &str) -> Result<T> {
    let raw = tokens
        .get(i)
        .ok_or_else(|| io(line, format!("missing {what}")))?;
    raw.parse()
        .map_err(|_| io(line, format!("invalid {what} '{raw}'")))
}

/// Non-blank, non-comment lines with their 1-based line numbers.
struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            last: 0,
        }
    }

    fn next_record(&mut self) -> Option<(usize, Vec<&'a str>)> {
        for (i, line) in self.lines.by_ref() {
            self.last = i + 1;
            let line = line.split('#').next().unwrap_or("").trim();
            if !line.is_empty() {
                return Some((i + 1, line.split_whitespace().collect()));
            }
        }
        None
    }

    fn expect_record(&mut self, block: &str) -> Result<(usize, Vec<&'a str>)> {
        self.next_record()
            .ok_or_else(|| io(self.last + 1, format!("truncated {block} block")))
    }
}

fn parse_vertex(tokens: &[&str], line: usize) -> Result<RawMeshVertex> {
    if !(8..=10).contains(&tokens.len()) {
        return Err(io(line, format!("vertex record has {} fields", tokens.len())));
    }
    let kind: EntityKind = tokens[2].parse().map_err(|e: String| io(line, e))?;
    let owner = EntityRef::new(
        kind,
        field(tokens, 3, line, "body index")?,
        field(tokens, 4, line, "entity index")?,
    );
    let xyz = [
        field(tokens, 5, line, "x")?,
        field(tokens, 6, line, "y")?,
        field(tokens, 7, line, "z")?,
    ];
    let param = match tokens.len() {
        8 => ParamCoord::None,
        9 => ParamCoord::Curve(field(tokens, 8, line, "s")?),
        _ => ParamCoord::Surface([field(tokens, 8, line, "s")?, field(tokens, 9, line, "t")?]),
    };
    Ok(RawMeshVertex {
        id: field(tokens, 1, line, "vertex id")?,
        xyz,
        owner,
        param,
    })
}

fn parse_connector(records: &mut Records<'_>, tokens: &[&str], line: usize) -> Result<Connector> {
    if tokens.len() != 4 {
        return Err(io(line, "connector header needs body, edge and count"));
    }
    let count: usize = field(tokens, 3, line, "point count")?;
    let mut points = Vec::new();
    for _ in 0..count {
        let (line, row) = records.expect_record("connector")?;
        if row.len() != 2 {
            return Err(io(line, format!("connector point has {} fields, expected 2", row.len())));
        }
        points.push(ConnectorPoint {
            id: field(&row, 0, line, "vertex id")?,
            t: field(&row, 1, line, "t")?,
        });
    }
    Ok(Connector {
        body: field(tokens, 1, line, "body index")?,
        edge: field(tokens, 2, line, "edge index")?,
        points,
    })
}

fn parse_domain(records: &mut Records<'_>, tokens: &[&str], line: usize) -> Result<Domain> {
    if tokens.len() != 5 {
        return Err(io(line, "domain header needs body, face, point and triangle counts"));
    }
    let nverts: usize = field(tokens, 3, line, "point count")?;
    let ntris: usize = field(tokens, 4, line, "triangle count")?;

    let mut points = Vec::new();
    for _ in 0..nverts {
        let (line, row) = records.expect_record("domain")?;
        if row.len() != 3 {
            return Err(io(line, format!("domain point has {} fields, expected 3", row.len())));
        }
        points.push(DomainPoint {
            id: field(&row, 0, line, "vertex id")?,
            uv: [field(&row, 1, line, "u")?, field(&row, 2, line, "v")?],
        });
    }

    let mut triangles = Vec::new();
    for _ in 0..ntris {
        let (line, row) = records.expect_record("domain")?;
        if row.len() == 4 {
            return Err(io(line, "quad elements are not supported"));
        }
        if row.len() != 3 {
            return Err(io(line, format!("triangle has {} fields, expected 3", row.len())));
        }
        let mut tri = [0usize; 3];
        for (c, slot) in tri.iter_mut().enumerate() {
            let one_based: usize = field(&row, c, line, "triangle index")?;
            *slot = one_based
                .checked_sub(1)
                .ok_or_else(|| io(line, "triangle indices are 1-based"))?;
        }
        triangles.push(tri);
    }

    Ok(Domain {
        body: field(tokens, 1, line, "body index")?,
        face: field(tokens, 2, line, "face index")?,
        points,
        triangles,
    })
}

impl FlatMesh {
    /// Parse the line-oriented text form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut mesh = FlatMesh::default();
        let mut records = Records::new(text);
        while let Some((line, tokens)) = records.next_record() {
            match tokens[0] {
                "vertex" => mesh.vertices.push(parse_vertex(&tokens, line)?),
                "connector" => mesh.connectors.push(parse_connector(&mut records, &tokens, line)?),
                "domain" => mesh.domains.push(parse_domain(&mut records, &tokens, line)?),
                other => return Err(io(line, format!("unknown record '{other}'"))),
            }
        }
        Ok(mesh)
    }

    /// Read the text form from any reader.
    pub fn read<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| io(0, e.to_string()))?;
        Self::parse(&text)
    }

    /// Deserialize the JSON envelope, checking format name and version.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: FlatMeshFile = serde_json::from_str(json).map_err(|e| io(e.line(), e.to_string()))?;
        if file.format != FORMAT_NAME {
            return Err(io(0, format!("unknown format '{}'", file.format)));
        }
        if file.version > FORMAT_VERSION {
            return Err(io(
                0,
                format!("version {} is newer than supported {FORMAT_VERSION}", file.version),
            ));
        }
        Ok(file.mesh)
    }

    pub fn to_json(&self) -> Result<String> {
        let file = FlatMeshFile {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
            mesh: self.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| io(0, e.to_string()))
    }
}

impl fmt::Display for FlatMesh {
    /// Writes the text form accepted by [`FlatMesh::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.vertices {
            let [x, y, z] = v.xyz;
            write!(
                f,
                "vertex {} {} {} {} {x:?} {y:?} {z:?}",
                v.id,
                v.owner.kind.as_str(),
                v.owner.body,
                v.owner.index
            )?;
            match v.param {
                ParamCoord::None => writeln!(f)?,
                ParamCoord::Curve(s) => writeln!(f, " {s:?}")?,
                ParamCoord::Surface([s, t]) => writeln!(f, " {s:?} {t:?}")?,
            }
        }
        for c in &self.connectors {
            writeln!(f, "connector {} {} {}", c.body, c.edge, c.points.len())?;
            for p in &c.points {
                writeln!(f, "{} {:?}", p.id, p.t)?;
            }
        }
        for d in &self.domains {
            writeln!(f, "domain {} {} {} {}", d.body, d.face, d.points.len(), d.triangles.len())?;
            for p in &d.points {
                writeln!(f, "{} {:?} {:?}", p.id, p.uv[0], p.uv[1])?;
            }
            for t in &d.triangles {
                writeln!(f, "{} {} {}", t[0] + 1, t[1] + 1, t[2] + 1)?;
            }
        }
        Ok(())
    }
}

/// Connector and domain blocks keyed by `(body, index)`, checked against
/// the body caches.
#[derive(Debug, Clone, Default)]
pub struct MeshBlocks<'m> {
    connectors: BTreeMap<(usize, usize), &'m Connector>,
    domains: BTreeMap<(usize, usize), &'m Domain>,
}

impl<'m> MeshBlocks<'m> {
    /// Fails with `BadEntityIndex` for blocks naming entities the bodies do
    /// not have, and `Inconsistent` for repeated blocks.
    pub fn new(mesh: &'m FlatMesh, caches: &[GeometryTopologyCache]) -> Result<Self> {
        let mut blocks = Self::default();
        for c in &mesh.connectors {
            let cache = caches.get(c.body).ok_or(ReconcileError::BadEntityIndex {
                entity: EntityRef::edge(c.body, c.edge),
            })?;
            cache.edge(c.edge)?;
            if blocks.connectors.insert((c.body, c.edge), c).is_some() {
                return Err(ReconcileError::inconsistent(format!(
                    "duplicate connector for {}",
                    EntityRef::edge(c.body, c.edge)
                )));
            }
        }
        for d in &mesh.domains {
            let cache = caches.get(d.body).ok_or(ReconcileError::BadEntityIndex {
                entity: EntityRef::face(d.body, d.face),
            })?;
            cache.face(d.face)?;
            if blocks.domains.insert((d.body, d.face), d).is_some() {
                return Err(ReconcileError::inconsistent(format!(
                    "duplicate domain for {}",
                    EntityRef::face(d.body, d.face)
                )));
            }
        }
        Ok(blocks)
    }

    pub fn connector(&self, body: usize, edge: usize) -> Option<&'m Connector> {
        self.connectors.get(&(body, edge)).copied()
    }

    pub fn domain(&self, body: usize, face: usize) -> Option<&'m Domain> {
        self.domains.get(&(body, face)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# one triangle
vertex 10 node 0 0 0 0 0
vertex 11 node 0 1 1 0 0
vertex 12 face 0 0 0 1 0 0.0 1.0

connector 0 0 2
10 0.0
11 1.0
domain 0 0 3 1
10 0.0 0.0
11 1.0 0.0
12 0.0 1.0
1 2 3
";

    #[test]
    fn parses_all_record_kinds() {
        let mesh = FlatMesh::parse(SAMPLE).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[2].param, ParamCoord::Surface([0.0, 1.0]));
        assert_eq!(mesh.vertices[0].owner, EntityRef::node(0, 0));
        assert_eq!(mesh.connectors[0].points[1], ConnectorPoint { id: 11, t: 1.0 });
        assert_eq!(mesh.domains[0].triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn text_form_round_trips() {
        let mesh = FlatMesh::parse(SAMPLE).unwrap();
        assert_eq!(FlatMesh::parse(&mesh.to_string()).unwrap(), mesh);
        assert_eq!(FlatMesh::from_json(&mesh.to_json().unwrap()).unwrap(), mesh);
    }

    #[test]
    fn quad_row_is_io_error() {
        let text = "domain 0 0 4 1\n1 0 0\n2 1 0\n3 1 1\n4 0 1\n1 2 3 4\n";
        match FlatMesh::parse(text) {
            Err(ReconcileError::Io { line, reason }) => {
                assert_eq!(line, 6);
                assert!(reason.contains("quad"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn truncated_block_reports_next_line() {
        let text = "connector 0 0 3\n1 0.0\n2 0.5\n";
        assert!(matches!(FlatMesh::parse(text), Err(ReconcileError::Io { line: 4, .. })));
    }

    #[test]
    fn oversized_counts_are_truncation_errors() {
        let text = "connector 0 0 18446744073709551615\n1 0.0\n";
        assert!(matches!(FlatMesh::parse(text), Err(ReconcileError::Io { line: 3, .. })));
        let text = "domain 0 0 18446744073709551615 1\n1 0.0 0.0\n";
        assert!(matches!(FlatMesh::parse(text), Err(ReconcileError::Io { line: 3, .. })));
        let text = "domain 0 0 0 18446744073709551615\n1 2 3\n";
        assert!(matches!(FlatMesh::parse(text), Err(ReconcileError::Io { line: 3, .. })));
    }

    #[test]
    fn malformed_fields_are_io_errors() {
        assert!(matches!(
            FlatMesh::parse("vertex x node 0 0 0 0 0"),
            Err(ReconcileError::Io { line: 1, .. })
        ));
        assert!(matches!(
            FlatMesh::parse("\n\nvertex 1 solid 0 0 0 0 0"),
            Err(ReconcileError::Io { line: 3, .. })
        ));
        assert!(matches!(FlatMesh::parse("vertex 1 node 0"), Err(ReconcileError::Io { .. })));
        assert!(matches!(
            FlatMesh::parse("domain 0 0 1 1\n1 0 0\n0 1 1"),
            Err(ReconcileError::Io { line: 3, .. })
        ));
        assert!(matches!(FlatMesh::parse("hexa 1 2"), Err(ReconcileError::Io { .. })));
    }

    #[test]
    fn json_with_wrong_format_is_rejected() {
        let json = r#"{"format":"other","version":1,"mesh":{"vertices":[],"connectors":[],"domains":[]}}"#;
        assert!(matches!(FlatMesh::from_json(json), Err(ReconcileError::Io { .. })));
        assert!(FlatMesh::from_json("{ not json").is_err());
    }
}
