use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of topological entity a mesh vertex or element can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Edge,
    Face,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Face => "face",
        }
    }

    /// Dimension of the parametric coordinate carried on this kind.
    pub fn parametric_dim(&self) -> usize {
        match self {
            EntityKind::Node => 0,
            EntityKind::Edge => 1,
            EntityKind::Face => 2,
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(EntityKind::Node),
            "edge" => Ok(EntityKind::Edge),
            "face" => Ok(EntityKind::Face),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// Reference to one topological entity: kind, owning body, and 0-based
/// index within that body's list of entities of the same kind.
///
/// Passed by value. Bounds are only meaningful against a particular model,
/// so construction never validates; consumers check against their own counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub body: usize,
    pub index: usize,
}

impl EntityRef {
    pub fn new(kind: EntityKind, body: usize, index: usize) -> Self {
        Self { kind, body, index }
    }

    pub fn node(body: usize, index: usize) -> Self {
        Self::new(EntityKind::Node, body, index)
    }

    pub fn edge(body: usize, index: usize) -> Self {
        Self::new(EntityKind::Edge, body, index)
    }

    pub fn face(body: usize, index: usize) -> Self {
        Self::new(EntityKind::Face, body, index)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of body {}", self.kind.as_str(), self.index, self.body)
    }
}

/// Topological classification of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// Closed body enclosing a volume.
    Solid,
    /// Zero-thickness body (e.g. a wake surface).
    Sheet,
    /// Open set of faces that is neither solid nor sheet.
    Face,
    /// Edges only.
    Wire,
}

/// Orientation of a face relative to its underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Forward,
    Reverse,
}

impl Sense {
    pub fn sign(&self) -> f64 {
        match self {
            Sense::Forward => 1.0,
            Sense::Reverse => -1.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Sense::Forward => Sense::Reverse,
            Sense::Reverse => Sense::Forward,
        }
    }
}
