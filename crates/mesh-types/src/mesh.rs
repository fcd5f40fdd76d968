use serde::{Deserialize, Serialize};

use crate::topo::EntityRef;

/// Generator-assigned vertex identifier. Opaque; only unique within one flat mesh.
pub type GeneratorId = u64;

/// Normalized parametric coordinate reported by the generator.
///
/// Values are in `[0, 1]` relative to the owning entity's parameter box.
/// Along a periodic face direction a generator may report a coordinate one
/// period outside that interval; reconciliation accepts it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParamCoord {
    None,
    Curve(f64),
    Surface([f64; 2]),
}

impl ParamCoord {
    pub fn dim(&self) -> usize {
        match self {
            ParamCoord::None => 0,
            ParamCoord::Curve(_) => 1,
            ParamCoord::Surface(_) => 2,
        }
    }
}

/// One vertex of the generator's flat output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMeshVertex {
    pub id: GeneratorId,
    pub xyz: [f64; 3],
    pub owner: EntityRef,
    pub param: ParamCoord,
}

/// Element shape. Quads are not accepted by the reconciliation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Line,
    Triangle,
}

impl ElementKind {
    pub fn vertex_count(&self) -> usize {
        match self {
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
        }
    }
}

/// A surface or line element expressed in generator vertex IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshElement {
    pub kind: ElementKind,
    pub vertices: Vec<GeneratorId>,
    /// Face (triangles) or edge (lines) the element was derived from.
    pub owner: EntityRef,
    /// Boundary tag resolved from the owner's boundary name, once assigned.
    pub tag: Option<i32>,
}

impl MeshElement {
    pub fn triangle(owner: EntityRef, vertices: [GeneratorId; 3]) -> Self {
        Self {
            kind: ElementKind::Triangle,
            vertices: vertices.to_vec(),
            owner,
            tag: None,
        }
    }

    pub fn line(owner: EntityRef, vertices: [GeneratorId; 2]) -> Self {
        Self {
            kind: ElementKind::Line,
            vertices: vertices.to_vec(),
            owner,
            tag: None,
        }
    }
}
