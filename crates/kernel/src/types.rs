use mesh_types::EntityRef;

/// Errors from kernel queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("body {body} not found")]
    BodyNotFound { body: usize },

    #[error("entity not found: {entity}")]
    EntityNotFound { entity: EntityRef },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}

/// Nodes bounding an edge. Closed edges (full circles) have a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EdgeNodes {
    One(usize),
    Two(usize, usize),
}

impl EdgeNodes {
    pub fn start(&self) -> usize {
        match *self {
            EdgeNodes::One(n) | EdgeNodes::Two(n, _) => n,
        }
    }

    pub fn end(&self) -> usize {
        match *self {
            EdgeNodes::One(n) | EdgeNodes::Two(_, n) => n,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            EdgeNodes::One(_) => 1,
            EdgeNodes::Two(..) => 2,
        }
    }
}
