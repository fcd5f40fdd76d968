/// Errors from installing, finalizing or querying a [`crate::Tessellation`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TessError {
    #[error("{what} index {index} out of range")]
    BadIndex { what: &'static str, index: usize },

    #[error("edge {edge} is degenerate and cannot carry points")]
    DegenerateEdge { edge: usize },

    #[error("{what} {index} already installed")]
    AlreadyInstalled { what: &'static str, index: usize },

    #[error("edges cannot change once faces are installed")]
    EdgesFrozen,

    #[error("edge {edge} must be installed before any face")]
    EdgesIncomplete { edge: usize },

    #[error("edge {edge} needs at least two points, got {count}")]
    TooFewPoints { edge: usize, count: usize },

    #[error("{what} arrays disagree in length: {left} vs {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("edge {edge} parameters not strictly increasing at point {index}")]
    NotMonotone { edge: usize, index: usize },

    #[error("edge {edge} ends {gap:e} away from its node {node}")]
    EndpointOffNode { edge: usize, node: usize, gap: f64 },

    #[error("face {face} has no triangles")]
    EmptyFace { face: usize },

    #[error("face {face} triangle {triangle} repeats a corner")]
    DegenerateTriangle { face: usize, triangle: usize },

    #[error("edge {edge} was never installed")]
    MissingEdge { edge: usize },

    #[error("face {face} was never installed")]
    MissingFace { face: usize },

    #[error("face {face} has an open side {a}-{b} that is not on a bounding edge")]
    OpenBoundary { face: usize, a: usize, b: usize },

    #[error("face {face} has a side {a}-{b} shared by more than two triangles")]
    NonManifold { face: usize, a: usize, b: usize },

    #[error("face {face} does not close against segment {a}-{b} of edge {edge}")]
    UnmatchedEdge {
        face: usize,
        edge: usize,
        a: usize,
        b: usize,
    },

    #[error("tessellation already finalized")]
    Finalized,

    #[error("tessellation not finalized")]
    NotFinalized,
}
