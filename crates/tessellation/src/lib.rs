//! Per-body tessellation container.
//!
//! A [`Tessellation`] is populated edge by edge, then face by face, and
//! finalized once. Finalization validates that every face closes against
//! its bounding edges and assigns the global point numbering `1..=N`.

pub mod error;
pub mod mesh;
pub mod tessellation;

pub use error::TessError;
pub use mesh::{FaceRange, TriangleMesh};
pub use tessellation::{EdgePointRef, EdgeTess, FaceTess, GlobalPoint, PointLocation, Tessellation};
