pub mod mesh;
pub mod topo;

pub use mesh::*;
pub use topo::*;
