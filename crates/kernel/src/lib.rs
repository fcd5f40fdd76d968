pub mod geometry;
pub mod topology;
pub mod traits;
pub mod types;

pub use geometry::{Interval, Periodicity, Point3d, Surface, SurfaceDerivs, UvBox, Vec3};
pub use topology::model::{Body, BodyBuilder, BrepModel, Edge, Face, Node};
pub use traits::CadKernel;
pub use types::{EdgeNodes, KernelError};

/// Distances the kernel treats as zero when building and comparing topology.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Nodes closer than this are the same node; edges shorter than this
    /// are degenerate.
    pub coincidence: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { coincidence: 1e-7 }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }
}
