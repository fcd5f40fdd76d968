use cad_kernel::KernelError;
use cad_tessellation::TessError;
use mesh_types::{BodyKind, EntityRef};

/// Reasons a reconciliation run aborts. No partial output accompanies any of them.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("body {body} is a {kind:?} body; only solid and sheet bodies are supported")]
    BadTopology { body: usize, kind: BodyKind },

    #[error("{entity} is outside the declared bounds")]
    BadEntityIndex { entity: EntityRef },

    #[error("{entity} has no resolvable boundary name{}", name.as_deref().map(|n| format!(" (got '{n}')")).unwrap_or_default())]
    MissingBoundaryName {
        entity: EntityRef,
        name: Option<String>,
    },

    #[error("generator output disagrees with the geometry: {reason}")]
    Inconsistent { reason: String },

    #[error("line {line}: {reason}")]
    Io { line: usize, reason: String },

    #[error("tessellation of body {body} is not watertight: {source}")]
    NotWatertight { body: usize, source: TessError },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

impl ReconcileError {
    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
