//! Test harness for mesh reconciliation.
//!
//! Generates synthetic generator output for kernel models, drives it
//! through reconciliation and checks the result.
//!
//! # Key Components
//!
//! - [`ReconcileRun`]: Fluent API for generating, reconciling and verifying
//! - [`generator`]: Synthetic flat meshes for any kernel model
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`report`]: Structured text run descriptions
//! - [`stl`]: STL export from TriangleMesh
//! - [`helpers`]: Error type, model fixtures, expected counts

pub mod generator;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod stl;
pub mod workflow;

pub use generator::{generate, GeneratorOptions};
pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::ReconcileReport;
pub use workflow::{ReconcileRun, RunOutcome, Transport};
