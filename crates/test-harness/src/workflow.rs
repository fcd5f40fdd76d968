//! Fluent driver: generate a synthetic mesh for a model, optionally push it
//! through a file format, reconcile it and run the oracles.

use cad_kernel::CadKernel;
use cad_tessellation::TriangleMesh;
use mesh_reconcile::{reconcile, AttributeIndexMap, BodyMesh, FlatMesh, ReconcileConfig, Reconciled};
use mesh_types::{BodyKind, EntityRef};
use tracing::info;

use crate::generator::{generate, GeneratorOptions};
use crate::helpers::HarnessError;
use crate::oracle::{run_body_checks, run_closed_mesh_checks};
use crate::report::ReconcileReport;

/// How the generated mesh reaches the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Direct,
    Text,
    Json,
}

/// Builder for one generate-then-reconcile run.
pub struct ReconcileRun<'k, K: CadKernel + ?Sized> {
    kernel: &'k K,
    options: GeneratorOptions,
    config: ReconcileConfig,
    transport: Transport,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub mesh: FlatMesh,
    pub reconciled: Reconciled,
    pub report: ReconcileReport,
}

impl<'k, K: CadKernel + ?Sized> ReconcileRun<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self {
            kernel,
            options: GeneratorOptions::default(),
            config: ReconcileConfig::default(),
            transport: Transport::Direct,
        }
    }

    pub fn divisions(mut self, n: usize) -> Self {
        self.options.divisions = n;
        self
    }

    pub fn flip(mut self, face: EntityRef) -> Self {
        self.options.flip_faces.push(face);
        self
    }

    pub fn reversed_connectors(mut self) -> Self {
        self.options.reverse_connectors = true;
        self
    }

    pub fn sequential_ids(mut self) -> Self {
        self.options.shuffle = None;
        self
    }

    /// Have the generator fold periodic face coordinates into `[0, 1)`.
    pub fn wrapped_uvs(mut self) -> Self {
        self.options.wrap_periodic = true;
        self
    }

    pub fn area_mode(mut self) -> Self {
        self.config = ReconcileConfig::area();
        self
    }

    pub fn via(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Generate, transport and reconcile, then check every body.
    pub fn run(self) -> Result<RunOutcome, HarnessError> {
        let generated = generate(self.kernel, &self.options)?;
        let mesh = match self.transport {
            Transport::Direct => generated,
            Transport::Text => FlatMesh::parse(&generated.to_string())?,
            Transport::Json => FlatMesh::from_json(&generated.to_json()?)?,
        };

        let registry = AttributeIndexMap::from_kernel(self.kernel)?;
        let reconciled = reconcile(self.kernel, &mesh, &registry, &self.config)?;

        let mut verdicts = Vec::new();
        for body in &reconciled.bodies {
            verdicts.extend(run_body_checks(self.kernel, body, &mesh));
            if self.kernel.body_kind(body.body)? == BodyKind::Solid {
                let render = body.tessellation.to_triangle_mesh()?;
                verdicts.extend(run_closed_mesh_checks(&render));
            }
        }
        let report = ReconcileReport::new(&reconciled, verdicts);
        info!(passed = report.all_passed(), "harness run complete");

        Ok(RunOutcome {
            mesh,
            reconciled,
            report,
        })
    }
}

impl RunOutcome {
    pub fn body(&self, body: usize) -> Result<&BodyMesh, HarnessError> {
        self.reconciled.body(body).ok_or_else(|| HarnessError::AssertionFailed {
            detail: format!("no reconciled body {body}"),
        })
    }

    pub fn triangle_mesh(&self, body: usize) -> Result<TriangleMesh, HarnessError> {
        Ok(self.body(body)?.tessellation.to_triangle_mesh()?)
    }

    /// Fail with the first failing oracle, carrying the full report.
    pub fn expect_all_passed(&self) -> Result<(), HarnessError> {
        match self.report.failures().next() {
            None => Ok(()),
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name.clone(),
                detail: format!("{}\n{}", v.detail, self.report),
            }),
        }
    }
}
