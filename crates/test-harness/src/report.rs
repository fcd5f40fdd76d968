//! Structured reports of a reconciliation run.
//!
//! The text form goes into panic messages of failing tests; the JSON form
//! is for archiving runs.

use std::fmt;

use mesh_reconcile::Reconciled;
use serde::Serialize;

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Per-body summary line.
#[derive(Debug, Clone, Serialize)]
pub struct BodySummary {
    pub body: usize,
    pub faces: usize,
    pub edges: usize,
    pub points: usize,
    pub elements: usize,
    pub flipped_faces: usize,
    pub reused_edges: usize,
}

/// A complete run report.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub bodies: Vec<BodySummary>,
    pub aliases: Vec<String>,
    pub oracle_results: Vec<OracleVerdict>,
}

impl ReconcileReport {
    pub fn new(reconciled: &Reconciled, oracle_results: Vec<OracleVerdict>) -> Self {
        let bodies = reconciled
            .bodies
            .iter()
            .map(|b| BodySummary {
                body: b.body,
                faces: b.tessellation.face_count(),
                edges: b.tessellation.edge_count(),
                points: b.index_map.len(),
                elements: b.elements.len(),
                flipped_faces: b.flipped_faces,
                reused_edges: b.reused_edges,
            })
            .collect();
        let aliases = reconciled
            .aliases
            .matches()
            .map(|(sheet, solid)| format!("edge {} of body {} -> edge {} of body {}", sheet.1, sheet.0, solid.1, solid.0))
            .collect();
        Self {
            bodies,
            aliases,
            oracle_results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.oracle_results.iter().all(|v| v.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &OracleVerdict> {
        self.oracle_results.iter().filter(|v| !v.passed)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Reconciliation Report ===\n\n");

        out.push_str(&format!("Bodies ({}):\n", self.bodies.len()));
        for b in &self.bodies {
            out.push_str(&format!(
                "  [{}] {} faces, {} edges -> {} points, {} elements ({} flipped faces, {} reused edges)\n",
                b.body, b.faces, b.edges, b.points, b.elements, b.flipped_faces, b.reused_edges,
            ));
        }

        if !self.aliases.is_empty() {
            out.push_str(&format!("\nShared edges ({}):\n", self.aliases.len()));
            for a in &self.aliases {
                out.push_str(&format!("  {a}\n"));
            }
        }

        if !self.oracle_results.is_empty() {
            let passed = self.oracle_results.iter().filter(|v| v.passed).count();
            out.push_str(&format!(
                "\nOracle Results ({passed}/{} passed):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let mark = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{mark}] {}: {}\n", v.oracle_name, v.detail));
            }
        }
        out
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
