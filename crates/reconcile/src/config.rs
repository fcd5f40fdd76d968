//! Run configuration for a reconciliation.

use serde::{Deserialize, Serialize};

/// Tolerance thresholds used while reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Trimmed and proxy ranges differing by less than this are treated as equal.
    pub periodic: f64,
    /// Face points closer than this to an edge point lie on that edge.
    pub coincidence: f64,
    /// Maximum distance between a reused edge point and its re-evaluated
    /// position on the receiving edge.
    pub identity: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            periodic: 1e-4,
            coincidence: 1e-7,
            identity: 1e-6,
        }
    }
}

/// Configuration for one [`crate::reconcile`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub tolerance: ToleranceConfig,
    /// Also resolve boundary tags for edges and emit line elements.
    pub tag_edges: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::surface()
    }
}

impl ReconcileConfig {
    /// Surface mesh: faces carry boundary tags, edges do not.
    pub fn surface() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            tag_edges: false,
        }
    }

    /// Area/line mesh: faces and edges both carry boundary tags.
    pub fn area() -> Self {
        Self {
            tag_edges: true,
            ..Self::surface()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ReconcileConfig::from_json(r#"{ "tolerance": { "periodic": 0.001 } }"#).unwrap();
        assert_eq!(config.tolerance.periodic, 0.001);
        assert_eq!(config.tolerance.coincidence, 1e-7);
        assert!(!config.tag_edges);
    }

    #[test]
    fn area_tags_edges() {
        assert!(ReconcileConfig::area().tag_edges);
        assert_eq!(ReconcileConfig::default(), ReconcileConfig::surface());
    }
}
