//! Reconciliation of an external generator's flat mesh with CAD topology.
//!
//! The generator reports points, edge connectors and face triangulations
//! under its own vertex numbering. This crate re-attaches them to the faces,
//! edges and nodes of each body, corrects periodic parameters and triangle
//! winding, shares edge discretizations between sheet and solid bodies, and
//! produces a finalized [`cad_tessellation::Tessellation`] per body together
//! with an [`IndexMap`] back to the generator's vertex IDs.
//!
//! [`reconcile`] runs every stage; the stages are also public for callers
//! that drive them individually.

pub mod attributes;
pub mod boundary;
pub mod builder;
pub mod cache;
pub mod classify;
pub mod config;
pub mod equivalence;
pub mod error;
pub mod flat_mesh;
pub mod index_map;
pub mod orientation;
pub mod pipeline;

pub use attributes::AttributeIndexMap;
pub use boundary::{assign_boundary_tags, BoundaryTags};
pub use builder::TessellationBuilder;
pub use cache::{periodic_offset, GeometryTopologyCache};
pub use classify::{ClassifiedVertex, VertexClassifier, VertexTable};
pub use config::{ReconcileConfig, ToleranceConfig};
pub use equivalence::{match_edges, EdgeAliases};
pub use error::{ReconcileError, Result};
pub use flat_mesh::{Connector, ConnectorPoint, Domain, DomainPoint, FlatMesh, MeshBlocks};
pub use index_map::{build_index_map, IndexMap};
pub use orientation::{correct_orientation, orientation_dot};
pub use pipeline::{reconcile, BodyMesh, Reconciled};
