//! Aliasing of geometrically identical edges between sheet and solid bodies.

use std::collections::BTreeMap;

use cad_kernel::{CadKernel, EdgeNodes};
use mesh_types::{BodyKind, EntityRef};
use tracing::{debug, info, instrument};

use crate::error::{ReconcileError, Result};

/// `(body, edge)` pair.
pub type EdgeKey = (usize, usize);

/// Symmetric alias map over every edge of every body. Unmatched edges alias
/// themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAliases {
    map: BTreeMap<EdgeKey, EdgeKey>,
    kinds: Vec<BodyKind>,
}

impl EdgeAliases {
    /// The edge whose discretization `(body, edge)` shares.
    pub fn resolve(&self, body: usize, edge: usize) -> EdgeKey {
        self.map.get(&(body, edge)).copied().unwrap_or((body, edge))
    }

    /// Solid edge a sheet edge must reuse, if it was matched.
    pub fn donor(&self, body: usize, edge: usize) -> Option<EdgeKey> {
        if self.kinds.get(body) != Some(&BodyKind::Sheet) {
            return None;
        }
        let target = self.resolve(body, edge);
        (target != (body, edge)).then_some(target)
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().all(|(k, v)| k == v)
    }

    /// Matched pairs, each reported once from its sheet side.
    pub fn matches(&self) -> impl Iterator<Item = (EdgeKey, EdgeKey)> + '_ {
        self.map
            .iter()
            .filter(|(k, v)| k != v && self.kinds.get(k.0) == Some(&BodyKind::Sheet))
            .map(|(k, v)| (*k, *v))
    }

    pub fn body_kind(&self, body: usize) -> Option<BodyKind> {
        self.kinds.get(body).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn nodes_match<K: CadKernel + ?Sized>(
    kernel: &K,
    a: (usize, EdgeNodes),
    b: (usize, EdgeNodes),
) -> Result<bool> {
    let same = |x: usize, y: usize| kernel.same_geometry(EntityRef::node(a.0, x), EntityRef::node(b.0, y));
    Ok(match (a.1, b.1) {
        (EdgeNodes::One(x), EdgeNodes::One(y)) => same(x, y)?,
        (EdgeNodes::Two(x0, x1), EdgeNodes::Two(y0, y1)) => {
            (same(x0, y0)? && same(x1, y1)?) || (same(x0, y1)? && same(x1, y0)?)
        }
        _ => false,
    })
}

/// Match sheet edges against solid edges.
///
/// A pair matches when the curves are geometrically identical and the end
/// nodes correspond in either order (or the single node, for closed edges).
/// The first solid edge matching a sheet edge wins.
#[instrument(skip(kernel))]
pub fn match_edges<K: CadKernel + ?Sized>(kernel: &K) -> Result<EdgeAliases> {
    let mut kinds = Vec::with_capacity(kernel.body_count());
    let mut map = BTreeMap::new();
    for body in 0..kernel.body_count() {
        let kind = kernel.body_kind(body)?;
        if !matches!(kind, BodyKind::Solid | BodyKind::Sheet) {
            return Err(ReconcileError::BadTopology { body, kind });
        }
        kinds.push(kind);
        for edge in 0..kernel.edge_count(body)? {
            map.insert((body, edge), (body, edge));
        }
    }

    let of_kind = |k: BodyKind| {
        kinds
            .iter()
            .enumerate()
            .filter(move |(_, kind)| **kind == k)
            .map(|(b, _)| b)
            .collect::<Vec<_>>()
    };
    let sheets = of_kind(BodyKind::Sheet);
    let solids = of_kind(BodyKind::Solid);

    let mut matched = 0usize;
    for &sheet in &sheets {
        for &solid in &solids {
            for se in 0..kernel.edge_count(sheet)? {
                let sheet_edge = EntityRef::edge(sheet, se);
                if map[&(sheet, se)] != (sheet, se) || kernel.edge_is_degenerate(sheet_edge)? {
                    continue;
                }
                let sheet_nodes = kernel.edge_nodes(sheet_edge)?;
                for de in 0..kernel.edge_count(solid)? {
                    let solid_edge = EntityRef::edge(solid, de);
                    if kernel.edge_is_degenerate(solid_edge)? || !kernel.same_geometry(sheet_edge, solid_edge)? {
                        continue;
                    }
                    let solid_nodes = kernel.edge_nodes(solid_edge)?;
                    if nodes_match(kernel, (sheet, sheet_nodes), (solid, solid_nodes))? {
                        debug!(sheet, sheet_edge = se, solid, solid_edge = de, "edges aliased");
                        map.insert((sheet, se), (solid, de));
                        map.insert((solid, de), (sheet, se));
                        matched += 1;
                        break;
                    }
                }
            }
        }
    }

    info!(bodies = kinds.len(), matched, "edge equivalence resolved");
    Ok(EdgeAliases { map, kinds })
}
