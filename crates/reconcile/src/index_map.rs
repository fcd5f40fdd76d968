//! Tessellation-global vertex index to generator vertex ID.

use cad_tessellation::Tessellation;
use mesh_types::GeneratorId;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ReconcileError, Result};

/// Dense map from 1-based global vertex index to generator vertex ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMap {
    ids: Vec<GeneratorId>,
}

impl IndexMap {
    /// Generator ID of global vertex `global` (1-based).
    pub fn generator_id(&self, global: usize) -> Option<GeneratorId> {
        global.checked_sub(1).and_then(|i| self.ids.get(i)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(global index, generator ID)` pairs in global order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, GeneratorId)> + '_ {
        self.ids.iter().enumerate().map(|(i, &id)| (i + 1, id))
    }

    pub fn as_slice(&self) -> &[GeneratorId] {
        &self.ids
    }
}

/// Resolve every stored face point of a finalized tessellation to its global
/// index and record the generator ID it came from. `face_ids[f][k]` is the
/// generator ID of stored point `k` of face `f`.
#[instrument(skip_all)]
pub fn build_index_map(tess: &Tessellation, face_ids: &[Vec<GeneratorId>]) -> Result<IndexMap> {
    let n = tess
        .point_count()
        .ok_or_else(|| ReconcileError::inconsistent("index map requested before finalize"))?;
    let mut slots: Vec<Option<GeneratorId>> = vec![None; n];

    for (f, ids) in face_ids.iter().enumerate() {
        for (local, &id) in ids.iter().enumerate() {
            let global = tess
                .global_index_of_face_point(f, local)
                .map_err(|e| ReconcileError::inconsistent(e.to_string()))?;
            let slot = global
                .checked_sub(1)
                .and_then(|i| slots.get_mut(i))
                .ok_or_else(|| ReconcileError::inconsistent(format!("global index {global} past {n}")))?;
            match *slot {
                Some(prev) if prev != id => {
                    return Err(ReconcileError::inconsistent(format!(
                        "global vertex {global} maps to generator vertices {prev} and {id}"
                    )));
                }
                _ => *slot = Some(id),
            }
        }
    }

    let ids = slots
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            id.ok_or_else(|| ReconcileError::inconsistent(format!("global vertex {} lies on no face", i + 1)))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(points = ids.len(), "index map built");
    Ok(IndexMap { ids })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_one_based() {
        let map = IndexMap { ids: vec![7, 3, 9] };
        assert_eq!(map.generator_id(1), Some(7));
        assert_eq!(map.generator_id(3), Some(9));
        assert_eq!(map.generator_id(0), None);
        assert_eq!(map.generator_id(4), None);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(1, 7), (2, 3), (3, 9)]);
    }
}
