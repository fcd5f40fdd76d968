//! Name to integer boundary-tag registry.

use std::collections::HashMap;

use cad_kernel::CadKernel;
use mesh_types::{EntityKind, EntityRef};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Boundary names with stable 1-based integer IDs in insertion order.
/// Serializes as the plain list of names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AttributeIndexMap {
    names: Vec<String>,
    ids: HashMap<String, i32>,
}

impl From<Vec<String>> for AttributeIndexMap {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<AttributeIndexMap> for Vec<String> {
    fn from(map: AttributeIndexMap) -> Self {
        map.names
    }
}

impl AttributeIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its ID. Existing names keep their ID.
    pub fn insert(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        self.names.push(name.to_string());
        let id = self.names.len() as i32;
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i as i32 + 1, n.as_str()))
    }

    /// Registry of every boundary name on every face, edge and node of the
    /// model, in body then face/edge/node order.
    pub fn from_kernel<K: CadKernel + ?Sized>(kernel: &K) -> Result<Self> {
        let mut map = Self::new();
        for body in 0..kernel.body_count() {
            for kind in [EntityKind::Face, EntityKind::Edge, EntityKind::Node] {
                for index in 0..kernel.entity_count(body, kind)? {
                    if let Some(name) = kernel.boundary_name(EntityRef::new(kind, body, index))? {
                        map.insert(name);
                    }
                }
            }
        }
        debug!(names = map.len(), "boundary registry built");
        Ok(map)
    }
}

impl<S: AsRef<str>> FromIterator<S> for AttributeIndexMap {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut map = Self::new();
        for name in iter {
            map.insert(name.as_ref());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_kernel::topology::primitives::{make_box, make_plate};
    use cad_kernel::{BrepModel, Point3d, Vec3};

    #[test]
    fn ids_are_one_based_and_stable() {
        let mut map = AttributeIndexMap::new();
        assert_eq!(map.insert("inlet"), 1);
        assert_eq!(map.insert("wall"), 2);
        assert_eq!(map.insert("inlet"), 1);
        assert_eq!(map.lookup("wall"), Some(2));
        assert_eq!(map.lookup("outlet"), None);
        assert_eq!(map.name(2), Some("wall"));
        assert_eq!(map.name(0), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn from_kernel_collects_face_names_first() {
        let model = BrepModel::with_bodies(vec![
            make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0)),
            make_plate(Point3d::new(1.0, 0.0, 0.0), Vec3::X, Vec3::Y, "wake"),
        ]);
        let map = AttributeIndexMap::from_kernel(&model).unwrap();
        let names: Vec<&str> = map.iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["xmin", "xmax", "ymin", "ymax", "zmin", "zmax", "box_edge", "wake"]);
    }

    #[test]
    fn lookup_survives_serde() {
        let map: AttributeIndexMap = ["farfield", "wing"].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"["farfield","wing"]"#);
        let back: AttributeIndexMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lookup("wing"), Some(2));
        assert_eq!(back, map);
    }
}
