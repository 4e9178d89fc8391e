// src/registry.rs
//! Ordered mapping of tracked visual objects to their bodies.
//!
//! Dense `Vec` for cache-friendly iteration during the sync pass, with a
//! `HashMap` index for O(1) lookups. Insertion order is kept stable so runs
//! are reproducible.

use std::collections::HashMap;

use crate::body::{BodyHandle, BodyInfo};
use crate::scene::ObjectId;

const DEFAULT_REGISTRY_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryEntry {
    pub object: ObjectId,
    pub body: BodyHandle,
    pub info: BodyInfo,
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    entries: Vec<RegistryEntry>,
    /// Position of each object's entry in `entries`.
    by_object: HashMap<ObjectId, usize>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(DEFAULT_REGISTRY_CAPACITY),
            by_object: HashMap::with_capacity(DEFAULT_REGISTRY_CAPACITY),
        }
    }

    /// Track `object`. Returns the body it was previously paired with, if any;
    /// that entry is replaced in place.
    pub fn insert(&mut self, object: ObjectId, body: BodyHandle, info: BodyInfo) -> Option<BodyHandle> {
        let entry = RegistryEntry { object, body, info };
        match self.by_object.get(&object) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], entry).body),
            None => {
                self.by_object.insert(object, self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Erase the entry for `object`, preserving the order of the rest.
    pub fn remove(&mut self, object: ObjectId) -> Option<RegistryEntry> {
        let idx = self.by_object.remove(&object)?;
        let removed = self.entries.remove(idx);
        for entry in &self.entries[idx..] {
            if let Some(slot) = self.by_object.get_mut(&entry.object) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, object: ObjectId) -> Option<BodyHandle> {
        self.by_object.get(&object).map(|&idx| self.entries[idx].body)
    }

    /// Linear scan over the entries.
    pub fn info_for_body(&self, body: BodyHandle) -> Option<&BodyInfo> {
        self.entries.iter().find(|e| e.body == body).map(|e| &e.info)
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.by_object.contains_key(&object)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegistryEntry> {
        self.entries.iter()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, RegistryEntry> {
        self.by_object.clear();
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyFactory, BodyMaterial, ShapeSpec};
    use crate::scene::{Pose, Scene};
    use rapier3d::prelude::RigidBodyHandle;

    fn info() -> BodyInfo {
        *BodyFactory::default()
            .create(Pose::default(), ShapeSpec::Sphere { radius: 1.0 }, 1.0, &BodyMaterial::default())
            .unwrap()
            .info()
    }

    fn handle(i: u32) -> BodyHandle {
        BodyHandle(RigidBodyHandle::from_raw_parts(i, 0))
    }

    #[test]
    fn removal_preserves_insertion_order() {
        let mut scene = Scene::new();
        let ids: Vec<_> = (0..4).map(|i| scene.spawn(format!("o{i}"), Pose::default())).collect();
        let mut registry = BodyRegistry::new();
        for (i, id) in ids.iter().enumerate() {
            assert!(registry.insert(*id, handle(i as u32), info()).is_none());
        }

        let removed = registry.remove(ids[1]).unwrap();
        assert_eq!(removed.body, handle(1));
        assert!(registry.remove(ids[1]).is_none());

        let order: Vec<_> = registry.iter().map(|e| e.object).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
        assert_eq!(registry.len(), 3);

        // Lookups behind the removed entry still resolve to the right body.
        assert_eq!(registry.get(ids[3]), Some(handle(3)));
        assert_eq!(registry.remove(ids[3]).map(|e| e.body), Some(handle(3)));
        assert_eq!(registry.get(ids[2]), Some(handle(2)));
        assert_eq!(registry.info_for_body(handle(0)).map(|i| i.mass), Some(1.0));
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut scene = Scene::new();
        let a = scene.spawn("a", Pose::default());
        let b = scene.spawn("b", Pose::default());
        let mut registry = BodyRegistry::new();
        registry.insert(a, handle(0), info());
        registry.insert(b, handle(1), info());

        assert_eq!(registry.insert(a, handle(7), info()), Some(handle(0)));
        assert_eq!(registry.get(a), Some(handle(7)));
        assert_eq!(registry.iter().next().map(|e| e.body), Some(handle(7)));
        assert_eq!(registry.len(), 2);
    }
}
