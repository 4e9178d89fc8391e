// src/scene.rs
// Render-layer boundary: the minimal scene graph the physics core writes into.
// Objects live in a generational arena so a stale ObjectId never aliases a
// newer object that reused the slot.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::BodyHandle;

/// Object id (index + generation)
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Position + orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// What the physics core needs from a renderable object.
pub trait VisualObject {
    fn id(&self) -> ObjectId;
    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn set_position(&mut self, position: Vec3);
    fn set_orientation(&mut self, orientation: Quat);
    /// Non-owning back-reference to the body simulating this object.
    fn physics_body(&self) -> Option<BodyHandle>;
    fn set_physics_body(&mut self, body: Option<BodyHandle>);
}

/// Id-based access to visual objects, used by the per-frame sync pass.
pub trait SceneGraph {
    type Object: VisualObject;

    fn object(&self, id: ObjectId) -> Option<&Self::Object>;
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut Self::Object>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
    pub visible: bool,
    physics_body: Option<BodyHandle>,
}

impl SceneObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }
}

impl VisualObject for SceneObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    #[inline]
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[inline]
    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    fn physics_body(&self) -> Option<BodyHandle> {
        self.physics_body
    }

    fn set_physics_body(&mut self, body: Option<BodyHandle>) {
        self.physics_body = body;
    }
}

struct Slot {
    generation: u32,
    object: Option<SceneObject>,
}

/// Generational arena of scene objects.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object at `pose` and return its id.
    pub fn spawn(&mut self, name: impl Into<String>, pose: Pose) -> ObjectId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot { generation: 0, object: None });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = ObjectId { index, generation: slot.generation };
        slot.object = Some(SceneObject {
            id,
            name: name.into(),
            position: pose.position,
            orientation: pose.rotation,
            scale: Vec3::ONE,
            visible: true,
            physics_body: None,
        });
        self.len += 1;
        id
    }

    /// Remove an object. The id, and every copy of it, goes stale.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(object)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.slots.iter().filter_map(|s| s.object.as_ref())
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.iter().find(|o| o.name == name)
    }
}

impl SceneGraph for Scene {
    type Object = SceneObject;

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_ref()
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ids_do_not_alias_reused_slots() {
        let mut scene = Scene::new();
        let old = scene.spawn("ball", Pose::from_position(Vec3::Y));
        assert!(scene.remove(old).is_some());

        let new = scene.spawn("ball", Pose::from_position(Vec3::X));
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(scene.object(old).is_none());
        assert!(scene.remove(old).is_none());
        assert_eq!(scene.object(new).unwrap().position, Vec3::X);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn spawned_objects_start_without_a_body() {
        let mut scene = Scene::new();
        let id = scene.spawn("billboard", Pose::default());
        let obj = scene.object(id).unwrap();
        assert_eq!(obj.id(), id);
        assert!(obj.physics_body().is_none());
        assert_eq!(scene.find("billboard").map(|o| o.id()), Some(id));
    }
}
