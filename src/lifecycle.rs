// src/lifecycle.rs
//! Creation and respawning of visual + physics object pairs.

use crate::body::BodyFactory;
use crate::layout::ObjectDescriptor;
use crate::scene::{ObjectId, Scene, SceneGraph};
use crate::world::PhysicsWorld;
use crate::Result;

/// Create the visual object for `desc`, build its body and register it.
///
/// On any error the visual object is removed again, so a failed spawn leaves
/// neither a half-registered pair nor an orphaned object behind.
pub fn spawn_object(
    world: &mut PhysicsWorld,
    scene: &mut Scene,
    factory: &BodyFactory,
    desc: &ObjectDescriptor,
) -> Result<ObjectId> {
    let body = factory
        .create_from_params(desc.pose, desc.shape, desc.mass, &desc.material)
        .map_err(|e| e.context(format!("building body for `{}`", desc.name)))?;

    let id = scene.spawn(desc.name.clone(), desc.pose);
    let registered = match scene.object_mut(id) {
        Some(obj) => world.add_rigid_body(obj, body),
        None => Ok(None),
    };
    if let Err(e) = registered {
        scene.remove(id);
        return Err(e.context(format!("registering `{}`", desc.name)));
    }
    Ok(id)
}

/// Spawn every descriptor, stopping at the first failure.
pub fn spawn_all<'a>(
    world: &mut PhysicsWorld,
    scene: &mut Scene,
    factory: &BodyFactory,
    descs: impl IntoIterator<Item = &'a ObjectDescriptor>,
) -> Result<Vec<ObjectId>> {
    descs
        .into_iter()
        .map(|desc| spawn_object(world, scene, factory, desc))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active(ObjectId),
    Removed,
}

/// An object that is torn down and recreated at its spawn pose when it falls
/// below a height threshold (the player ball).
#[derive(Debug, Clone)]
pub struct Respawnable {
    descriptor: ObjectDescriptor,
    fall_threshold: f32,
    state: LifecycleState,
    respawns: u32,
}

impl Respawnable {
    /// Spawn the first instance.
    pub fn spawn(
        world: &mut PhysicsWorld,
        scene: &mut Scene,
        factory: &BodyFactory,
        descriptor: ObjectDescriptor,
        fall_threshold: f32,
    ) -> Result<Self> {
        let id = spawn_object(world, scene, factory, &descriptor)?;
        Ok(Self {
            descriptor,
            fall_threshold,
            state: LifecycleState::Active(id),
            respawns: 0,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Id of the live instance, if any.
    pub fn current(&self) -> Option<ObjectId> {
        match self.state {
            LifecycleState::Active(id) => Some(id),
            LifecycleState::Removed => None,
        }
    }

    pub fn respawns(&self) -> u32 {
        self.respawns
    }

    pub fn fall_threshold(&self) -> f32 {
        self.fall_threshold
    }

    /// Per-frame check, run after `step`. Returns the new id when a respawn happened.
    pub fn update(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut Scene,
        factory: &BodyFactory,
    ) -> Result<Option<ObjectId>> {
        let fallen = match self.state {
            LifecycleState::Active(id) => scene
                .object(id)
                .map_or(true, |obj| obj.position.y < self.fall_threshold),
            LifecycleState::Removed => true,
        };
        if !fallen {
            return Ok(None);
        }
        self.respawn(world, scene, factory).map(Some)
    }

    /// Remove the current instance (if any) and create a fresh one.
    pub fn respawn(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut Scene,
        factory: &BodyFactory,
    ) -> Result<ObjectId> {
        if let LifecycleState::Active(old) = self.state {
            world.remove_object(scene, old);
            scene.remove(old);
            self.state = LifecycleState::Removed;
        }
        let id = spawn_object(world, scene, factory, &self.descriptor)?;
        self.state = LifecycleState::Active(id);
        self.respawns += 1;
        log::info!("respawned `{}` as {id:?} (respawn #{})", self.descriptor.name, self.respawns);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ShapeParams;
    use crate::scene::{Pose, VisualObject};
    use crate::Error;
    use glam::Vec3;

    fn world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.initialize_default().unwrap();
        world
    }

    #[test]
    fn failed_spawn_leaves_no_object_behind() {
        let mut world = world();
        let mut scene = Scene::new();
        let factory = *world.factory();
        let bad = ObjectDescriptor::new("ghost", Pose::default(), ShapeParams::default(), 1.0);

        let err = spawn_object(&mut world, &mut scene, &factory, &bad).unwrap_err();
        assert!(err.is_construction());
        assert!(scene.is_empty());
        assert!(world.is_empty());
    }

    #[test]
    fn registration_failure_removes_the_visual_object() {
        let mut world = PhysicsWorld::new();
        let mut scene = Scene::new();
        let factory = *world.factory();
        let desc = ObjectDescriptor::new("ball", Pose::default(), ShapeParams::sphere(1.0), 1.0);

        let err = spawn_object(&mut world, &mut scene, &factory, &desc).unwrap_err();
        assert!(matches!(err, Error::WithContext { ref source, .. } if matches!(**source, Error::NotInitialized)));
        assert!(scene.is_empty());
    }

    #[test]
    fn falling_below_threshold_respawns_at_spawn_pose() {
        let mut world = world();
        let mut scene = Scene::new();
        let factory = *world.factory();
        let spawn = Pose::from_position(Vec3::new(0.0, 10.0, 0.0));
        let desc = ObjectDescriptor::new("ball", spawn, ShapeParams::sphere(2.0), 3.0);
        let mut ball = Respawnable::spawn(&mut world, &mut scene, &factory, desc, -5.0).unwrap();
        let first = ball.current().unwrap();

        // No ground: free fall until the threshold is crossed.
        let mut respawned = None;
        for _ in 0..120 {
            world.step(&mut scene, 1.0 / 60.0);
            if let Some(id) = ball.update(&mut world, &mut scene, &factory).unwrap() {
                respawned = Some(id);
                break;
            }
        }

        let second = respawned.expect("ball never fell below the threshold");
        assert_ne!(first, second);
        assert!(!scene.contains(first));
        assert!(!world.contains(first));
        assert_eq!(world.len(), 1);
        assert_eq!(ball.respawns(), 1);

        let obj = scene.object(second).unwrap();
        assert_eq!(obj.position, spawn.position);
        assert!(obj.physics_body().is_some());
    }
}
