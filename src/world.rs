// src/world.rs
//!
//! Physics world: owns the Rapier simulation, tracks which visual object each
//! body drives, and mirrors body transforms onto those objects every step.
//!
//! ## Lifecycle
//! - [`PhysicsWorld::new`] builds an *uninitialized* world; nothing simulates
//!   until [`PhysicsWorld::initialize`] constructs the pipeline.
//! - Bodies come from [`BodyFactory`](crate::body::BodyFactory) and are handed
//!   over with [`PhysicsWorld::add_rigid_body`]; the world owns them from then on
//!   and the visual object keeps a non-owning [`BodyHandle`].
//! - [`PhysicsWorld::remove_rigid_body`] detaches the body from the simulation,
//!   erases the registry entry and clears the back-reference, in that order.
//!
//! ## Usage
//! ```rust,no_run
//! use folio_physics::{BodyMaterial, PhysicsWorld, Pose, Scene, SceneGraph, ShapeSpec};
//! use glam::Vec3;
//!
//! let mut scene = Scene::new();
//! let mut world = PhysicsWorld::new();
//! world.initialize(Vec3::new(0.0, -50.0, 0.0))?;
//!
//! let pose = Pose::from_position(Vec3::new(0.0, 10.0, 0.0));
//! let ball = scene.spawn("ball", pose);
//! let body = world.factory().create(pose, ShapeSpec::Sphere { radius: 2.0 }, 3.0, &BodyMaterial::default())?;
//! if let Some(obj) = scene.object_mut(ball) {
//!     world.add_rigid_body(obj, body)?;
//! }
//!
//! world.step(&mut scene, 1.0 / 60.0);
//! # Ok::<(), folio_physics::Error>(())
//! ```

use glam::Vec3;
use rapier3d::prelude::*;

use crate::body::{BodyFactory, BodyHandle, BodyInfo, CollisionFlags, RigidBodyDesc};
use crate::bridge::TransformBridge;
use crate::config::PhysicsConfig;
use crate::registry::{BodyRegistry, RegistryEntry};
use crate::scene::{ObjectId, SceneGraph, VisualObject};
use crate::time::FixedTimestep;
use crate::{Error, Result};

/// Outcome of one `step()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Simulation sub-steps that ran.
    pub substeps: u32,
    /// Objects whose transform was written.
    pub synced: usize,
    /// Registry entries left untouched this frame.
    pub skipped: usize,
}

/// Rapier state built by `initialize`.
///
/// Fields drop in declaration order: bodies and joints first, then the
/// pipeline structures in reverse construction order.
struct Simulation {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    pipeline: PhysicsPipeline,
    query_pipeline: QueryPipeline,
    ccd_solver: CCDSolver,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    integration_parameters: IntegrationParameters,
}

impl Simulation {
    fn new(fixed_dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: fixed_dt,
            ..IntegrationParameters::default()
        };
        let narrow_phase = NarrowPhase::new();
        let broad_phase = BroadPhase::new();
        let islands = IslandManager::new();
        let ccd_solver = CCDSolver::new();
        let query_pipeline = QueryPipeline::new();
        let pipeline = PhysicsPipeline::new();

        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            pipeline,
            query_pipeline,
            ccd_solver,
            islands,
            broad_phase,
            narrow_phase,
            integration_parameters,
        }
    }

    fn step(&mut self, gravity: &Vector<Real>, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn insert(&mut self, desc: RigidBodyDesc) -> BodyHandle {
        let handle = self.bodies.insert(desc.body);
        self.colliders.insert_with_parent(desc.collider, handle, &mut self.bodies);
        BodyHandle(handle)
    }

    fn detach(&mut self, body: BodyHandle) -> Option<RigidBody> {
        self.bodies.remove(
            body.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )
    }
}

/// Body transform, if it is usable this frame.
#[inline]
fn motion_state(body: &RigidBody) -> Option<&Isometry<Real>> {
    let pos = body.position();
    let finite = pos.translation.vector.iter().all(|v| v.is_finite())
        && pos.rotation.coords.iter().all(|v| v.is_finite());
    finite.then_some(pos)
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub struct PhysicsWorld {
    registry: BodyRegistry,
    simulation: Option<Simulation>,
    gravity: Vector<Real>,
    bridge: TransformBridge,
    timestep: FixedTimestep,
    factory: BodyFactory,
    config: PhysicsConfig,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Uninitialized world with default configuration.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Uninitialized world; `config.gravity` is what `initialize_default` uses.
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            registry: BodyRegistry::new(),
            simulation: None,
            gravity: to_vector(config.gravity),
            bridge: TransformBridge::new(),
            timestep: FixedTimestep::new(config.fixed_timestep),
            factory: BodyFactory::new(&config),
            config,
        }
    }

    /// Build the simulation pipeline and set gravity.
    ///
    /// Succeeds from a clean state (also when already initialized but empty,
    /// which rebuilds the pipeline). Fails if any body is still registered or
    /// the configuration cannot be simulated.
    pub fn initialize(&mut self, gravity: Vec3) -> Result<()> {
        if !self.registry.is_empty() {
            return Err(Error::AlreadyInitialized { bodies: self.registry.len() });
        }
        self.config.validate()?;
        if !gravity.is_finite() {
            return Err(Error::InvalidParameter { name: "gravity", value: gravity.length() });
        }
        self.simulation = Some(Simulation::new(self.config.fixed_timestep));
        self.gravity = to_vector(gravity);
        self.timestep.reset();
        log::info!("Physics world initialized (gravity {gravity})");
        Ok(())
    }

    /// `initialize` with the configured gravity.
    pub fn initialize_default(&mut self) -> Result<()> {
        self.initialize(self.config.gravity)
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Factory carrying this world's margin and activation defaults.
    pub fn factory(&self) -> &BodyFactory {
        &self.factory
    }

    pub fn gravity(&self) -> Vec3 {
        to_vec3(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    // -------------------------------------------------------------------------
    // Body Management
    // -------------------------------------------------------------------------

    /// Hand `body` to the simulation and pair it with `obj`.
    ///
    /// `None` is a no-op (`Ok(None)`). If `obj` already drives a body, that body
    /// is detached first.
    pub fn add_rigid_body<O>(
        &mut self,
        obj: &mut O,
        body: impl Into<Option<RigidBodyDesc>>,
    ) -> Result<Option<BodyHandle>>
    where
        O: VisualObject + ?Sized,
    {
        let Some(desc) = body.into() else {
            log::debug!("add_rigid_body({:?}): no body supplied, ignoring", obj.id());
            return Ok(None);
        };
        let sim = self.simulation.as_mut().ok_or(Error::NotInitialized)?;

        let id = obj.id();
        if let Some(previous) = self.registry.get(id) {
            log::debug!("{id:?} already tracked, detaching previous body {previous:?}");
            sim.detach(previous);
        }

        let info = desc.info;
        let handle = sim.insert(desc);
        self.registry.insert(id, handle, info);
        obj.set_physics_body(Some(handle));
        log::debug!("registered {id:?} -> {handle:?} (mass {}, flags {:?})", info.mass, info.flags);
        Ok(Some(handle))
    }

    /// Untrack `obj`. Returns whether anything was removed; never an error.
    pub fn remove_rigid_body<O>(&mut self, obj: &mut O) -> bool
    where
        O: VisualObject + ?Sized,
    {
        let removed = self.unregister(obj.id()).is_some();
        if removed {
            obj.set_physics_body(None);
        }
        removed
    }

    /// Untrack by id, clearing the back-reference if the object still exists.
    pub fn remove_object<S: SceneGraph>(&mut self, scene: &mut S, id: ObjectId) -> bool {
        match scene.object_mut(id) {
            Some(obj) => self.remove_rigid_body(obj),
            None => self.unregister(id).is_some(),
        }
    }

    fn unregister(&mut self, id: ObjectId) -> Option<RegistryEntry> {
        let body = self.registry.get(id)?;
        if let Some(sim) = self.simulation.as_mut() {
            sim.detach(body);
        }
        let entry = self.registry.remove(id);
        log::debug!("unregistered {id:?} (body {body:?})");
        entry
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advance by `dt` seconds using the configured sub-step cap, then sync.
    pub fn step<S: SceneGraph>(&mut self, scene: &mut S, dt: f32) -> StepStats {
        self.step_with(scene, dt, self.config.max_sub_steps)
    }

    /// Advance by `dt` in at most `max_sub_steps` fixed sub-steps, then copy every
    /// tracked body's transform onto its visual object.
    ///
    /// No-op on an uninitialized world. Never fails: entries whose body or
    /// object is unavailable are skipped.
    pub fn step_with<S: SceneGraph>(&mut self, scene: &mut S, dt: f32, max_sub_steps: u32) -> StepStats {
        let Some(sim) = self.simulation.as_mut() else {
            return StepStats::default();
        };

        let plan = self.timestep.advance(dt, max_sub_steps);
        for _ in 0..plan.substeps {
            sim.step(&self.gravity, plan.dt);
        }

        let mut stats = StepStats { substeps: plan.substeps, ..StepStats::default() };
        for entry in self.registry.iter() {
            let Some(body) = sim.bodies.get(entry.body.0) else {
                log::debug!("sync: body {:?} of {:?} is gone, skipping", entry.body, entry.object);
                stats.skipped += 1;
                continue;
            };
            if motion_state(body).is_none() {
                log::debug!("sync: body {:?} has no valid transform yet, skipping", entry.body);
                stats.skipped += 1;
                continue;
            }
            let Some(obj) = scene.object_mut(entry.object) else {
                log::debug!("sync: object {:?} not in scene, skipping", entry.object);
                stats.skipped += 1;
                continue;
            };
            self.bridge.sync(obj, body);
            stats.synced += 1;
        }
        stats
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.registry.contains(id)
    }

    pub fn body_of(&self, id: ObjectId) -> Option<BodyHandle> {
        self.registry.get(id)
    }

    /// Tracked (object, body) pairs in insertion order.
    pub fn tracked(&self) -> impl Iterator<Item = (ObjectId, BodyHandle)> + '_ {
        self.registry.iter().map(|e| (e.object, e.body))
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.simulation.as_ref()?.bodies.get(handle.0)
    }

    pub fn body_info(&self, handle: BodyHandle) -> Option<&BodyInfo> {
        self.registry.info_for_body(handle)
    }

    pub fn body_flags(&self, handle: BodyHandle) -> Option<CollisionFlags> {
        self.body_info(handle).map(|info| info.flags)
    }

    pub fn body_position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| to_vec3(b.translation()))
    }

    // -------------------------------------------------------------------------
    // Velocity and Impulse APIs
    // -------------------------------------------------------------------------

    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| to_vec3(b.linvel()))
    }

    /// Overwrite a body's linear velocity. Returns false for unknown handles
    /// and non-finite velocities.
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        if !velocity.is_finite() {
            log::warn!("rejecting non-finite velocity {velocity} for {handle:?}");
            return false;
        }
        match self.body_mut(handle) {
            Some(body) => {
                body.set_linvel(to_vector(velocity), true);
                true
            }
            None => false,
        }
    }

    /// Apply an instantaneous impulse. Returns false for unknown handles and
    /// non-finite impulses.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        if !impulse.is_finite() {
            log::warn!("rejecting non-finite impulse {impulse} for {handle:?}");
            return false;
        }
        match self.body_mut(handle) {
            Some(body) => {
                body.apply_impulse(to_vector(impulse), true);
                true
            }
            None => false,
        }
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.simulation.as_mut()?.bodies.get_mut(handle.0)
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Release every body (clearing back-references), then the pipeline.
    /// The world is uninitialized afterwards.
    pub fn dispose<S: SceneGraph>(&mut self, scene: &mut S) {
        let mut sim = self.simulation.take();
        let count = self.registry.len();
        for entry in self.registry.drain() {
            if let Some(sim) = sim.as_mut() {
                sim.detach(entry.body);
            }
            if let Some(obj) = scene.object_mut(entry.object) {
                obj.set_physics_body(None);
            }
        }
        drop(sim);
        self.timestep.reset();
        log::info!("Physics world disposed ({count} bodies released)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyMaterial, ShapeSpec};
    use crate::scene::{Pose, Scene};

    fn sphere(world: &PhysicsWorld, y: f32) -> RigidBodyDesc {
        world
            .factory()
            .create(
                Pose::from_position(Vec3::new(0.0, y, 0.0)),
                ShapeSpec::Sphere { radius: 1.0 },
                1.0,
                &BodyMaterial::default(),
            )
            .unwrap()
    }

    fn initialized() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.initialize(Vec3::new(0.0, -9.81, 0.0)).unwrap();
        world
    }

    #[test]
    fn uninitialized_world_steps_as_noop() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        assert!(!world.is_initialized());
        assert_eq!(world.step(&mut scene, 1.0 / 60.0), StepStats::default());
    }

    #[test]
    fn add_before_initialize_fails_without_registering() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = PhysicsWorld::new();
        let desc = sphere(&world, 5.0);
        let err = world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
        assert!(world.is_empty());
        assert!(scene.object(id).unwrap().physics_body().is_none());
    }

    #[test]
    fn initialize_is_idempotent_only_when_empty() {
        let mut scene = Scene::new();
        let mut world = initialized();
        world.initialize(Vec3::new(0.0, -50.0, 0.0)).unwrap();
        assert_eq!(world.gravity(), Vec3::new(0.0, -50.0, 0.0));

        let id = scene.spawn("ball", Pose::default());
        let desc = sphere(&world, 5.0);
        world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap();
        let err = world.initialize(Vec3::ZERO).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized { bodies: 1 }));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn adding_none_is_a_noop() {
        let mut scene = Scene::new();
        let id = scene.spawn("decor", Pose::default());
        let mut world = initialized();
        let added = world.add_rigid_body(scene.object_mut(id).unwrap(), None).unwrap();
        assert!(added.is_none());
        assert!(world.is_empty());
        assert!(scene.object(id).unwrap().physics_body().is_none());
    }

    #[test]
    fn re_adding_replaces_the_previous_body() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = initialized();
        let first_desc = sphere(&world, 5.0);
        let first = world.add_rigid_body(scene.object_mut(id).unwrap(), first_desc).unwrap().unwrap();
        let second_desc = sphere(&world, 8.0);
        let second = world.add_rigid_body(scene.object_mut(id).unwrap(), second_desc).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(world.body(first).is_none());
        assert_eq!(world.len(), 1);
        assert_eq!(scene.object(id).unwrap().physics_body(), Some(second));
    }

    #[test]
    fn remove_object_handles_objects_already_gone_from_the_scene() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = initialized();
        let desc = sphere(&world, 5.0);
        let body = world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap().unwrap();

        scene.remove(id);
        let stats = world.step(&mut scene, 1.0 / 60.0);
        assert_eq!(stats.skipped, 1);

        assert!(world.remove_object(&mut scene, id));
        assert!(world.body(body).is_none());
        assert!(!world.remove_object(&mut scene, id));
    }

    #[test]
    fn velocity_api_reaches_the_body() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = initialized();
        world.set_gravity(Vec3::ZERO);
        let desc = sphere(&world, 0.0);
        let body = world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap().unwrap();

        assert!(world.set_linear_velocity(body, Vec3::new(6.0, 0.0, 0.0)));
        for _ in 0..30 {
            world.step(&mut scene, 1.0 / 60.0);
        }
        let x = scene.object(id).unwrap().position.x;
        assert!((x - 3.0).abs() < 0.1, "x = {x}");
        let v = world.linear_velocity(body).unwrap();
        assert!(v.abs_diff_eq(Vec3::new(6.0, 0.0, 0.0), 1e-3), "v = {v}");
    }

    #[test]
    fn impulse_changes_velocity_by_impulse_over_mass() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = initialized();
        world.set_gravity(Vec3::ZERO);
        let desc = sphere(&world, 0.0);
        let body = world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap().unwrap();
        world.step(&mut scene, 1.0 / 60.0);

        // Unit mass: velocity change equals the impulse.
        assert!(world.apply_impulse(body, Vec3::new(0.0, 0.0, 4.0)));
        let v = world.linear_velocity(body).unwrap();
        assert!((v.z - 4.0).abs() < 1e-3, "v = {v}");

        world.remove_rigid_body(scene.object_mut(id).unwrap());
        assert!(!world.apply_impulse(body, Vec3::X));
    }

    #[test]
    fn unusable_timestep_fails_initialization() {
        for fixed_timestep in [0.0, -1.0 / 60.0, f32::NAN] {
            let config = PhysicsConfig { fixed_timestep, ..PhysicsConfig::default() };
            let mut world = PhysicsWorld::with_config(config);
            let err = world.initialize_default().unwrap_err();
            assert!(
                matches!(err, Error::InvalidParameter { name: "physics.fixed_timestep", .. }),
                "{fixed_timestep} gave {err:?}"
            );
            assert!(!world.is_initialized());
        }
    }

    #[test]
    fn non_finite_velocity_and_impulse_are_rejected() {
        let mut scene = Scene::new();
        let id = scene.spawn("ball", Pose::default());
        let mut world = initialized();
        let desc = sphere(&world, 5.0);
        let body = world.add_rigid_body(scene.object_mut(id).unwrap(), desc).unwrap().unwrap();

        assert!(!world.set_linear_velocity(body, Vec3::new(f32::NAN, 0.0, f32::INFINITY)));
        assert!(!world.apply_impulse(body, Vec3::new(0.0, f32::NEG_INFINITY, 0.0)));
        assert_eq!(world.linear_velocity(body), Some(Vec3::ZERO));

        let stats = world.step(&mut scene, 1.0 / 60.0);
        assert_eq!(stats, StepStats { substeps: 1, synced: 1, skipped: 0 });
        assert!(scene.object(id).unwrap().position.is_finite());
    }

    #[test]
    fn bodies_without_a_valid_transform_are_skipped() {
        let mut scene = Scene::new();
        let mut world = initialized();
        let broken_id = scene.spawn("broken", Pose::default());
        let healthy_id = scene.spawn("healthy", Pose::default());
        let broken_desc = sphere(&world, 5.0);
        let broken = world.add_rigid_body(scene.object_mut(broken_id).unwrap(), broken_desc).unwrap().unwrap();
        // Far from the broken body so the two never interact.
        let healthy_desc = world
            .factory()
            .create(
                Pose::from_position(Vec3::new(500.0, 5.0, 0.0)),
                ShapeSpec::Sphere { radius: 1.0 },
                1.0,
                &BodyMaterial::default(),
            )
            .unwrap();
        world.add_rigid_body(scene.object_mut(healthy_id).unwrap(), healthy_desc).unwrap();

        // Public setters refuse this; corrupt the transform directly.
        world
            .body_mut(broken)
            .unwrap()
            .set_translation(vector![f32::NAN, f32::NAN, f32::NAN], true);

        for _ in 0..3 {
            let stats = world.step(&mut scene, 1.0 / 60.0);
            assert_eq!(stats.synced, 1);
            assert_eq!(stats.skipped, 1);
        }
        assert_eq!(scene.object(broken_id).unwrap().position, Vec3::ZERO);
        let healthy = scene.object(healthy_id).unwrap().position;
        assert_eq!(healthy.x, 500.0);
        assert!(healthy.y < 5.0);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut scene = Scene::new();
        let mut world = initialized();
        let ids: Vec<_> = (0..3).map(|i| scene.spawn(format!("b{i}"), Pose::default())).collect();
        for (i, id) in ids.iter().enumerate() {
            let desc = sphere(&world, 3.0 * i as f32 + 2.0);
            world.add_rigid_body(scene.object_mut(*id).unwrap(), desc).unwrap();
        }

        world.dispose(&mut scene);
        assert!(!world.is_initialized());
        assert!(world.is_empty());
        assert!(scene.iter().all(|o| o.physics_body().is_none()));
        world.initialize_default().unwrap();
    }
}
