// src/lib.rs
//! Physics core of the interactive 3D portfolio world.
//!
//! A Rapier simulation drives the player ball, bricks and static scenery; every
//! frame [`PhysicsWorld::step`] advances it and copies body transforms onto the
//! scene objects they belong to.

pub mod body;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod registry;
pub mod scene;
pub mod time;
pub mod world;

pub use body::{BodyFactory, BodyHandle, BodyInfo, BodyMaterial, CollisionFlags, RigidBodyDesc, ShapeParams, ShapeSpec};
pub use bridge::TransformBridge;
pub use commands::{CommandQueue, CommandSender, PhysicsCommand};
pub use config::{ActivationPolicy, PhysicsConfig, WorldConfig};
pub use controller::{BallController, MoveDirection};
pub use error::{Error, Result};
pub use layout::ObjectDescriptor;
pub use lifecycle::{spawn_object, LifecycleState, Respawnable};
pub use registry::BodyRegistry;
pub use scene::{ObjectId, Pose, Scene, SceneGraph, SceneObject, VisualObject};
pub use world::{PhysicsWorld, StepStats};
