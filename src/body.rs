// src/body.rs
//! Rigid body factory.
//!
//! Turns declarative object parameters (pose, shape, mass, material) into a
//! [`RigidBodyDesc`]: a Rapier body + collider pair that is fully built but not
//! yet part of any world. Registering it is the caller's job
//! (`PhysicsWorld::add_rigid_body`).
//!
//! Mass decides everything about mobility: `0` builds a fixed body carrying
//! [`CollisionFlags::STATIC_OBJECT`], anything above builds a dynamic body whose
//! inertia Rapier derives from the collider shape.

use glam::Vec3;
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ActivationPolicy, PhysicsConfig, STATIC_COLLISION_FLAG};
use crate::scene::Pose;
use crate::{Error, Result};

/// Handle to a body registered in a `PhysicsWorld`.
///
/// Visual objects store this as a non-owning back-reference; the world owns the body.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

impl BodyHandle {
    pub fn raw(self) -> RigidBodyHandle {
        self.0
    }
}

bitflags::bitflags! {
    /// Collision flags recorded per body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionFlags: u32 {
        const STATIC_OBJECT = STATIC_COLLISION_FLAG;
    }
}

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl ShapeSpec {
    /// Box from full dimensions (the way meshes are sized).
    pub fn box_from_size(size: Vec3) -> Self {
        ShapeSpec::Box { half_extents: size * 0.5 }
    }

    fn validate(&self, margin: f32) -> Result<()> {
        match *self {
            ShapeSpec::Sphere { radius } => {
                if !(radius > 0.0 && radius.is_finite()) {
                    return Err(Error::invalid_shape(format!("sphere radius {radius}")));
                }
            }
            ShapeSpec::Box { half_extents: he } => {
                if !(he.is_finite() && he.min_element() > 0.0) {
                    return Err(Error::invalid_shape(format!("box half-extents {he}")));
                }
                if margin > 0.0 && he.min_element() <= margin {
                    return Err(Error::invalid_shape(format!(
                        "box half-extents {he} do not exceed collision margin {margin}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Loosely-typed shape input as it appears in object descriptors.
///
/// Exactly one of `radius`, `half_extents` or `size` may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    pub radius: Option<f32>,
    pub half_extents: Option<Vec3>,
    /// Full box dimensions; halved on conversion.
    pub size: Option<Vec3>,
}

impl ShapeParams {
    pub fn sphere(radius: f32) -> Self {
        Self { radius: Some(radius), ..Self::default() }
    }

    pub fn cuboid(size: Vec3) -> Self {
        Self { size: Some(size), ..Self::default() }
    }
}

impl TryFrom<ShapeParams> for ShapeSpec {
    type Error = Error;

    fn try_from(params: ShapeParams) -> Result<Self> {
        match (params.radius, params.half_extents, params.size) {
            (Some(radius), None, None) => Ok(ShapeSpec::Sphere { radius }),
            (None, Some(half_extents), None) => Ok(ShapeSpec::Box { half_extents }),
            (None, None, Some(size)) => Ok(ShapeSpec::box_from_size(size)),
            (None, None, None) => Err(Error::MissingShape),
            _ => Err(Error::AmbiguousShape),
        }
    }
}

/// Surface parameters. Unset values fall back to the engine or factory defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyMaterial {
    pub friction: Option<f32>,
    pub rolling_friction: Option<f32>,
    /// 0 = no bounce, 1 = perfectly elastic. Above 1 is accepted.
    pub restitution: Option<f32>,
    pub margin: Option<f32>,
}

impl BodyMaterial {
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn with_rolling_friction(mut self, rolling_friction: f32) -> Self {
        self.rolling_friction = Some(rolling_friction);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = Some(margin);
        self
    }
}

/// What the world remembers about a body besides the Rapier state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyInfo {
    pub shape: ShapeSpec,
    pub mass: f32,
    pub flags: CollisionFlags,
    pub activation: ActivationPolicy,
    pub margin: f32,
    pub initial_pose: Pose,
}

impl BodyInfo {
    pub fn is_static(&self) -> bool {
        self.flags.contains(CollisionFlags::STATIC_OBJECT)
    }
}

/// A built, unregistered body.
#[derive(Clone)]
pub struct RigidBodyDesc {
    pub(crate) body: RigidBody,
    pub(crate) collider: Collider,
    pub(crate) info: BodyInfo,
}

impl RigidBodyDesc {
    pub fn info(&self) -> &BodyInfo {
        &self.info
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn collider(&self) -> &Collider {
        &self.collider
    }
}

impl std::fmt::Debug for RigidBodyDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigidBodyDesc").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Builds bodies with the world's margin and activation defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFactory {
    pub default_margin: f32,
    pub activation: ActivationPolicy,
}

impl Default for BodyFactory {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl BodyFactory {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            default_margin: config.collision_margin,
            activation: config.activation,
        }
    }

    /// Same as [`BodyFactory::create`] but resolves loosely-typed shape input first.
    pub fn create_from_params(
        &self,
        pose: Pose,
        shape: ShapeParams,
        mass: f32,
        material: &BodyMaterial,
    ) -> Result<RigidBodyDesc> {
        self.create(pose, ShapeSpec::try_from(shape)?, mass, material)
    }

    pub fn create(
        &self,
        pose: Pose,
        shape: ShapeSpec,
        mass: f32,
        material: &BodyMaterial,
    ) -> Result<RigidBodyDesc> {
        if !pose.is_finite() {
            return Err(Error::InvalidParameter { name: "pose", value: f32::NAN });
        }
        if !(mass >= 0.0 && mass.is_finite()) {
            return Err(Error::InvalidParameter { name: "mass", value: mass });
        }
        let margin = material.margin.unwrap_or(self.default_margin);
        check_non_negative("margin", Some(margin))?;
        check_non_negative("friction", material.friction)?;
        check_non_negative("rolling_friction", material.rolling_friction)?;
        check_non_negative("restitution", material.restitution)?;
        if let Some(r) = material.restitution.filter(|r| *r > 1.0) {
            log::warn!("restitution {r} > 1 produces energy-gaining collisions");
        }
        shape.validate(margin)?;

        let dynamic = mass > 0.0;
        let flags = if dynamic {
            CollisionFlags::empty()
        } else {
            CollisionFlags::STATIC_OBJECT
        };

        let builder = if dynamic {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let mut builder = builder
            .position(to_isometry(&pose))
            .can_sleep(self.activation == ActivationPolicy::AllowSleep);
        if let Some(rolling) = material.rolling_friction {
            builder = builder.angular_damping(rolling);
        }
        let body = builder.build();

        let mut collider = match shape {
            ShapeSpec::Sphere { radius } => ColliderBuilder::ball(radius),
            ShapeSpec::Box { half_extents: he } if margin > 0.0 => {
                // Outer extents stay at `he`; the margin becomes the rounded border.
                ColliderBuilder::round_cuboid(he.x - margin, he.y - margin, he.z - margin, margin)
            }
            ShapeSpec::Box { half_extents: he } => ColliderBuilder::cuboid(he.x, he.y, he.z),
        };
        if dynamic {
            collider = collider.mass(mass);
        }
        if let Some(friction) = material.friction {
            collider = collider.friction(friction);
        }
        if let Some(restitution) = material.restitution {
            collider = collider.restitution(restitution);
        }

        Ok(RigidBodyDesc {
            body,
            collider: collider.build(),
            info: BodyInfo {
                shape,
                mass,
                flags,
                activation: self.activation,
                margin,
                initial_pose: pose,
            },
        })
    }
}

fn check_non_negative(name: &'static str, value: Option<f32>) -> Result<()> {
    match value {
        Some(v) if !(v >= 0.0 && v.is_finite()) => Err(Error::InvalidParameter { name, value: v }),
        _ => Ok(()),
    }
}

pub(crate) fn to_isometry(pose: &Pose) -> Isometry3<Real> {
    let p = pose.position;
    let q = pose.rotation;
    Isometry3::from_parts(
        Translation3::new(p.x, p.y, p.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}
