// src/config.rs
//! Declarative configuration for the physics core and the portfolio gameplay.
//!
//! Every section carries `#[serde(default)]`, so a JSON file only needs the
//! fields it overrides:
//!
//! ```json
//! { "physics": { "gravity": [0.0, -9.81, 0.0] }, "gameplay": { "fall_threshold": -20.0 } }
//! ```

use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::Pose;
use crate::{Error, Result};

/// Bit value of the static collision flag (Bullet's `CF_STATIC_OBJECT`).
pub const STATIC_COLLISION_FLAG: u32 = 2;

/// Whether bodies may fall asleep when they come to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Bodies never deactivate. Player impulses always register, at the cost of
    /// keeping every body in the broad phase each step.
    #[default]
    DisableDeactivation,
    /// Let the engine put resting bodies to sleep.
    AllowSleep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Collision margin applied uniformly to every shape.
    pub collision_margin: f32,
    /// Length of one simulation sub-step, in seconds.
    pub fixed_timestep: f32,
    /// Upper bound on sub-steps per `step()`; 0 = one variable step.
    pub max_sub_steps: u32,
    pub activation: ActivationPolicy,
}

impl PhysicsConfig {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(Error::InvalidParameter {
                name: "physics.gravity",
                value: self.gravity.length(),
            });
        }
        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "physics.fixed_timestep",
                value: self.fixed_timestep,
            });
        }
        if !(self.collision_margin >= 0.0 && self.collision_margin.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "physics.collision_margin",
                value: self.collision_margin,
            });
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -50.0, 0.0),
            collision_margin: 0.05,
            fixed_timestep: 1.0 / 60.0,
            max_sub_steps: 10,
            activation: ActivationPolicy::DisableDeactivation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub scaling_factor: f32,
    /// Below this height the ball counts as grounded.
    pub ground_threshold: f32,
    /// Vertical input applied while airborne.
    pub air_movement_y: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            scaling_factor: 20.0,
            ground_threshold: 2.01,
            air_movement_y: -0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub spawn: Pose,
    pub radius: f32,
    pub mass: f32,
    pub rolling_friction: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            spawn: Pose::new(Vec3::new(0.0, 10.0, 0.0), Quat::IDENTITY),
            radius: 2.0,
            mass: 3.0,
            rolling_friction: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Objects below this height are respawned.
    pub fall_threshold: f32,
    pub ball: BallConfig,
    pub movement: MovementConfig,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            fall_threshold: -50.0,
            ball: BallConfig::default(),
            movement: MovementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickWallConfig {
    pub mass: f32,
    /// Full brick dimensions (length, height, depth).
    pub brick_size: Vec3,
    pub bricks_across: u32,
    pub rows: u32,
    /// Center of the wall footprint; `y` is ignored, rows start on the ground.
    pub center: Vec3,
}

impl Default for BrickWallConfig {
    fn default() -> Self {
        Self {
            mass: 0.1,
            brick_size: Vec3::new(3.0, 1.5, 3.0),
            bricks_across: 6,
            rows: 6,
            center: Vec3::new(70.0, 0.0, -60.0),
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub physics: PhysicsConfig,
    pub gameplay: GameplayConfig,
    pub bricks: BrickWallConfig,
}

impl WorldConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;
        let config = Self::from_json_str(&text)
            .map_err(|e| e.context(format!("parsing {}", path.display())))?;
        log::info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.physics.validate()?;
        if !self.gameplay.fall_threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "gameplay.fall_threshold",
                value: self.gameplay.fall_threshold,
            });
        }
        Ok(())
    }
}
