// src/controller.rs
//! Player ball drive.
//!
//! Input arrives already reduced to four axis strengths (keyboard keys or a
//! joystick); the controller turns them into a linear velocity on the ball's
//! body. The velocity goes through the world API, never through the visual
//! transform.

use glam::Vec3;

use crate::config::MovementConfig;
use crate::scene::VisualObject;
use crate::world::PhysicsWorld;

/// Directional input, each component in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveDirection {
    pub left: f32,
    pub right: f32,
    pub forward: f32,
    pub back: f32,
}

impl MoveDirection {
    pub fn is_idle(&self) -> bool {
        self.right - self.left == 0.0 && self.back - self.forward == 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct BallController {
    pub movement: MovementConfig,
}

impl BallController {
    pub fn new(movement: MovementConfig) -> Self {
        Self { movement }
    }

    /// Velocity the ball should get for `input` at height `y`, or `None` when
    /// there is nothing to apply.
    pub fn target_velocity(&self, input: &MoveDirection, y: f32) -> Option<Vec3> {
        let airborne = y >= self.movement.ground_threshold;
        let dir = Vec3::new(
            input.right - input.left,
            if airborne { self.movement.air_movement_y } else { 0.0 },
            input.back - input.forward,
        );
        (dir != Vec3::ZERO).then(|| dir * self.movement.scaling_factor)
    }

    /// Apply `input` to `ball`. Returns whether a velocity was written.
    pub fn drive<O: VisualObject + ?Sized>(
        &self,
        world: &mut PhysicsWorld,
        ball: &O,
        input: &MoveDirection,
    ) -> bool {
        let Some(body) = ball.physics_body() else {
            return false;
        };
        match self.target_velocity(input, ball.position().y) {
            Some(velocity) => world.set_linear_velocity(body, velocity),
            None => false,
        }
    }
}
