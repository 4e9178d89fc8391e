// src/bridge.rs
//! Physics -> visual transform copy.
//!
//! One-way only: a tracked object's position/orientation is overwritten every
//! step, so gameplay code that wants to move a body goes through the world's
//! velocity/impulse API instead.

use glam::{Quat, Vec3};
use nalgebra::Isometry3;
use rapier3d::prelude::*;

use crate::scene::VisualObject;

/// Copies body transforms onto visual objects through a reused scratch transform.
///
/// Each `PhysicsWorld` owns its own bridge, so worlds never share scratch state.
#[derive(Debug, Clone)]
pub struct TransformBridge {
    scratch: Isometry3<Real>,
}

impl Default for TransformBridge {
    fn default() -> Self {
        Self { scratch: Isometry3::identity() }
    }
}

impl TransformBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `body`'s world transform into `obj`.
    #[inline]
    pub fn sync<O: VisualObject + ?Sized>(&mut self, obj: &mut O, body: &RigidBody) {
        self.scratch = *body.position();
        let t = &self.scratch.translation;
        let r = &self.scratch.rotation;
        obj.set_position(Vec3::new(t.x, t.y, t.z));
        obj.set_orientation(Quat::from_xyzw(r.i, r.j, r.k, r.w));
    }

    /// Transform written by the most recent `sync`.
    pub fn last_synced(&self) -> &Isometry3<Real> {
        &self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::to_isometry;
    use crate::scene::{Pose, Scene, SceneGraph};

    #[test]
    fn copies_origin_and_rotation() {
        let pose = Pose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let body = RigidBodyBuilder::dynamic().position(to_isometry(&pose)).build();

        let mut scene = Scene::new();
        let id = scene.spawn("crate", Pose::default());
        let mut bridge = TransformBridge::new();
        bridge.sync(scene.object_mut(id).unwrap(), &body);

        let obj = scene.object(id).unwrap();
        assert!(obj.position.abs_diff_eq(pose.position, 1e-6));
        assert!(obj.orientation.abs_diff_eq(pose.rotation, 1e-6));
        assert_eq!(bridge.last_synced().translation.y, 2.0);
    }
}
