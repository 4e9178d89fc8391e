// src/commands.rs
//! Deferred registry mutations.
//!
//! Producers (possibly on other threads) send `Add`/`Remove` requests through a
//! [`CommandSender`]; the frame loop drains them between steps with
//! [`CommandQueue::apply`], so the registry is never mutated while the sync
//! pass iterates it.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::body::RigidBodyDesc;
use crate::scene::{ObjectId, SceneGraph};
use crate::world::PhysicsWorld;

#[derive(Debug)]
pub enum PhysicsCommand {
    Add { object: ObjectId, body: RigidBodyDesc },
    Remove { object: ObjectId },
}

/// Cloneable producer side of a [`CommandQueue`].
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<PhysicsCommand>,
}

impl CommandSender {
    /// Queue a command. Returns false if the queue has been dropped.
    pub fn send(&self, command: PhysicsCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn add(&self, object: ObjectId, body: RigidBodyDesc) -> bool {
        self.send(PhysicsCommand::Add { object, body })
    }

    pub fn remove(&self, object: ObjectId) -> bool {
        self.send(PhysicsCommand::Remove { object })
    }
}

/// Summary of one `apply` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedCommands {
    pub added: usize,
    pub removed: usize,
    /// Commands that targeted a missing object or failed to register.
    pub ignored: usize,
}

pub struct CommandQueue {
    tx: Sender<PhysicsCommand>,
    rx: Receiver<PhysicsCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Drain every queued command, in send order. Non-blocking.
    /// Call between steps, never from inside one.
    pub fn apply<S: SceneGraph>(&self, world: &mut PhysicsWorld, scene: &mut S) -> AppliedCommands {
        let mut applied = AppliedCommands::default();
        for command in self.rx.try_iter() {
            match command {
                PhysicsCommand::Add { object, body } => {
                    let Some(obj) = scene.object_mut(object) else {
                        log::debug!("deferred add: {object:?} no longer in scene");
                        applied.ignored += 1;
                        continue;
                    };
                    match world.add_rigid_body(obj, body) {
                        Ok(Some(_)) => applied.added += 1,
                        Ok(None) => applied.ignored += 1,
                        Err(e) => {
                            log::warn!("deferred add for {object:?} failed: {e}");
                            applied.ignored += 1;
                        }
                    }
                }
                PhysicsCommand::Remove { object } => {
                    if world.remove_object(scene, object) {
                        applied.removed += 1;
                    } else {
                        applied.ignored += 1;
                    }
                }
            }
        }
        applied
    }
}
