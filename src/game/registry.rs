//! Pairing between simulated bodies and the visual nodes they drive.
//!
//! Sync is one-directional: after the simulation steps, each registered
//! body's translation and rotation are copied verbatim into its node. Nodes
//! are never read back into the simulation.

use rapier3d::prelude::RigidBodyHandle;

use super::physics::PhysicsWorld;
use super::scene::{NodeId, SceneGraph};

/// Stable handle to a registry entry. Removing an entry bumps the slot
/// generation, so stale handles never alias a later entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEntry {
    pub body: RigidBodyHandle,
    pub node: NodeId,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<SyncEntry>,
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `body` with `node`. Returns `None` if the node is already driven
    /// by another body.
    pub fn register(&mut self, body: RigidBodyHandle, node: NodeId) -> Option<SyncHandle> {
        if self.iter().any(|(_, e)| e.node == node) {
            log::warn!("[Registry] node {} is already driven by a body", node.index());
            return None;
        }

        let entry = Some(SyncEntry { body, node });
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            return Some(SyncHandle {
                index,
                generation: slot.generation,
            });
        }

        self.slots.push(Slot { generation: 0, entry });
        Some(SyncHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        })
    }

    /// Removes an entry. Other handles stay valid.
    pub fn remove(&mut self, handle: SyncHandle) -> Option<SyncEntry> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(entry)
    }

    pub fn get(&self, handle: SyncHandle) -> Option<SyncEntry> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (SyncHandle, SyncEntry)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entry.map(|entry| {
                (
                    SyncHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    entry,
                )
            })
        })
    }

    /// Copies every registered body's transform into its node.
    /// Returns the number of nodes written.
    pub fn sync(&self, physics: &PhysicsWorld, scene: &mut SceneGraph) -> usize {
        let mut synced = 0;
        for (_, entry) in self.iter() {
            let Some((position, rotation)) = physics.get_transform(entry.body) else {
                log::trace!("[Registry] body {:?} has no motion state, skipping", entry.body);
                continue;
            };
            let Some(node) = scene.get_mut(entry.node) else {
                continue;
            };
            node.position = position;
            node.rotation = rotation;
            synced += 1;
        }
        synced
    }

    /// Steps the simulation by `dt`, consumes this tick's forces, then syncs
    /// visuals.
    pub fn step_and_sync(&self, physics: &mut PhysicsWorld, scene: &mut SceneGraph, dt: f32) -> usize {
        physics.step(dt);
        physics.clear_forces();
        self.sync(physics, scene)
    }
}
