//! Explicit ownership tree of named parts.
//!
//! Parts live in a `SlotMap` keyed by [`PartId`]; child lists are kept in a
//! `SecondaryMap` so adjacency stays in sync with the primary storage. A part
//! with no parent is owned directly by the world root. World poses are never
//! cached: [`SceneGraph::world_pose`] walks the parent chain on every call.

use crate::id::PartId;
use crate::pose::Pose;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("part not found: {0:?}")]
    PartNotFound(PartId),
    #[error("cannot parent {child:?} under {parent:?}: would create a cycle")]
    WouldCycle { child: PartId, parent: PartId },
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// How a reparent treats the part's pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reparent {
    /// Recompute the local pose so the world pose is unchanged.
    KeepWorld,
    /// Keep the local pose; the world pose jumps to the new parent's frame.
    KeepLocal,
}

/// Per-part data stored in the scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartNode {
    pub name: String,
    /// Pose relative to the parent (or to the world if unparented).
    pub local: Pose,
    parent: Option<PartId>,
}

impl PartNode {
    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }
}

/// The scene: named parts arranged in a parent/child tree.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SceneGraph {
    parts: SlotMap<PartId, PartNode>,
    children: SecondaryMap<PartId, Vec<PartId>>,
    /// Parts owned directly by the world root, in insertion order.
    roots: Vec<PartId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Construction and lookup
    // -----------------------------------------------------------------------

    /// Add a part under `parent` (or the world root) with the given local pose.
    pub fn add_part(
        &mut self,
        name: &str,
        parent: Option<PartId>,
        local: Pose,
    ) -> Result<PartId, SceneError> {
        if let Some(p) = parent {
            self.require(p)?;
        }
        let id = self.parts.insert(PartNode {
            name: name.to_string(),
            local,
            parent,
        });
        self.children.insert(id, Vec::new());
        self.attach(id, parent);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All part ids, in storage order.
    pub fn ids(&self) -> impl Iterator<Item = PartId> + '_ {
        self.parts.keys()
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.contains_key(id)
    }

    pub fn part(&self, id: PartId) -> Option<&PartNode> {
        self.parts.get(id)
    }

    pub fn name(&self, id: PartId) -> Option<&str> {
        self.parts.get(id).map(|p| p.name.as_str())
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.parts.get(id).and_then(|p| p.parent)
    }

    /// Children of `id` in their authored order. Empty for unknown parts.
    pub fn children(&self, id: PartId) -> &[PartId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parts owned directly by the world root.
    pub fn roots(&self) -> &[PartId] {
        &self.roots
    }

    /// Find a direct child of `parent` (or a root part when `None`) by name.
    pub fn find_child(&self, parent: Option<PartId>, name: &str) -> Option<PartId> {
        let candidates = match parent {
            Some(p) => self.children(p),
            None => self.roots(),
        };
        candidates
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_descendant_of(&self, id: PartId, ancestor: PartId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    // -----------------------------------------------------------------------
    // Poses
    // -----------------------------------------------------------------------

    pub fn local_pose(&self, id: PartId) -> Result<Pose, SceneError> {
        Ok(self.require(id)?.local)
    }

    pub fn set_local_pose(&mut self, id: PartId, pose: Pose) -> Result<(), SceneError> {
        self.require_mut(id)?.local = pose;
        Ok(())
    }

    /// World pose: the composition of every ancestor's local pose with this one.
    pub fn world_pose(&self, id: PartId) -> Result<Pose, SceneError> {
        let node = self.require(id)?;
        match node.parent {
            Some(p) => Ok(self.world_pose(p)?.compose(&node.local)),
            None => Ok(node.local),
        }
    }

    /// Place the part at `pose` in world space, adjusting its local pose.
    pub fn set_world_pose(&mut self, id: PartId, pose: Pose) -> Result<(), SceneError> {
        let local = match self.require(id)?.parent {
            Some(p) => pose.relative_to(&self.world_pose(p)?),
            None => pose,
        };
        self.require_mut(id)?.local = local;
        Ok(())
    }

    pub fn set_world_position(&mut self, id: PartId, position: Vec3) -> Result<(), SceneError> {
        let mut pose = self.world_pose(id)?;
        pose.position = position;
        self.set_world_pose(id, pose)
    }

    pub fn set_world_rotation(&mut self, id: PartId, rotation: Quat) -> Result<(), SceneError> {
        let mut pose = self.world_pose(id)?;
        pose.rotation = rotation;
        self.set_world_pose(id, pose)
    }

    // -----------------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------------

    /// Move `id` under `new_parent` (or the world root when `None`).
    pub fn reparent(
        &mut self,
        id: PartId,
        new_parent: Option<PartId>,
        mode: Reparent,
    ) -> Result<(), SceneError> {
        let old_parent = self.require(id)?.parent;
        if let Some(p) = new_parent {
            self.require(p)?;
            if p == id || self.is_descendant_of(p, id) {
                return Err(SceneError::WouldCycle {
                    child: id,
                    parent: p,
                });
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        let world = self.world_pose(id)?;
        self.detach(id, old_parent);
        self.require_mut(id)?.parent = new_parent;
        self.attach(id, new_parent);

        if mode == Reparent::KeepWorld {
            self.set_world_pose(id, world)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, id: PartId) -> Result<&PartNode, SceneError> {
        self.parts.get(id).ok_or(SceneError::PartNotFound(id))
    }

    fn require_mut(&mut self, id: PartId) -> Result<&mut PartNode, SceneError> {
        self.parts.get_mut(id).ok_or(SceneError::PartNotFound(id))
    }

    fn attach(&mut self, id: PartId, parent: Option<PartId>) {
        match parent {
            Some(p) => {
                if let Some(list) = self.children.get_mut(p) {
                    list.push(id);
                }
            }
            None => self.roots.push(id),
        }
    }

    fn detach(&mut self, id: PartId, parent: Option<PartId>) {
        match parent {
            Some(p) => {
                if let Some(list) = self.children.get_mut(p) {
                    list.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&c| c != id),
        }
    }

    /// World pose of every part, in storage order.
    pub fn snapshot(&self) -> Result<Vec<(PartId, Pose)>, SceneError> {
        self.ids().map(|id| Ok((id, self.world_pose(id)?))).collect()
    }
}

/// Whether two snapshots agree part for part within `tolerance`.
pub fn snapshots_match(a: &[(PartId, Pose)], b: &[(PartId, Pose)], tolerance: f32) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((ia, pa), (ib, pb))| ia == ib && pa.approx_eq(pb, tolerance))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::axis_angle_degrees;

    const EPS: f32 = 1e-5;

    fn two_level() -> (SceneGraph, PartId, PartId) {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_part(
                "root",
                None,
                Pose::new(Vec3::new(1.0, 0.0, 0.0), axis_angle_degrees(Vec3::Z, 90.0)),
            )
            .unwrap();
        let child = scene
            .add_part("child", Some(root), Pose::from_position(Vec3::X))
            .unwrap();
        (scene, root, child)
    }

    #[test]
    fn add_part_registers_child() {
        let (scene, root, child) = two_level();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.children(root), &[child]);
        assert_eq!(scene.roots(), &[root]);
        assert_eq!(scene.parent(child), Some(root));
        assert_eq!(scene.name(child), Some("child"));
    }

    #[test]
    fn add_part_with_unknown_parent_fails() {
        let (mut scene, _, _) = two_level();
        let null = PartId::default();
        assert_eq!(
            scene.add_part("orphan", Some(null), Pose::IDENTITY),
            Err(SceneError::PartNotFound(null))
        );
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn find_child_by_name() {
        let (scene, root, child) = two_level();
        assert_eq!(scene.find_child(Some(root), "child"), Some(child));
        assert_eq!(scene.find_child(Some(root), "missing"), None);
        assert_eq!(scene.find_child(None, "root"), Some(root));
    }

    #[test]
    fn world_pose_composes_parent() {
        let (scene, _, child) = two_level();
        let world = scene.world_pose(child).unwrap();
        assert!(world.position.distance(Vec3::new(1.0, 1.0, 0.0)) < EPS);
    }

    #[test]
    fn set_world_pose_round_trips() {
        let (mut scene, _, child) = two_level();
        let target = Pose::new(Vec3::new(-2.0, 3.0, 0.5), axis_angle_degrees(Vec3::Y, 30.0));
        scene.set_world_pose(child, target).unwrap();
        assert!(scene.world_pose(child).unwrap().approx_eq(&target, 1e-4));
    }

    #[test]
    fn reparent_keep_world_preserves_world_pose() {
        let (mut scene, root, child) = two_level();
        let before = scene.world_pose(child).unwrap();
        scene.reparent(child, None, Reparent::KeepWorld).unwrap();
        assert_eq!(scene.parent(child), None);
        assert!(scene.children(root).is_empty());
        assert!(scene.roots().contains(&child));
        assert!(scene.world_pose(child).unwrap().approx_eq(&before, 1e-5));
    }

    #[test]
    fn reparent_keep_local_moves_with_new_frame() {
        let (mut scene, _, child) = two_level();
        scene.reparent(child, None, Reparent::KeepLocal).unwrap();
        let world = scene.world_pose(child).unwrap();
        assert!(world.position.distance(Vec3::X) < EPS);
    }

    #[test]
    fn detached_part_ignores_former_parent_motion() {
        let (mut scene, root, child) = two_level();
        scene.reparent(child, None, Reparent::KeepWorld).unwrap();
        let before = scene.world_pose(child).unwrap();
        scene
            .set_world_pose(root, Pose::new(Vec3::splat(5.0), Quat::from_rotation_x(1.0)))
            .unwrap();
        assert!(scene.world_pose(child).unwrap().approx_eq(&before, EPS));
    }

    #[test]
    fn reparent_rejects_cycle() {
        let (mut scene, root, child) = two_level();
        let err = scene.reparent(root, Some(child), Reparent::KeepWorld);
        assert_eq!(
            err,
            Err(SceneError::WouldCycle {
                child: root,
                parent: child
            })
        );
        assert!(scene.reparent(root, Some(root), Reparent::KeepWorld).is_err());
    }

    #[test]
    fn is_descendant_of_walks_chain() {
        let (mut scene, root, child) = two_level();
        let grandchild = scene.add_part("gc", Some(child), Pose::IDENTITY).unwrap();
        assert!(scene.is_descendant_of(grandchild, root));
        assert!(scene.is_descendant_of(grandchild, child));
        assert!(!scene.is_descendant_of(root, grandchild));
        assert!(!scene.is_descendant_of(root, root));
    }

    #[test]
    fn children_keep_authored_order() {
        let mut scene = SceneGraph::new();
        let group = scene.add_part("group", None, Pose::IDENTITY).unwrap();
        let a = scene.add_part("a", Some(group), Pose::IDENTITY).unwrap();
        let b = scene.add_part("b", Some(group), Pose::IDENTITY).unwrap();
        let c = scene.add_part("c", Some(group), Pose::IDENTITY).unwrap();
        assert_eq!(scene.children(group), &[a, b, c]);
    }

    #[test]
    fn snapshot_holds_world_poses_and_detects_moves() {
        let (mut scene, root, child) = two_level();
        let before = scene.snapshot().unwrap();
        assert_eq!(before.len(), 2);
        let (_, child_pose) = before.iter().find(|(id, _)| *id == child).unwrap();
        assert!(child_pose.position.distance(Vec3::new(1.0, 1.0, 0.0)) < EPS);
        assert!(snapshots_match(&before, &scene.snapshot().unwrap(), EPS));

        let mut moved = scene.local_pose(root).unwrap();
        moved.position.y += 0.01;
        scene.set_local_pose(root, moved).unwrap();
        let after = scene.snapshot().unwrap();
        assert!(!snapshots_match(&before, &after, 1e-3));
        assert!(snapshots_match(&before, &after, 0.1));
        assert!(!snapshots_match(&before, &after[..1], 0.1));
    }
}
