//! Serde data file structs for scene descriptions.
//!
//! A scene file lists root parts, each with a local placement and nested
//! children. It is deserialized from RON, JSON, or TOML and then built into a
//! [`SceneGraph`] by [`SceneData::build`].

use glam::Vec3;
use serde::Deserialize;
use walkthrough_core::pose::{Pose, euler_degrees};
use walkthrough_core::scene::{SceneError, SceneGraph};
use walkthrough_core::PartId;

/// Top-level scene file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub parts: Vec<PartData>,
}

/// One part and its subtree.
#[derive(Debug, Clone, Deserialize)]
pub struct PartData {
    pub name: String,
    /// Position relative to the parent.
    #[serde(default)]
    pub position: Vec3,
    /// Rotation relative to the parent, as Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub children: Vec<PartData>,
}

impl PartData {
    fn local_pose(&self) -> Pose {
        Pose::new(self.position, euler_degrees(self.rotation))
    }
}

impl SceneData {
    /// Build a scene graph, preserving the authored child order.
    pub fn build(&self) -> Result<SceneGraph, SceneError> {
        let mut scene = SceneGraph::new();
        for part in &self.parts {
            add_subtree(&mut scene, None, part)?;
        }
        Ok(scene)
    }

    /// Total number of parts, including nested children.
    pub fn part_count(&self) -> usize {
        fn count(part: &PartData) -> usize {
            1 + part.children.iter().map(count).sum::<usize>()
        }
        self.parts.iter().map(count).sum()
    }
}

fn add_subtree(
    scene: &mut SceneGraph,
    parent: Option<PartId>,
    part: &PartData,
) -> Result<PartId, SceneError> {
    let id = scene.add_part(&part.name, parent, part.local_pose())?;
    for child in &part.children {
        add_subtree(scene, Some(id), child)?;
    }
    Ok(id)
}
