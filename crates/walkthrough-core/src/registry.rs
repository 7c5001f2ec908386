//! Resolution of the named parts the procedure needs.
//!
//! Resolution happens once at startup. A missing part is a configuration
//! error: the player cannot be constructed without every required part.

use crate::config::PartNames;
use crate::id::{PartId, PartRole};
use crate::pose::Pose;
use crate::scene::{Reparent, SceneError, SceneGraph};

/// Errors that can occur while resolving required parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A required part is absent from the scene.
    #[error("required part '{name}' ({role:?}) not found under '{parent}'")]
    MissingPart {
        role: PartRole,
        name: String,
        parent: String,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Typed handles to every required part, plus the poses and parents captured
/// at startup.
#[derive(Debug, Clone)]
pub struct PartRegistry {
    assembly: PartId,
    monitor: PartId,
    cover: PartId,
    old_battery: PartId,
    casing_panel: PartId,
    fasteners_a: PartId,
    fasteners_b: PartId,
    tool: PartId,
    new_battery: PartId,
    tool_rest: Pose,
}

impl PartRegistry {
    /// Resolve every required part, capture the tool's rest pose, then detach
    /// the tool and the replacement battery to the world root (world pose
    /// preserved) so later assembly motion does not drag them along.
    pub fn resolve(scene: &mut SceneGraph, names: &PartNames) -> Result<Self, RegistryError> {
        let assembly =
            scene
                .find_child(None, &names.assembly)
                .ok_or_else(|| RegistryError::MissingPart {
                    role: PartRole::Assembly,
                    name: names.assembly.clone(),
                    parent: "<world>".to_string(),
                })?;

        let child = |role: PartRole, name: &str| {
            scene
                .find_child(Some(assembly), name)
                .ok_or_else(|| RegistryError::MissingPart {
                    role,
                    name: name.to_string(),
                    parent: names.assembly.clone(),
                })
        };

        let monitor = child(PartRole::Monitor, &names.monitor)?;
        let cover = child(PartRole::Cover, &names.cover)?;
        let old_battery = child(PartRole::OldBattery, &names.old_battery)?;
        let casing_panel = child(PartRole::CasingPanel, &names.casing_panel)?;
        let fasteners_a = child(PartRole::FastenersA, &names.fasteners_a)?;
        let fasteners_b = child(PartRole::FastenersB, &names.fasteners_b)?;
        let tool = child(PartRole::Tool, &names.tool)?;
        let new_battery = child(PartRole::NewBattery, &names.new_battery)?;

        let tool_rest = scene.world_pose(tool)?;

        scene.reparent(new_battery, None, Reparent::KeepWorld)?;
        scene.reparent(tool, None, Reparent::KeepWorld)?;
        log::debug!(
            "resolved {} parts; detached '{}' and '{}' to the world root",
            PartRole::ALL.len(),
            names.tool,
            names.new_battery
        );

        Ok(Self {
            assembly,
            monitor,
            cover,
            old_battery,
            casing_panel,
            fasteners_a,
            fasteners_b,
            tool,
            new_battery,
            tool_rest,
        })
    }

    /// The part playing `role`.
    pub fn get(&self, role: PartRole) -> PartId {
        match role {
            PartRole::Assembly => self.assembly,
            PartRole::Monitor => self.monitor,
            PartRole::Cover => self.cover,
            PartRole::OldBattery => self.old_battery,
            PartRole::CasingPanel => self.casing_panel,
            PartRole::FastenersA => self.fasteners_a,
            PartRole::FastenersB => self.fasteners_b,
            PartRole::Tool => self.tool,
            PartRole::NewBattery => self.new_battery,
        }
    }

    pub fn tool(&self) -> PartId {
        self.tool
    }

    /// The tool's canonical world pose between steps.
    pub fn tool_rest(&self) -> Pose {
        self.tool_rest
    }
}
