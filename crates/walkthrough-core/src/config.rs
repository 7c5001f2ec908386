//! Player configuration: animation durations, fastener choreography constants,
//! and the names of the parts the procedure requires.
//!
//! Every field has a default, so a config file only needs to list overrides.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Errors from [`PlayerConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a positive, finite number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f32 },
    #[error("part name for {field} is empty")]
    EmptyPartName { field: &'static str },
}

/// Top-level configuration for a [`crate::player::StepPlayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Duration of rotations, group rotations and moves, in seconds.
    pub transform_duration: f32,
    /// Duration of each tool move and each fastener move, in seconds.
    pub fastener_duration: f32,
    pub fastener: FastenerConfig,
    pub parts: PartNames,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            transform_duration: 1.0,
            fastener_duration: 0.1,
            fastener: FastenerConfig::default(),
            parts: PartNames::default(),
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("transform_duration", self.transform_duration)?;
        check_duration("fastener_duration", self.fastener_duration)?;
        self.parts.validate()
    }
}

fn check_duration(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { field, value })
    }
}

/// Fixed world-space constants used by the fastener sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastenerConfig {
    /// Where removed fasteners are parked.
    pub staging_position: Vec3,
    /// Tool position relative to the fastener it is working on.
    pub tool_offset: Vec3,
    /// Tool rotation while working, as Euler angles in degrees.
    pub tool_approach_euler_deg: Vec3,
}

impl Default for FastenerConfig {
    fn default() -> Self {
        Self {
            staging_position: Vec3::new(-2.25, -0.355, 0.319),
            tool_offset: Vec3::new(0.0, 0.2, 0.0),
            tool_approach_euler_deg: Vec3::new(90.0, 0.0, 0.0),
        }
    }
}

/// Names of the required parts.
///
/// `assembly` is looked up among the world root's parts; all others are
/// direct children of the assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartNames {
    pub assembly: String,
    pub monitor: String,
    pub cover: String,
    pub old_battery: String,
    pub casing_panel: String,
    pub fasteners_a: String,
    pub fasteners_b: String,
    pub tool: String,
    pub new_battery: String,
}

impl Default for PartNames {
    fn default() -> Self {
        Self {
            assembly: "Laptop".to_string(),
            monitor: "Monitor".to_string(),
            cover: "CoverElectronics".to_string(),
            old_battery: "BatteryOld".to_string(),
            casing_panel: "CasingDisk".to_string(),
            fasteners_a: "Screws1".to_string(),
            fasteners_b: "Screws2".to_string(),
            tool: "screwdriver".to_string(),
            new_battery: "batteryNew".to_string(),
        }
    }
}

impl PartNames {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("assembly", &self.assembly),
            ("monitor", &self.monitor),
            ("cover", &self.cover),
            ("old_battery", &self.old_battery),
            ("casing_panel", &self.casing_panel),
            ("fasteners_a", &self.fasteners_a),
            ("fasteners_b", &self.fasteners_b),
            ("tool", &self.tool),
            ("new_battery", &self.new_battery),
        ];
        for (field, name) in fields {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyPartName { field });
            }
        }
        Ok(())
    }
}
