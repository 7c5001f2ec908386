//! Rigid poses (position + rotation) and their composition.
//!
//! A part's world pose is `compose(parent world pose, local pose)`; parts
//! without a parent are owned by the world root and their local pose is
//! their world pose. Scale is not modelled.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and rotation of a part, either local to its parent or in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Apply `local` in the frame of `self`: the world pose of a child whose
    /// parent sits at `self`.
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> Pose {
        let inv = self.rotation.inverse();
        Pose {
            position: inv * -self.position,
            rotation: inv,
        }
    }

    /// Express this (world) pose in the frame of `parent`.
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        parent.inverse().compose(self)
    }

    /// Linear position / spherical rotation interpolation. `t` is clamped to `[0, 1]`.
    pub fn interpolate(&self, target: &Pose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(target.position, t),
            rotation: self.rotation.slerp(target.rotation, t),
        }
    }

    /// Whether both position and rotation match within `tolerance`.
    ///
    /// Rotations are compared as unit quaternions, treating `q` and `-q` as equal.
    pub fn approx_eq(&self, other: &Pose, tolerance: f32) -> bool {
        self.position.distance(other.position) <= tolerance
            && rotation_distance(self.rotation, other.rotation) <= tolerance
    }
}

/// Component distance between two rotations, sign-insensitive.
pub fn rotation_distance(a: Quat, b: Quat) -> f32 {
    (a - b).length().min((a + b).length())
}

/// Rotation of `degrees` about `axis` (normalized internally).
pub fn axis_angle_degrees(axis: Vec3, degrees: f32) -> Quat {
    Quat::from_axis_angle(axis.normalize(), degrees.to_radians())
}

/// Rotation from Euler angles in degrees. Applied in Y, X, Z order, which is
/// the convention scene authoring tools use for `(pitch, yaw, roll)` triples.
pub fn euler_degrees(angles: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    )
}
