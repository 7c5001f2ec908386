//! Time-bounded, interruptible transform animations.
//!
//! A [`Choreography`] is a resumable task. The host's frame loop calls
//! [`Choreography::tick`] once per rendered frame with the elapsed time; the
//! task interpolates from the state it captured at construction towards its
//! target and reports [`TickStatus::Continue`] until it is finished.
//!
//! # Interruption
//!
//! Interruption is cooperative. The interrupt flag arrives with the frame
//! and is checked at the top of every tick, before any interpolation. An
//! interrupted choreography jumps straight to its defined end state and
//! reports [`TickStatus::Done`]; it never stops at a partial interpolation.

use std::collections::VecDeque;
use std::fmt;

use glam::{Quat, Vec3};

use crate::id::PartId;
use crate::pose::{Pose, axis_angle_degrees};
use crate::scene::{Reparent, SceneError, SceneGraph};

// ---------------------------------------------------------------------------
// Frame and status
// ---------------------------------------------------------------------------

/// Input for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
    /// Whether a skip was requested since the previous tick.
    pub interrupted: bool,
}

impl Frame {
    /// A frame of `dt` seconds. Negative or non-finite deltas count as zero.
    pub fn new(dt: f32) -> Self {
        Self {
            dt: usable_dt(dt),
            interrupted: false,
        }
    }

    pub fn interrupted() -> Self {
        Self {
            dt: 0.0,
            interrupted: true,
        }
    }
}

/// Result of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Suspended; tick again next frame.
    Continue,
    /// Finished (naturally or by interruption). The end state has been applied.
    Done,
}

// ---------------------------------------------------------------------------
// Choreography trait
// ---------------------------------------------------------------------------

/// A resumable animation over one or more part transforms.
pub trait Choreography: fmt::Debug {
    /// Advance by one frame. Must not be called again after returning `Done`.
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError>;
}

/// Time a frame may actually advance by: zero for negative, NaN or infinite
/// deltas.
pub(crate) fn usable_dt(dt: f32) -> f32 {
    if dt.is_finite() { dt.max(0.0) } else { 0.0 }
}

/// Tracks elapsed time against a duration.
#[derive(Debug, Clone, Copy)]
struct Clock {
    elapsed: f32,
    duration: f32,
}

impl Clock {
    fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
        }
    }

    /// Add `dt` and return the new progress in `[0, 1)`, or `None` once the
    /// duration has elapsed.
    fn advance(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += usable_dt(dt);
        if self.elapsed >= self.duration {
            None
        } else {
            Some(self.elapsed / self.duration)
        }
    }
}

// ---------------------------------------------------------------------------
// RotateInPlace
// ---------------------------------------------------------------------------

/// Slerp a part's world rotation from its current value to
/// `current * rotation(axis, angle)`; the axis is in the part's own frame.
#[derive(Debug, Clone)]
pub struct RotateInPlace {
    part: PartId,
    start: Quat,
    end: Quat,
    clock: Clock,
}

impl RotateInPlace {
    pub fn new(
        scene: &SceneGraph,
        part: PartId,
        axis: Vec3,
        degrees: f32,
        duration: f32,
    ) -> Result<Self, SceneError> {
        let start = scene.world_pose(part)?.rotation;
        Ok(Self {
            part,
            start,
            end: (start * axis_angle_degrees(axis, degrees)).normalize(),
            clock: Clock::new(duration),
        })
    }

    pub fn target(&self) -> Quat {
        self.end
    }
}

impl Choreography for RotateInPlace {
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError> {
        if !frame.interrupted {
            if let Some(t) = self.clock.advance(frame.dt) {
                scene.set_world_rotation(self.part, self.start.slerp(self.end, t))?;
                return Ok(TickStatus::Continue);
            }
        }
        scene.set_world_rotation(self.part, self.end)?;
        Ok(TickStatus::Done)
    }
}

// ---------------------------------------------------------------------------
// RotateGroupAroundPivot
// ---------------------------------------------------------------------------

/// Rotate a whole subtree about an external pivot and a world-space axis,
/// accumulating `angle * dt / duration` per tick.
///
/// The tool is lifted out of the subtree for the duration (if it is a
/// descendant) and put back under its former parent at the end, world pose
/// preserved, so the group rotation does not carry it along.
#[derive(Debug, Clone)]
pub struct RotateGroupAroundPivot {
    group: PartId,
    pivot: Vec3,
    axis: Vec3,
    degrees: f32,
    start: Pose,
    clock: Clock,
    lifted_tool: Option<(PartId, Option<PartId>)>,
}

impl RotateGroupAroundPivot {
    pub fn new(
        scene: &mut SceneGraph,
        group: PartId,
        pivot: Vec3,
        axis: Vec3,
        degrees: f32,
        duration: f32,
        tool: PartId,
    ) -> Result<Self, SceneError> {
        let lifted_tool = if scene.is_descendant_of(tool, group) {
            let parent = scene.parent(tool);
            scene.reparent(tool, None, Reparent::KeepWorld)?;
            log::debug!("lifted tool out of rotating group");
            Some((tool, parent))
        } else {
            None
        };

        Ok(Self {
            group,
            pivot,
            axis: axis.normalize(),
            degrees,
            start: scene.world_pose(group)?,
            clock: Clock::new(duration),
            lifted_tool,
        })
    }

    /// The closed-form end pose of the group.
    pub fn target(&self) -> Pose {
        let q = axis_angle_degrees(self.axis, self.degrees);
        Pose {
            position: self.pivot + q * (self.start.position - self.pivot),
            rotation: (q * self.start.rotation).normalize(),
        }
    }

    fn finish(&mut self, scene: &mut SceneGraph) -> Result<TickStatus, SceneError> {
        scene.set_world_pose(self.group, self.target())?;
        if let Some((tool, parent)) = self.lifted_tool.take() {
            scene.reparent(tool, parent, Reparent::KeepWorld)?;
        }
        Ok(TickStatus::Done)
    }
}

impl Choreography for RotateGroupAroundPivot {
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError> {
        if frame.interrupted || self.clock.advance(frame.dt).is_none() {
            return self.finish(scene);
        }

        let fraction = usable_dt(frame.dt) / self.clock.duration;
        let step = axis_angle_degrees(self.axis, self.degrees * fraction);
        let current = scene.world_pose(self.group)?;
        let rotated = Pose {
            position: self.pivot + step * (current.position - self.pivot),
            rotation: (step * current.rotation).normalize(),
        };
        scene.set_world_pose(self.group, rotated)?;
        Ok(TickStatus::Continue)
    }
}

// ---------------------------------------------------------------------------
// MoveAndRotate
// ---------------------------------------------------------------------------

/// Lerp a part's world position and slerp its world rotation to a target.
#[derive(Debug, Clone)]
pub struct MoveAndRotate {
    part: PartId,
    start: Pose,
    target: Pose,
    clock: Clock,
}

impl MoveAndRotate {
    pub fn new(
        scene: &SceneGraph,
        part: PartId,
        target: Pose,
        duration: f32,
    ) -> Result<Self, SceneError> {
        Ok(Self {
            part,
            start: scene.world_pose(part)?,
            target,
            clock: Clock::new(duration),
        })
    }

    /// Move to `position` keeping the part's current world rotation.
    pub fn translate_to(
        scene: &SceneGraph,
        part: PartId,
        position: Vec3,
        duration: f32,
    ) -> Result<Self, SceneError> {
        let rotation = scene.world_pose(part)?.rotation;
        Self::new(scene, part, Pose::new(position, rotation), duration)
    }

    pub fn target(&self) -> Pose {
        self.target
    }
}

impl Choreography for MoveAndRotate {
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError> {
        if !frame.interrupted {
            if let Some(t) = self.clock.advance(frame.dt) {
                scene.set_world_pose(self.part, self.start.interpolate(&self.target, t))?;
                return Ok(TickStatus::Continue);
            }
        }
        scene.set_world_pose(self.part, self.target)?;
        Ok(TickStatus::Done)
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// One stage of a [`Sequence`].
#[derive(Debug)]
pub enum Stage {
    /// Run an animation to completion.
    Animate(Box<dyn Choreography>),
    /// Reparent a part (world pose preserved). Takes no frame time.
    Attach {
        part: PartId,
        parent: Option<PartId>,
    },
}

/// Stages run in order. Each frame ticks at most one animation; attach
/// stages run as soon as they are reached. When interrupted, every remaining
/// stage is driven to its end state in the same tick.
#[derive(Debug, Default)]
pub struct Sequence {
    stages: VecDeque<Stage>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, choreography: impl Choreography + 'static) -> Self {
        self.stages.push_back(Stage::Animate(Box::new(choreography)));
        self
    }

    pub fn then_attach(mut self, part: PartId, parent: Option<PartId>) -> Self {
        self.stages.push_back(Stage::Attach { part, parent });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Choreography for Sequence {
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError> {
        let mut ticked = false;
        loop {
            let Some(stage) = self.stages.front_mut() else {
                return Ok(TickStatus::Done);
            };
            match stage {
                Stage::Attach { part, parent } => {
                    scene.reparent(*part, *parent, Reparent::KeepWorld)?;
                }
                Stage::Animate(choreography) => {
                    if ticked && !frame.interrupted {
                        return Ok(TickStatus::Continue);
                    }
                    ticked = true;
                    if choreography.tick(scene, frame)? == TickStatus::Continue {
                        return Ok(TickStatus::Continue);
                    }
                }
            }
            self.stages.pop_front();
        }
    }
}

/// Run `choreography` with a fixed frame delta until it finishes. Returns the
/// number of ticks taken. A delta that cannot advance time interrupts the
/// choreography on the first tick.
pub fn run_to_end(
    choreography: &mut dyn Choreography,
    scene: &mut SceneGraph,
    dt: f32,
) -> Result<usize, SceneError> {
    let frame = if usable_dt(dt) > 0.0 {
        Frame::new(dt)
    } else {
        Frame::interrupted()
    };
    let mut ticks = 1;
    while choreography.tick(scene, frame)? == TickStatus::Continue {
        ticks += 1;
    }
    Ok(ticks)
}

// ===========================================================================
// Tests
// ===========================================================================
