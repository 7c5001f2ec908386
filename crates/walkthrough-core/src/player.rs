//! The step player: the state machine that walks the procedure.
//!
//! # Lifecycle of a step
//!
//! 1. [`StepPlayer::advance`] or [`StepPlayer::retreat`] is called while idle.
//!    The interrupt flag is cleared, the current step's message goes to the
//!    narrative sink, and the step's cue for that direction is turned into a
//!    choreography.
//! 2. The host calls [`StepPlayer::update`] once per frame. Each call ticks
//!    the choreography with the frame delta and the interrupt flag.
//! 3. When the choreography finishes, the index moves one step in the
//!    requested direction (unless already at that end), the tool snaps back to
//!    its rest pose, and navigation state is republished.
//!
//! Calling `advance`/`retreat` while a step runs only sets the interrupt
//! flag; it never starts a second step. At most one choreography runs at a
//! time.

use glam::Vec3;

use crate::choreography::{
    Choreography, Frame, MoveAndRotate, RotateGroupAroundPivot, RotateInPlace, Sequence,
    TickStatus,
};
use crate::config::PlayerConfig;
use crate::error::WalkthroughError;
use crate::fastener::{FastenerSequence, OriginalPoseMap};
use crate::id::{PartId, PartRole};
use crate::registry::PartRegistry;
use crate::scene::{Reparent, SceneError, SceneGraph};
use crate::sink::{NarrativeSink, Navigation, NavigationSink};
use crate::step::{Cue, StepId};

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// What an `advance`/`retreat` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// A step started running (and may already have finished, if it had
    /// nothing to animate).
    Started(StepId),
    /// A step was already running; it will be skipped to its end state on
    /// the next update.
    Interrupt,
    /// Already at the end of the procedure in the requested direction.
    AtBoundary,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Recorded ownership and placement of a part before a transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transfer {
    position: Vec3,
    parent: Option<PartId>,
}

#[derive(Debug)]
struct ActiveStep {
    step: StepId,
    reverse: bool,
    choreography: Box<dyn Choreography>,
}

// ---------------------------------------------------------------------------
// StepPlayer
// ---------------------------------------------------------------------------

/// Drives the procedure over a scene, writing to a narrative sink and a
/// navigation sink.
pub struct StepPlayer<N: NarrativeSink, V: NavigationSink> {
    scene: SceneGraph,
    parts: PartRegistry,
    config: PlayerConfig,
    current: StepId,
    active: Option<ActiveStep>,
    interrupt: bool,
    originals: OriginalPoseMap,
    /// Where the old battery sat and who owned it, while it is out.
    old_battery: Option<Transfer>,
    /// Where the replacement battery was and who owned it, while installed.
    new_battery: Option<Transfer>,
    /// The old battery's seat, first recorded at extraction.
    battery_seat: Option<Vec3>,
    narrative: N,
    navigation: V,
}

impl<N: NarrativeSink, V: NavigationSink> StepPlayer<N, V> {
    /// Validate the config, resolve required parts (detaching the tool and the
    /// replacement battery) and publish the initial navigation state.
    ///
    /// Fails if any required part is missing; the walkthrough cannot run
    /// without it.
    pub fn new(
        mut scene: SceneGraph,
        config: PlayerConfig,
        narrative: N,
        navigation: V,
    ) -> Result<Self, WalkthroughError> {
        config.validate()?;
        let parts = PartRegistry::resolve(&mut scene, &config.parts)?;

        let mut player = Self {
            scene,
            parts,
            config,
            current: StepId::FIRST,
            active: None,
            interrupt: false,
            originals: OriginalPoseMap::new(),
            old_battery: None,
            new_battery: None,
            battery_seat: None,
            narrative,
            navigation,
        };
        player.publish_navigation();
        log::info!("walkthrough ready: {} steps", StepId::COUNT);
        Ok(player)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Run the current step forward, or skip the running step.
    pub fn advance(&mut self) -> Result<Request, WalkthroughError> {
        self.request(false)
    }

    /// Run the current step in reverse, or skip the running step.
    pub fn retreat(&mut self) -> Result<Request, WalkthroughError> {
        self.request(true)
    }

    /// Per-frame hook. Ticks the running choreography, if any, and finalizes
    /// the step when it finishes. Returns the step that finished this frame.
    pub fn update(&mut self, dt: f32) -> Result<Option<StepId>, WalkthroughError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let frame = Frame {
            interrupted: self.interrupt,
            ..Frame::new(dt)
        };
        if active.choreography.tick(&mut self.scene, frame)? == TickStatus::Continue {
            return Ok(None);
        }

        let step = active.step;
        let reverse = active.reverse;
        self.active = None;
        self.finish_step(step, reverse)?;
        Ok(Some(step))
    }

    /// Update with `dt` until no step is running. Returns the number of
    /// frames used. A `dt` that is not a positive finite number skips the
    /// running step instead, since time would never advance.
    pub fn settle(&mut self, dt: f32) -> Result<usize, WalkthroughError> {
        let advances = dt.is_finite() && dt > 0.0;
        if self.active.is_some() && !advances {
            self.interrupt = true;
        }
        let mut frames = 0;
        while self.active.is_some() {
            self.update(dt)?;
            frames += 1;
        }
        Ok(frames)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current_step(&self) -> StepId {
        self.current
    }

    pub fn index(&self) -> usize {
        self.current.index()
    }

    /// Whether a choreography is running.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Step currently animating, if any.
    pub fn running_step(&self) -> Option<StepId> {
        self.active.as_ref().map(|a| a.step)
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt
    }

    /// Navigation affordances for the current index.
    pub fn navigation(&self) -> Navigation {
        Navigation {
            previous_enabled: !self.current.is_first(),
            next_enabled: !self.current.is_last(),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn part(&self, role: PartRole) -> PartId {
        self.parts.get(role)
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn original_positions(&self) -> &OriginalPoseMap {
        &self.originals
    }

    pub fn narrative_sink(&self) -> &N {
        &self.narrative
    }

    pub fn navigation_sink(&self) -> &V {
        &self.navigation
    }

    // -----------------------------------------------------------------------
    // Step execution
    // -----------------------------------------------------------------------

    fn request(&mut self, reverse: bool) -> Result<Request, WalkthroughError> {
        if self.active.is_some() {
            if !self.interrupt {
                log::debug!("skip requested for {:?}", self.running_step());
            }
            self.interrupt = true;
            return Ok(Request::Interrupt);
        }

        let blocked = if reverse {
            self.current.is_first()
        } else {
            self.current.is_last()
        };
        if blocked {
            log::warn!(
                "ignoring {} at {:?}: end of procedure",
                if reverse { "retreat" } else { "advance" },
                self.current
            );
            return Ok(Request::AtBoundary);
        }

        let step = self.current;
        self.run_step(step, reverse)?;
        Ok(Request::Started(step))
    }

    fn run_step(&mut self, step: StepId, reverse: bool) -> Result<(), WalkthroughError> {
        self.interrupt = false;
        let definition = step.definition();
        self.narrative.show(definition.message);
        log::info!(
            "step {} {:?} ({})",
            step.index(),
            step,
            if reverse { "reverse" } else { "forward" }
        );

        match self.dispatch(definition.cue(reverse))? {
            Some(choreography) => {
                self.active = Some(ActiveStep {
                    step,
                    reverse,
                    choreography,
                });
            }
            None => self.finish_step(step, reverse)?,
        }
        Ok(())
    }

    fn finish_step(&mut self, step: StepId, reverse: bool) -> Result<(), WalkthroughError> {
        let moved = if reverse {
            self.current.prev()
        } else {
            self.current.next()
        };
        if let Some(next) = moved {
            self.current = next;
        }

        self.scene
            .set_world_pose(self.parts.tool(), self.parts.tool_rest())?;
        self.publish_navigation();
        log::debug!("finished {:?}; now at {:?}", step, self.current);
        Ok(())
    }

    fn publish_navigation(&mut self) {
        let navigation = self.navigation();
        self.navigation.set_navigation(navigation);
    }

    /// Build the choreography for a cue. `None` means there is nothing to
    /// animate.
    fn dispatch(&mut self, cue: Cue) -> Result<Option<Box<dyn Choreography>>, SceneError> {
        let duration = self.config.transform_duration;
        let tool = self.parts.tool();

        let choreography: Box<dyn Choreography> = match cue {
            Cue::Nothing => return Ok(None),
            Cue::Rotate {
                part,
                axis,
                degrees,
            } => Box::new(RotateInPlace::new(
                &self.scene,
                self.parts.get(part),
                axis,
                degrees,
                duration,
            )?),
            Cue::RotateGroup {
                group,
                pivot,
                axis,
                degrees,
            } => {
                let pivot = self.scene.world_pose(self.parts.get(pivot))?.position;
                Box::new(RotateGroupAroundPivot::new(
                    &mut self.scene,
                    self.parts.get(group),
                    pivot,
                    axis,
                    degrees,
                    duration,
                    tool,
                )?)
            }
            Cue::Slide { part, offset } => {
                let id = self.parts.get(part);
                let position = self.scene.world_pose(id)?.position;
                Box::new(MoveAndRotate::translate_to(
                    &self.scene,
                    id,
                    position + offset,
                    duration,
                )?)
            }
            Cue::Fasteners { group, insert } => Box::new(FastenerSequence::new(
                &self.scene,
                &mut self.originals,
                self.parts.get(group),
                tool,
                insert,
                self.config.fastener_duration,
                &self.config.fastener,
            )?),
            Cue::ExtractBattery { offset } => {
                let battery = self.parts.get(PartRole::OldBattery);
                let seat = match self.old_battery {
                    Some(transfer) => transfer.position,
                    None => {
                        let transfer = Transfer {
                            position: self.scene.world_pose(battery)?.position,
                            parent: self.scene.parent(battery),
                        };
                        self.old_battery = Some(transfer);
                        self.battery_seat.get_or_insert(transfer.position);
                        transfer.position
                    }
                };
                self.scene.reparent(battery, None, Reparent::KeepWorld)?;
                Box::new(MoveAndRotate::translate_to(
                    &self.scene,
                    battery,
                    seat + offset,
                    duration,
                )?)
            }
            Cue::ReturnBattery => {
                let battery = self.parts.get(PartRole::OldBattery);
                let Some(transfer) = self.old_battery.take() else {
                    log::warn!("old battery is not out; nothing to return");
                    return Ok(None);
                };
                Box::new(self.transfer_back(battery, transfer, duration)?)
            }
            Cue::InstallNewBattery => {
                let battery = self.parts.get(PartRole::NewBattery);
                let Some(seat) = self.battery_seat else {
                    log::warn!("battery seat unknown; the old battery was never removed");
                    return Ok(None);
                };
                if self.new_battery.is_none() {
                    self.new_battery = Some(Transfer {
                        position: self.scene.world_pose(battery)?.position,
                        parent: self.scene.parent(battery),
                    });
                }
                let assembly = self.parts.get(PartRole::Assembly);
                Box::new(
                    Sequence::new()
                        .then(MoveAndRotate::translate_to(
                            &self.scene,
                            battery,
                            seat,
                            duration,
                        )?)
                        .then_attach(battery, Some(assembly)),
                )
            }
            Cue::UninstallNewBattery => {
                let battery = self.parts.get(PartRole::NewBattery);
                let Some(transfer) = self.new_battery.take() else {
                    log::warn!("replacement battery is not installed; nothing to undo");
                    return Ok(None);
                };
                Box::new(self.transfer_back(battery, transfer, duration)?)
            }
        };
        Ok(Some(choreography))
    }

    /// Move `part` back to a recorded position, then restore its recorded parent.
    fn transfer_back(
        &self,
        part: PartId,
        transfer: Transfer,
        duration: f32,
    ) -> Result<Sequence, SceneError> {
        Ok(Sequence::new()
            .then(MoveAndRotate::translate_to(
                &self.scene,
                part,
                transfer.position,
                duration,
            )?)
            .then_attach(part, transfer.parent))
    }
}

impl<N: NarrativeSink, V: NavigationSink> std::fmt::Debug for StepPlayer<N, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepPlayer")
            .field("current", &self.current)
            .field("running", &self.running_step())
            .field("interrupt", &self.interrupt)
            .field("parts", &self.scene.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
