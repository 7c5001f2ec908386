use std::path::Path;

use walkthrough_core::config::PlayerConfig;
use walkthrough_core::player::{Request, StepPlayer};
use walkthrough_core::pose::Pose;
use walkthrough_core::scene::SceneGraph;
use walkthrough_core::sink::{NarrativeSink, Navigation, NavigationSink};
use walkthrough_core::step::StepId;
use walkthrough_core::{PartId, WalkthroughError};

use crate::error::DemoError;

/// 60 Hz.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Frames a single step may take before the session gives up on it.
pub const MAX_FRAMES_PER_STEP: usize = 100_000;

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Narrative sink that logs each message and keeps a transcript.
#[derive(Debug, Default)]
pub struct Narration {
    messages: Vec<String>,
}

impl Narration {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl NarrativeSink for Narration {
    fn show(&mut self, message: &str) {
        log::info!("narrative: {message}");
        self.messages.push(message.to_string());
    }
}

/// Navigation sink that keeps the latest affordances.
#[derive(Debug, Default)]
pub struct NavigationState {
    current: Navigation,
    updates: usize,
}

impl NavigationState {
    pub fn current(&self) -> Navigation {
        self.current
    }

    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl NavigationSink for NavigationState {
    fn set_navigation(&mut self, navigation: Navigation) {
        log::debug!(
            "navigation: previous={} next={}",
            navigation.previous_enabled,
            navigation.next_enabled
        );
        self.current = navigation;
        self.updates += 1;
    }
}

pub type DemoPlayer = StepPlayer<Narration, NavigationState>;

// ---------------------------------------------------------------------------
// HeadlessSession
// ---------------------------------------------------------------------------

/// Drives a player with a fixed frame delta, the way a host frame loop would.
#[derive(Debug)]
pub struct HeadlessSession {
    player: DemoPlayer,
    dt: f32,
    frames: usize,
}

impl HeadlessSession {
    /// Load a scene description and an optional config file, then build the
    /// player.
    pub fn load(scene_path: &Path, config_path: Option<&Path>) -> Result<Self, DemoError> {
        let scene = walkthrough_data::load_scene(scene_path).map_err(|source| DemoError::Scene {
            file: scene_path.to_path_buf(),
            source,
        })?;
        let config =
            walkthrough_data::load_config_or_default(config_path).map_err(DemoError::Config)?;
        Self::new(scene, config)
    }

    pub fn new(scene: SceneGraph, config: PlayerConfig) -> Result<Self, DemoError> {
        let player = StepPlayer::new(
            scene,
            config,
            Narration::default(),
            NavigationState::default(),
        )?;
        Ok(Self {
            player,
            dt: DEFAULT_DT,
            frames: 0,
        })
    }

    /// Use a different frame delta for subsequent steps.
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn player(&self) -> &DemoPlayer {
        &self.player
    }

    /// Frames driven so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn messages(&self) -> &[String] {
        self.player.narrative_sink().messages()
    }

    pub fn navigation(&self) -> Navigation {
        self.player.navigation_sink().current()
    }

    pub fn current_step(&self) -> StepId {
        self.player.current_step()
    }

    /// Advance and run the step to completion.
    pub fn step_forward(&mut self) -> Result<Request, DemoError> {
        let request = self.player.advance()?;
        self.drive()?;
        Ok(request)
    }

    /// Retreat and run the step to completion.
    pub fn step_back(&mut self) -> Result<Request, DemoError> {
        let request = self.player.retreat()?;
        self.drive()?;
        Ok(request)
    }

    /// Advance, let the step run for `frames` frames, then skip the rest.
    pub fn skip_forward(&mut self, frames: usize) -> Result<Request, DemoError> {
        let request = self.player.advance()?;
        for _ in 0..frames {
            if !self.player.is_busy() {
                break;
            }
            self.frame()?;
        }
        if self.player.is_busy() {
            self.player.advance()?;
        }
        self.drive()?;
        Ok(request)
    }

    /// Step forward until the last step. Returns the number of steps run.
    pub fn run_to_end(&mut self) -> Result<usize, DemoError> {
        let mut steps = 0;
        while !self.player.current_step().is_last() {
            self.step_forward()?;
            steps += 1;
        }
        log::info!("reached {:?} after {} frames", self.current_step(), self.frames);
        Ok(steps)
    }

    /// Step back until the first step. Returns the number of steps run.
    pub fn rewind(&mut self) -> Result<usize, DemoError> {
        let mut steps = 0;
        while !self.player.current_step().is_first() {
            self.step_back()?;
            steps += 1;
        }
        log::info!("rewound to {:?} after {} frames", self.current_step(), self.frames);
        Ok(steps)
    }

    /// World pose of every part.
    pub fn snapshot(&self) -> Result<Vec<(PartId, Pose)>, DemoError> {
        Ok(self
            .player
            .scene()
            .snapshot()
            .map_err(WalkthroughError::from)?)
    }

    fn frame(&mut self) -> Result<(), DemoError> {
        self.player.update(self.dt)?;
        self.frames += 1;
        Ok(())
    }

    fn drive(&mut self) -> Result<(), DemoError> {
        let mut frames = 0;
        while self.player.is_busy() {
            if frames >= MAX_FRAMES_PER_STEP {
                return Err(DemoError::Stalled {
                    step: format!("{:?}", self.player.running_step()),
                    frames,
                });
            }
            self.frame()?;
            frames += 1;
        }
        Ok(())
    }
}
