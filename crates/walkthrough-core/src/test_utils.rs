//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use glam::{Quat, Vec3};

use crate::config::PlayerConfig;
use crate::id::{PartId, PartRole};
use crate::player::StepPlayer;
use crate::pose::{Pose, axis_angle_degrees};
use crate::scene::SceneGraph;
use crate::sink::{NarrativeSink, Navigation, NavigationSink};
use crate::step::StepId;

pub use crate::scene::snapshots_match;

/// One 60 Hz frame.
pub const FRAME: f32 = 1.0 / 60.0;

/// Pose tolerance for round-trip assertions.
pub const TOLERANCE: f32 = 1e-4;

// ===========================================================================
// Recording sinks
// ===========================================================================

/// Every narrative message, in order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog(pub Vec<String>);

impl NarrativeSink for MessageLog {
    fn show(&mut self, message: &str) {
        self.0.push(message.to_string());
    }
}

/// Every navigation update, in order.
#[derive(Debug, Clone, Default)]
pub struct NavigationLog(pub Vec<Navigation>);

impl NavigationLog {
    pub fn last(&self) -> Option<Navigation> {
        self.0.last().copied()
    }
}

impl NavigationSink for NavigationLog {
    fn set_navigation(&mut self, navigation: Navigation) {
        self.0.push(navigation);
    }
}

pub type TestPlayer = StepPlayer<MessageLog, NavigationLog>;

// ===========================================================================
// Scene fixture
// ===========================================================================

/// The canonical laptop: an assembly root named `Laptop` whose direct
/// children are every required part plus a couple of extras. Screws1 has four
/// screws, Screws2 has three.
pub fn laptop_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    let laptop = scene
        .add_part("Laptop", None, Pose::from_position(Vec3::new(0.0, 0.75, 0.0)))
        .unwrap();

    let child = |scene: &mut SceneGraph, name: &str, position: Vec3, rotation: Quat| {
        scene
            .add_part(name, Some(laptop), Pose::new(position, rotation))
            .unwrap()
    };

    child(&mut scene, "Base", Vec3::ZERO, Quat::IDENTITY);
    let monitor = child(
        &mut scene,
        "Monitor",
        Vec3::new(0.0, 0.012, -0.115),
        axis_angle_degrees(Vec3::X, -15.0),
    );
    scene
        .add_part("Screen", Some(monitor), Pose::from_position(Vec3::new(0.0, 0.11, 0.0)))
        .unwrap();
    child(
        &mut scene,
        "CoverElectronics",
        Vec3::new(0.08, -0.012, 0.04),
        Quat::IDENTITY,
    );
    child(
        &mut scene,
        "BatteryOld",
        Vec3::new(0.1, -0.006, 0.07),
        Quat::IDENTITY,
    );
    child(
        &mut scene,
        "CasingDisk",
        Vec3::new(-0.14, -0.004, 0.01),
        Quat::IDENTITY,
    );

    let screws1 = child(&mut scene, "Screws1", Vec3::new(0.0, -0.013, 0.0), Quat::IDENTITY);
    for (i, x) in [-0.15_f32, -0.05, 0.05, 0.15].into_iter().enumerate() {
        scene
            .add_part(
                &format!("Screw1_{i}"),
                Some(screws1),
                Pose::new(Vec3::new(x, 0.0, 0.1), axis_angle_degrees(Vec3::X, 180.0)),
            )
            .unwrap();
    }
    let screws2 = child(&mut scene, "Screws2", Vec3::new(0.16, -0.008, 0.0), Quat::IDENTITY);
    for (i, z) in [-0.06_f32, 0.0, 0.06].into_iter().enumerate() {
        scene
            .add_part(
                &format!("Screw2_{i}"),
                Some(screws2),
                Pose::new(Vec3::new(0.0, 0.0, z), axis_angle_degrees(Vec3::Z, 90.0)),
            )
            .unwrap();
    }

    child(
        &mut scene,
        "screwdriver",
        Vec3::new(0.45, 0.05, 0.3),
        axis_angle_degrees(Vec3::Y, 30.0),
    );
    child(
        &mut scene,
        "batteryNew",
        Vec3::new(0.55, 0.0, 0.2),
        Quat::IDENTITY,
    );
    scene
}

// ===========================================================================
// Player helpers
// ===========================================================================

pub fn new_player() -> TestPlayer {
    StepPlayer::new(
        laptop_scene(),
        PlayerConfig::default(),
        MessageLog::default(),
        NavigationLog::default(),
    )
    .unwrap()
}

/// A fresh player advanced (each step run to completion) until `step` is current.
pub fn player_at(step: StepId) -> TestPlayer {
    let mut player = new_player();
    while player.current_step() < step {
        player.advance().unwrap();
        player.settle(FRAME).unwrap();
    }
    player
}

/// World pose of every part, in storage order.
pub fn snapshot<N: NarrativeSink, V: NavigationSink>(
    player: &StepPlayer<N, V>,
) -> Vec<(PartId, Pose)> {
    player.scene().snapshot().unwrap()
}

/// World positions of the fasteners in a group, in authored order.
pub fn fastener_positions<N: NarrativeSink, V: NavigationSink>(
    player: &StepPlayer<N, V>,
    group: PartRole,
) -> Vec<(PartId, Vec3)> {
    let scene = player.scene();
    scene
        .children(player.part(group))
        .iter()
        .map(|&id| (id, scene.world_pose(id).unwrap().position))
        .collect()
}
