use glam::Vec3;
use walkthrough_core::config::PlayerConfig;
use walkthrough_core::id::PartRole;
use walkthrough_core::player::Request;
use walkthrough_core::scene::snapshots_match;
use walkthrough_core::sink::Navigation;
use walkthrough_core::step::StepId;
use walkthrough_demo::{DemoError, HeadlessSession, default_config_path, laptop_scene_path};

fn session() -> HeadlessSession {
    HeadlessSession::load(&laptop_scene_path(), Some(&default_config_path())).unwrap()
}

// -----------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------

#[test]
fn bundled_config_matches_defaults() {
    let config = walkthrough_data::load_config(&default_config_path()).unwrap();
    assert_eq!(config, PlayerConfig::default());
}

#[test]
fn bundled_scene_resolves_every_part() {
    let session = session();
    let player = session.player();
    assert_eq!(session.current_step(), StepId::WelcomeMessage);
    assert_eq!(
        player.scene().children(player.part(PartRole::FastenersA)).len(),
        4
    );
    assert_eq!(
        player.scene().children(player.part(PartRole::FastenersB)).len(),
        3
    );
    assert_eq!(player.scene().parent(player.parts().tool()), None);
    assert_eq!(
        session.navigation(),
        Navigation {
            previous_enabled: false,
            next_enabled: true
        }
    );
}

#[test]
fn missing_scene_file_is_reported() {
    let err = HeadlessSession::load(&laptop_scene_path().with_file_name("nope.ron"), None)
        .unwrap_err();
    assert!(matches!(err, DemoError::Scene { .. }));
}

#[test]
fn scene_without_required_part_fails_to_start() {
    let config = PlayerConfig {
        parts: walkthrough_core::config::PartNames {
            monitor: "Display".to_string(),
            ..Default::default()
        },
        ..PlayerConfig::default()
    };
    let scene = walkthrough_data::load_scene(&laptop_scene_path()).unwrap();
    let err = HeadlessSession::new(scene, config).unwrap_err();
    assert!(matches!(err, DemoError::Walkthrough(_)));
    assert!(err.to_string().contains("Display"));
}

// -----------------------------------------------------------------------
// Walking
// -----------------------------------------------------------------------

#[test]
fn run_to_end_shows_every_message_once() {
    let mut session = session();
    assert_eq!(session.run_to_end().unwrap(), 15);
    assert_eq!(session.current_step(), StepId::FinalMessage);
    assert_eq!(session.messages().len(), 15);
    assert_eq!(session.messages()[1], "Close the Laptop");
    assert_eq!(
        session.navigation(),
        Navigation {
            previous_enabled: true,
            next_enabled: false
        }
    );
    assert!(session.frames() > 60);
}

#[test]
fn round_trip_restores_the_scene() {
    let mut session = session();
    let initial = session.snapshot().unwrap();
    session.run_to_end().unwrap();
    assert_eq!(session.rewind().unwrap(), 15);
    assert!(snapshots_match(&initial, &session.snapshot().unwrap(), 1e-3));
}

#[test]
fn skipping_matches_playing_through() {
    let mut played = session();
    let mut skipped = session();
    for _ in 0..StepId::COUNT - 1 {
        played.step_forward().unwrap();
        skipped.skip_forward(3).unwrap();
    }
    assert!(skipped.frames() < played.frames());
    assert!(snapshots_match(
        &played.snapshot().unwrap(),
        &skipped.snapshot().unwrap(),
        1e-3
    ));
}

#[test]
fn coarse_frames_land_on_the_same_state() {
    let mut fine = session();
    let mut coarse = session().with_dt(0.35);
    fine.run_to_end().unwrap();
    coarse.run_to_end().unwrap();
    assert!(coarse.frames() < fine.frames());
    assert!(snapshots_match(
        &fine.snapshot().unwrap(),
        &coarse.snapshot().unwrap(),
        1e-3
    ));
}

#[test]
fn boundaries_report_without_moving() {
    let mut session = session();
    assert_eq!(session.step_back().unwrap(), Request::AtBoundary);
    session.run_to_end().unwrap();
    assert_eq!(session.step_forward().unwrap(), Request::AtBoundary);
    assert_eq!(session.current_step(), StepId::FinalMessage);
}

#[test]
fn old_battery_ends_outside_the_laptop() {
    let mut session = session();
    session.run_to_end().unwrap();
    let player = session.player();
    let old = player.part(PartRole::OldBattery);
    let new = player.part(PartRole::NewBattery);
    let assembly = player.part(PartRole::Assembly);
    assert_eq!(player.scene().parent(old), None);
    assert_eq!(player.scene().parent(new), Some(assembly));
    let gap = player.scene().world_pose(old).unwrap().position
        - player.scene().world_pose(new).unwrap().position;
    assert!(gap.length() > Vec3::new(0.8, 0.2, 0.2).length() * 0.5);
}
