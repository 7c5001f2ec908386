//! Headless runner: walks the laptop battery procedure forward, then back,
//! printing the narrative and checking the scene returns to where it started.
//!
//! Run with: `RUST_LOG=info cargo run --package walkthrough-demo --example headless_runner`

use walkthrough_core::scene::snapshots_match;
use walkthrough_demo::{HeadlessSession, default_config_path, laptop_scene_path};

const TOLERANCE: f32 = 1e-3;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = default_config_path();
    let mut session = HeadlessSession::load(&laptop_scene_path(), Some(&config))
        .unwrap_or_else(|e| panic!("failed to start session: {e}"));

    let initial = session.snapshot().expect("snapshot failed");
    println!("=== Laptop battery replacement ({} parts) ===\n", initial.len());

    let steps = session.run_to_end().expect("forward walk failed");
    for (i, message) in session.messages().iter().enumerate() {
        println!("{:>2}. {message}", i + 1);
    }
    println!(
        "\nForward: {steps} steps in {} frames, now at {:?}",
        session.frames(),
        session.current_step()
    );

    // One interrupted step, then the rest of the way back.
    session.step_back().expect("step back failed");
    session.skip_forward(5).expect("skip failed");
    let back = session.rewind().expect("rewind failed");
    println!("Reverse: {back} steps, {} frames total", session.frames());

    let restored = session.snapshot().expect("snapshot failed");
    if snapshots_match(&initial, &restored, TOLERANCE) {
        println!("Round trip: PASS (scene restored)");
    } else {
        println!("Round trip: FAIL (scene differs from the start)");
        std::process::exit(1);
    }
}
