//! Headless demo for the walkthrough engine.
//!
//! Loads a scene description and a player config from data files, then drives
//! the procedure with a fixed frame delta, logging narrative and navigation
//! output instead of rendering it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use walkthrough_demo::HeadlessSession;
//!
//! let mut session = HeadlessSession::load(scene_path, Some(config_path))?;
//! session.run_to_end()?;
//! for message in session.messages() {
//!     println!("{message}");
//! }
//! ```

pub mod error;
pub mod session;

pub use error::DemoError;
pub use session::{DEFAULT_DT, DemoPlayer, HeadlessSession, Narration, NavigationState};

use std::path::{Path, PathBuf};

/// Directory holding the bundled scene descriptions.
pub fn scenes_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/scenes"))
}

/// The bundled laptop scene.
pub fn laptop_scene_path() -> PathBuf {
    scenes_dir().join("laptop.ron")
}

/// The bundled player configuration.
pub fn default_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("walkthrough.ron")
}
