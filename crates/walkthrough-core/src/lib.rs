//! Walkthrough Core -- a step-by-step animated repair walkthrough engine.
//!
//! This crate drives a fixed sixteen-step procedure (replacing a laptop
//! battery) over a scene graph of named parts. The host owns the frame loop
//! and feeds it deltas; the player animates parts, publishes narrative text
//! and keeps navigation state up to date.
//!
//! # Step Lifecycle
//!
//! 1. **Request** -- [`player::StepPlayer::advance`] or
//!    [`player::StepPlayer::retreat`] starts the current step's cue for that
//!    direction, or flags a skip if a step is already running.
//! 2. **Animate** -- each [`player::StepPlayer::update`] ticks the running
//!    [`choreography::Choreography`] with the frame delta.
//! 3. **Finish** -- the index moves one step, the tool returns to rest and
//!    navigation is republished.
//!
//! ```rust,ignore
//! let mut player = StepPlayer::new(scene, PlayerConfig::default(), narrative, navigation)?;
//! player.advance()?;
//! while player.is_busy() {
//!     player.update(1.0 / 60.0)?;
//! }
//! ```
//!
//! # Key Types
//!
//! - [`scene::SceneGraph`] -- Named parts with explicit parent ownership;
//!   world poses derived from the parent chain.
//! - [`registry::PartRegistry`] -- Required parts resolved once by name.
//! - [`step::StepId`] / [`step::STEPS`] -- The ordered procedure table.
//! - [`choreography`] -- Frame-driven animations that snap to their end
//!   state when interrupted.
//! - [`fastener::FastenerSequence`] -- Tool-driven removal and insertion of
//!   fasteners.
//! - [`player::StepPlayer`] -- The state machine tying it all together.

pub mod choreography;
pub mod config;
pub mod error;
pub mod fastener;
pub mod id;
pub mod player;
pub mod pose;
pub mod registry;
pub mod scene;
pub mod sink;
pub mod step;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::PlayerConfig;
pub use error::WalkthroughError;
pub use id::{PartId, PartRole};
pub use player::{Request, StepPlayer};
pub use pose::Pose;
pub use scene::SceneGraph;
pub use sink::{NarrativeSink, Navigation, NavigationSink};
pub use step::StepId;
