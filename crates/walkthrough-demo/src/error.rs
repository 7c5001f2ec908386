use std::path::PathBuf;

use walkthrough_core::WalkthroughError;
use walkthrough_data::DataLoadError;

/// Errors that can occur in a headless demo session.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Failed to load the scene description.
    #[error("failed to load scene {file}: {source}")]
    Scene {
        file: PathBuf,
        source: DataLoadError,
    },

    /// Failed to load the player configuration.
    #[error("failed to load config: {0}")]
    Config(#[source] DataLoadError),

    /// The player could not be built or failed while running.
    #[error(transparent)]
    Walkthrough(#[from] WalkthroughError),

    /// A step did not finish within the frame budget.
    #[error("step {step} did not finish within {frames} frames")]
    Stalled { step: String, frames: usize },
}
