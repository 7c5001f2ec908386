use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::scene::SceneError;

/// Errors surfaced by the step player.
///
/// `Config` and `Registry` only occur at construction and are fatal: the host
/// must not continue without a player.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalkthroughError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("scene setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}
