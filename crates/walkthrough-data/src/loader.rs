//! Reads player configuration and scene description files.
//!
//! The format of each file comes from its extension (RON, TOML or JSON).
//! Configuration is validated once parsed; scene files are built into a
//! [`SceneGraph`].

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkthrough_core::config::{ConfigError, PlayerConfig};
use walkthrough_core::scene::{SceneError, SceneGraph};

use crate::schema::SceneData;

/// Base name looked up by [`find_config`].
pub const CONFIG_BASE_NAME: &str = "walkthrough";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading data files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but its values are unusable.
    #[error("invalid configuration in {file}: {source}")]
    Invalid { file: PathBuf, source: ConfigError },

    /// The scene description could not be built.
    #[error("invalid scene in {file}: {source}")]
    Scene { file: PathBuf, source: SceneError },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

/// Supported data file formats, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// Pick the format from a file's extension.
    pub fn from_path(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }
}

/// Find `walkthrough.{ron,toml,json}` in `dir`. More than one match is a
/// [`DataLoadError::ConflictingFormats`] error.
pub fn find_config(dir: &Path) -> Result<Option<PathBuf>, DataLoadError> {
    let mut candidates = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{CONFIG_BASE_NAME}.{}", format.extension())))
        .filter(|path| path.is_file());

    let Some(first) = candidates.next() else {
        return Ok(None);
    };
    match candidates.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats {
            a: first,
            b: second,
        }),
        None => {
            log::debug!("found config at {}", first.display());
            Ok(Some(first))
        }
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(path, format, &content)
}

fn deserialize_str<T: DeserializeOwned>(
    path: &Path,
    format: Format,
    content: &str,
) -> Result<T, DataLoadError> {
    let parse = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse(e.to_string())),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load and validate a player configuration. Missing fields take their
/// defaults.
pub fn load_config(path: &Path) -> Result<PlayerConfig, DataLoadError> {
    let config: PlayerConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Invalid {
        file: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load the configuration at `path`, or the built-in defaults when no path
/// is given.
pub fn load_config_or_default(path: Option<&Path>) -> Result<PlayerConfig, DataLoadError> {
    match path {
        Some(path) => load_config(path),
        None => {
            log::debug!("no config file given; using defaults");
            Ok(PlayerConfig::default())
        }
    }
}

/// Load a scene description and build its scene graph.
pub fn load_scene(path: &Path) -> Result<SceneGraph, DataLoadError> {
    let data: SceneData = deserialize_file(path)?;
    let scene = data.build().map_err(|source| DataLoadError::Scene {
        file: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded {} parts from {}", scene.len(), path.display());
    Ok(scene)
}

// ===========================================================================
// Tests
// ===========================================================================
