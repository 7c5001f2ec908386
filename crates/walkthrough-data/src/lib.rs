//! Data file loading for the walkthrough: player configuration and scene
//! descriptions in RON, TOML or JSON.

pub mod loader;
pub mod schema;

pub use loader::{
    DataLoadError, Format, find_config, load_config, load_config_or_default, load_scene,
};
pub use schema::{PartData, SceneData};
