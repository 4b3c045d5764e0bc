use thiserror::Error;

use crate::graphics::BufferTarget;

/// Errors raised while setting up or feeding the sprite renderer.
///
/// Per-frame conditions (unresolved textures, a full batch, an empty flush)
/// are handled by branching and never show up here.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("batch capacity {0} is outside 1..={max}", max = crate::graphics::MAX_CAPACITY)]
    InvalidCapacity(usize),
    #[error("failed to create {target:?} buffer of {len} bytes: {reason}")]
    BufferCreation {
        target: BufferTarget,
        len: usize,
        reason: String,
    },
    #[error("failed to create program '{label}': {reason}")]
    ProgramCreation { label: String, reason: String },
    #[error("failed to upload texture {0}: {1}")]
    TextureUpload(u64, String),
    #[error("renderer is not ready: {0}")]
    NotReady(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a [`RendererConfig`](crate::RendererConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
