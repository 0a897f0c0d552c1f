//! Error Types
//!
//! Only the outer surfaces (config, replay scripts, hook installation) are
//! fallible. The quest core itself logs and returns early instead.

use std::path::PathBuf;

use crate::host::HookPoint;

/// Alias for `Result<T, QuestError>`.
pub type QuestResult<T> = Result<T, QuestError>;

/// Errors raised outside the quest core.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    /// A file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TOML document did not match the expected shape.
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: toml::de::Error,
    },

    /// A config could not be written back out as TOML.
    #[error("failed to write config: {0}")]
    Emit(#[from] toml::ser::Error),

    /// The host does not expose the named interception point.
    #[error("interception point not found: {0}")]
    HookNotFound(HookPoint),

    /// A replay script referenced something the session cannot do.
    #[error("replay step {step}: {message}")]
    Replay { step: usize, message: String },
}
