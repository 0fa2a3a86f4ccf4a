//! Error types for the plugin.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a plugin invocation.
///
/// Missing data is never an error here: a device without attribute rows or a
/// state file that cannot be parsed simply produces less output.
#[derive(Debug, Error)]
pub enum PluginError {
    /// `MUNIN_STATEFILE` is not set.
    #[error("environment variable not defined: {0}")]
    MissingStateFile(&'static str),

    /// No override was given and `smartctl` is not on the search path.
    #[error("no executable provided for smartctl")]
    SmartctlNotFound,

    /// The environment could not be read into settings.
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The state file could not be written.
    #[error("failed to write state file {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state map could not be serialized.
    #[error("failed to serialize state: {0}")]
    StateEncode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
