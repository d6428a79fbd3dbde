pub mod paths;
pub mod settings;
pub mod validation;

use thiserror::Error;

pub use paths::AppPaths;
pub use settings::{LlmSettings, RagSettings, ServerSettings, Settings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Env { key: String, reason: String },
    #[error("invalid config at '{path}': {reason}")]
    Invalid { path: String, reason: String },
}
