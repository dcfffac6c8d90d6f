use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },
}
