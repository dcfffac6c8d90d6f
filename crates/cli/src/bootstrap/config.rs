use doh_stub_domain::{Config, ConfigError};
use std::path::Path;

/// Load configuration from `path`, or fall back to built-in defaults
/// when no file was given.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}
