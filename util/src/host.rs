//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable holding the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "MAP_VIEW_ROOT";

/// The software root environment variable is not set.
#[derive(Debug, thiserror::Error)]
#[error("The software root environment variable ({}) is not set", SW_ROOT_ENV_VAR)]
pub struct RootNotSet;

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, RootNotSet> {
    match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(p) => Ok(PathBuf::from(p)),
        None => Err(RootNotSet)
    }
}
