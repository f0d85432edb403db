//! Where FreelanceDesk keeps its files.
//!
//! Everything lives under one home directory: `FREELANCEDESK_HOME` when set,
//! otherwise `<platform data dir>/FreelanceDesk`
//! (`~/.local/share/FreelanceDesk` on Linux).

use std::path::PathBuf;

use crate::constants::{APP_DIR_NAME, DB_FILE_NAME};
use crate::error::{FdError, FdResult};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "FREELANCEDESK_HOME";

/// Home directory holding the config file, database and logs.
pub fn home_dir() -> FdResult<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    dirs::data_dir()
        .map(|base| base.join(APP_DIR_NAME))
        .ok_or_else(|| FdError::Config("could not determine data directory".into()))
}

pub fn config_file() -> FdResult<PathBuf> {
    Ok(home_dir()?.join("config.toml"))
}

pub fn database_file() -> FdResult<PathBuf> {
    Ok(home_dir()?.join(DB_FILE_NAME))
}

pub fn log_dir() -> FdResult<PathBuf> {
    Ok(home_dir()?.join("logs"))
}
