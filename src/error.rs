// ABOUTME: Application-wide error types for rollcheck.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::status::{ClientError, StatusCheckFailed};
use crate::types::ParseResourceIdError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid resource: {0}")]
    InvalidResource(#[from] ParseResourceIdError),

    #[error("no resources to check: pass them as arguments or list them under `resources`")]
    NoResources,

    #[error("kubectl client unavailable: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    StatusCheck(#[from] StatusCheckFailed),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
