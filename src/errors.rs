// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::JobId;

#[derive(Error, Debug)]
pub enum BatchpoolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found in queue: {0}")]
    JobNotFound(JobId),

    #[error("Job handle already queued as {0}")]
    AlreadyQueued(JobId),

    #[error("Job identities exhausted")]
    IdsExhausted,

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BatchpoolError>;
