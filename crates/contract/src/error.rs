//! Error types for the contract crate

use thiserror::Error;

/// Errors raised by a [`crate::Driver`] implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("action failed: {action}: {reason}")]
    Action { action: String, reason: String },

    #[error("check could not be evaluated: {0}")]
    Evaluate(String),

    #[error("driver session lost: {0}")]
    Session(String),

    #[error("artifact capture failed: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Shorthand for an action-level failure.
    pub fn action(action: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DriverError::Action {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised while loading or validating scenario definitions.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("duplicate scenario name: {0}")]
    DuplicateScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ContractResult<T> = Result<T, ContractError>;
