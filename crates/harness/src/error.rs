//! Error types for the harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("target unreachable at {url}: {reason}")]
    TargetUnreachable { url: String, reason: String },

    #[error("frontend failed to start: {0}")]
    ServerStartup(String),

    #[error("frontend readiness check failed after {0} attempts")]
    ServerReadiness(usize),

    #[error("node not found on PATH; the browser driver needs Node.js")]
    NodeNotFound,

    #[error("playwright not installed; install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("browser bridge error: {0}")]
    Bridge(String),

    #[error("browser bridge closed unexpectedly")]
    BridgeClosed,

    #[error("no scenario matched the requested filter")]
    NoScenariosSelected,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("driver error: {0}")]
    Driver(#[from] todocheck_contract::DriverError),

    #[error("scenario definitions: {0}")]
    Contract(#[from] todocheck_contract::ContractError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
