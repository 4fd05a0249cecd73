//! Error types for the integration suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("setup job reported a Failed condition; last logs:\n{logs}")]
    JobFailed { logs: String },

    #[error("setup job did not complete within {elapsed_secs}s; last status: {last_status}")]
    JobTimeout {
        elapsed_secs: u64,
        last_status: String,
    },

    #[error("orchestrator query failed: {0}")]
    Orchestrator(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("browser script failed: {0}")]
    Browser(String),

    #[error("step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("OpenProject API request failed: {method} {endpoint} - {status}: {body}")]
    Api {
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("OpenProject user '{0}' not found via API")]
    UserNotFound(String),

    #[error("configuration error: {0}")]
    Config(#[from] opnc_common::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
