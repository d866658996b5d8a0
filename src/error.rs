use thiserror::Error;

/// Name used to prefix failures reported back to the pipeline
pub const ACTION_NAME: &str = "invalidate-cdn";

/// Every way a run can fail
///
/// Each variant is raised at most once per run; nothing is retried.
#[derive(Error, Debug)]
pub enum InvalidateError {
    /// Missing or disallowed input, detected before any side effect
    #[error("{0}")]
    Configuration(String),

    /// Version lookup, download, extraction or component install failed
    #[error("failed to provision gcloud: {0:#}")]
    Provisioning(anyhow::Error),

    /// Handing the credential file to gcloud failed
    #[error("failed to authenticate gcloud: {0:#}")]
    Authentication(anyhow::Error),

    /// The invalidation command exited non-zero
    #[error("failed to execute gcloud command `{command}`: {detail}")]
    Execution { command: String, detail: String },
}

impl InvalidateError {
    /// Message reported through the pipeline's failure channel
    pub fn report(&self) -> String {
        format!("{} failed with: {}", ACTION_NAME, self)
    }
}

pub type Result<T> = std::result::Result<T, InvalidateError>;
