//! Error type shared by the pipeline backends.

use thiserror::Error;

/// Failures a backend call can surface to its caller.
///
/// Malformed model output is never an error: backends degrade it to an empty
/// result themselves. Only transport-level problems reach this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no API key configured for the language-model backend (set GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("language-model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("language-model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode language-model response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
