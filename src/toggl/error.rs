use reqwest::StatusCode;

/// Failure of a single upstream Toggl call.
#[derive(Debug, thiserror::Error)]
pub enum TogglError {
    /// Neither an API token nor an email/password pair is configured.
    #[error("API token not configured")]
    MissingCredentials,

    /// Upstream answered with a non-2xx status. `body` is already sanitized.
    #[error("Toggl API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("Toggl request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode Toggl response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid Toggl URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl TogglError {
    /// HTTP status of an upstream rejection, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
