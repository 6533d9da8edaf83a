use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketsError {
    #[error("not initialized: run 'tickets init'")]
    NotInitialized,

    #[error("secrets file not found: {0}")]
    SecretsNotFound(String),

    #[error("missing secret '{0}': set it in secrets.json or the environment")]
    MissingSecret(String),

    #[error("invalid interval: {0} seconds")]
    InvalidInterval(u64),

    #[error("tracker returned {status}: {body}")]
    Tracker { status: u16, body: String },

    #[error("unexpected tracker response: {0}")]
    TrackerResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TicketsError {
    /// True when the tracker could not be reached at all, as opposed to the
    /// tracker rejecting a single request.
    pub fn is_unreachable(&self) -> bool {
        match self {
            TicketsError::Http(e) => e.is_connect() || e.is_timeout(),
            TicketsError::Tracker { status, .. } => {
                matches!(status, 502..=504) || *status == 401 || *status == 403
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TicketsError>;
