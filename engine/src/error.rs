/// Everything an operation on the game state can be rejected with.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// Malformed or out-of-range input, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// A referenced user, team, match, tournament or bracket slot is absent.
    #[error("{0}")]
    NotFound(String),

    /// The resource exists but belongs to someone else.
    #[error("{0}")]
    Forbidden(String),

    /// The action is invalid for the current lifecycle state, or a write lost
    /// an optimistic-concurrency race.
    #[error("{0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DraftError {
    pub fn not_found(what: &str) -> Self {
        DraftError::NotFound(format!("{what} not found"))
    }

    /// HTTP-equivalent status for the boundary layer.
    pub fn status_code(&self) -> u16 {
        match self {
            DraftError::Validation(_) => 400,
            DraftError::Forbidden(_) => 403,
            DraftError::NotFound(_) => 404,
            DraftError::Conflict(_) => 409,
            DraftError::Storage(_) => 500,
        }
    }

    /// Message safe to hand to a client. Storage details never leave the server.
    pub fn public_message(&self, fallback: &str) -> String {
        match self {
            DraftError::Storage(_) => fallback.to_owned(),
            other => other.to_string(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, DraftError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, DraftError>;
