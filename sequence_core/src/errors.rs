//! Server-wide error taxonomy.

use thiserror::Error;

/// Errors surfaced to request handlers.
///
/// Every user-facing operation returns exactly one of these. Invariant
/// violations are wrapped in [`ServerError::Internal`]; the display text
/// stays generic while the detail is kept for the server log.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ServerError {
    /// Malformed or out-of-range request field
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Display name is on the reserved list
    #[error("that name is reserved")]
    NameReserved,

    /// Display name already held by a live session
    #[error("that name is already taken")]
    NameTaken,

    /// Missing or expired session token
    #[error("unauthorized")]
    Unauthorized,

    /// Caller lacks the required role (e.g. non-host starting a game)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request conflicts with current state (already in a room, room full,
    /// wrong password, not your turn, game not active, team full)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Card/cell incompatibility in a turn request
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Invariant violation; specifics go to the log, not the client
    #[error("internal server error")]
    Internal(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Detail string for the server log. For `Internal` this carries the
    /// specifics that the display message deliberately omits.
    pub fn log_detail(&self) -> String {
        match self {
            Self::Internal(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_display_stays_generic() {
        let err = ServerError::Internal("deck cursor past 104".to_string());
        assert_eq!(err.to_string(), "internal server error");
        assert!(err.log_detail().contains("deck cursor"));
    }
}
