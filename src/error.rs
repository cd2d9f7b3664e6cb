//! Error taxonomy shared by the server, blockchain and facade layers.

use thiserror::Error;

/// Errors surfaced by every SDK operation.
///
/// The variant is the error kind; the payload is the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnisonError {
    /// A caller-supplied argument failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing credentials, missing signer, or caller lacks the required role.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// A referenced contract, interaction or project does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The GraphQL backend or the chain reported a failure.
    #[error("Remote failure: {0}")]
    Remote(String),

    /// The requested state change is already in effect.
    #[error("Already in state: {0}")]
    AlreadyInState(String),
}

impl UnisonError {
    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotAuthorized(m)
            | Self::NotFound(m)
            | Self::Remote(m)
            | Self::AlreadyInState(m) => m,
        }
    }
}

impl From<reqwest::Error> for UnisonError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(format!("GraphQL transport error: {}", err))
    }
}

/// Result type for SDK operations.
pub type UnisonResult<T> = Result<T, UnisonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UnisonError::NotFound("The interactionId is not found".into());
        assert_eq!(err.to_string(), "Not found: The interactionId is not found");
        assert_eq!(err.message(), "The interactionId is not found");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let a = UnisonError::AlreadyInState("x".into());
        let b = UnisonError::InvalidArgument("x".into());
        assert_ne!(a, b);
    }
}
