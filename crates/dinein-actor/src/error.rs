//! # Actor Errors
//!
//! Errors raised by the state actor runtime itself, as opposed to the entity errors it
//! carries back to the caller.

/// Errors that can occur while talking to a state actor.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("State actor closed")]
    Closed,
    #[error("State actor dropped response channel")]
    Dropped,
    #[error("Rejected: {0}")]
    Entity(Box<dyn std::error::Error + Send + Sync>),
}

impl ActorError {
    /// Recovers the concrete entity error, if this is one of type `E`.
    pub fn into_entity<E: std::error::Error + 'static>(self) -> Result<E, Self> {
        match self {
            ActorError::Entity(inner) => match inner.downcast::<E>() {
                Ok(e) => Ok(*e),
                Err(other) => Err(ActorError::Entity(other)),
            },
            other => Err(other),
        }
    }
}
