//! Error taxonomy.
//!
//! Every failure a caller can see is one of four kinds: the input was rejected locally
//! ([`ValidationError`]), the server or network failed ([`ApiError`]), a code could not be
//! generated ([`CodeError`]), or the client-side state actor is gone
//! ([`dinein_actor::ActorError`]). [`DineInError`] wraps all of them.

use crate::codes::CodeError;
use crate::model::{OrderId, OrderStatus, Role};
use dinein_actor::ActorError;
use thiserror::Error;

/// Input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please enter your table number")]
    MissingTableNumber,

    #[error("An order is already being placed")]
    SubmissionInProgress,

    #[error("Please enter a valid phone number")]
    InvalidPhone,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("{0} is required")]
    BlankField(&'static str),

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("Cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} is not on the board")]
    UnknownOrder(OrderId),

    #[error("Order {0} is still being updated")]
    WriteInFlight(OrderId),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

/// Failure at the REST boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No token is stored for the role the endpoint needs.
    #[error("Not logged in as {0}")]
    Unauthorized(Role),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for rejections a refresh can explain (another client got there first).
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(400) | Some(409))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Any error the client library returns.
#[derive(Debug, Error)]
pub enum DineInError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Actor(#[from] ActorError),
}

impl DineInError {
    /// Single line suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            DineInError::Api(ApiError::Network(_)) => {
                "Could not reach the restaurant. Please try again.".to_string()
            }
            DineInError::Api(ApiError::Unauthorized(_)) => "Please log in again.".to_string(),
            DineInError::Actor(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DineInError::Validation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            DineInError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = DineInError> = std::result::Result<T, E>;
