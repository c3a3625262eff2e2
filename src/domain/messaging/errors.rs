//! Messaging-specific error types.

use serde::Serialize;

use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, MessageId, UserId,
};
use crate::ports::StoreError;

/// What the caller may assume about state after a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureState {
    /// Nothing was written; resubmitting is safe.
    Unchanged,
    /// The write may have committed; re-fetch before acting again.
    Indeterminate,
}

/// Messaging errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// Malformed or out-of-range input.
    ValidationFailed { field: String, message: String },
    /// Conversation does not exist (or is hidden from the caller).
    ConversationNotFound(ConversationId),
    /// Message does not exist (or is hidden from the caller).
    MessageNotFound(MessageId),
    /// Identity does not resolve in the user directory.
    UserNotFound(UserId),
    /// Caller is not a participant, not the sender, or not the receiver.
    Forbidden(String),
    /// Creation race that could not be resolved by re-fetching.
    Conflict(String),
    /// Transient store failure; always retryable for reads.
    Unavailable { message: String, state: FailureState },
    /// Non-transient infrastructure error.
    Infrastructure(String),
}

impl MessagingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MessagingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MessagingError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        MessagingError::Conflict(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MessagingError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            MessagingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MessagingError::ConversationNotFound(_) => ErrorCode::ConversationNotFound,
            MessagingError::MessageNotFound(_) => ErrorCode::MessageNotFound,
            MessagingError::UserNotFound(_) => ErrorCode::UserNotFound,
            MessagingError::Forbidden(_) => ErrorCode::Forbidden,
            MessagingError::Conflict(_) => ErrorCode::Conflict,
            MessagingError::Unavailable { .. } => ErrorCode::ServiceUnavailable,
            MessagingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            MessagingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MessagingError::ConversationNotFound(id) => format!("Conversation not found: {}", id),
            MessagingError::MessageNotFound(id) => format!("Message not found: {}", id),
            MessagingError::UserNotFound(id) => format!("User not found: {}", id),
            MessagingError::Forbidden(msg) => msg.clone(),
            MessagingError::Conflict(msg) => format!("Conflict: {}", msg),
            MessagingError::Unavailable { message, .. } => {
                format!("Temporarily unavailable: {}", message)
            }
            MessagingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Whether resubmitting the same request is safe.
    ///
    /// Indeterminate failures are not: the caller has to reconcile first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MessagingError::Unavailable {
                state: FailureState::Unchanged,
                ..
            }
        )
    }

    /// State guarantee attached to transient failures.
    pub fn failure_state(&self) -> Option<FailureState> {
        match self {
            MessagingError::Unavailable { state, .. } => Some(*state),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MessagingError {}

impl From<DomainError> for MessagingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => MessagingError::ValidationFailed {
                field: err.detail("field").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            ErrorCode::Forbidden | ErrorCode::Unauthorized => {
                MessagingError::Forbidden(err.message)
            }
            ErrorCode::Conflict => MessagingError::Conflict(err.message),
            ErrorCode::ServiceUnavailable => MessagingError::Unavailable {
                message: err.message,
                state: FailureState::Unchanged,
            },
            _ => MessagingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<StoreError> for MessagingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => MessagingError::Unavailable {
                message: msg,
                state: FailureState::Unchanged,
            },
            StoreError::CommitUncertain(msg) => MessagingError::Unavailable {
                message: msg,
                state: FailureState::Indeterminate,
            },
            StoreError::UniqueViolation(msg) => MessagingError::Conflict(msg),
            StoreError::NotFound(msg) | StoreError::Database(msg) => {
                MessagingError::Infrastructure(msg)
            }
        }
    }
}
