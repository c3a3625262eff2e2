//! Mock session validator for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_test_user("alice-token", 1)
//!     .with_test_user("bob-token", 2);
//!
//! let user = validator.validate("alice-token").await?;
//! assert_eq!(user.id.as_i64(), 1);
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Token table validator. Unknown tokens return `InvalidToken`.
#[derive(Debug, Clone, Default)]
pub struct MockSessionValidator {
    tokens: HashMap<String, Result<AuthenticatedUser, AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a token to a user.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), Ok(user));
        self
    }

    /// Map a token to a user with the given numeric id.
    pub fn with_test_user(self, token: impl Into<String>, user_id: i64) -> Self {
        let user = AuthenticatedUser::new(
            UserId::from_i64(user_id),
            Some(format!("Test User {}", user_id)),
        );
        self.with_user(token, user)
    }

    /// Make a token fail with the given error.
    pub fn with_error(mut self, token: impl Into<String>, error: AuthError) -> Self {
        self.tokens.insert(token.into(), Err(error));
        self
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .unwrap_or(Err(AuthError::InvalidToken))
    }
}
