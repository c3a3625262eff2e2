//! Canonical unordered pair of conversation participants.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, UserId};

/// Unordered pair of distinct users, stored as `(min, max)`.
///
/// Both call orders normalize to the same value, so the pair can key a
/// conversation directly.
///
/// # Invariants
///
/// - `low < high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// Canonicalizes two identities into a pair.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if both identities are the same user
    pub fn new(a: UserId, b: UserId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::validation(
                "other_user_id",
                "Cannot start a conversation with yourself",
            ));
        }
        Ok(Self {
            low: a.min(b),
            high: a.max(b),
        })
    }

    /// Reconstitute a pair from persistence.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the stored columns violate `low < high`
    pub fn from_canonical(low: UserId, high: UserId) -> Result<Self, DomainError> {
        if low >= high {
            return Err(DomainError::validation(
                "participant_low",
                format!("Stored pair ({}, {}) is not canonical", low, high),
            ));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    /// Checks whether the user is one of the two participants.
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// Returns the participant that is not `user`, or `None` for outsiders.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}
