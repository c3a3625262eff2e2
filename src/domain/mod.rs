//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `messaging` - Conversations, messages, read state and paging rules

pub mod foundation;
pub mod messaging;
