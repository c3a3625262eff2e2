//! Messaging module - two-party conversations and their message log.
//!
//! - `ParticipantPair` - canonical `(min, max)` key for a conversation
//! - `Conversation` - relationship record plus last-message summary
//! - `Message` / `MessageDraft` - immutable log entries and validated input
//! - `PageRequest` / `MessagePage` - bounded windows over the log

mod conversation;
mod errors;
mod message;
mod page;
mod participant_pair;

pub use conversation::{Conversation, LastMessageSnapshot};
pub use errors::{FailureState, MessagingError};
pub use message::{Message, MessageDraft};
pub use page::{MessagePage, PageRequest, MAX_PAGE_SIZE};
pub use participant_pair::ParticipantPair;
