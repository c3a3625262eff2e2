//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `ConversationRepository` - Pair-keyed conversation records
//! - `MessageRepository` - Append-only message log plus summary upkeep
//! - `ReadStateRepository` - Read flags and unread aggregates
//!
//! ## Collaborator Ports
//!
//! - `UserDirectory` / `ProfileDirectory` - Identities and display metadata
//! - `SessionValidator` - Bearer token validation

mod conversation_repository;
mod message_repository;
mod read_state_repository;
mod session_validator;
mod store_error;
mod user_directory;

pub use conversation_repository::ConversationRepository;
pub use message_repository::{AppendResult, MessageRepository, SnapshotPolicy};
pub use read_state_repository::ReadStateRepository;
pub use session_validator::SessionValidator;
pub use store_error::StoreError;
pub use user_directory::{ProfileDirectory, UserDirectory, UserProfile};
