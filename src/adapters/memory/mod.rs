//! In-memory adapters.
//!
//! Selected when `database.url` is `memory://`, and used throughout the
//! test suite.

mod messaging_store;
mod user_directory;

pub use messaging_store::InMemoryMessagingStore;
pub use user_directory::InMemoryUserDirectory;
