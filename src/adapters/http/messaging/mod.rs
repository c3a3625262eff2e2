//! HTTP adapter for direct messaging.

mod dto;
mod handlers;
mod routes;

pub use dto::ErrorResponse;
pub use handlers::{MessagingHandlers, MessagingLimits, MessagingPorts};
pub use routes::{conversation_routes, message_routes};
