//! HTTP adapters - REST API implementations.

pub mod messaging;
pub mod middleware;
mod router;

pub use router::{build_router, HttpSettings};
