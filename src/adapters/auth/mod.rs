//! Authentication adapters implementing the `SessionValidator` port.
//!
//! - `jwt` - HS256 tokens issued by the platform identity service
//! - `mock` - Token table for tests and local development

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator};
pub use mock::MockSessionValidator;
