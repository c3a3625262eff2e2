//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Bearer token validators
//! - `http` - axum routers, DTOs and middleware
//! - `memory` - Single-process store and directory
//! - `postgres` - PostgreSQL store and platform user directory

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
