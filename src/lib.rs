//! Campus DM - direct messaging core
//!
//! Two-party conversations keyed by a canonical participant pair, atomic
//! sends that keep the conversation summary current, per-message read state,
//! and newest-first paging over the message log.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
