//! Shared utilities for the Tamariba workspace.
//!
//! Cross-cutting concerns used by the server crate: logging setup and
//! time/clock abstractions.

pub mod logger;
pub mod time;
