//! UI layer: axum wiring for the WebSocket and HTTP surfaces.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
