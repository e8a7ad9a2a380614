//! Real-time room-based messaging and presence core.
//!
//! An in-memory registry of live connections, chat rooms with bounded
//! message history, best-effort room broadcast, and a presence/notification
//! emitter that lets the rest of the backend push targeted events to users
//! or rooms. Single-process by design; all state lives in memory and the
//! protected rooms are recreated from a fixed list on boot.

// layers
pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod ui;
