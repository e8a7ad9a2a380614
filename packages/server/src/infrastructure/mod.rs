//! Infrastructure layer: transport implementation and wire DTOs.

pub mod dto;
pub mod transport;
