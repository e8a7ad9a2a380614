//! Transport implementations.

mod channel;

pub use channel::{ChannelTransport, PusherChannel};
