//! Bounded per-room message history.

use std::collections::VecDeque;

use super::message::Message;

/// Maximum number of messages retained per room
pub const HISTORY_CAPACITY: usize = 100;

/// Default page size for history reads
pub const DEFAULT_READ_LIMIT: usize = 50;

/// Ordered ring buffer of one room's messages.
///
/// Length never exceeds [`HISTORY_CAPACITY`]; insertion order is preserved;
/// evicting the oldest entry under capacity pressure is the only removal path.
#[derive(Debug, Default, Clone)]
pub struct RoomHistory {
    messages: VecDeque<Message>,
}

impl RoomHistory {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a message at the tail, evicting from the head while over
    /// capacity.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > HISTORY_CAPACITY {
            self.messages.pop_front();
        }
    }

    /// Read up to `limit` messages ending `offset` messages back from the
    /// most recent, in append order.
    ///
    /// Indices are clamped to the stored range; out-of-range reads return
    /// fewer or zero messages instead of erroring.
    pub fn read(&self, limit: usize, offset: usize) -> Vec<Message> {
        let end = self.messages.len().saturating_sub(offset);
        let start = end.saturating_sub(limit);
        self.messages.range(start..end).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
