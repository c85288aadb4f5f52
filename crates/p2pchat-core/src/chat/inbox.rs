//! Per-node inbox of received chat messages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Inbox                                                          │
//! │  ├── messages: VecDeque<ChatMessage>                            │
//! │  │   └── Arrival order, ring buffer (default 10 000 messages)   │
//! │  │                                                              │
//! │  └── broadcast_tx: broadcast::Sender<ChatMessage>               │
//! │      └── Real-time arrivals for in-process subscribers          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Draining is a cursor query, not a consumption: messages stay in the
//! inbox until they are evicted by newer arrivals.

use std::collections::VecDeque;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::ChatMessage;

/// Default maximum number of messages kept in memory.
pub const DEFAULT_INBOX_CAPACITY: usize = 10_000;

/// Buffer size for the arrival broadcast channel.
const BROADCAST_CHANNEL_SIZE: usize = 256;

/// Ordered, bounded buffer of received messages.
///
/// Pushes and drains are serialized by an `RwLock`: concurrent drains share
/// the read side, a push takes the write side.
pub struct Inbox {
    messages: RwLock<VecDeque<ChatMessage>>,
    capacity: usize,
    broadcast_tx: broadcast::Sender<ChatMessage>,
}

impl std::fmt::Debug for Inbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

impl Inbox {
    /// Create an inbox that keeps at most `capacity` messages.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CHANNEL_SIZE);
        Self {
            messages: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            broadcast_tx,
        }
    }

    /// Append a message, evicting the oldest one when full.
    pub fn push(&self, message: ChatMessage) {
        {
            let mut messages = self.messages.write();
            if messages.len() >= self.capacity {
                messages.pop_front();
            }
            messages.push_back(message.clone());
        }

        // No subscribers is fine
        let _ = self.broadcast_tx.send(message);
    }

    /// Messages received after the one with id `after`.
    ///
    /// An empty cursor returns everything. An unknown cursor returns nothing.
    pub fn drain(&self, after: &str) -> Vec<ChatMessage> {
        let messages = self.messages.read();
        if after.is_empty() {
            return messages.iter().cloned().collect();
        }

        match messages.iter().position(|m| m.id == after) {
            Some(index) => messages.iter().skip(index + 1).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Subscribe to messages as they are pushed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.broadcast_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(content: &str) -> ChatMessage {
        ChatMessage::new("alice", "bob", content)
    }

    #[test]
    fn test_drain_cursor_semantics() {
        let inbox = Inbox::default();
        let m1 = msg("one");
        let m2 = msg("two");
        let m3 = msg("three");
        inbox.push(m1.clone());
        inbox.push(m2.clone());
        inbox.push(m3.clone());

        assert_eq!(inbox.drain(""), vec![m1.clone(), m2.clone(), m3.clone()]);
        assert_eq!(inbox.drain(&m1.id), vec![m2.clone(), m3.clone()]);
        assert!(inbox.drain(&m3.id).is_empty());
        assert!(inbox.drain("nonexistent-id").is_empty());
    }

    #[test]
    fn test_drain_does_not_consume() {
        let inbox = Inbox::default();
        inbox.push(msg("kept"));

        assert_eq!(inbox.drain("").len(), 1);
        assert_eq!(inbox.drain("").len(), 1);
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_empty_inbox() {
        let inbox = Inbox::default();
        assert!(inbox.is_empty());
        assert!(inbox.drain("").is_empty());
        assert!(inbox.drain("anything").is_empty());
    }

    #[test]
    fn test_eviction_at_capacity() {
        let inbox = Inbox::new(2);
        let m1 = msg("one");
        let m2 = msg("two");
        let m3 = msg("three");
        inbox.push(m1.clone());
        inbox.push(m2.clone());
        inbox.push(m3.clone());

        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.drain(""), vec![m2.clone(), m3]);
        // Evicted cursor behaves like an unknown one
        assert!(inbox.drain(&m1.id).is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let inbox = Inbox::new(0);
        assert_eq!(inbox.capacity(), 1);
        inbox.push(msg("one"));
        let last = msg("two");
        inbox.push(last.clone());
        assert_eq!(inbox.drain(""), vec![last]);
    }

    #[tokio::test]
    async fn test_subscribe_receives_pushes() {
        let inbox = Inbox::default();
        let mut rx = inbox.subscribe();

        let m = msg("live");
        inbox.push(m.clone());

        assert_eq!(rx.recv().await.unwrap(), m);
    }

    #[test]
    fn test_concurrent_pushes_are_all_kept() {
        let inbox = std::sync::Arc::new(Inbox::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let inbox = inbox.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        inbox.push(msg(&format!("{t}-{i}")));
                        let _ = inbox.drain("");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(inbox.len(), 400);
    }

    proptest! {
        #[test]
        fn prop_drain_after_index_returns_suffix(count in 1usize..20, cursor in 0usize..20) {
            let inbox = Inbox::default();
            let pushed: Vec<_> = (0..count).map(|i| msg(&i.to_string())).collect();
            for m in &pushed {
                inbox.push(m.clone());
            }

            let cursor = cursor % count;
            let drained = inbox.drain(&pushed[cursor].id);
            prop_assert_eq!(drained, pushed[cursor + 1..].to_vec());
        }
    }
}
