//! In-memory username registry
//!
//! Volatile: records live exactly as long as the process holding the
//! registry. There is no expiry; a stale record is only noticed when a dial
//! to its addresses fails.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ChatError, ChatResult};
use crate::types::PeerRecord;

/// Thread-safe username → [`PeerRecord`] map.
///
/// Lookups share the read lock, so they never block each other. A record is
/// replaced as a whole under the write lock and can never be observed
/// half-written.
#[derive(Debug, Default)]
pub struct Registry {
    records: RwLock<HashMap<String, PeerRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace the record for `username` (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` if `username` or `peer_id` is empty.
    pub fn register(
        &self,
        username: &str,
        peer_id: &str,
        addrs: Vec<String>,
    ) -> ChatResult<PeerRecord> {
        if username.trim().is_empty() {
            return Err(ChatError::Validation("username is required".to_string()));
        }
        if peer_id.trim().is_empty() {
            return Err(ChatError::Validation("peer_id is required".to_string()));
        }

        let record = PeerRecord::new(username, peer_id, addrs);
        let previous = self
            .records
            .write()
            .insert(username.to_string(), record.clone());

        debug!(
            username,
            peer_id,
            addrs = record.addrs.len(),
            replaced = previous.is_some(),
            "Registered peer"
        );

        Ok(record)
    }

    /// Current peer id and addresses for `username`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotFound` if the username was never registered.
    pub fn lookup(&self, username: &str) -> ChatResult<(String, Vec<String>)> {
        self.get(username)
            .map(|record| (record.peer_id, record.addrs))
            .ok_or_else(|| ChatError::NotFound(username.to_string()))
    }

    /// Full record for `username`, including `last_seen`.
    pub fn get(&self, username: &str) -> Option<PeerRecord> {
        self.records.read().get(username).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_register_then_lookup() {
        let registry = Registry::new();
        registry
            .register("alice", "peer-a", vec!["addr1".into(), "addr2".into()])
            .unwrap();

        let (peer_id, addrs) = registry.lookup("alice").unwrap();
        assert_eq!(peer_id, "peer-a");
        assert_eq!(addrs, vec!["addr1".to_string(), "addr2".to_string()]);
    }

    #[test]
    fn test_last_write_wins() {
        let registry = Registry::new();
        registry
            .register("alice", "peer-1", vec!["a1".into(), "a2".into()])
            .unwrap();
        registry.register("alice", "peer-2", vec!["b1".into()]).unwrap();

        let (peer_id, addrs) = registry.lookup("alice").unwrap();
        assert_eq!(peer_id, "peer-2");
        // No merge of the old addresses
        assert_eq!(addrs, vec!["b1".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistration_refreshes_last_seen() {
        let registry = Registry::new();
        let first = registry.register("alice", "peer-1", vec![]).unwrap();
        let second = registry.register("alice", "peer-1", vec![]).unwrap();
        assert!(second.last_seen >= first.last_seen);
        assert_eq!(registry.get("alice").unwrap().last_seen, second.last_seen);
    }

    #[test]
    fn test_lookup_unknown_is_not_found() {
        let registry = Registry::new();
        let err = registry.lookup("carol").unwrap_err();
        assert!(matches!(err, ChatError::NotFound(ref name) if name == "carol"));
    }

    #[test]
    fn test_usernames_are_case_sensitive() {
        let registry = Registry::new();
        registry.register("Alice", "peer-upper", vec![]).unwrap();

        assert!(registry.lookup("alice").is_err());
        assert_eq!(registry.lookup("Alice").unwrap().0, "peer-upper");
    }

    #[test]
    fn test_empty_fields_rejected() {
        let registry = Registry::new();
        assert!(matches!(
            registry.register("", "peer", vec![]),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            registry.register("alice", "", vec![]),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            registry.register("   ", "peer", vec![]),
            Err(ChatError::Validation(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_addresses_allowed() {
        let registry = Registry::new();
        registry.register("alice", "peer-a", vec![]).unwrap();
        assert!(registry.lookup("alice").unwrap().1.is_empty());
    }

    #[test]
    fn test_concurrent_distinct_registrations() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let name = format!("user-{i}");
                    registry
                        .register(&name, &format!("peer-{i}"), vec![format!("addr-{i}")])
                        .unwrap();
                    // Lookups of other keys run concurrently with writes
                    let _ = registry.lookup("user-0");
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(registry.len(), 16);
        for i in 0..16 {
            let (peer_id, addrs) = registry.lookup(&format!("user-{i}")).unwrap();
            assert_eq!(peer_id, format!("peer-{i}"));
            assert_eq!(addrs, vec![format!("addr-{i}")]);
        }
    }

    proptest! {
        #[test]
        fn prop_register_lookup_roundtrip(
            username in "[a-zA-Z0-9_]{1,16}",
            peer_id in "[a-f0-9]{1,64}",
            addrs in proptest::collection::vec("[a-z0-9.:/]{0,24}", 0..5),
        ) {
            let registry = Registry::new();
            registry.register(&username, &peer_id, addrs.clone()).unwrap();
            prop_assert_eq!(registry.lookup(&username).unwrap(), (peer_id, addrs));
        }
    }
}
