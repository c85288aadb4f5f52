//! Core types shared by the directory and the node

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a username can currently be reached.
///
/// At most one record exists per username; registering again replaces the
/// whole record, addresses included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Unique, case-sensitive key
    pub username: String,
    /// Transport identity of the peer (endpoint id string)
    pub peer_id: String,
    /// Advertised addresses, in the order they were registered
    pub addrs: Vec<String>,
    /// Time of the most recent registration
    pub last_seen: DateTime<Utc>,
}

impl PeerRecord {
    /// Create a record stamped with the current time
    pub fn new(username: impl Into<String>, peer_id: impl Into<String>, addrs: Vec<String>) -> Self {
        Self {
            username: username.into(),
            peer_id: peer_id.into(),
            addrs,
            last_seen: Utc::now(),
        }
    }
}

/// Identity and addresses of a registered node, as reported by `GET /me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub username: String,
    pub peer_id: String,
    pub addrs: Vec<String>,
}

/// Lifecycle of a node process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    /// Identity generated, transport listening, not yet registered
    Bootstrapping,
    /// Registered with the directory
    Registered,
    /// Control plane running
    Serving,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Bootstrapping => write!(f, "bootstrapping"),
            NodeState::Registered => write!(f, "registered"),
            NodeState::Serving => write!(f, "serving"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_record_stamps_time() {
        let before = Utc::now();
        let record = PeerRecord::new("alice", "peer-a", vec!["addr1".into()]);
        assert_eq!(record.username, "alice");
        assert!(record.last_seen >= before);
    }

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Bootstrapping.to_string(), "bootstrapping");
        assert_eq!(NodeState::Serving.to_string(), "serving");
    }
}
