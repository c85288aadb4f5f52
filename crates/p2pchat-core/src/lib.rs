//! p2pchat Core Library
//!
//! A username directory plus direct peer-to-peer chat over iroh.
//!
//! ## Overview
//!
//! A node picks a username, binds an iroh endpoint, and registers
//! `(username, peer_id, addrs)` with a small HTTP directory. To send, it
//! looks the recipient up in the directory, dials the returned peer id and
//! writes one message on one stream. Received messages land in an in-memory
//! inbox that a local HTTP control plane exposes with cursor-based polling.
//!
//! ## Core Principles
//!
//! - **Directory for names only**: message content never touches it
//! - **Fire-and-forget**: a send succeeds once the stream is written
//! - **Volatile**: registry and inbox live in memory
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use p2pchat_core::{EphemeralIdentity, NodeBootstrap, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::new("alice").with_directory_url("http://127.0.0.1:8080");
//!     let node = NodeBootstrap::start(config, &EphemeralIdentity).await?.register().await?;
//!
//!     let id = node.send_message("bob", "hi").await?;
//!     println!("sent {id}");
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8081").await?;
//!     Arc::new(node).serve(listener).await?;
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod api;
pub mod chat;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod identity;
pub mod logging;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports
pub use address::{PeerAddr, TransportAddr};
pub use chat::{ChatMessage, Inbox, DEFAULT_INBOX_CAPACITY};
pub use config::{DirectoryConfig, NodeConfig};
pub use directory::{DirectoryClient, Registry};
pub use engine::{ChatNode, NodeBootstrap};
pub use error::{ChatError, ChatResult, ErrorBody};
pub use identity::{EphemeralIdentity, FileIdentity, IdentityStore};
pub use protocol::{ChatProtocolHandler, CHAT_ALPN, MAX_MESSAGE_SIZE};
pub use transport::ChatTransport;
pub use types::*;
