//! Node engine - lifecycle and message sending for one chat node
//!
//! A node moves through three states, encoded in the types:
//!
//! ```text
//! NodeBootstrap::start ──► NodeBootstrap ──register()──► ChatNode ──serve()──► (serving)
//!   identity, endpoint,        Bootstrapping                Registered           Serving
//!   protocol handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use p2pchat_core::{EphemeralIdentity, NodeBootstrap, NodeConfig};
//!
//! let node = NodeBootstrap::start(NodeConfig::new("alice"), &EphemeralIdentity)
//!     .await?
//!     .register()
//!     .await?;
//!
//! let id = node.send_message("bob", "hi").await?;
//! let unread = node.inbox().drain("");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::address::{advertised_addrs, dial_hints, parse_peer_id};
use crate::api;
use crate::chat::{ChatMessage, Inbox};
use crate::config::NodeConfig;
use crate::directory::DirectoryClient;
use crate::error::{ChatError, ChatResult};
use crate::identity::{load_or_generate, IdentityStore};
use crate::transport::ChatTransport;
use crate::types::{NodeInfo, NodeState};

/// A node that is listening for chat streams but not yet registered.
#[derive(Debug)]
pub struct NodeBootstrap {
    config: NodeConfig,
    transport: ChatTransport,
    inbox: Arc<Inbox>,
    directory: DirectoryClient,
}

impl NodeBootstrap {
    /// Load or create the identity, bind the endpoint and accept chat streams.
    ///
    /// Bootstrap peers are dialed once; failures there are logged, not returned.
    pub async fn start(config: NodeConfig, identity: &dyn IdentityStore) -> ChatResult<Self> {
        if config.username.trim().is_empty() {
            return Err(ChatError::Validation("username is required".to_string()));
        }

        let secret_key = load_or_generate(identity)?;
        let inbox = Arc::new(Inbox::new(config.inbox_capacity));
        let transport = ChatTransport::bind(secret_key, inbox.clone(), &config).await?;
        let directory = DirectoryClient::new(&config.directory_url, config.directory_timeout)?;

        if !config.bootstrap.is_empty() {
            let connected = transport.connect_bootstrap(&config.bootstrap).await;
            info!(connected, total = config.bootstrap.len(), "Bootstrap peers dialed");
        }

        info!(
            username = %config.username,
            peer_id = %transport.endpoint_id(),
            state = %NodeState::Bootstrapping,
            "Node started"
        );

        Ok(Self {
            config,
            transport,
            inbox,
            directory,
        })
    }

    pub fn peer_id(&self) -> String {
        self.transport.endpoint_id().to_string()
    }

    pub fn state(&self) -> NodeState {
        NodeState::Bootstrapping
    }

    /// Register this node's username, peer id and addresses with the directory.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Registration` if the directory rejects or cannot
    /// be reached; the node cannot be found by others without it.
    pub async fn register(self) -> ChatResult<ChatNode> {
        let local = self.transport.local_addr(self.config.addr_wait).await;
        let addrs = advertised_addrs(&local);
        let peer_id = self.peer_id();

        self.directory
            .register(&self.config.username, &peer_id, &addrs)
            .await
            .map_err(|e| ChatError::Registration(e.to_string()))?;

        info!(
            username = %self.config.username,
            %peer_id,
            addrs = addrs.len(),
            directory = %self.directory.base_url(),
            state = %NodeState::Registered,
            "Registered with directory"
        );

        Ok(ChatNode {
            info: NodeInfo {
                username: self.config.username.clone(),
                peer_id,
                addrs,
            },
            config: self.config,
            transport: self.transport,
            inbox: self.inbox,
            directory: self.directory,
            serving: AtomicBool::new(false),
        })
    }

    /// Stop the endpoint without registering.
    pub async fn shutdown(self) -> ChatResult<()> {
        self.transport.shutdown().await
    }
}

/// A registered node: sends messages and owns the inbox.
#[derive(Debug)]
pub struct ChatNode {
    info: NodeInfo,
    config: NodeConfig,
    transport: ChatTransport,
    inbox: Arc<Inbox>,
    directory: DirectoryClient,
    serving: AtomicBool,
}

impl ChatNode {
    /// Identity and addresses as registered.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn username(&self) -> &str {
        &self.info.username
    }

    pub fn inbox(&self) -> &Arc<Inbox> {
        &self.inbox
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> NodeState {
        if self.serving.load(Ordering::Acquire) {
            NodeState::Serving
        } else {
            NodeState::Registered
        }
    }

    /// Send `content` to the node registered as `to_username`.
    ///
    /// Returns the new message id once it has been written to the stream.
    /// Delivery into the recipient's inbox is not confirmed.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty recipient
    /// - `RecipientUnknown` if the directory has no such username
    /// - `InvalidPeerId` if the registered peer id does not decode
    /// - `StreamOpen`, `StreamWrite` or `Timeout` on transport failures
    /// - `Directory` / `Timeout` if the directory cannot be reached
    pub async fn send_message(&self, to_username: &str, content: &str) -> ChatResult<String> {
        if to_username.is_empty() {
            return Err(ChatError::Validation("to_username is required".to_string()));
        }

        let (peer_id, addrs) = self.directory.lookup(to_username).await.map_err(|e| match e {
            ChatError::NotFound(name) => ChatError::RecipientUnknown(name),
            other => other,
        })?;

        let peer = parse_peer_id(&peer_id)?;
        let hints = dial_hints(peer, &addrs);
        debug!(to = %to_username, %peer, hints = hints.ip_addrs().count(), "Dialing recipient");

        let conn = self.transport.open(hints).await?;
        let message = ChatMessage::new(self.info.username.clone(), to_username, content);
        self.transport.send_on(&conn, &message).await?;

        info!(id = %message.id, to = %to_username, %peer, "Message sent");
        Ok(message.id)
    }

    /// Serve the control-plane API on `listener` until the task is dropped.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> ChatResult<()> {
        let addr = listener.local_addr()?;
        self.serving.store(true, Ordering::Release);
        info!(%addr, username = %self.info.username, state = %NodeState::Serving, "Control plane listening");

        let result = axum::serve(listener, api::router(self.clone())).await;
        self.serving.store(false, Ordering::Release);
        result?;
        Ok(())
    }

    /// Stop accepting chat streams and close the endpoint.
    pub async fn shutdown(&self) -> ChatResult<()> {
        self.transport.shutdown().await
    }
}
