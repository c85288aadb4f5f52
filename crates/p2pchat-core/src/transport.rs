//! iroh endpoint ownership and outbound delivery
//!
//! The transport binds one endpoint for the node's identity, mounts the chat
//! protocol on a router, and delivers outbound messages one stream at a time.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use iroh::discovery::static_provider::StaticProvider;
use iroh::endpoint::Connection;
use iroh::protocol::Router;
use iroh::{Endpoint, EndpointAddr, EndpointId, RelayMode, SecretKey};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::address::parse_bootstrap;
use crate::chat::{ChatMessage, Inbox};
use crate::config::NodeConfig;
use crate::error::{ChatError, ChatResult};
use crate::protocol::{ChatProtocolHandler, CHAT_ALPN, MAX_MESSAGE_SIZE};

/// Poll interval while waiting for local addresses
const ADDR_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The node's iroh endpoint plus the router serving [`CHAT_ALPN`].
pub struct ChatTransport {
    endpoint: Endpoint,
    router: Router,
    static_provider: StaticProvider,
    dial_timeout: Duration,
    write_timeout: Duration,
}

impl std::fmt::Debug for ChatTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTransport")
            .field("endpoint_id", &self.endpoint.id())
            .field("dial_timeout", &self.dial_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

impl ChatTransport {
    /// Bind an endpoint for `secret_key` and start accepting chat streams into `inbox`.
    pub async fn bind(secret_key: SecretKey, inbox: Arc<Inbox>, config: &NodeConfig) -> ChatResult<Self> {
        let static_provider = StaticProvider::new();

        let mut builder = Endpoint::builder()
            .secret_key(secret_key)
            .alpns(vec![CHAT_ALPN.to_vec()])
            .discovery(static_provider.clone());
        if !config.relay_enabled {
            builder = builder.relay_mode(RelayMode::Disabled);
        }

        let endpoint = builder
            .bind()
            .await
            .map_err(|e| ChatError::Network(format!("Failed to bind endpoint: {}", e)))?;
        info!(endpoint_id = %endpoint.id(), relay = config.relay_enabled, "Endpoint bound");

        let router = Router::builder(endpoint.clone())
            .accept(CHAT_ALPN, ChatProtocolHandler::new(inbox, config.read_timeout))
            .spawn();
        debug!("Chat protocol handler registered");

        Ok(Self {
            endpoint,
            router,
            static_provider,
            dial_timeout: config.dial_timeout,
            write_timeout: config.write_timeout,
        })
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint.id()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Current addresses of this endpoint.
    ///
    /// Waits up to `wait` for the endpoint to report a direct address. If it
    /// never does, the bound sockets are used, with unspecified IPs replaced
    /// by loopback.
    pub async fn local_addr(&self, wait: Duration) -> EndpointAddr {
        let deadline = Instant::now() + wait;
        loop {
            let addr = self.endpoint.addr();
            if addr.ip_addrs().next().is_some() {
                return addr;
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(ADDR_POLL_INTERVAL).await;
        }

        debug!("No direct address reported, falling back to bound sockets");
        self.endpoint
            .bound_sockets()
            .into_iter()
            .map(dialable)
            .fold(self.endpoint.addr(), |addr, socket| addr.with_ip_addr(socket))
    }

    /// Make `addr` known to discovery for later dials.
    pub fn add_peer_addr(&self, addr: EndpointAddr) {
        debug!(peer = %addr.id, "Adding peer address to static discovery");
        self.static_provider.add_endpoint_info(addr);
    }

    /// Dial every bootstrap peer once. Failures are logged and skipped.
    ///
    /// Returns the number of peers that answered.
    pub async fn connect_bootstrap(&self, peers: &[String]) -> usize {
        let mut connected = 0;
        for raw in peers {
            let addr = match parse_bootstrap(raw) {
                Ok(addr) => addr,
                Err(e) => {
                    warn!(addr = %raw, error = %e, "Skipping bootstrap peer");
                    continue;
                }
            };
            let peer = addr.id;
            self.add_peer_addr(addr.clone());

            match self.dial(addr).await {
                Ok(conn) => {
                    info!(%peer, "Connected to bootstrap peer");
                    conn.close(0u32.into(), b"bootstrap");
                    connected += 1;
                }
                Err(e) => warn!(%peer, error = %e, "Bootstrap peer unreachable"),
            }
        }
        connected
    }

    /// Deliver one message to `peer` on a fresh connection.
    ///
    /// Returns once the stream is finished; there is no application ack.
    pub async fn deliver(&self, peer: EndpointAddr, message: &ChatMessage) -> ChatResult<()> {
        let conn = self.open(peer).await?;
        self.send_on(&conn, message).await
    }

    /// Write `message` on a new stream of `conn`, then close the connection.
    pub async fn send_on(&self, conn: &Connection, message: &ChatMessage) -> ChatResult<()> {
        let result = match message.encode() {
            Ok(bytes) if bytes.len() > MAX_MESSAGE_SIZE => Err(ChatError::Validation(format!(
                "message is {} bytes, limit is {}",
                bytes.len(),
                MAX_MESSAGE_SIZE
            ))),
            Ok(bytes) => self.write_stream(conn, &bytes).await.map(|()| bytes.len()),
            Err(e) => Err(e),
        };
        conn.close(0u32.into(), b"sent");

        let size = result?;
        debug!(peer = %conn.remote_id(), id = %message.id, size, "Message written");
        Ok(())
    }

    /// Connect under the chat ALPN, bounded by the dial timeout.
    ///
    /// Connect failures surface as `StreamOpen`: from the caller's side a
    /// stream could not be opened.
    pub async fn open(&self, peer: EndpointAddr) -> ChatResult<Connection> {
        let peer_id = peer.id;
        self.add_peer_addr(peer.clone());
        self.dial(peer).await.map_err(|e| {
            warn!(peer = %peer_id, error = %e, "Dial failed");
            match e {
                ChatError::Timeout(_) => e,
                other => ChatError::StreamOpen(other.to_string()),
            }
        })
    }

    async fn dial(&self, peer: EndpointAddr) -> ChatResult<Connection> {
        let peer_id = peer.id;
        match timeout(self.dial_timeout, self.endpoint.connect(peer, CHAT_ALPN)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(ChatError::Connect(format!("{}: {}", peer_id, e))),
            Err(_) => Err(ChatError::Timeout(format!(
                "connect to {} after {:?}",
                peer_id, self.dial_timeout
            ))),
        }
    }

    async fn write_stream(&self, conn: &Connection, bytes: &[u8]) -> ChatResult<()> {
        let mut send = timeout(self.dial_timeout, conn.open_uni())
            .await
            .map_err(|_| ChatError::Timeout("open stream".to_string()))?
            .map_err(|e| ChatError::StreamOpen(format!("Failed to open stream: {}", e)))?;

        timeout(self.write_timeout, send.write_all(bytes))
            .await
            .map_err(|_| ChatError::Timeout("write stream".to_string()))?
            .map_err(|e| ChatError::StreamWrite(format!("Failed to write: {}", e)))?;
        send.finish()
            .map_err(|e| ChatError::StreamWrite(format!("Failed to finish stream: {}", e)))?;

        // Wait for the peer to take the data before closing the connection.
        // An elapsed wait is not an error: the write already happened.
        match timeout(self.write_timeout, send.stopped()).await {
            Ok(Ok(None)) => Ok(()),
            Ok(Ok(Some(code))) => Err(ChatError::StreamWrite(format!("stream stopped by peer ({})", code))),
            Ok(Err(e)) => {
                debug!(error = %e, "Stream ended before acknowledgement");
                Ok(())
            }
            Err(_) => {
                debug!("Timed out waiting for stream acknowledgement");
                Ok(())
            }
        }
    }

    /// Stop accepting streams and close the endpoint.
    pub async fn shutdown(&self) -> ChatResult<()> {
        self.router
            .shutdown()
            .await
            .map_err(|e| ChatError::Network(format!("Router shutdown failed: {}", e)))?;
        info!("Transport shut down");
        Ok(())
    }
}

fn dialable(socket: SocketAddr) -> SocketAddr {
    match socket.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), socket.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), socket.port()),
        _ => socket,
    }
}
