//! Advertised peer addresses
//!
//! A node advertises each of its transport addresses combined with its own
//! peer id, so that a single string is enough to dial it:
//!
//! ```text
//! 192.168.1.4:51234/p2p/<endpoint-id>        direct UDP address
//! https://relay.example.com./p2p/<endpoint-id> relay URL
//! ```
//!
//! The `/p2p/` suffix is optional when the peer id is known from elsewhere
//! (a directory record), and mandatory for bootstrap peers.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use iroh::{EndpointAddr, EndpointId, RelayUrl};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

/// Separator between the transport part and the peer id.
pub const PEER_SEPARATOR: &str = "/p2p/";

/// Transport half of an advertised address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAddr {
    /// Direct UDP socket address
    Direct(SocketAddr),
    /// Relay server the peer is reachable through
    Relay(RelayUrl),
}

impl fmt::Display for TransportAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAddr::Direct(addr) => write!(f, "{}", addr),
            TransportAddr::Relay(url) => write!(f, "{}", url),
        }
    }
}

impl FromStr for TransportAddr {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(TransportAddr::Direct(addr));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            let url = s
                .parse::<RelayUrl>()
                .map_err(|e| ChatError::InvalidAddress(format!("Invalid relay URL '{}': {}", s, e)))?;
            return Ok(TransportAddr::Relay(url));
        }
        Err(ChatError::InvalidAddress(format!(
            "'{}' is neither a socket address nor a relay URL",
            s
        )))
    }
}

/// A transport address, optionally bound to a peer id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr {
    pub transport: TransportAddr,
    pub peer: Option<EndpointId>,
}

impl PeerAddr {
    pub fn new(transport: TransportAddr, peer: EndpointId) -> Self {
        Self {
            transport,
            peer: Some(peer),
        }
    }

    /// Add this address as a dialing hint to `addr`.
    pub fn add_to(&self, addr: EndpointAddr) -> EndpointAddr {
        match &self.transport {
            TransportAddr::Direct(socket) => addr.with_ip_addr(*socket),
            TransportAddr::Relay(url) => addr.with_relay_url(url.clone()),
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peer {
            Some(peer) => write!(f, "{}{}{}", self.transport, PEER_SEPARATOR, peer),
            None => write!(f, "{}", self.transport),
        }
    }
}

impl FromStr for PeerAddr {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once(PEER_SEPARATOR) {
            Some((transport, peer)) => Ok(Self {
                transport: transport.parse()?,
                peer: Some(parse_peer_id(peer)?),
            }),
            None => Ok(Self {
                transport: s.parse()?,
                peer: None,
            }),
        }
    }
}

/// Decode a peer id string into an endpoint id.
pub fn parse_peer_id(s: &str) -> ChatResult<EndpointId> {
    s.trim()
        .parse::<EndpointId>()
        .map_err(|e| ChatError::InvalidPeerId(format!("'{}': {}", s, e)))
}

/// Every transport address of `addr`, combined with its peer id.
pub fn advertised_addrs(addr: &EndpointAddr) -> Vec<String> {
    let direct = addr
        .ip_addrs()
        .map(|socket| PeerAddr::new(TransportAddr::Direct(*socket), addr.id));
    let relays = addr
        .relay_urls()
        .map(|url| PeerAddr::new(TransportAddr::Relay(url.clone()), addr.id));

    direct.chain(relays).map(|a| a.to_string()).collect()
}

/// Build a dialable address for `peer` from advertised address strings.
///
/// Strings that fail to parse, or that name a different peer, are skipped:
/// the transport may still reach the peer through discovery.
pub fn dial_hints(peer: EndpointId, addrs: &[String]) -> EndpointAddr {
    let mut endpoint_addr = EndpointAddr::new(peer);
    for raw in addrs {
        match raw.parse::<PeerAddr>() {
            Ok(parsed) if parsed.peer.is_none() || parsed.peer == Some(peer) => {
                endpoint_addr = parsed.add_to(endpoint_addr);
            }
            Ok(parsed) => {
                debug!(addr = %raw, expected = %peer, found = ?parsed.peer, "Skipping address of another peer");
            }
            Err(e) => {
                debug!(addr = %raw, error = %e, "Skipping unparsable address");
            }
        }
    }
    endpoint_addr
}

/// Parse a bootstrap peer address; the `/p2p/<id>` suffix is required.
pub fn parse_bootstrap(s: &str) -> ChatResult<EndpointAddr> {
    let parsed: PeerAddr = s.parse()?;
    let peer = parsed.peer.ok_or_else(|| {
        ChatError::InvalidAddress(format!("bootstrap address '{}' has no {} suffix", s, PEER_SEPARATOR))
    })?;
    Ok(parsed.add_to(EndpointAddr::new(peer)))
}
