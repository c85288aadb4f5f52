//! Chat wire protocol
//!
//! One message per unidirectional stream, fire-and-forget:
//!
//! ```text
//! Sender                          Recipient
//!   |--- connect(CHAT_ALPN) ------->|
//!   |--- open_uni ----------------->|
//!   |--- postcard(ChatMessage) ---->|
//!   |--- finish ------------------->|  read_to_end → decode → Inbox
//! ```
//!
//! There is no application-level reply. A stream that does not decode, or
//! does not finish within the read timeout, is logged and dropped; the
//! connection keeps accepting further streams.

use std::sync::Arc;
use std::time::Duration;

use iroh::endpoint::{Connection, RecvStream};
use iroh::protocol::{AcceptError, ProtocolHandler};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::chat::{ChatMessage, Inbox};
use crate::error::{ChatError, ChatResult};

/// ALPN protocol identifier for chat streams
pub const CHAT_ALPN: &[u8] = b"/p2pchat/chat/1";

/// Largest encoded message a stream may carry (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Accepts chat connections and pushes decoded messages into the inbox.
#[derive(Clone)]
pub struct ChatProtocolHandler {
    inbox: Arc<Inbox>,
    read_timeout: Duration,
}

impl std::fmt::Debug for ChatProtocolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProtocolHandler")
            .field("inbox", &self.inbox)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl ChatProtocolHandler {
    pub fn new(inbox: Arc<Inbox>, read_timeout: Duration) -> Self {
        Self { inbox, read_timeout }
    }

    pub const fn alpn() -> &'static [u8] {
        CHAT_ALPN
    }

    /// Accept streams until the peer closes the connection.
    async fn handle_connection(connection: Connection, inbox: Arc<Inbox>, read_timeout: Duration) {
        let remote_id = connection.remote_id();
        debug!(%remote_id, "Chat connection accepted");

        loop {
            let recv = match connection.accept_uni().await {
                Ok(recv) => recv,
                Err(e) => {
                    debug!(%remote_id, reason = %e, "Chat connection closed");
                    return;
                }
            };

            match Self::read_message(recv, read_timeout).await {
                Ok(message) => {
                    info!(
                        %remote_id,
                        id = %message.id,
                        from = %message.from_user,
                        to = %message.to_user,
                        "Message received"
                    );
                    inbox.push(message);
                }
                Err(e) => {
                    warn!(%remote_id, error = %e, "Dropping chat stream");
                }
            }
        }
    }

    async fn read_message(mut recv: RecvStream, read_timeout: Duration) -> ChatResult<ChatMessage> {
        let bytes = timeout(read_timeout, recv.read_to_end(MAX_MESSAGE_SIZE))
            .await
            .map_err(|_| ChatError::Timeout(format!("stream not finished after {:?}", read_timeout)))?
            .map_err(|e| ChatError::Decode(format!("Failed to read stream: {}", e)))?;
        ChatMessage::decode(&bytes)
    }
}

impl ProtocolHandler for ChatProtocolHandler {
    fn accept(
        &self,
        conn: Connection,
    ) -> impl std::future::Future<Output = Result<(), AcceptError>> + Send {
        let inbox = self.inbox.clone();
        let read_timeout = self.read_timeout;

        async move {
            Self::handle_connection(conn, inbox, read_timeout).await;
            Ok(())
        }
    }
}
