//! WebSocket transport for the client.
//!
//! Provides [`WsTransport`] which owns the socket and bridges text frames to
//! channels. This is a thin layer that only moves strings: protocol logic
//! stays in the Sans-IO [`crate::Client`]. There is no reconnect; a closed or
//! failed socket is reported once as [`TransportEvent::Closed`].

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Channel capacity in each direction.
const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Inbound transport events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame from the server.
    Frame(String),
    /// Socket closed or failed.
    Closed {
        /// Close or error description
        reason: String,
    },
}

/// Handle to an open WebSocket.
pub struct WsTransport {
    /// Send text frames to the server. Dropping it closes the socket.
    pub outbound: mpsc::Sender<String>,
    /// Receive frames and the final close event.
    pub inbound: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl WsTransport {
    /// Stop the socket task immediately.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to `endpoint` (e.g. `ws://localhost:8080`).
pub async fn connect(endpoint: &str) -> Result<WsTransport, TransportError> {
    let (stream, _response) =
        connect_async(endpoint).await.map_err(|e| TransportError::Connection(e.to_string()))?;
    tracing::info!(%endpoint, "websocket open");

    let (mut sink, mut source) = stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (inbound_tx, inbound_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(async move {
        let reason = loop {
            tokio::select! {
                outgoing = outbound_rx.recv() => match outgoing {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            break format!("send failed: {e}");
                        }
                    },
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break "closed locally".to_string();
                    },
                },
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let frame = TransportEvent::Frame(text.as_str().to_owned());
                        if inbound_tx.send(frame).await.is_err() {
                            break "receiver dropped".to_string();
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break "closed by peer".to_string(),
                    Some(Ok(_)) => {},
                    Some(Err(e)) => break format!("receive failed: {e}"),
                },
            }
        };
        tracing::debug!(%reason, "websocket task finished");
        let _ = inbound_tx.send(TransportEvent::Closed { reason }).await;
    });

    Ok(WsTransport {
        outbound: outbound_tx,
        inbound: inbound_rx,
        abort_handle: handle.abort_handle(),
    })
}
