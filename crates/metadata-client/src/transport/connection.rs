//! Socket setup and the background reader and writer tasks.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use metadata_common::ConnectionError;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::protocol::{decode_push, ServerEvent};
use crate::server::ConnectionState;

use super::envelope::Frame;
use super::types::TransportConfig;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) type CallResult = Result<Value, ConnectionError>;

/// In-flight invocations keyed by frame id.
pub(crate) type PendingCalls = Arc<Mutex<HashMap<u64, oneshot::Sender<CallResult>>>>;

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

pub(crate) async fn open(config: &TransportConfig) -> Result<WsStream, ConnectionError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| ConnectionError::Transport(format!("invalid url: {e}")))?;

    if let Some(token) = &config.access_token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ConnectionError::Transport("access token is not a valid header".into()))?;
        request.headers_mut().insert(header::AUTHORIZATION, value);
    }

    info!(url = %config.url, "connecting to metadata hub");

    match tokio::time::timeout(
        config.connect_timeout,
        tokio_tungstenite::connect_async(request),
    )
    .await
    {
        Ok(Ok((stream, _))) => Ok(stream),
        Ok(Err(e)) => Err(ConnectionError::Transport(e.to_string())),
        Err(_elapsed) => Err(ConnectionError::Timeout),
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Route incoming frames until the socket closes, then fail every pending
/// call and mark the connection disconnected.
pub(crate) async fn reader_loop(
    mut read: SplitStream<WsStream>,
    pending: PendingCalls,
    push_tx: mpsc::Sender<ServerEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    while let Some(msg) = read.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => handle_frame(&text, &pending, &push_tx).await,
            Ok(WsMessage::Close(frame)) => {
                info!(reason = ?frame.map(|f| f.reason.as_str().to_owned()), "metadata hub closed connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.send_replace(ConnectionState::Disconnected);

    let mut calls = pending.lock().await;
    if !calls.is_empty() {
        debug!(count = calls.len(), "failing pending calls");
    }
    for (_, tx) in calls.drain() {
        let _ = tx.send(Err(ConnectionError::Closed));
    }
}

async fn handle_frame(text: &str, pending: &PendingCalls, push_tx: &mpsc::Sender<ServerEvent>) {
    let frame = match Frame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping malformed frame");
            return;
        }
    };

    match frame {
        Frame::Completion { id, result, error } => {
            let Some(tx) = pending.lock().await.remove(&id) else {
                debug!(id, "completion for unknown or expired call");
                return;
            };
            let outcome = match error {
                Some(message) => Err(ConnectionError::Rejected(message)),
                None => Ok(result),
            };
            let _ = tx.send(outcome);
        }
        Frame::Push { method, args } => match decode_push(&method, args) {
            Ok(event) => deliver(push_tx, event).await,
            Err(e) => warn!(method = %method, error = %e, "dropping malformed push"),
        },
        Frame::Close { reason } => {
            info!(reason = reason.as_deref().unwrap_or(""), "metadata hub is closing");
            deliver(push_tx, ServerEvent::DisconnectRequested).await;
        }
        Frame::Invoke { method, .. } => {
            warn!(method = %method, "unexpected invoke frame from hub");
        }
    }
}

async fn deliver(push_tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) {
    if push_tx.send(event).await.is_err() {
        debug!("push receiver dropped");
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

pub(crate) async fn writer_loop(
    mut write: SplitSink<WsStream, WsMessage>,
    mut outgoing: mpsc::Receiver<WsMessage>,
) {
    while let Some(msg) = outgoing.recv().await {
        let closing = matches!(msg, WsMessage::Close(_));
        if let Err(e) = write.send(msg).await {
            warn!(error = %e, "failed to write frame");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = write.close().await;
}
