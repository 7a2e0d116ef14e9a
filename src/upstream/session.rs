//! The single outbound WebSocket session.
//!
//! # Responsibilities
//! - Build the handshake request with the configured header directives
//! - Perform the opening handshake under a timeout
//! - Run the reader task that feeds the reply slot
//! - Serialize writes through the shared sink
//! - Record lifecycle events in the state machine

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::bridge::slot::ReplySender;
use crate::config::headers::HeaderDirectives;
use crate::observability::metrics;
use crate::upstream::state::{SessionEvent, SessionState, StateCell};
use crate::upstream::{SessionError, Upstream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Live connection to the backend.
pub struct Session {
    uri: String,
    sink: Mutex<WsSink>,
    state: Arc<StateCell>,
    reader: JoinHandle<()>,
}

impl Session {
    /// Connect to `uri`, injecting `headers` into the opening handshake.
    ///
    /// Text messages received afterwards are handed to `replies`.
    pub async fn connect(
        uri: &str,
        headers: &HeaderDirectives,
        connect_timeout: Duration,
        replies: ReplySender,
    ) -> Result<Self, SessionError> {
        let request = build_request(uri, headers)?;
        let state = Arc::new(StateCell::new());

        tracing::info!(uri = %uri, headers = headers.len(), "Connecting to backend");

        let (stream, response) = match timeout(connect_timeout, tokio_tungstenite::connect_async(request)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                state.fire(SessionEvent::Failed);
                return Err(SessionError::Handshake {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                state.fire(SessionEvent::Failed);
                return Err(SessionError::HandshakeTimeout {
                    uri: uri.to_string(),
                    secs: connect_timeout.as_secs(),
                });
            }
        };

        state.fire(SessionEvent::Opened);
        tracing::info!(uri = %uri, status = %response.status(), "Websocket opened");

        let (sink, source) = stream.split();
        let reader = tokio::spawn(read_loop(source, replies, state.clone()));

        Ok(Self {
            uri: uri.to_string(),
            sink: Mutex::new(sink),
            state,
            reader,
        })
    }

    /// Backend URI this session is connected to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Send a close frame (if still open) and mark the session closed.
    pub async fn close(&self) {
        if self.state.current().is_open() {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "Close frame not delivered");
            }
        }
        if self.state.fire(SessionEvent::Closed).is_some() {
            tracing::info!(uri = %self.uri, "Websocket closed");
        }
    }
}

#[async_trait]
impl Upstream for Session {
    async fn send(&self, text: String) -> Result<(), SessionError> {
        let state = self.state.current();
        if !state.is_open() {
            return Err(SessionError::NotOpen(state));
        }

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(Message::text(text)).await {
            tracing::error!(uri = %self.uri, error = %e, "Websocket send failed");
            self.state.fire(SessionEvent::Failed);
            return Err(SessionError::Transport(e.to_string()));
        }

        metrics::record_message("outbound");
        Ok(())
    }

    fn state(&self) -> SessionState {
        self.state.current()
    }

    fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("uri", &self.uri)
            .field("state", &self.state.current())
            .finish()
    }
}

/// Build the client handshake request with the extra headers applied.
pub fn build_request(uri: &str, headers: &HeaderDirectives) -> Result<Request, SessionError> {
    let mut request = uri.into_client_request().map_err(|e| SessionError::Handshake {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    for (name, value) in headers.iter() {
        let invalid = || SessionError::InvalidHeader(format!("{}: {}", name, value));
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        request.headers_mut().insert(header_name, header_value);
    }

    Ok(request)
}

/// Drain the read half until the connection ends.
async fn read_loop(mut source: WsSource, replies: ReplySender, state: Arc<StateCell>) {
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!(bytes = text.as_str().len(), "Websocket: {}", text.as_str());
                metrics::record_message("inbound");
                if replies.on_message(text.as_str().to_owned()).await.is_err() {
                    tracing::warn!("Reply slot dropped, stopping reader");
                    state.fire(SessionEvent::Closed);
                    return;
                }
            }
            Ok(Message::Binary(data)) => {
                tracing::warn!(bytes = data.len(), "Ignoring binary frame");
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Websocket closed by backend");
                state.fire(SessionEvent::Closed);
                return;
            }
            // ping/pong are answered by the transport
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Websocket error");
                state.fire(SessionEvent::Failed);
                return;
            }
        }
    }

    tracing::info!("Websocket closed");
    state.fire(SessionEvent::Closed);
}
