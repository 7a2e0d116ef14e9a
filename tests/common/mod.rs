//! Shared utilities for integration tests: mock WebSocket backends and a
//! bridge launcher on ephemeral ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::Message;

use ws_bridge::config::BridgeConfig;
use ws_bridge::lifecycle::start;
use ws_bridge::{Session, Shutdown};

/// A running bridge under test.
pub struct TestBridge {
    pub base_url: String,
    pub session: Arc<Session>,
    pub shutdown: Shutdown,
}

/// Start a bridge on 127.0.0.1:0 pointed at `backend`.
pub async fn start_bridge(backend: SocketAddr, tweak: impl FnOnce(&mut BridgeConfig)) -> TestBridge {
    let mut config = BridgeConfig::default();
    config.listener.bind_host = "127.0.0.1".to_string();
    config.listener.port = Some(0);
    config.upstream.url = Some(format!("ws://{}/socket", backend));
    config.bridge.reply_timeout_secs = 5;
    tweak(&mut config);

    let bridge = start(&config).await.expect("bridge failed to start");
    let base_url = format!("http://{}", bridge.local_addr());
    let session = bridge.session();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = bridge.serve(server_shutdown).await;
    });

    TestBridge {
        base_url,
        session,
        shutdown,
    }
}

/// HTTP client that never goes through an environment proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start a backend that echoes every text message after `delay`.
pub async fn start_echo_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        tokio::time::sleep(delay).await;
                        if ws.send(Message::text(text.as_str().to_owned())).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    addr
}

/// Start an echo backend that reports the handshake headers it saw.
pub async fn start_header_capture_backend() -> (SocketAddr, oneshot::Receiver<HeaderMap>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (headers_tx, headers_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let _ = headers_tx.send(request.headers().clone());
            Ok(response)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(socket, callback).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = ws.send(Message::text(text.as_str().to_owned())).await;
            }
        }
    });

    (addr, headers_rx)
}

/// What a scripted backend should do next.
pub enum Command {
    Send(String),
    Close,
}

/// A backend driven step by step from the test.
pub struct ScriptedBackend {
    pub addr: SocketAddr,
    commands: mpsc::UnboundedSender<Command>,
    received: mpsc::UnboundedReceiver<String>,
}

impl ScriptedBackend {
    /// Push a text message to the bridge.
    pub fn send(&self, text: &str) {
        let _ = self.commands.send(Command::Send(text.to_string()));
    }

    /// Close the WebSocket from the backend side.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Next text message the bridge forwarded.
    pub async fn next_received(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("bridge did not forward a message")
            .expect("backend task ended")
    }
}

/// Start a backend that only replies when told to.
pub async fn start_scripted_backend() -> ScriptedBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
    let (received_tx, received_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();

        loop {
            tokio::select! {
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(text.as_str().to_owned());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                },
                command = commands_rx.recv() => match command {
                    Some(Command::Send(text)) => {
                        if ws.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Command::Close) | None => {
                        let _ = ws.close(None).await;
                        // Drain until the bridge acknowledges the close
                        while let Some(Ok(_)) = ws.next().await {}
                        break;
                    }
                },
            }
        }
    });

    ScriptedBackend {
        addr,
        commands: commands_tx,
        received: received_rx,
    }
}
