//! WebSocket 连接策略
//!
//! 通过 `tokio-tungstenite` 维持一条持久套接字。协议层的
//! Ping/Pong/Binary 帧在这里消化，只有文本帧进入流水线。

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::{ConnectionStrategy, FrameSource, TransportConfig};

/// WebSocket 策略
pub struct WebSocketStrategy {
    base_url: String,
}

impl WebSocketStrategy {
    /// `base_url` 形如 `wss://api.estate.example`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn stream_url(&self, config: &TransportConfig) -> String {
        format!(
            "{}/notifications/stream?userId={}&token={}",
            self.base_url.trim_end_matches('/'),
            config.user_id,
            config.access_token
        )
    }
}

#[async_trait]
impl ConnectionStrategy for WebSocketStrategy {
    fn name(&self) -> &'static str {
        "websocket"
    }

    async fn open(&self, config: &TransportConfig) -> Result<Box<dyn FrameSource>> {
        let url = self.stream_url(config);
        let (ws, _response) = connect_async(url)
            .await
            .context("websocket handshake failed")?;
        Ok(Box::new(WsFrameSource { ws }))
    }
}

struct WsFrameSource {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn next_frame(&mut self) -> Result<Option<String>> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Ping(payload))) => {
                    // 协议层心跳，原样回应
                    let _ = self.ws.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(other)) => {
                    debug!(frame = ?other, "Ignoring non-text websocket frame");
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
