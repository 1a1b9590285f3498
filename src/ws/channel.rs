//! Typed wrapper around one player's WebSocket

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};

use crate::protocol::ServerEvent;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Transport(#[from] axum::Error),
}

/// What the read side produced
#[derive(Debug)]
pub enum Inbound {
    Text(String),
    Ping(Bytes),
    /// Pong frames and binary payloads that are not UTF-8
    Ignored,
    /// Peer closed, the stream ended, or the transport failed
    Closed,
}

pub struct Connection {
    sender: SplitSink<WebSocket, Message>,
    receiver: SplitStream<WebSocket>,
}

impl Connection {
    pub fn new(socket: WebSocket) -> Self {
        let (sender, receiver) = socket.split();
        Self { sender, receiver }
    }

    pub async fn send_event(&mut self, event: &ServerEvent) -> Result<(), ChannelError> {
        let json = serde_json::to_string(event)?;
        self.sender.send(Message::Text(json.into())).await?;
        Ok(())
    }

    pub async fn pong(&mut self, data: Bytes) -> Result<(), ChannelError> {
        self.sender.send(Message::Pong(data)).await?;
        Ok(())
    }

    /// Wait for the next frame. Cancel-safe, so it can sit in a `select!`.
    pub async fn next_frame(&mut self) -> Inbound {
        match self.receiver.next().await {
            Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_owned()),
            // Some clients send JSON in binary frames
            Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                Ok(text) => Inbound::Text(text.to_owned()),
                Err(_) => {
                    tracing::warn!("Ignoring non-UTF-8 binary frame ({} bytes)", data.len());
                    Inbound::Ignored
                }
            },
            Some(Ok(Message::Ping(data))) => Inbound::Ping(data),
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!("Peer sent close frame: {:?}", frame);
                Inbound::Closed
            }
            Some(Ok(_)) => Inbound::Ignored,
            Some(Err(e)) => {
                tracing::error!("WebSocket read error: {}", e);
                Inbound::Closed
            }
            None => Inbound::Closed,
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.sender.close().await {
            tracing::debug!("Error while closing websocket: {}", e);
        }
    }
}
