//! WebSocket handle: inbound updates as broadcast events, outbound pulls as
//! fire-and-forget text frames.

use async_trait::async_trait;
use futures::{stream::SplitSink, SinkExt, StreamExt};
use shared::{
    domain::Side,
    protocol::{ClientAction, GameUpdate},
};
use tokio::{
    net::TcpStream,
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;

const EVENT_CHANNEL_CAPACITY: usize = 256;

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Update(GameUpdate),
    Error(String),
    Disconnected,
}

#[async_trait]
pub trait GameHandle: Send + Sync {
    async fn send_pull(&self, side: Side) -> Result<(), ClientError>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

pub struct GameClient {
    url: String,
    writer: Mutex<WsWriter>,
    events: broadcast::Sender<ClientEvent>,
    reader_task: JoinHandle<()>,
}

pub fn validate_server_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|err| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ClientError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("expected ws:// or wss://, got {other}://"),
        }),
    }
}

impl GameClient {
    /// Connects and starts reading. The returned receiver is subscribed
    /// before the reader starts, so it also sees the server's first state.
    pub async fn connect(
        server_url: &str,
    ) -> Result<(Self, broadcast::Receiver<ClientEvent>), ClientError> {
        let url = validate_server_url(server_url)?;
        let (ws_stream, _) =
            connect_async(url.as_str())
                .await
                .map_err(|source| ClientError::Connect {
                    url: url.to_string(),
                    source,
                })?;
        info!(url = %url, "connected to game server");

        let (writer, mut reader) = ws_stream.split();
        let (events, first_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let reader_events = events.clone();
        let reader_task = tokio::spawn(async move {
            while let Some(msg) = reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match GameUpdate::decode(&text) {
                        Ok(update) => {
                            let _ = reader_events.send(ClientEvent::Update(update));
                        }
                        Err(err) => {
                            warn!(%err, "dropping server frame");
                            let _ = reader_events.send(ClientEvent::Error(err.to_string()));
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = reader_events.send(ClientEvent::Error(format!(
                            "websocket receive failed: {err}"
                        )));
                        break;
                    }
                }
            }
            info!("game server connection closed");
            let _ = reader_events.send(ClientEvent::Disconnected);
        });

        Ok((
            Self {
                url: url.to_string(),
                writer: Mutex::new(writer),
                events,
                reader_task,
            },
            first_rx,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send_action(&self, action: ClientAction) -> Result<(), ClientError> {
        let text = action.encode()?;
        debug!(%text, "sending action");
        self.writer
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(ClientError::Send)
    }

    pub async fn close(&self) {
        let _ = self.writer.lock().await.close().await;
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

#[async_trait]
impl GameHandle for GameClient {
    async fn send_pull(&self, side: Side) -> Result<(), ClientError> {
        self.send_action(ClientAction::pull(side)).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
