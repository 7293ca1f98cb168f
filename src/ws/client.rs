use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::protocol::{Command, ServerMessage};
use crate::error::TransportError;
use crate::pomodoro::{EngineSnapshot, TimerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ResponseResult = Result<EngineSnapshot, String>;

pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Display-side end of the relay connection.
///
/// A background reader splits incoming frames into pushed events and command
/// responses. The host answers commands in order, so responses pair up with
/// commands one by one.
pub struct RelayClient {
    sender: SplitSink<WsStream, Message>,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    responses: mpsc::UnboundedReceiver<ResponseResult>,
    reader: JoinHandle<()>,
}

impl RelayClient {
    /// Connect to a host at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let url = format!("ws://{}", addr);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;
        tracing::info!("Attached to relay at {}", url);

        let (sender, mut receiver) = ws_stream.split();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (responses_tx, responses) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Relay connection error: {}", e);
                        break;
                    }
                };

                let delivered = match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::Tick { snapshot }) => {
                        events_tx.send(TimerEvent::Tick { snapshot }).is_ok()
                    }
                    Ok(ServerMessage::Complete { mode }) => {
                        events_tx.send(TimerEvent::Complete { mode }).is_ok()
                    }
                    Ok(ServerMessage::Response {
                        success,
                        message,
                        snapshot,
                    }) => {
                        let result = match (success, snapshot) {
                            (true, Some(snapshot)) => Ok(snapshot),
                            (true, None) => Err("response without state".to_string()),
                            (false, _) => Err(message.unwrap_or_else(|| "rejected".to_string())),
                        };
                        responses_tx.send(result).is_ok()
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring malformed relay message: {}", e);
                        true
                    }
                };
                if !delivered {
                    break;
                }
            }
            tracing::info!("Relay connection closed");
        });

        Ok(Self {
            sender,
            events,
            responses,
            reader,
        })
    }

    /// Send a command and wait up to [`RESPONSE_TIMEOUT`] for the host's answer.
    ///
    /// After a timeout the pairing of responses to commands is lost, so the
    /// connection must not be used again.
    pub async fn send(&mut self, command: &Command) -> Result<EngineSnapshot, TransportError> {
        let json = serde_json::to_string(command)?;
        self.sender.send(Message::Text(json)).await?;
        match timeout(RESPONSE_TIMEOUT, self.responses.recv()).await {
            Ok(Some(Ok(snapshot))) => Ok(snapshot),
            Ok(Some(Err(message))) => Err(TransportError::Rejected(message)),
            Ok(None) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Timeout(RESPONSE_TIMEOUT)),
        }
    }

    /// Next pushed event; `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        self.events.recv().await
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
