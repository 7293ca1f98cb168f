use futures_util::{Sink, SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::{self, protocol::Message};

use super::protocol::{Command, ServerMessage};
use crate::error::TransportError;
use crate::pomodoro::SessionHandle;

pub async fn start_websocket_server(
    addr: SocketAddr,
    session: SessionHandle,
) -> Result<(), TransportError> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Relay listening on ws://{}", listener.local_addr()?);
    serve(listener, session).await
}

/// Accept display connections forever. Every connection drives the same session.
pub async fn serve(listener: TcpListener, session: SessionHandle) -> Result<(), TransportError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        tracing::info!("New display connection from: {}", peer_addr);
        tokio::spawn(handle_connection(stream, peer_addr, session.clone()));
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, session: SessionHandle) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut events = session.subscribe();

    // A freshly attached display renders the current state right away.
    match session.snapshot().await {
        Ok(snapshot) => {
            if let Err(e) = send_message(&mut ws_sender, &ServerMessage::Tick { snapshot }).await {
                tracing::warn!("Failed to send initial state to {}: {}", peer_addr, e);
                return;
            }
        }
        Err(e) => {
            tracing::error!("Timer session unavailable: {}", e);
            return;
        }
    }

    loop {
        tokio::select! {
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let response = respond(&text, &session).await;
                    if let Err(e) = send_message(&mut ws_sender, &response).await {
                        tracing::warn!("Failed to send response to {}: {}", peer_addr, e);
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                        tracing::warn!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Display connection closed by {}", peer_addr);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error from {}: {}", peer_addr, e);
                    break;
                }
            },
            event = events.recv() => {
                let message = match event {
                    Ok(event) => ServerMessage::from(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Display {} lagged by {} events, resyncing", peer_addr, skipped);
                        match session.snapshot().await {
                            Ok(snapshot) => ServerMessage::Tick { snapshot },
                            Err(_) => break,
                        }
                    }
                    Err(RecvError::Closed) => break,
                };
                if let Err(e) = send_message(&mut ws_sender, &message).await {
                    tracing::warn!("Failed to push event to {}: {}", peer_addr, e);
                    break;
                }
            }
        }
    }

    tracing::info!("Display connection with {} terminated", peer_addr);
}

async fn respond(text: &str, session: &SessionHandle) -> ServerMessage {
    let command = match serde_json::from_str::<Command>(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Failed to parse command: {}", e);
            return ServerMessage::rejected(format!("Parse error: {}", e));
        }
    };

    tracing::debug!("[Relay] Received: {:?}", command);
    match session.send(command).await {
        Ok(snapshot) => ServerMessage::accepted(snapshot),
        Err(e) => ServerMessage::rejected(e.to_string()),
    }
}

async fn send_message<S>(sender: &mut S, message: &ServerMessage) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(message)?;
    sender.send(Message::Text(json)).await?;
    Ok(())
}
