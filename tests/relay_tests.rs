//! Integration tests for the relay host over a real WebSocket connection
//!
//! These tests verify that the host:
//! - Pushes the current state to every display that attaches
//! - Answers commands and streams ticks and a single completion
//! - Rejects bad commands without dropping the connection
//! - Keeps counting while no display is attached

use focus_timer::notify::SilentNotifier;
use focus_timer::ws::{self, RelayClient, ServerMessage};
use focus_timer::{Command, Mode, Session, TimerEngine, TimerEvent, TransportError};
use futures_util::{SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{Duration, sleep, timeout};
use tokio_tungstenite::tungstenite::protocol::Message;

async fn spawn_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let session = Session::spawn(TimerEngine::default(), Arc::new(SilentNotifier));
    tokio::spawn(ws::serve(listener, session));
    addr
}

async fn next_event(client: &mut RelayClient) -> TimerEvent {
    timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("Timeout waiting for relay event")
        .expect("Relay connection closed")
}

#[tokio::test]
async fn test_attach_pushes_current_state() {
    let addr = spawn_host().await;
    let mut client = RelayClient::connect(&addr).await.unwrap();

    match next_event(&mut client).await {
        TimerEvent::Tick { snapshot } => {
            assert_eq!(snapshot, TimerEngine::default().snapshot());
        }
        other => panic!("Expected initial tick, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_countdown_completes_once_over_relay() {
    let addr = spawn_host().await;
    let mut client = RelayClient::connect(&addr).await.unwrap();

    client
        .send(&Command::SetDuration {
            mode: Mode::Focus,
            seconds: 2,
        })
        .await
        .unwrap();
    let started = client.send(&Command::Start { duration: None }).await.unwrap();
    assert!(started.current().is_running);

    let mut completions = 0;
    loop {
        match next_event(&mut client).await {
            TimerEvent::Complete { mode } => {
                assert_eq!(mode, Mode::Focus);
                completions += 1;
                break;
            }
            TimerEvent::Tick { .. } => {}
        }
    }
    assert_eq!(completions, 1);

    let state = *client.send(&Command::Query).await.unwrap().current();
    assert_eq!(state.time_left, 0);
    assert_eq!(state.total_time, 2);
    assert!(!state.is_running);
}

#[tokio::test]
async fn test_rejected_command_reports_reason() {
    let addr = spawn_host().await;
    let mut client = RelayClient::connect(&addr).await.unwrap();

    let err = client
        .send(&Command::SetDuration {
            mode: Mode::ShortBreak,
            seconds: 0,
        })
        .await
        .unwrap_err();
    match err {
        TransportError::Rejected(message) => assert!(message.contains("positive")),
        other => panic!("Expected rejection, got: {:?}", other),
    }

    let snapshot = client.send(&Command::Query).await.unwrap();
    assert_eq!(snapshot.state(Mode::ShortBreak).total_time, 300);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let addr = spawn_host().await;
    let (mut ws_stream, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
        .await
        .unwrap();

    async fn next_message<S>(stream: &mut S) -> ServerMessage
    where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            let msg = timeout(Duration::from_secs(5), stream.next())
                .await
                .expect("Timeout waiting for frame")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    assert!(matches!(
        next_message(&mut ws_stream).await,
        ServerMessage::Tick { .. }
    ));

    ws_stream
        .send(Message::Text("not json".to_string()))
        .await
        .unwrap();
    match next_message(&mut ws_stream).await {
        ServerMessage::Response {
            success, message, ..
        } => {
            assert!(!success);
            assert!(message.unwrap().starts_with("Parse error"));
        }
        other => panic!("Expected response, got: {:?}", other),
    }

    ws_stream
        .send(Message::Text(r#"{"type":"query"}"#.to_string()))
        .await
        .unwrap();
    assert!(matches!(
        next_message(&mut ws_stream).await,
        ServerMessage::Response { success: true, .. }
    ));
}

#[tokio::test]
async fn test_countdown_survives_display_reload() {
    let addr = spawn_host().await;
    let mut first = RelayClient::connect(&addr).await.unwrap();
    first.send(&Command::Start { duration: None }).await.unwrap();
    drop(first);

    sleep(Duration::from_millis(1500)).await;

    let mut second = RelayClient::connect(&addr).await.unwrap();
    match next_event(&mut second).await {
        TimerEvent::Tick { snapshot } => {
            let focus = snapshot.state(Mode::Focus);
            assert!(focus.is_running);
            assert!(focus.time_left < 1500);
        }
        other => panic!("Expected initial tick, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_connect_to_missing_host_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = RelayClient::connect(&addr).await;
    assert!(matches!(result, Err(TransportError::Connect { .. })));
}

#[tokio::test]
async fn test_unanswered_command_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws_stream = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws_stream.next().await {}
    });

    let mut client = RelayClient::connect(&addr).await.unwrap();
    let result = timeout(Duration::from_secs(10), client.send(&Command::Query))
        .await
        .expect("send never gave up on a silent host");
    assert!(matches!(
        result,
        Err(TransportError::Timeout(waited)) if waited == ws::RESPONSE_TIMEOUT
    ));
}
