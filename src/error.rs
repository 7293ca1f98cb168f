use thiserror::Error;

use crate::pomodoro::Mode;

/// Invalid-argument rejections returned synchronously by timer commands.
///
/// A rejected command never touches the engine state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("duration must be a positive number of seconds")]
    ZeroDuration,

    #[error("cannot change the {} duration while it is running", .0.label())]
    ModeRunning(Mode),

    #[error("invalid time '{0}', expected MM:SS")]
    InvalidClock(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mode '{0}' (expected focus, short or long)")]
pub struct UnknownMode(pub String);

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no async runtime available to drive the tick scheduler")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("notifications unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to relay at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("relay io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("relay connection closed")]
    Closed,

    #[error("relay did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed relay message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("relay rejected command: {0}")]
    Rejected(String),
}

/// Errors surfaced by a [`crate::pomodoro::SessionHandle`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("timer session has shut down")]
    Closed,
}
