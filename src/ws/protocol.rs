use serde::{Deserialize, Serialize};

use crate::pomodoro::{EngineSnapshot, Mode, TimerEvent};

pub use crate::pomodoro::Command;

/// Host to display messages. Sent as JSON text frames tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Tick {
        snapshot: EngineSnapshot,
    },
    Complete {
        mode: Mode,
    },
    /// Answer to the command most recently received on this connection.
    Response {
        success: bool,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        snapshot: Option<EngineSnapshot>,
    },
}

impl ServerMessage {
    pub fn accepted(snapshot: EngineSnapshot) -> Self {
        ServerMessage::Response {
            success: true,
            message: None,
            snapshot: Some(snapshot),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ServerMessage::Response {
            success: false,
            message: Some(message.into()),
            snapshot: None,
        }
    }
}

impl From<TimerEvent> for ServerMessage {
    fn from(event: TimerEvent) -> Self {
        match event {
            TimerEvent::Tick { snapshot } => ServerMessage::Tick { snapshot },
            TimerEvent::Complete { mode } => ServerMessage::Complete { mode },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pomodoro::TimerEngine;

    #[test]
    fn test_tick_serialization() {
        let message = ServerMessage::Tick {
            snapshot: TimerEngine::default().snapshot(),
        };
        let json: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "tick");
        assert_eq!(json["snapshot"]["selected_mode"], "focus");
        assert_eq!(json["snapshot"]["states"]["long_break"]["time_left"], 900);
        assert_eq!(json["snapshot"]["states"]["focus"]["is_running"], false);
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_string(&ServerMessage::rejected("Parse error")).unwrap();
        assert!(json.contains("\"type\":\"response\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"message\":\"Parse error\""));
    }

    #[test]
    fn test_complete_parses() {
        let message: ServerMessage =
            serde_json::from_str(r#"{"type":"complete","mode":"short_break"}"#).unwrap();
        assert_eq!(
            message,
            ServerMessage::Complete {
                mode: Mode::ShortBreak
            }
        );
    }
}
