//! Terminal display surface.
//!
//! The display never owns timer state. It renders whatever its backend
//! pushes and forwards user commands. Attached to a relay host it falls back
//! to a local session, seeded from the last state it saw, as soon as the
//! relay is unreachable.

pub mod input;
pub mod render;

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::{SessionError, TransportError};
use crate::notify::Notifier;
use crate::pomodoro::{
    Command, Durations, EngineSnapshot, Mode, Session, SessionHandle, TimerEngine, TimerEvent,
};
use crate::ws::RelayClient;
use input::{HELP, Input, parse_input};

enum Failure {
    Rejected(String),
    Lost,
}

impl From<SessionError> for Failure {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Closed => Failure::Lost,
            other => Failure::Rejected(other.to_string()),
        }
    }
}

impl From<TransportError> for Failure {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rejected(message) => Failure::Rejected(message),
            other => {
                tracing::warn!("Relay transport failure: {}", other);
                Failure::Lost
            }
        }
    }
}

enum Backend {
    Local {
        session: SessionHandle,
        events: broadcast::Receiver<TimerEvent>,
    },
    Remote(RelayClient),
}

impl Backend {
    fn local(session: SessionHandle) -> Self {
        let events = session.subscribe();
        Backend::Local { session, events }
    }

    async fn send(&mut self, command: Command) -> Result<EngineSnapshot, Failure> {
        match self {
            Backend::Local { session, .. } => Ok(session.send(command).await?),
            Backend::Remote(client) => Ok(client.send(&command).await?),
        }
    }

    async fn next_event(&mut self) -> Option<TimerEvent> {
        match self {
            Backend::Local { events, .. } => loop {
                match events.recv().await {
                    Ok(event) => return Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Display skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            },
            Backend::Remote(client) => client.next_event().await,
        }
    }
}

pub struct Display {
    backend: Backend,
    durations: Durations,
    notifier: Arc<dyn Notifier>,
    last: Option<EngineSnapshot>,
}

impl Display {
    /// Display driving its own in-process session.
    pub fn local(engine: TimerEngine, notifier: Arc<dyn Notifier>) -> Self {
        let durations = *engine.durations();
        let last = Some(engine.snapshot());
        let session = Session::spawn(engine, notifier.clone());
        Self {
            backend: Backend::local(session),
            durations,
            notifier,
            last,
        }
    }

    /// Display attached to a relay host, or a local one if the host is unreachable.
    ///
    /// `durations` and `notifier` are only used once the display has to take
    /// over the countdown itself.
    pub async fn attach(addr: &str, durations: Durations, notifier: Arc<dyn Notifier>) -> Self {
        match RelayClient::connect(addr).await {
            Ok(client) => Self {
                backend: Backend::Remote(client),
                durations,
                notifier,
                last: None,
            },
            Err(e) => {
                tracing::warn!("{}, running the timer locally", e);
                Self::local(TimerEngine::new(durations), notifier)
            }
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.backend, Backend::Local { .. })
    }

    pub fn last_snapshot(&self) -> Option<&EngineSnapshot> {
        self.last.as_ref()
    }

    /// Next event to render. A backend that went away is replaced by a local
    /// session before this returns.
    pub async fn next_update(&mut self) -> TimerEvent {
        loop {
            match self.backend.next_event().await {
                Some(event) => {
                    if let TimerEvent::Tick { snapshot } = &event {
                        self.last = Some(*snapshot);
                    }
                    return event;
                }
                None => self.take_over(),
            }
        }
    }

    /// Apply a command, retrying once on a local session if the backend is gone.
    pub async fn execute(&mut self, command: Command) -> Result<EngineSnapshot, String> {
        let result = match self.backend.send(command.clone()).await {
            Err(Failure::Lost) => {
                self.take_over();
                self.backend.send(command).await
            }
            other => other,
        };
        match result {
            Ok(snapshot) => {
                self.last = Some(snapshot);
                Ok(snapshot)
            }
            Err(Failure::Rejected(message)) => Err(message),
            Err(Failure::Lost) => Err("timer session unavailable".to_string()),
        }
    }

    fn take_over(&mut self) {
        let engine = match &self.last {
            Some(snapshot) => {
                let mut engine = TimerEngine::restore(self.durations, snapshot);
                if snapshot.current().is_running {
                    engine.start();
                }
                engine
            }
            None => TimerEngine::new(self.durations),
        };
        tracing::warn!(
            "Timer backend lost, continuing locally on {}",
            engine.selected_mode()
        );
        self.last = Some(engine.snapshot());
        self.backend = Backend::local(Session::spawn(engine, self.notifier.clone()));
    }

    /// Read commands from `input` until it ends or the user quits.
    pub async fn run<R>(mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        println!("{}", HELP);
        if let Some(snapshot) = &self.last {
            print_status(&render::status_line(snapshot));
        }

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle_line(&line).await {
                        break;
                    }
                }
                event = self.next_update() => match event {
                    TimerEvent::Tick { snapshot } => print_status(&render::status_line(&snapshot)),
                    TimerEvent::Complete { mode } => println!("\n{}", render::completion_line(mode)),
                },
            }
        }
        println!();
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> bool {
        let input = match parse_input(line) {
            Ok(Some(input)) => input,
            Ok(None) => return true,
            Err(e) => {
                println!("✗ {}", e);
                return true;
            }
        };

        let command = match input {
            Input::Quit => return false,
            Input::Help => {
                println!("{}", HELP);
                return true;
            }
            Input::Status => Command::Query,
            Input::SetSelected(seconds) => Command::SetDuration {
                mode: self.selected_mode(),
                seconds,
            },
            Input::Command(command) => command,
        };

        let show_overview = command == Command::Query;
        match self.execute(command).await {
            Ok(snapshot) if show_overview => println!("\n{}", render::overview(&snapshot)),
            Ok(_) => {}
            Err(message) => println!("✗ {}", message),
        }
        true
    }

    fn selected_mode(&self) -> Mode {
        self.last.map(|s| s.selected_mode).unwrap_or(Mode::Focus)
    }
}

fn print_status(line: &str) {
    print!("\r\x1b[2K{}", line);
    let _ = std::io::stdout().flush();
}
