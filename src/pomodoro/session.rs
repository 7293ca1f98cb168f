use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::engine::{EngineSnapshot, TimerEngine};
use super::mode::Mode;
use crate::error::{EngineError, SchedulerError, SessionError};
use crate::notify::{self, Notifier};
use crate::scheduler::{TICK_INTERVAL, Tick, TickReceiver, TickScheduler};

const EVENT_BUFFER: usize = 100;
const REQUEST_BUFFER: usize = 32;

/// Commands a display surface can issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Run the selected mode, optionally applying a new duration first.
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    Pause,
    Reset,
    Query,
    SelectMode {
        mode: Mode,
    },
    SetDuration {
        mode: Mode,
        seconds: u64,
    },
}

/// Pushed to every subscriber of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// State after a tick or an accepted command.
    Tick { snapshot: EngineSnapshot },
    /// A run reached 0:00. Sent once per completed run.
    Complete { mode: Mode },
}

type Reply = oneshot::Sender<Result<EngineSnapshot, SessionError>>;

struct Request {
    command: Command,
    reply: Reply,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request").field("command", &self.command).finish()
    }
}

/// Owns the engine and everything that drives it; runs on a single task.
pub struct Session {
    engine: TimerEngine,
    scheduler: TickScheduler,
    ticks: TickReceiver,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<TimerEvent>,
    requests: mpsc::Receiver<Request>,
}

impl Session {
    /// Spawn the session on the current tokio runtime.
    pub fn spawn(engine: TimerEngine, notifier: Arc<dyn Notifier>) -> SessionHandle {
        let (scheduler, ticks) = TickScheduler::new(TICK_INTERVAL);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (request_tx, requests) = mpsc::channel(REQUEST_BUFFER);

        let session = Session {
            engine,
            scheduler,
            ticks,
            notifier,
            events: events.clone(),
            requests,
        };
        tokio::spawn(session.run());

        SessionHandle {
            requests: request_tx,
            events,
        }
    }

    async fn run(mut self) {
        tracing::debug!("Timer session started on {}", self.engine.selected_mode());
        // An engine handed over already running keeps counting.
        if self.sync_scheduler().is_err() {
            tracing::warn!("Session starts paused");
        }
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                Some(tick) = self.ticks.recv() => self.on_tick(tick),
            }
        }
        self.scheduler.cancel();
        tracing::debug!("Timer session shut down");
    }

    fn handle(&mut self, request: Request) {
        let result = self.apply(request.command);
        if let Err(e) = &result {
            tracing::warn!("Command rejected: {}", e);
        }
        if request.reply.send(result).is_err() {
            tracing::debug!("Command caller went away before the reply");
        }
    }

    fn apply(&mut self, command: Command) -> Result<EngineSnapshot, SessionError> {
        tracing::debug!("Command: {:?}", command);
        let changes_state = command != Command::Query;
        match command {
            Command::Start { duration } => {
                if let Some(seconds) = duration {
                    if seconds == 0 {
                        return Err(EngineError::ZeroDuration.into());
                    }
                    // A new duration restarts the selected mode from the top.
                    let mode = self.engine.selected_mode();
                    self.engine.pause();
                    self.scheduler.cancel();
                    self.engine.set_duration(mode, seconds)?;
                }
                self.engine.start();
            }
            Command::Pause => self.engine.pause(),
            Command::Reset => self.engine.reset(),
            Command::Query => {}
            Command::SelectMode { mode } => self.engine.select_mode(mode),
            Command::SetDuration { mode, seconds } => self.engine.set_duration(mode, seconds)?,
        }

        let synced = self.sync_scheduler();
        let snapshot = self.engine.snapshot();
        if changes_state {
            self.publish(TimerEvent::Tick { snapshot });
        }
        synced?;
        Ok(snapshot)
    }

    /// Hold the scheduler exactly while the selected mode runs.
    fn sync_scheduler(&mut self) -> Result<(), SchedulerError> {
        if !self.engine.is_running() {
            self.scheduler.cancel();
            return Ok(());
        }
        if self.scheduler.is_active() {
            return Ok(());
        }
        if let Err(e) = self.scheduler.start() {
            self.engine.pause();
            tracing::error!("Could not start the countdown: {}", e);
            return Err(e);
        }
        Ok(())
    }

    fn on_tick(&mut self, tick: Tick) {
        if !self.scheduler.is_current(tick) {
            tracing::trace!("Dropping stale tick from generation {}", tick.generation);
            return;
        }

        let completion = self.engine.tick();
        if !self.engine.is_running() {
            self.scheduler.cancel();
        }
        self.publish(TimerEvent::Tick {
            snapshot: self.engine.snapshot(),
        });

        if let Some(event) = completion {
            self.publish(TimerEvent::Complete { mode: event.mode });
            notify::announce_in_background(self.notifier.clone(), event);
        }
    }

    fn publish(&self, event: TimerEvent) {
        // No subscribers is fine; the state is still queryable.
        let _ = self.events.send(event);
    }
}

/// Cloneable front door to a running [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<TimerEvent>,
}

impl SessionHandle {
    pub async fn send(&self, command: Command) -> Result<EngineSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn start(&self) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::Start { duration: None }).await
    }

    pub async fn pause(&self) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::Pause).await
    }

    pub async fn reset(&self) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::Reset).await
    }

    pub async fn select_mode(&self, mode: Mode) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::SelectMode { mode }).await
    }

    pub async fn set_duration(
        &self,
        mode: Mode,
        seconds: u64,
    ) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::SetDuration { mode, seconds }).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, SessionError> {
        self.send(Command::Query).await
    }
}
