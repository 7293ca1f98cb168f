// Focus timer: per-mode countdown engine, a relay host that keeps the
// countdown alive outside any display, and a terminal display surface.

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod notify;
pub mod pomodoro;
pub mod scheduler;
pub mod ws;

pub use config::AppConfig;
pub use error::{EngineError, SessionError, TransportError};
pub use pomodoro::{Command, EngineSnapshot, Mode, Session, SessionHandle, TimerEngine, TimerEvent, TimerState};

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
