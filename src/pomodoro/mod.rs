pub mod engine;
pub mod format;
pub mod mode;
pub mod session;

pub use engine::{CompletionEvent, EngineSnapshot, TimerEngine, TimerState};
pub use mode::{Durations, Mode, ModeMap};
pub use session::{Command, Session, SessionHandle, TimerEvent};
