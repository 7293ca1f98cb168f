use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::UnknownMode;

pub const FOCUS_SECONDS: u64 = 25 * 60; // Default focus session
pub const SHORT_BREAK_SECONDS: u64 = 5 * 60; // Default short break
pub const LONG_BREAK_SECONDS: u64 = 15 * 60; // Default long break

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn default_duration(&self) -> u64 {
        match self {
            Mode::Focus => FOCUS_SECONDS,
            Mode::ShortBreak => SHORT_BREAK_SECONDS,
            Mode::LongBreak => LONG_BREAK_SECONDS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mode::Focus => "⚡",
            Mode::ShortBreak => "☕",
            Mode::LongBreak => "🕒",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "focus" | "work" => Ok(Mode::Focus),
            "short" | "short_break" | "shortbreak" => Ok(Mode::ShortBreak),
            "long" | "long_break" | "longbreak" => Ok(Mode::LongBreak),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// A value for every [`Mode`]. There are no missing keys, so lookups never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeMap<T> {
    pub focus: T,
    pub short_break: T,
    pub long_break: T,
}

impl<T> ModeMap<T> {
    pub fn from_fn(mut f: impl FnMut(Mode) -> T) -> Self {
        Self {
            focus: f(Mode::Focus),
            short_break: f(Mode::ShortBreak),
            long_break: f(Mode::LongBreak),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mode, &T)> {
        Mode::ALL.into_iter().map(move |mode| (mode, &self[mode]))
    }
}

impl<T> Index<Mode> for ModeMap<T> {
    type Output = T;

    fn index(&self, mode: Mode) -> &T {
        match mode {
            Mode::Focus => &self.focus,
            Mode::ShortBreak => &self.short_break,
            Mode::LongBreak => &self.long_break,
        }
    }
}

impl<T> IndexMut<Mode> for ModeMap<T> {
    fn index_mut(&mut self, mode: Mode) -> &mut T {
        match mode {
            Mode::Focus => &mut self.focus,
            Mode::ShortBreak => &mut self.short_break,
            Mode::LongBreak => &mut self.long_break,
        }
    }
}

/// Configured duration in seconds per mode.
pub type Durations = ModeMap<u64>;

impl Durations {
    pub fn defaults() -> Self {
        ModeMap::from_fn(|mode| mode.default_duration())
    }
}
