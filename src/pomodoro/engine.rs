use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::mode::{Durations, Mode, ModeMap};
use crate::error::EngineError;

/// Countdown state of a single mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub time_left: u64,
    pub total_time: u64,
    pub is_running: bool,
}

impl TimerState {
    pub fn idle(duration: u64) -> Self {
        Self {
            time_left: duration,
            total_time: duration,
            is_running: false,
        }
    }

    /// Elapsed share of the run in percent, clamped to `[0, 100]`.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        let elapsed = self.total_time.saturating_sub(self.time_left) as f64;
        (elapsed / self.total_time as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.time_left == 0
    }
}

/// Read-only copy of everything a display surface may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub selected_mode: Mode,
    pub states: ModeMap<TimerState>,
}

impl EngineSnapshot {
    pub fn current(&self) -> &TimerState {
        &self.states[self.selected_mode]
    }

    pub fn state(&self, mode: Mode) -> &TimerState {
        &self.states[mode]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub mode: Mode,
    pub completed_at: DateTime<Local>,
}

/// Per-mode countdown state machine.
///
/// Only the selected mode ever runs. Switching modes pauses the running one,
/// so there is a single logical clock no matter how many modes have progress.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    selected: Mode,
    states: ModeMap<TimerState>,
    durations: Durations,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::defaults())
    }
}

impl TimerEngine {
    pub fn new(durations: Durations) -> Self {
        let durations = sanitize(durations);
        Self {
            selected: Mode::Focus,
            states: ModeMap::from_fn(|mode| TimerState::idle(durations[mode])),
            durations,
        }
    }

    /// Rebuild an engine from a snapshot taken elsewhere. Every mode comes back paused.
    pub fn restore(durations: Durations, snapshot: &EngineSnapshot) -> Self {
        let durations = sanitize(durations);
        let states = ModeMap::from_fn(|mode| {
            let seen = snapshot.states[mode];
            let total_time = if seen.total_time == 0 {
                durations[mode]
            } else {
                seen.total_time
            };
            TimerState {
                time_left: seen.time_left.min(total_time),
                total_time,
                is_running: false,
            }
        });
        Self {
            selected: snapshot.selected_mode,
            states,
            durations,
        }
    }

    pub fn selected_mode(&self) -> Mode {
        self.selected
    }

    pub fn state(&self, mode: Mode) -> &TimerState {
        &self.states[mode]
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn is_running(&self) -> bool {
        self.states[self.selected].is_running
    }

    pub fn select_mode(&mut self, mode: Mode) {
        let current = &mut self.states[self.selected];
        if current.is_running {
            current.is_running = false;
            tracing::debug!(
                "Paused {} at {}s left on switch to {}",
                self.selected,
                current.time_left,
                mode
            );
        }
        self.selected = mode;
    }

    /// Run the selected mode. A mode already at 0:00 is reset first.
    pub fn start(&mut self) {
        if self.states[self.selected].is_complete() {
            tracing::debug!("{} already complete, resetting before start", self.selected);
            self.reset();
        }
        let state = &mut self.states[self.selected];
        state.is_running = true;
        tracing::debug!("Started {} with {}s left", self.selected, state.time_left);
    }

    pub fn pause(&mut self) {
        self.states[self.selected].is_running = false;
    }

    pub fn reset(&mut self) {
        self.states[self.selected] = TimerState::idle(self.durations[self.selected]);
    }

    /// Change the duration of `mode`. The new value also becomes what `reset` restores.
    pub fn set_duration(&mut self, mode: Mode, seconds: u64) -> Result<(), EngineError> {
        if seconds == 0 {
            return Err(EngineError::ZeroDuration);
        }
        if self.states[mode].is_running {
            return Err(EngineError::ModeRunning(mode));
        }
        self.durations[mode] = seconds;
        self.states[mode] = TimerState::idle(seconds);
        tracing::debug!("{} duration set to {}s", mode, seconds);
        Ok(())
    }

    /// Advance the selected mode by one second.
    ///
    /// Returns the completion event on the tick that takes a running countdown
    /// from 1 to 0. The countdown stays at 0:00 until the next reset or start.
    pub fn tick(&mut self) -> Option<CompletionEvent> {
        let mode = self.selected;
        let state = &mut self.states[mode];
        if !state.is_running {
            return None;
        }
        if state.time_left == 0 {
            state.is_running = false;
            return None;
        }

        state.time_left -= 1;
        if state.time_left > 0 {
            return None;
        }

        state.is_running = false;
        let event = CompletionEvent {
            mode,
            completed_at: Local::now(),
        };
        tracing::info!(
            "{} complete at {}",
            mode,
            event.completed_at.format("%H:%M:%S")
        );
        Some(event)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            selected_mode: self.selected,
            states: self.states,
        }
    }
}

fn sanitize(durations: Durations) -> Durations {
    ModeMap::from_fn(|mode| match durations[mode] {
        0 => mode.default_duration(),
        seconds => seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(engine: &mut TimerEngine, ticks: u64) -> Vec<CompletionEvent> {
        (0..ticks).filter_map(|_| engine.tick()).collect()
    }

    #[test]
    fn test_new_engine_is_idle_on_focus() {
        let engine = TimerEngine::default();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_mode, Mode::Focus);
        for mode in Mode::ALL {
            assert_eq!(*snapshot.state(mode), TimerState::idle(mode.default_duration()));
        }
    }

    #[test]
    fn test_full_focus_run_completes_once() {
        let mut engine = TimerEngine::default();
        engine.start();

        let events = run(&mut engine, 1500);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].mode, Mode::Focus);
        assert_eq!(
            *engine.state(Mode::Focus),
            TimerState {
                time_left: 0,
                total_time: 1500,
                is_running: false
            }
        );
    }

    #[test]
    fn test_ticks_after_completion_do_nothing() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Mode::Focus, 2).unwrap();
        engine.start();

        let events = run(&mut engine, 10);

        assert_eq!(events.len(), 1);
        assert_eq!(engine.state(Mode::Focus).time_left, 0);
    }

    #[test]
    fn test_switching_mode_pauses_running_one() {
        let mut engine = TimerEngine::default();
        engine.select_mode(Mode::ShortBreak);
        engine.start();
        run(&mut engine, 100);

        engine.select_mode(Mode::LongBreak);

        let short = engine.state(Mode::ShortBreak);
        assert_eq!(short.time_left, 200);
        assert!(!short.is_running);
        assert_eq!(*engine.state(Mode::LongBreak), TimerState::idle(900));
        assert_eq!(engine.selected_mode(), Mode::LongBreak);
    }

    #[test]
    fn test_frozen_mode_ignores_ticks_while_unselected() {
        let mut engine = TimerEngine::default();
        engine.start();
        run(&mut engine, 10);
        engine.select_mode(Mode::ShortBreak);

        run(&mut engine, 50);

        assert_eq!(engine.state(Mode::Focus).time_left, 1490);
        assert_eq!(engine.state(Mode::ShortBreak).time_left, 300);
    }

    #[test]
    fn test_start_pause_reset_restores_duration() {
        let mut engine = TimerEngine::default();
        engine.start();
        run(&mut engine, 42);
        engine.pause();
        engine.reset();

        assert_eq!(*engine.state(Mode::Focus), TimerState::idle(1500));

        engine.reset();
        assert_eq!(*engine.state(Mode::Focus), TimerState::idle(1500));
    }

    #[test]
    fn test_pause_and_reset_never_complete() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Mode::Focus, 3).unwrap();
        engine.start();
        run(&mut engine, 2);
        engine.pause();
        assert!(run(&mut engine, 5).is_empty());
        engine.reset();
        assert!(run(&mut engine, 5).is_empty());
    }

    #[test]
    fn test_set_duration_rejects_zero() {
        let mut engine = TimerEngine::default();
        let before = engine.snapshot();

        assert_eq!(
            engine.set_duration(Mode::Focus, 0),
            Err(EngineError::ZeroDuration)
        );
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_set_duration_rejects_running_mode() {
        let mut engine = TimerEngine::default();
        engine.start();
        run(&mut engine, 5);
        let before = engine.snapshot();

        assert_eq!(
            engine.set_duration(Mode::Focus, 600),
            Err(EngineError::ModeRunning(Mode::Focus))
        );
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_set_duration_applies_to_idle_mode_and_reset() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Mode::Focus, 600).unwrap();
        assert_eq!(*engine.state(Mode::Focus), TimerState::idle(600));

        engine.start();
        run(&mut engine, 30);
        engine.reset();
        assert_eq!(*engine.state(Mode::Focus), TimerState::idle(600));
    }

    #[test]
    fn test_start_on_complete_mode_resets_first() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Mode::Focus, 1).unwrap();
        engine.start();
        assert_eq!(run(&mut engine, 1).len(), 1);

        engine.start();

        let state = engine.state(Mode::Focus);
        assert!(state.is_running);
        assert_eq!(state.time_left, 1);
        assert_eq!(run(&mut engine, 1).len(), 1);
    }

    #[test]
    fn test_progress_is_derived() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Mode::Focus, 200).unwrap();
        engine.start();
        run(&mut engine, 50);
        assert_eq!(engine.snapshot().current().progress(), 25.0);
        assert_eq!(TimerState::idle(0).progress(), 0.0);
    }

    #[test]
    fn test_restore_pauses_everything_and_clamps() {
        let mut source = TimerEngine::default();
        source.select_mode(Mode::LongBreak);
        source.start();
        run(&mut source, 60);
        let mut snapshot = source.snapshot();
        snapshot.states.short_break = TimerState {
            time_left: 999,
            total_time: 0,
            is_running: true,
        };

        let restored = TimerEngine::restore(Durations::defaults(), &snapshot);

        assert_eq!(restored.selected_mode(), Mode::LongBreak);
        assert_eq!(restored.state(Mode::LongBreak).time_left, 840);
        assert!(!restored.is_running());
        assert_eq!(*restored.state(Mode::ShortBreak), TimerState {
            time_left: 300,
            total_time: 300,
            is_running: false,
        });
    }

    proptest! {
        #[test]
        fn prop_time_left_tracks_ticks(total in 1u64..400, ticks in 0u64..600) {
            let mut engine = TimerEngine::default();
            engine.set_duration(Mode::Focus, total).unwrap();
            engine.start();

            let events = run(&mut engine, ticks);

            prop_assert_eq!(engine.state(Mode::Focus).time_left, total.saturating_sub(ticks));
            prop_assert_eq!(events.len(), usize::from(ticks >= total));
        }

        #[test]
        fn prop_paused_ticks_do_not_move(ticks in 0u64..200) {
            let mut engine = TimerEngine::default();
            engine.start();
            run(&mut engine, 3);
            engine.pause();
            let before = engine.snapshot();

            run(&mut engine, ticks);

            prop_assert_eq!(engine.snapshot(), before);
        }
    }
}
