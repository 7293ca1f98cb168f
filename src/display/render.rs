use crate::pomodoro::format::{format_clock, progress_bar};
use crate::pomodoro::{EngineSnapshot, Mode, TimerState};

const BAR_WIDTH: usize = 20;

fn status_word(state: &TimerState) -> &'static str {
    if state.is_running {
        "running"
    } else if state.time_left == 0 {
        "done"
    } else if state.time_left < state.total_time {
        "paused"
    } else {
        "ready"
    }
}

/// One status line for the selected mode.
pub fn status_line(snapshot: &EngineSnapshot) -> String {
    let mode = snapshot.selected_mode;
    let state = snapshot.current();
    let progress = state.progress();
    format!(
        "{} {:<11} {}  {} {:>3.0}%  {}",
        mode.emoji(),
        mode.label(),
        format_clock(state.time_left),
        progress_bar(progress, BAR_WIDTH),
        progress,
        status_word(state)
    )
}

/// Every mode with progress in it, selected one marked.
pub fn overview(snapshot: &EngineSnapshot) -> String {
    snapshot
        .states
        .iter()
        .map(|(mode, state)| {
            let marker = if mode == snapshot.selected_mode { '>' } else { ' ' };
            format!(
                "{} {:<11} {} / {}  {}",
                marker,
                mode.label(),
                format_clock(state.time_left),
                format_clock(state.total_time),
                status_word(state)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn completion_line(mode: Mode) -> String {
    format!("🔔 {} complete!", mode.label())
}
