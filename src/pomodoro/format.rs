use crate::error::EngineError;

/// `MM:SS`, minutes zero-padded to two digits.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parse an edited clock value into seconds.
///
/// Accepts `MM:SS`, `M:SS` and bare minutes. A part that is not a number
/// counts as zero, but the whole value must be at least one second.
pub fn parse_clock(text: &str) -> Result<u64, EngineError> {
    let text = text.trim();
    let mut parts = text.splitn(2, ':');
    let minutes = parse_part(parts.next());
    let seconds = parse_part(parts.next());

    let total = minutes.saturating_mul(60).saturating_add(seconds);
    if total == 0 {
        return Err(EngineError::InvalidClock(text.to_string()));
    }
    Ok(total)
}

fn parse_part(part: Option<&str>) -> u64 {
    part.and_then(|p| p.trim().parse().ok()).unwrap_or(0)
}

/// Fixed-width text bar for a progress percentage.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
