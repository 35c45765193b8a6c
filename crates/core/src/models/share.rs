//! Persisted configuration carried by shared links

use serde::Serialize;

use super::TeamMember;

/// Default presentation timer length in seconds
pub const DEFAULT_TIMER_DURATION_SECS: u32 = 120;
/// Shortest allowed timer (1 minute)
pub const MIN_TIMER_DURATION_SECS: u32 = 60;
/// Longest allowed timer (60 minutes)
pub const MAX_TIMER_DURATION_SECS: u32 = 3600;

const DEFAULT_TIMER_MINUTES: u32 = 2;

/// The subset of application state that survives in a link.
///
/// Selection and timer state are session-local and never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareData {
    pub team_members: Vec<TeamMember>,
    pub timer_enabled: bool,
    pub timer_duration: u32,
    pub celebration_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebration_media_url: Option<String>,
}

impl Default for ShareData {
    fn default() -> Self {
        Self {
            team_members: Vec::new(),
            timer_enabled: true,
            timer_duration: DEFAULT_TIMER_DURATION_SECS,
            celebration_enabled: true,
            celebration_media_url: None,
        }
    }
}

/// Clamp a duration in seconds into the allowed timer range
pub fn clamp_timer_duration(secs: u32) -> u32 {
    secs.clamp(MIN_TIMER_DURATION_SECS, MAX_TIMER_DURATION_SECS)
}

/// Parse a free-text minutes value into a timer duration in seconds.
///
/// Leading digits are used; anything unparsable (or zero) falls back
/// to two minutes. The result is clamped to 1..=60 minutes.
pub fn timer_duration_from_minutes(input: &str) -> u32 {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let leading: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    let minutes = match leading.parse::<u32>() {
        Ok(0) | Err(_) => DEFAULT_TIMER_MINUTES,
        Ok(_) if negative => 0,
        Ok(m) => m,
    };

    clamp_timer_duration(minutes.saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_defaults() {
        let share = ShareData::default();
        assert!(share.timer_enabled);
        assert_eq!(share.timer_duration, 120);
        assert!(share.celebration_enabled);
        assert!(share.team_members.is_empty());
    }

    #[test]
    fn test_clamp_timer_duration() {
        assert_eq!(clamp_timer_duration(0), 60);
        assert_eq!(clamp_timer_duration(300), 300);
        assert_eq!(clamp_timer_duration(10_000), 3600);
    }

    #[test]
    fn test_minutes_input() {
        assert_eq!(timer_duration_from_minutes("5"), 300);
        assert_eq!(timer_duration_from_minutes(" 3min"), 180);
        assert_eq!(timer_duration_from_minutes("abc"), 120);
        assert_eq!(timer_duration_from_minutes("0"), 120);
        assert_eq!(timer_duration_from_minutes("-4"), 60);
        assert_eq!(timer_duration_from_minutes("90"), 3600);
    }
}
