//! Application state

use crate::models::{
    clamp_timer_duration, ShareData, TeamMember, DEFAULT_TIMER_DURATION_SECS,
};
use crate::roster::Roster;
use crate::selection::SelectionEngine;
use crate::timer::{ActiveTimer, TimerEngine};

/// Root state of a stand-up session.
///
/// Selection and timer state live in their engines, so `is_selecting`,
/// `selected_winner` and `active_timer` are read from there rather than
/// stored twice.
#[derive(Debug, Clone)]
pub struct AppState {
    pub team_members: Roster,
    pub selection: SelectionEngine,
    pub timer: TimerEngine,
    pub timer_enabled: bool,
    /// Seconds, kept within 60..=3600
    pub timer_duration: u32,
    pub celebration_enabled: bool,
    pub celebration_media_url: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            team_members: Roster::new(),
            selection: SelectionEngine::new(),
            timer: TimerEngine::new(),
            timer_enabled: true,
            timer_duration: DEFAULT_TIMER_DURATION_SECS,
            celebration_enabled: true,
            celebration_media_url: None,
        }
    }

    /// Fresh state carrying the persisted fields of a shared link.
    /// Selection and timer always start idle.
    pub fn from_share(share: ShareData) -> Self {
        Self {
            team_members: Roster::from_members(share.team_members),
            timer_enabled: share.timer_enabled,
            timer_duration: clamp_timer_duration(share.timer_duration),
            celebration_enabled: share.celebration_enabled,
            celebration_media_url: share.celebration_media_url,
            ..Self::new()
        }
    }

    /// Project down to the fields that go into a link
    pub fn to_share_data(&self) -> ShareData {
        ShareData {
            team_members: self.team_members.to_vec(),
            timer_enabled: self.timer_enabled,
            timer_duration: self.timer_duration,
            celebration_enabled: self.celebration_enabled,
            celebration_media_url: self.celebration_media_url.clone(),
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_selecting()
    }

    pub fn selected_winner(&self) -> Option<&TeamMember> {
        self.selection.winner()
    }

    pub fn active_timer(&self) -> Option<&ActiveTimer> {
        self.timer.active()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_share_resets_ephemeral_state() {
        let share = ShareData {
            team_members: vec![TeamMember::new("Ann")],
            timer_enabled: false,
            timer_duration: 300,
            celebration_enabled: false,
            celebration_media_url: Some("https://example.com/boom.gif".into()),
        };

        let state = AppState::from_share(share.clone());
        assert!(!state.is_selecting());
        assert!(state.selected_winner().is_none());
        assert!(state.active_timer().is_none());
        assert_eq!(state.to_share_data(), share);
    }

    #[test]
    fn test_from_share_clamps_duration() {
        let share = ShareData {
            timer_duration: 5,
            ..ShareData::default()
        };
        assert_eq!(AppState::from_share(share).timer_duration, 60);
    }
}
