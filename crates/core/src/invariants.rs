//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{TeamMember, MAX_TIMER_DURATION_SECS, MIN_TIMER_DURATION_SECS};
use crate::selection::RoundId;
use crate::state::AppState;

/// Validate that a roster is internally consistent
pub fn assert_roster_invariants(members: &[TeamMember]) {
    let mut seen = HashSet::new();
    for member in members {
        debug_assert!(
            seen.insert(&member.id),
            "Roster has duplicate member id {}",
            member.id
        );

        debug_assert!(
            !member.name.trim().is_empty(),
            "Member {} has empty name",
            member.id
        );

        // A blocker counts as an update
        debug_assert!(
            !member.has_blocker() || member.update_given,
            "Member {} has a blocker but no update",
            member.id
        );
    }
}

/// Validate that the whole application state is consistent
pub fn assert_state_invariants(state: &AppState) {
    assert_roster_invariants(state.team_members.members());

    if let Some(timer) = state.active_timer() {
        debug_assert!(
            state.team_members.contains(&timer.member_id),
            "Active timer references unknown member {}",
            timer.member_id
        );
    }

    if let Some(winner) = state.selected_winner() {
        debug_assert!(
            state.team_members.contains(&winner.id),
            "Selected winner {} is not on the roster",
            winner.id
        );
    }

    debug_assert!(
        (MIN_TIMER_DURATION_SECS..=MAX_TIMER_DURATION_SECS).contains(&state.timer_duration),
        "Timer duration {}s out of range",
        state.timer_duration
    );
}

/// Validate that a new round identifier moves forward
pub fn assert_round_advanced(previous: Option<RoundId>, next: RoundId) {
    if let Some(previous) = previous {
        debug_assert!(
            next > previous,
            "Round {} does not follow {}",
            next,
            previous
        );
    }
}
