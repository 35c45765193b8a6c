//! Selection engine
//!
//! Randomized "who speaks next" pick. A round moves
//! `Idle -> Animating -> Settled`; starting again from `Settled` begins a
//! new round with the same entry actions.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{MemberId, TeamMember};
use crate::roster::Roster;

/// Identifies one selection round. Scheduled callbacks carry it so that
/// work belonging to an older round can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(u64);

impl RoundId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Animating {
        round: RoundId,
        started_at: DateTime<Utc>,
    },
    Settled {
        round: RoundId,
        winner: TeamMember,
    },
}

/// Result of committing a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A winner was drawn and marked
    Settled(TeamMember),
    /// Nobody was enabled at commit time; back to idle
    Cancelled,
    /// The round is no longer the animating one
    Stale,
}

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    phase: SelectionPhase,
    last_round: u64,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self {
            phase: SelectionPhase::Idle,
            last_round: 0,
        }
    }

    pub fn phase(&self) -> &SelectionPhase {
        &self.phase
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.phase, SelectionPhase::Animating { .. })
    }

    pub fn winner(&self) -> Option<&TeamMember> {
        match &self.phase {
            SelectionPhase::Settled { winner, .. } => Some(winner),
            _ => None,
        }
    }

    /// Round of the current animation or settled pick
    pub fn round(&self) -> Option<RoundId> {
        match &self.phase {
            SelectionPhase::Idle => None,
            SelectionPhase::Animating { round, .. } | SelectionPhase::Settled { round, .. } => {
                Some(*round)
            }
        }
    }

    /// Whether `round` is the round currently animating
    pub fn is_animating(&self, round: RoundId) -> bool {
        matches!(self.phase, SelectionPhase::Animating { round: r, .. } if r == round)
    }

    /// Enter `Animating`.
    ///
    /// Refused while already animating or when nobody is enabled. On entry
    /// every member's update and blocker are reset and the whole roster is
    /// reshuffled.
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        roster: &mut Roster,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<RoundId> {
        if self.is_selecting() || roster.enabled_count() == 0 {
            return None;
        }

        roster.reset_round();
        roster.shuffle(rng);

        self.last_round += 1;
        let round = RoundId(self.last_round);
        self.phase = SelectionPhase::Animating {
            round,
            started_at: now,
        };

        tracing::debug!(%round, candidates = roster.enabled_count(), "Selection started");
        Some(round)
    }

    /// Member to highlight on an animation tick. Purely presentational.
    pub fn highlight<'a, R: Rng + ?Sized>(
        &self,
        round: RoundId,
        roster: &'a Roster,
        rng: &mut R,
    ) -> Option<&'a TeamMember> {
        if !self.is_animating(round) {
            return None;
        }
        roster.choose_enabled(rng)
    }

    /// Draw the winner from the enabled set as it is now.
    pub fn commit<R: Rng + ?Sized>(
        &mut self,
        round: RoundId,
        roster: &mut Roster,
        rng: &mut R,
    ) -> CommitOutcome {
        if !self.is_animating(round) {
            tracing::debug!(%round, "Ignoring commit for stale round");
            return CommitOutcome::Stale;
        }

        let Some(winner_id) = roster.choose_enabled(rng).map(|m| m.id.clone()) else {
            tracing::info!(%round, "No enabled members left, cancelling round");
            self.phase = SelectionPhase::Idle;
            return CommitOutcome::Cancelled;
        };

        roster.set_update_given(&winner_id, true);
        let Some(winner) = roster.get(&winner_id).cloned() else {
            self.phase = SelectionPhase::Idle;
            return CommitOutcome::Cancelled;
        };

        tracing::info!(%round, winner = %winner.name, "Selection settled");
        self.phase = SelectionPhase::Settled {
            round,
            winner: winner.clone(),
        };
        CommitOutcome::Settled(winner)
    }

    /// Drop back to idle, forgetting any winner
    pub fn reset(&mut self) {
        self.phase = SelectionPhase::Idle;
    }

    /// Forget a settled winner that left the roster
    pub fn forget_member(&mut self, id: &MemberId) {
        if self.winner().is_some_and(|w| &w.id == id) {
            self.phase = SelectionPhase::Idle;
        }
    }

    /// Refresh the winner snapshot after the member was edited
    pub fn refresh_winner(&mut self, roster: &Roster) {
        if let SelectionPhase::Settled { winner, .. } = &mut self.phase {
            if let Some(current) = roster.get(&winner.id) {
                *winner = current.clone();
            }
        }
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}
