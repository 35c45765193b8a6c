//! Session coordinator
//!
//! Single owner of `AppState`. Every mutation goes through a `Session`
//! method; operations that need something to happen later return
//! [`Effect`]s for the host to schedule. Scheduled callbacks come back
//! carrying the round they were issued for and are discarded when that
//! round is gone.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;

use crate::dsu;
use crate::invariants::{assert_round_advanced, assert_state_invariants};
use crate::models::{clamp_timer_duration, timer_duration_from_minutes, MemberId, ShareData};
use crate::roster::Progress;
use crate::selection::{CommitOutcome, RoundId, SelectionPhase};
use crate::state::AppState;
use crate::timer::TimerEvent;

/// Delays used by the selection and timer state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long a selection animates before the winner is drawn
    pub selection_window: Duration,
    /// Interval between highlighted names while animating
    pub highlight_tick: Duration,
    /// Pause between settling and the winner's countdown
    pub timer_start_delay: Duration,
    /// How long an expired badge stays before it may auto-hide
    pub acknowledged_grace: Duration,
    pub timer_tick: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            selection_window: Duration::from_millis(3000),
            highlight_tick: Duration::from_millis(100),
            timer_start_delay: Duration::from_millis(3000),
            acknowledged_grace: Duration::from_millis(5000),
            timer_tick: Duration::from_millis(1000),
        }
    }
}

/// Work the host must schedule on behalf of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Abort everything scheduled for earlier rounds
    CancelScheduled,
    /// Call [`Session::highlight`] every `every` while `round` animates
    Highlight { round: RoundId, every: Duration },
    /// Call [`Session::commit_selection`] after `after`
    CommitSelection { round: RoundId, after: Duration },
    /// Call [`Session::start_winner_timer`] after `after`
    StartTimer {
        round: RoundId,
        member_id: MemberId,
        after: Duration,
    },
    /// Call [`Session::tick`] every `every` while a timer runs
    Countdown { every: Duration },
    /// Call [`Session::hide_acknowledged`] after `after`
    HideAcknowledged {
        round: Option<RoundId>,
        member_id: MemberId,
        after: Duration,
    },
    /// Show the celebration overlay for a member
    Celebrate {
        member_id: MemberId,
        media_url: Option<String>,
    },
}

pub struct Session {
    state: AppState,
    timings: Timings,
    /// Member the celebration overlay is showing for. At most one at a time.
    overlay: Option<MemberId>,
}

impl Session {
    pub fn new(timings: Timings) -> Self {
        Self {
            state: AppState::new(),
            timings,
            overlay: None,
        }
    }

    /// Start from a decoded link, or from defaults when there is none
    pub fn from_share(share: Option<ShareData>, timings: Timings) -> Self {
        let state = share.map(AppState::from_share).unwrap_or_default();
        let session = Self {
            state,
            timings,
            overlay: None,
        };
        session.check();
        session
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn overlay(&self) -> Option<&MemberId> {
        self.overlay.as_ref()
    }

    pub fn share_data(&self) -> ShareData {
        self.state.to_share_data()
    }

    pub fn progress(&self) -> Progress {
        self.state.team_members.progress()
    }

    pub fn is_last_outstanding(&self, id: &MemberId) -> bool {
        self.state.team_members.is_last_outstanding(id)
    }

    pub fn dsu_summary(&self, date: NaiveDate) -> String {
        dsu::dsu_summary(self.state.team_members.members(), date)
    }

    fn check(&self) {
        assert_state_invariants(&self.state);
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn add_member(&mut self, name: &str) -> Option<MemberId> {
        let id = self.state.team_members.try_add(name);
        if let Some(id) = &id {
            tracing::info!(member = %id, "Member added");
        }
        self.check();
        id
    }

    /// Remove a member along with any selection or timer state about them
    pub fn remove_member(&mut self, id: &MemberId) -> bool {
        if !self.state.team_members.contains(id) {
            return false;
        }

        self.state.team_members.remove(id);
        self.state.selection.forget_member(id);
        self.state.timer.forget_member(id);
        if self.overlay.as_ref() == Some(id) {
            self.overlay = None;
        }

        tracing::info!(member = %id, "Member removed");
        self.check();
        true
    }

    pub fn rename_member(&mut self, id: &MemberId, name: &str) -> bool {
        if name.trim().is_empty() || !self.state.team_members.contains(id) {
            return false;
        }

        self.state.team_members.rename(id, name);
        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
        true
    }

    pub fn set_member_enabled(&mut self, id: &MemberId, enabled: bool) -> bool {
        if !self.state.team_members.contains(id) {
            return false;
        }
        self.state.team_members.set_enabled(id, enabled);
        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
        true
    }

    pub fn toggle_member_enabled(&mut self, id: &MemberId) -> bool {
        let Some(enabled) = self.state.team_members.get(id).map(|m| m.enabled) else {
            return false;
        };
        self.set_member_enabled(id, !enabled)
    }

    pub fn enable_all(&mut self) {
        self.state.team_members.enable_all();
        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
    }

    pub fn disable_all(&mut self) {
        self.state.team_members.disable_all();
        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
    }

    /// Empty the roster and drop all round state
    pub fn clear_roster(&mut self) -> Vec<Effect> {
        self.state.team_members.clear();
        self.state.selection.reset();
        self.state.timer.clear_all();
        self.overlay = None;

        tracing::info!("Roster cleared");
        self.check();
        vec![Effect::CancelScheduled]
    }

    // ------------------------------------------------------------------
    // Updates and blockers
    // ------------------------------------------------------------------

    /// Flip a member's update. Unmarking is refused while they have a
    /// blocker, and stops their timer if it is the active one.
    pub fn toggle_update(&mut self, id: &MemberId) -> bool {
        let Some(given) = self.state.team_members.get(id).map(|m| !m.update_given) else {
            return false;
        };

        if !self.state.team_members.set_update_given(id, given) {
            tracing::debug!(member = %id, "Refusing to unmark a member with a blocker");
            return false;
        }

        if !given && self.state.timer.unmark(id) {
            tracing::debug!(member = %id, "Timer stopped after unmark");
        }

        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
        true
    }

    pub fn set_blocker(&mut self, id: &MemberId, text: &str) -> bool {
        if !self.state.team_members.set_blocker(id, text) {
            return false;
        }
        self.state.selection.refresh_winner(&self.state.team_members);
        self.check();
        true
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Begin a selection round. Returns no effects when refused.
    pub fn start_selection<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Effect> {
        if self.state.is_selecting() || self.state.team_members.enabled_count() == 0 {
            tracing::debug!("Selection refused");
            return Vec::new();
        }

        let previous = self.state.selection.round();
        if let Some(stopped) = self.state.timer.stop() {
            tracing::debug!(member = %stopped, "Timer stopped for new round");
        }
        self.overlay = None;

        let Some(round) = self
            .state
            .selection
            .begin(&mut self.state.team_members, now, rng)
        else {
            return Vec::new();
        };
        assert_round_advanced(previous, round);
        self.check();

        vec![
            Effect::CancelScheduled,
            Effect::Highlight {
                round,
                every: self.timings.highlight_tick,
            },
            Effect::CommitSelection {
                round,
                after: self.timings.selection_window,
            },
        ]
    }

    /// Name to flash on an animation tick; `None` once `round` stopped
    /// animating.
    pub fn highlight<R: Rng + ?Sized>(&self, round: RoundId, rng: &mut R) -> Option<String> {
        self.state
            .selection
            .highlight(round, &self.state.team_members, rng)
            .map(|m| m.name.clone())
    }

    /// Draw the winner for `round`
    pub fn commit_selection<R: Rng + ?Sized>(&mut self, round: RoundId, rng: &mut R) -> Vec<Effect> {
        let outcome = self
            .state
            .selection
            .commit(round, &mut self.state.team_members, rng);
        self.check();

        match outcome {
            CommitOutcome::Settled(winner) => vec![Effect::StartTimer {
                round,
                member_id: winner.id,
                after: self.timings.timer_start_delay,
            }],
            CommitOutcome::Cancelled | CommitOutcome::Stale => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    /// Delayed countdown start for a settled winner. Ignored unless
    /// `round` is still the settled round and `member_id` its winner.
    pub fn start_winner_timer(
        &mut self,
        round: RoundId,
        member_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        let relevant = matches!(
            self.state.selection.phase(),
            SelectionPhase::Settled { round: r, winner } if *r == round && &winner.id == member_id
        );

        if !relevant {
            tracing::debug!(%round, member = %member_id, "Discarding stale timer start");
            return Vec::new();
        }

        self.start_timer(member_id, now)
    }

    /// Start a countdown for any member on the roster
    pub fn start_timer(&mut self, member_id: &MemberId, now: DateTime<Utc>) -> Vec<Effect> {
        if !self.state.team_members.contains(member_id) {
            return Vec::new();
        }

        let started = self.state.timer.start(
            member_id.clone(),
            now,
            self.state.timer_duration,
            self.state.timer_enabled,
        );
        self.check();

        if started {
            vec![Effect::Countdown {
                every: self.timings.timer_tick,
            }]
        } else {
            Vec::new()
        }
    }

    pub fn stop_timer(&mut self) -> Option<MemberId> {
        let stopped = self.state.timer.stop();
        if stopped.is_some() && self.overlay == stopped {
            self.overlay = None;
        }
        stopped
    }

    /// Evaluate the countdown
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(TimerEvent::Expired(member_id)) = self.state.timer.tick(now) else {
            return Vec::new();
        };

        let mut effects = vec![Effect::HideAcknowledged {
            round: self.state.selection.round(),
            member_id: member_id.clone(),
            after: self.timings.acknowledged_grace,
        }];

        if self.state.celebration_enabled && self.overlay.is_none() {
            self.overlay = Some(member_id.clone());
            effects.push(Effect::Celebrate {
                member_id,
                media_url: self.state.celebration_media_url.clone(),
            });
        }

        effects
    }

    /// Grace period after expiry elapsed. The badge goes away only when
    /// the member was the last one outstanding in the same round.
    pub fn hide_acknowledged(&mut self, round: Option<RoundId>, member_id: &MemberId) -> bool {
        if self.state.selection.round() != round {
            return false;
        }

        let showing = self.state.timer.expired_member() == Some(member_id)
            || self.state.timer.is_acknowledged(member_id);
        if !showing || !self.state.team_members.is_last_outstanding(member_id) {
            return false;
        }

        self.clear_acknowledged(member_id)
    }

    /// Remove a member's frozen timer badge
    pub fn clear_acknowledged(&mut self, member_id: &MemberId) -> bool {
        if self.overlay.as_ref() == Some(member_id) {
            self.overlay = None;
        }
        self.state.timer.clear_acknowledged(member_id)
    }

    pub fn dismiss_overlay(&mut self) -> Option<MemberId> {
        self.overlay.take()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Turning the timer feature off stops any running countdown
    pub fn set_timer_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop_timer();
        }
        self.state.timer_enabled = enabled;
    }

    pub fn set_timer_duration(&mut self, secs: u32) {
        self.state.timer_duration = clamp_timer_duration(secs);
    }

    /// Apply a minutes value typed by the user
    pub fn set_timer_minutes(&mut self, input: &str) -> u32 {
        self.state.timer_duration = timer_duration_from_minutes(input);
        self.state.timer_duration
    }

    pub fn set_celebration_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.overlay = None;
        }
        self.state.celebration_enabled = enabled;
    }

    pub fn set_celebration_media_url(&mut self, url: Option<&str>) {
        self.state.celebration_media_url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Timings::default())
    }
}
