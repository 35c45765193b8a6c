//! Presentation timer
//!
//! One countdown at a time. Remaining time is always derived from the
//! start instant, so a suspended host catches up on the next tick.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::MemberId;

/// The countdown record for the member currently presenting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTimer {
    pub member_id: MemberId,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u32,
}

impl ActiveTimer {
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = (now - self.started_at).num_seconds().max(0);
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        self.duration_secs.saturating_sub(self.elapsed_secs(now))
    }

    /// Fraction of the duration used, in percent
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        let used = self.duration_secs - self.remaining_secs(now);
        f64::from(used) / f64::from(self.duration_secs) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimerPhase {
    #[default]
    Idle,
    Running(ActiveTimer),
    Expired(ActiveTimer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown reached zero. Raised once per run.
    Expired(MemberId),
}

/// Colour band of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTone {
    Calm,
    Warning,
    Urgent,
}

impl TimerTone {
    pub fn for_progress(percent: f64) -> Self {
        if percent < 50.0 {
            TimerTone::Calm
        } else if percent < 80.0 {
            TimerTone::Warning
        } else {
            TimerTone::Urgent
        }
    }
}

/// Format seconds as `m:ss`
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Default)]
pub struct TimerEngine {
    phase: TimerPhase,
    /// Members whose timer ended and still show a frozen badge
    acknowledged: BTreeSet<MemberId>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TimerPhase {
        &self.phase
    }

    /// The running or expired timer, if any
    pub fn active(&self) -> Option<&ActiveTimer> {
        match &self.phase {
            TimerPhase::Idle => None,
            TimerPhase::Running(timer) | TimerPhase::Expired(timer) => Some(timer),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, TimerPhase::Running(_))
    }

    pub fn running_member(&self) -> Option<&MemberId> {
        match &self.phase {
            TimerPhase::Running(timer) => Some(&timer.member_id),
            _ => None,
        }
    }

    pub fn expired_member(&self) -> Option<&MemberId> {
        match &self.phase {
            TimerPhase::Expired(timer) => Some(&timer.member_id),
            _ => None,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        match &self.phase {
            TimerPhase::Running(timer) => Some(timer.remaining_secs(now)),
            TimerPhase::Expired(_) => Some(0),
            TimerPhase::Idle => None,
        }
    }

    pub fn is_acknowledged(&self, id: &MemberId) -> bool {
        self.acknowledged.contains(id)
    }

    pub fn acknowledged(&self) -> impl Iterator<Item = &MemberId> {
        self.acknowledged.iter()
    }

    /// Start a countdown for `member_id`.
    ///
    /// Ignored when the timer feature is off. Any other timer is stopped
    /// first and its member acknowledged.
    pub fn start(
        &mut self,
        member_id: MemberId,
        now: DateTime<Utc>,
        duration_secs: u32,
        enabled: bool,
    ) -> bool {
        if !enabled {
            return false;
        }

        self.stop();
        self.acknowledged.remove(&member_id);

        tracing::debug!(member = %member_id, duration_secs, "Timer started");
        self.phase = TimerPhase::Running(ActiveTimer {
            member_id,
            started_at: now,
            duration_secs,
        });
        true
    }

    /// Stop the current timer, moving its member to the acknowledged set
    pub fn stop(&mut self) -> Option<MemberId> {
        let member_id = match std::mem::take(&mut self.phase) {
            TimerPhase::Idle => return None,
            TimerPhase::Running(timer) | TimerPhase::Expired(timer) => timer.member_id,
        };

        self.acknowledged.insert(member_id.clone());
        Some(member_id)
    }

    /// Evaluate the countdown. Expiry is reported on the first tick that
    /// sees zero remaining; later ticks stay quiet.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        let TimerPhase::Running(timer) = &self.phase else {
            return None;
        };

        if timer.remaining_secs(now) > 0 {
            return None;
        }

        let timer = timer.clone();
        let member_id = timer.member_id.clone();
        self.phase = TimerPhase::Expired(timer);

        tracing::info!(member = %member_id, "Timer expired");
        Some(TimerEvent::Expired(member_id))
    }

    /// The member's update was unmarked; stop their timer if it is the
    /// active one.
    pub fn unmark(&mut self, member_id: &MemberId) -> bool {
        if self.active().is_some_and(|t| &t.member_id == member_id) {
            self.stop();
            return true;
        }
        false
    }

    /// Remove the frozen badge for a member, including an expired timer
    pub fn clear_acknowledged(&mut self, member_id: &MemberId) -> bool {
        let mut cleared = self.acknowledged.remove(member_id);
        if self.expired_member() == Some(member_id) {
            self.phase = TimerPhase::Idle;
            cleared = true;
        }
        cleared
    }

    /// Drop every trace of a member that left the roster
    pub fn forget_member(&mut self, member_id: &MemberId) {
        if self.active().is_some_and(|t| &t.member_id == member_id) {
            self.phase = TimerPhase::Idle;
        }
        self.acknowledged.remove(member_id);
    }

    pub fn clear_all(&mut self) {
        self.phase = TimerPhase::Idle;
        self.acknowledged.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_disabled_feature_ignores_start() {
        let mut timer = TimerEngine::new();
        assert!(!timer.start("a".into(), start_time(), 120, false));
        assert_eq!(timer.phase(), &TimerPhase::Idle);
    }

    #[test]
    fn test_remaining_is_derived_from_start() {
        let mut timer = TimerEngine::new();
        let t0 = start_time();
        timer.start("a".into(), t0, 120, true);

        assert_eq!(timer.remaining_secs(t0), Some(120));
        assert_eq!(timer.remaining_secs(t0 + Duration::seconds(45)), Some(75));
        // a long suspension skips straight to zero
        assert_eq!(timer.remaining_secs(t0 + Duration::hours(2)), Some(0));
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut timer = TimerEngine::new();
        let t0 = start_time();
        timer.start("a".into(), t0, 60, true);

        assert_eq!(timer.tick(t0 + Duration::seconds(59)), None);
        assert_eq!(
            timer.tick(t0 + Duration::seconds(60)),
            Some(TimerEvent::Expired("a".into()))
        );
        assert_eq!(timer.tick(t0 + Duration::seconds(61)), None);
        assert_eq!(timer.tick(t0 + Duration::seconds(90)), None);
        assert_eq!(timer.expired_member(), Some(&"a".into()));
    }

    #[test]
    fn test_starting_second_timer_acknowledges_first() {
        let mut timer = TimerEngine::new();
        let t0 = start_time();
        timer.start("a".into(), t0, 120, true);
        timer.start("b".into(), t0 + Duration::seconds(10), 120, true);

        assert!(timer.is_acknowledged(&"a".into()));
        assert_eq!(timer.running_member(), Some(&"b".into()));
        assert_eq!(timer.acknowledged().count(), 1);
    }

    #[test]
    fn test_restart_clears_own_badge() {
        let mut timer = TimerEngine::new();
        let t0 = start_time();
        timer.start("a".into(), t0, 120, true);
        timer.stop();
        assert!(timer.is_acknowledged(&"a".into()));

        timer.start("a".into(), t0, 120, true);
        assert!(!timer.is_acknowledged(&"a".into()));
        assert!(timer.is_running());
    }

    #[test]
    fn test_stop_acknowledges() {
        let mut timer = TimerEngine::new();
        timer.start("a".into(), start_time(), 120, true);

        assert_eq!(timer.stop(), Some("a".into()));
        assert_eq!(timer.phase(), &TimerPhase::Idle);
        assert!(timer.is_acknowledged(&"a".into()));
        assert_eq!(timer.stop(), None);
    }

    #[test]
    fn test_unmark_only_touches_active_member() {
        let mut timer = TimerEngine::new();
        timer.start("a".into(), start_time(), 120, true);

        assert!(!timer.unmark(&"b".into()));
        assert!(timer.is_running());
        assert!(timer.unmark(&"a".into()));
        assert_eq!(timer.phase(), &TimerPhase::Idle);
    }

    #[test]
    fn test_clear_acknowledged_hides_expired() {
        let mut timer = TimerEngine::new();
        let t0 = start_time();
        timer.start("a".into(), t0, 60, true);
        timer.tick(t0 + Duration::seconds(60));

        assert!(timer.clear_acknowledged(&"a".into()));
        assert_eq!(timer.phase(), &TimerPhase::Idle);
        assert!(!timer.clear_acknowledged(&"a".into()));
    }

    #[test]
    fn test_clock_and_tone() {
        assert_eq!(format_clock(120), "2:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(0), "0:00");

        assert_eq!(TimerTone::for_progress(10.0), TimerTone::Calm);
        assert_eq!(TimerTone::for_progress(50.0), TimerTone::Warning);
        assert_eq!(TimerTone::for_progress(95.0), TimerTone::Urgent);
    }

    #[test]
    fn test_progress_percent() {
        let t0 = start_time();
        let timer = ActiveTimer {
            member_id: "a".into(),
            started_at: t0,
            duration_secs: 100,
        };
        assert_eq!(timer.progress_percent(t0), 0.0);
        assert_eq!(timer.progress_percent(t0 + Duration::seconds(25)), 25.0);
        assert_eq!(timer.progress_percent(t0 + Duration::seconds(500)), 100.0);
    }
}
