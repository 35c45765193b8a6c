//! Delayed and repeating callbacks
//!
//! Each scheduled job lives in a named slot. Scheduling into an occupied
//! slot aborts the previous job. Jobs do not touch the session; they send
//! a [`Wakeup`] back to the facilitator loop.

use std::collections::HashMap;
use std::time::Duration;

use standup_core::{MemberId, RoundId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Highlight,
    Commit,
    TimerStart,
    Countdown,
    Hide(MemberId),
}

/// Message delivered when a scheduled job fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wakeup {
    Highlight(RoundId),
    Commit(RoundId),
    StartTimer {
        round: RoundId,
        member_id: MemberId,
    },
    Tick,
    Hide {
        round: Option<RoundId>,
        member_id: MemberId,
    },
}

pub struct Scheduler {
    tx: mpsc::UnboundedSender<Wakeup>,
    slots: HashMap<Slot, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(tx: mpsc::UnboundedSender<Wakeup>) -> Self {
        Self {
            tx,
            slots: HashMap::new(),
        }
    }

    /// Deliver `wakeup` once after `after`
    pub fn once(&mut self, slot: Slot, after: Duration, wakeup: Wakeup) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            time::sleep(after).await;
            let _ = tx.send(wakeup);
        });
        self.install(slot, handle);
    }

    /// Deliver `wakeup` every `every`, starting one period from now, until
    /// the slot is cancelled
    pub fn every(&mut self, slot: Slot, every: Duration, wakeup: Wakeup) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(wakeup.clone()).is_err() {
                    break;
                }
            }
        });
        self.install(slot, handle);
    }

    fn install(&mut self, slot: Slot, handle: JoinHandle<()>) {
        tracing::trace!(?slot, "Scheduled");
        if let Some(previous) = self.slots.insert(slot, handle) {
            previous.abort();
        }
    }

    pub fn cancel(&mut self, slot: &Slot) -> bool {
        match self.slots.remove(slot) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending job
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.slots.drain() {
            handle.abort();
        }
    }

    pub fn is_scheduled(&self, slot: &Slot) -> bool {
        self.slots
            .get(slot)
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (Scheduler, mpsc::UnboundedReceiver<Wakeup>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Scheduler::new(tx), rx)
    }

    fn hide(id: &str) -> Wakeup {
        Wakeup::Hide {
            round: None,
            member_id: id.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let (mut scheduler, mut rx) = scheduler();
        let start = Instant::now();

        scheduler.once(Slot::Hide("a".into()), Duration::from_secs(5), hide("a"));
        assert_eq!(rx.recv().await, Some(hide("a")));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_a_slot_aborts_the_old_job() {
        let (mut scheduler, mut rx) = scheduler();

        scheduler.once(Slot::Hide("a".into()), Duration::from_secs(1), hide("old"));
        scheduler.once(Slot::Hide("a".into()), Duration::from_secs(2), hide("new"));

        assert_eq!(rx.recv().await, Some(hide("new")));
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_repeats_until_cancelled() {
        let (mut scheduler, mut rx) = scheduler();
        let start = Instant::now();

        scheduler.every(Slot::Countdown, Duration::from_secs(1), Wakeup::Tick);
        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Wakeup::Tick));
        }
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(scheduler.is_scheduled(&Slot::Countdown));

        assert!(scheduler.cancel(&Slot::Countdown));
        assert!(!scheduler.is_scheduled(&Slot::Countdown));
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (mut scheduler, mut rx) = scheduler();

        scheduler.once(Slot::Hide("a".into()), Duration::from_secs(1), hide("a"));
        scheduler.every(Slot::Countdown, Duration::from_secs(1), Wakeup::Tick);
        scheduler.cancel_all();

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!scheduler.cancel(&Slot::Countdown));
    }
}
