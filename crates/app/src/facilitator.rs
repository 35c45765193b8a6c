//! Facilitator
//!
//! Owns the session and everything around it: runs commands, turns
//! session effects into scheduled jobs, handles their wakeups and keeps
//! the page address in step with the state.

use chrono::{DateTime, Local, Utc};
use rand::rngs::StdRng;
use standup_core::{Effect, MemberId, Session};
use standup_link::{Location, UrlSync};

use crate::clipboard::Clipboard;
use crate::commands::{Command, MemberRef, TimerCommand, HELP};
use crate::render::{self, Output};
use crate::scheduler::{Scheduler, Slot, Wakeup};

pub struct Facilitator {
    session: Session,
    sync: UrlSync<Box<dyn Location>>,
    scheduler: Scheduler,
    clipboard: Box<dyn Clipboard>,
    rng: StdRng,
}

impl Facilitator {
    pub fn new(
        session: Session,
        sync: UrlSync<Box<dyn Location>>,
        scheduler: Scheduler,
        clipboard: Box<dyn Clipboard>,
        rng: StdRng,
    ) -> Self {
        Self {
            session,
            sync,
            scheduler,
            clipboard,
            rng,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current address, if there is one
    pub fn share_link(&self) -> Option<String> {
        self.sync.share_link().ok()
    }

    /// First screen
    pub fn greeting(&self, now: DateTime<Utc>) -> Vec<Output> {
        let members = self.session.state().team_members.len();
        let mut out = Vec::new();
        if members > 0 {
            out.push(Output::Line(format!("Restored {} members from the link.", members)));
        }
        out.push(Output::Line(render::board(&self.session, now)));
        out.push(Output::Line("Type 'help' for commands.".to_string()));
        out
    }

    fn resolve(&self, who: &MemberRef) -> Result<(MemberId, String), Output> {
        let roster = &self.session.state().team_members;
        who.resolve(roster)
            .and_then(|id| roster.get(&id).map(|m| (id, m.name.clone())))
            .ok_or_else(|| Output::Line(format!("No member {}", who)))
    }

    pub fn handle_command(&mut self, command: Command, now: DateTime<Utc>) -> Vec<Output> {
        tracing::debug!(?command, "Command");

        let shows_board = !matches!(
            command,
            Command::Share
                | Command::Dsu
                | Command::Link(_)
                | Command::Help
                | Command::Quit
                | Command::Status
        );

        let mut out = match self.run_command(command, now) {
            Ok(out) => out,
            Err(message) => return vec![message],
        };

        self.sync();
        if shows_board {
            out.push(Output::Line(render::board(&self.session, now)));
        }
        out
    }

    fn run_command(&mut self, command: Command, now: DateTime<Utc>) -> Result<Vec<Output>, Output> {
        let mut out = Vec::new();

        match command {
            Command::Add(name) => match self.session.add_member(&name) {
                Some(_) => out.push(Output::Line(format!("Added {}", name.trim()))),
                None => return Err(Output::Line("A name can't be blank".to_string())),
            },
            Command::Remove(who) => {
                let (id, name) = self.resolve(&who)?;
                self.session.remove_member(&id);
                self.scheduler.cancel(&Slot::Hide(id));
                out.push(Output::Line(format!("Removed {}", name)));
            }
            Command::Rename(who, name) => {
                let (id, _) = self.resolve(&who)?;
                if !self.session.rename_member(&id, &name) {
                    return Err(Output::Line("A name can't be blank".to_string()));
                }
            }
            Command::Toggle(who) => {
                let (id, _) = self.resolve(&who)?;
                self.session.toggle_member_enabled(&id);
            }
            Command::EnableAll => self.session.enable_all(),
            Command::DisableAll => self.session.disable_all(),
            Command::ClearAll => {
                let effects = self.session.clear_roster();
                self.apply(effects, &mut out);
            }
            Command::Spin => {
                if self.session.state().is_selecting() {
                    return Err(Output::Line("Already picking".to_string()));
                }
                let effects = self.session.start_selection(now, &mut self.rng);
                if effects.is_empty() {
                    return Err(Output::Line("No one to pick, enable someone first".to_string()));
                }
                self.apply(effects, &mut out);
            }
            Command::Done(who) => {
                let (id, name) = self.resolve(&who)?;
                if !self.session.toggle_update(&id) {
                    return Err(Output::Line(format!(
                        "{} has a blocker, clear it before unmarking",
                        name
                    )));
                }
                self.stop_countdown_if_idle();
            }
            Command::Blocker(who, text) => {
                let (id, _) = self.resolve(&who)?;
                self.session.set_blocker(&id, &text);
            }
            Command::Timer(TimerCommand::On) => self.session.set_timer_enabled(true),
            Command::Timer(TimerCommand::Off) => {
                self.session.set_timer_enabled(false);
                self.scheduler.cancel(&Slot::Countdown);
            }
            Command::Timer(TimerCommand::Start(who)) => {
                let (id, _) = self.resolve(&who)?;
                let effects = self.session.start_timer(&id, now);
                if effects.is_empty() {
                    return Err(Output::Line("The timer is off, 'timer on' enables it".to_string()));
                }
                self.apply(effects, &mut out);
            }
            Command::Timer(TimerCommand::Stop) => {
                if self.session.stop_timer().is_none() {
                    return Err(Output::Line("No timer running".to_string()));
                }
                self.scheduler.cancel(&Slot::Countdown);
            }
            Command::Duration(minutes) => {
                let secs = self.session.set_timer_minutes(&minutes);
                out.push(Output::Line(format!(
                    "Each person gets {}",
                    standup_core::format_clock(secs)
                )));
            }
            Command::Celebrate(enabled) => self.session.set_celebration_enabled(enabled),
            Command::CelebrateUrl(url) => self.session.set_celebration_media_url(url.as_deref()),
            Command::Ack(Some(who)) => {
                let (id, _) = self.resolve(&who)?;
                self.session.clear_acknowledged(&id);
                self.scheduler.cancel(&Slot::Hide(id));
            }
            Command::Ack(None) => {
                if self.session.dismiss_overlay().is_none() {
                    return Err(Output::Line("Nothing to dismiss".to_string()));
                }
            }
            Command::Share => {
                self.sync();
                let link = self.sync.share_link().map_err(|_| {
                    Output::Line(
                        "No address to share. Start with an address or set base_url.".to_string(),
                    )
                })?;
                out.push(self.copy("Link", &link));
                out.push(Output::Line(link));
            }
            Command::Dsu => {
                let today = now.with_timezone(&Local).date_naive();
                let summary = self.session.dsu_summary(today);
                out.push(self.copy("DSU summary", &summary));
                out.push(Output::Line(summary));
            }
            Command::Link(path) => {
                let link = self
                    .sync
                    .link_with_state(&path, self.session.state())
                    .map_err(|e| Output::Line(e.to_string()))?;
                out.push(Output::Line(link));
            }
            Command::Status => out.push(Output::Line(render::board(&self.session, now))),
            Command::Help => out.push(Output::Line(HELP.to_string())),
            Command::Quit => {
                if let Some(link) = self.share_link() {
                    out.push(Output::Line(format!("Pick up where you left off: {}", link)));
                }
            }
        }

        Ok(out)
    }

    fn copy(&mut self, what: &str, text: &str) -> Output {
        if self.clipboard.copy(text) {
            Output::Line(format!("{} copied to clipboard", what))
        } else {
            Output::Line(format!("{}:", what))
        }
    }

    /// Unmarking may have stopped the running timer
    fn stop_countdown_if_idle(&mut self) {
        if !self.session.state().timer.is_running() {
            self.scheduler.cancel(&Slot::Countdown);
        }
    }

    pub fn handle_wakeup(&mut self, wakeup: Wakeup, now: DateTime<Utc>) -> Vec<Output> {
        let mut out = Vec::new();

        match wakeup {
            Wakeup::Highlight(round) => match self.session.highlight(round, &mut self.rng) {
                Some(name) => out.push(Output::Flash(format!("Picking... {}", name))),
                None => {
                    self.scheduler.cancel(&Slot::Highlight);
                }
            },
            Wakeup::Commit(round) => {
                self.scheduler.cancel(&Slot::Highlight);
                let effects = self.session.commit_selection(round, &mut self.rng);
                if effects.is_empty() {
                    tracing::debug!(%round, "Commit produced no winner");
                } else if let Some(winner) = self.session.state().selected_winner() {
                    out.push(Output::Line(format!("{}, you're up!", winner.name)));
                    out.push(Output::Line(render::board(&self.session, now)));
                }
                self.apply(effects, &mut out);
            }
            Wakeup::StartTimer { round, member_id } => {
                let effects = self.session.start_winner_timer(round, &member_id, now);
                self.apply(effects, &mut out);
            }
            Wakeup::Tick => {
                let effects = self.session.tick(now);
                let expired = !effects.is_empty();
                self.apply(effects, &mut out);

                if self.session.state().timer.is_running() {
                    if let Some(line) = render::timer_line(&self.session, now) {
                        out.push(Output::Flash(line));
                    }
                } else {
                    self.scheduler.cancel(&Slot::Countdown);
                }
                if expired {
                    out.push(Output::Line(render::board(&self.session, now)));
                }
            }
            Wakeup::Hide { round, member_id } => {
                if self.session.hide_acknowledged(round, &member_id) {
                    out.push(Output::Line(render::board(&self.session, now)));
                }
            }
        }

        self.sync();
        out
    }

    fn apply(&mut self, effects: Vec<Effect>, out: &mut Vec<Output>) {
        for effect in effects {
            match effect {
                Effect::CancelScheduled => self.scheduler.cancel_all(),
                Effect::Highlight { round, every } => {
                    self.scheduler
                        .every(Slot::Highlight, every, Wakeup::Highlight(round));
                }
                Effect::CommitSelection { round, after } => {
                    self.scheduler.once(Slot::Commit, after, Wakeup::Commit(round));
                }
                Effect::StartTimer {
                    round,
                    member_id,
                    after,
                } => {
                    self.scheduler.once(
                        Slot::TimerStart,
                        after,
                        Wakeup::StartTimer { round, member_id },
                    );
                }
                Effect::Countdown { every } => {
                    self.scheduler.every(Slot::Countdown, every, Wakeup::Tick);
                }
                Effect::HideAcknowledged {
                    round,
                    member_id,
                    after,
                } => {
                    self.scheduler.once(
                        Slot::Hide(member_id.clone()),
                        after,
                        Wakeup::Hide { round, member_id },
                    );
                }
                Effect::Celebrate {
                    member_id,
                    media_url,
                } => {
                    let name = self
                        .session
                        .state()
                        .team_members
                        .get(&member_id)
                        .map(|m| m.name.clone())
                        .unwrap_or_default();
                    out.push(Output::Line(render::celebration(&name, media_url.as_deref())));
                }
            }
        }
    }

    fn sync(&mut self) {
        self.sync.sync_to_location(self.session.state());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use rand::SeedableRng;
    use standup_core::{codec, Timings};
    use standup_link::{Detached, MemoryLocation, PageAddress, STATE_PARAM};
    use tokio::sync::mpsc;

    use super::*;
    use crate::commands::parse;

    #[derive(Clone, Default)]
    struct RecordingClipboard(Rc<RefCell<Vec<String>>>);

    impl Clipboard for RecordingClipboard {
        fn copy(&mut self, text: &str) -> bool {
            self.0.borrow_mut().push(text.to_string());
            true
        }
    }

    struct Harness {
        facilitator: Facilitator,
        wakeups: mpsc::UnboundedReceiver<Wakeup>,
        copied: RecordingClipboard,
        now: DateTime<Utc>,
    }

    impl Harness {
        fn new(location: Box<dyn Location>) -> Self {
            let (tx, wakeups) = mpsc::unbounded_channel();
            let mut sync = UrlSync::new(location);
            let session = Session::from_share(sync.load_from_location(), Timings::default());
            let copied = RecordingClipboard::default();

            Self {
                facilitator: Facilitator::new(
                    session,
                    sync,
                    Scheduler::new(tx),
                    Box::new(copied.clone()),
                    StdRng::seed_from_u64(7),
                ),
                wakeups,
                copied,
                now: DateTime::parse_from_rfc3339("2026-10-16T09:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            }
        }

        fn run(&mut self, line: &str) -> Vec<Output> {
            let command = parse(line).unwrap().unwrap();
            self.facilitator.handle_command(command, self.now)
        }

        /// Feed wakeups until one matching `stop` has been handled
        async fn until(&mut self, stop: impl Fn(&Wakeup) -> bool) -> Vec<Output> {
            let mut out = Vec::new();
            while let Some(wakeup) = self.wakeups.recv().await {
                let done = stop(&wakeup);
                out.extend(self.facilitator.handle_wakeup(wakeup, self.now));
                if done {
                    break;
                }
            }
            out
        }
    }

    fn texts(out: &[Output]) -> Vec<&str> {
        out.iter().map(Output::text).collect()
    }

    fn stored_names(link: &str) -> Vec<String> {
        let address = PageAddress::parse(link).unwrap();
        let share = codec::decode(address.query_param(STATE_PARAM).unwrap()).unwrap();
        share.team_members.into_iter().map(|m| m.name).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_round() {
        let mut h = Harness::new(Box::new(MemoryLocation::new("https://example.com/standup/")));
        h.run("add Ann");
        h.run("add Bo");
        h.run("celebrate-url https://example.com/party.gif");

        h.run("spin");
        assert!(h.facilitator.session().state().is_selecting());

        let out = h.until(|w| matches!(w, Wakeup::Commit(_))).await;
        assert!(out.iter().any(|o| matches!(o, Output::Flash(t) if t.starts_with("Picking... "))));
        let winner = h.facilitator.session().state().selected_winner().unwrap().clone();
        assert!(texts(&out).contains(&format!("{}, you're up!", winner.name).as_str()));

        h.until(|w| matches!(w, Wakeup::StartTimer { .. })).await;
        assert_eq!(
            h.facilitator.session().state().timer.running_member(),
            Some(&winner.id)
        );

        h.now = h.now + chrono::Duration::seconds(121);
        let out = h.until(|w| matches!(w, Wakeup::Tick)).await;
        assert!(texts(&out)
            .iter()
            .any(|t| t.starts_with(&format!("*** Time's up, {}!", winner.name))
                && t.ends_with("party.gif")));
        assert_eq!(h.facilitator.session().overlay(), Some(&winner.id));

        let out = h.run("ack");
        assert!(h.facilitator.session().overlay().is_none());
        assert!(!out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spin_refused_while_picking() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");
        h.run("spin");

        assert_eq!(texts(&h.run("spin")), vec!["Already picking"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spin_with_nobody_enabled() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");
        h.run("disable-all");

        assert_eq!(
            texts(&h.run("spin")),
            vec!["No one to pick, enable someone first"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_winner_gets_no_timer() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");
        h.run("spin");
        h.until(|w| matches!(w, Wakeup::Commit(_))).await;

        h.run("rm Ann");
        h.until(|w| matches!(w, Wakeup::StartTimer { .. })).await;

        assert!(h.facilitator.session().state().active_timer().is_none());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.wakeups.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_address_tracks_every_change() {
        let mut h = Harness::new(Box::new(MemoryLocation::new("https://example.com/standup/")));
        h.run("add Ann");
        h.run("add Bo");
        h.run("rename bo Bob");

        let link = h.facilitator.share_link().unwrap();
        assert_eq!(stored_names(&link), vec!["Ann", "Bob"]);

        let reopened = Harness::new(Box::new(MemoryLocation::new(link)));
        let greeting = reopened.facilitator.greeting(reopened.now);
        assert_eq!(greeting[0].text(), "Restored 2 members from the link.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_and_dsu_copy() {
        let mut h = Harness::new(Box::new(MemoryLocation::new("https://example.com/standup/")));
        h.run("add Ann");
        h.run("blocker ann waiting on review");

        let out = h.run("share");
        assert_eq!(out[0].text(), "Link copied to clipboard");
        assert!(out[1].text().contains("state="));

        let out = h.run("dsu");
        assert_eq!(out[0].text(), "DSU summary copied to clipboard");

        let copied = h.copied.0.borrow();
        assert_eq!(copied.len(), 2);
        assert!(copied[1].ends_with("- Ann: waiting on review"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_without_address() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");

        let out = h.run("share");
        assert_eq!(out.len(), 1);
        assert!(out[0].text().starts_with("No address to share"));
        assert!(h.copied.0.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmark_with_blocker_refused() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");
        h.run("blocker 1 DB down");

        assert_eq!(
            texts(&h.run("done 1")),
            vec!["Ann has a blocker, clear it before unmarking"]
        );
        assert_eq!(texts(&h.run("done 3")), vec!["No member #3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_commands() {
        let mut h = Harness::new(Box::new(Detached));
        h.run("add Ann");

        assert_eq!(h.run("duration 5")[0].text(), "Each person gets 5:00");
        h.run("timer start ann");
        assert!(h.facilitator.session().state().timer.is_running());

        h.run("timer off");
        assert!(h.facilitator.session().state().active_timer().is_none());
        assert_eq!(
            texts(&h.run("timer start 1")),
            vec!["The timer is off, 'timer on' enables it"]
        );
        assert_eq!(texts(&h.run("timer stop")), vec!["No timer running"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_to_other_page() {
        let mut h = Harness::new(Box::new(MemoryLocation::new("https://example.com/standup/")));
        h.run("add Ann");

        let out = h.run("link settings/");
        assert!(out[0].text().starts_with("https://example.com/settings/?state="));
        assert_eq!(stored_names(out[0].text()), vec!["Ann"]);
    }
}
