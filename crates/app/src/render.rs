//! Text rendering of the stand-up board

use std::fmt::Write as _;
use std::io;

use chrono::{DateTime, Utc};
use standup_core::{format_clock, ActiveTimer, Session, TeamMember, TimerPhase, TimerTone};

/// Whole board: progress, roster, current speaker and countdown
pub fn board(session: &Session, now: DateTime<Utc>) -> String {
    let state = session.state();
    let mut out = String::new();

    let progress = session.progress();
    let _ = writeln!(
        out,
        "Stand-up: {}{}",
        progress,
        if progress.is_complete() { " - all done" } else { "" }
    );

    if state.team_members.is_empty() {
        let _ = writeln!(out, "  (no one yet, try 'add <name>')");
    }

    let winner = state.selected_winner().map(|w| &w.id);
    for (index, member) in state.team_members.members().iter().enumerate() {
        let pointer = if Some(&member.id) == winner { '>' } else { ' ' };
        let _ = writeln!(out, "{} {}", pointer, member_line(index + 1, member, session, now));
    }

    if state.is_selecting() {
        let _ = writeln!(out, "Picking...");
    } else if let Some(winner) = state.selected_winner() {
        let _ = writeln!(out, "Up next: {}", winner.name);
    }

    if let Some(line) = timer_line(session, now) {
        let _ = writeln!(out, "{}", line);
    }

    let _ = write!(out, "{}", settings_line(session));
    out
}

fn member_line(position: usize, member: &TeamMember, session: &Session, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:>2}. [{}] {}",
        position,
        if member.update_given { 'x' } else { ' ' },
        member.name
    );

    if !member.enabled {
        line.push_str(" (skipped)");
    }

    if let Some(blocker) = member.blocker_text() {
        let _ = write!(line, "  blocker: {}", blocker);
    }

    let timer = &session.state().timer;
    if timer.running_member() == Some(&member.id) {
        if let Some(remaining) = timer.remaining_secs(now) {
            let _ = write!(line, "  {}", format_clock(remaining));
        }
    } else if timer.expired_member() == Some(&member.id) || timer.is_acknowledged(&member.id) {
        line.push_str("  0:00 time's up");
    }

    line
}

/// Countdown status line, if a timer is showing
pub fn timer_line(session: &Session, now: DateTime<Utc>) -> Option<String> {
    let state = session.state();
    let name_of = |timer: &ActiveTimer| {
        state
            .team_members
            .get(&timer.member_id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    };

    match state.timer.phase() {
        TimerPhase::Idle => None,
        TimerPhase::Running(timer) => {
            let tone = match TimerTone::for_progress(timer.progress_percent(now)) {
                TimerTone::Calm => "",
                TimerTone::Warning => " (wrap up soon)",
                TimerTone::Urgent => " (almost out)",
            };
            Some(format!(
                "Timer: {} {} of {} left{}",
                name_of(timer),
                format_clock(timer.remaining_secs(now)),
                format_clock(timer.duration_secs),
                tone
            ))
        }
        TimerPhase::Expired(timer) => Some(format!("Timer: {} is out of time", name_of(timer))),
    }
}

fn settings_line(session: &Session) -> String {
    let state = session.state();
    let mut line = if state.timer_enabled {
        format!("Timer {} per person", format_clock(state.timer_duration))
    } else {
        "Timer off".to_string()
    };

    line.push_str(if state.celebration_enabled {
        ", celebration on"
    } else {
        ", celebration off"
    });

    if let Some(url) = &state.celebration_media_url {
        let _ = write!(line, " ({})", url);
    }
    line
}

/// Announcement when a countdown runs out
pub fn celebration(name: &str, media_url: Option<&str>) -> String {
    match media_url {
        Some(url) => format!("*** Time's up, {}! *** {}", name, url),
        None => format!("*** Time's up, {}! ***", name),
    }
}

/// One piece of terminal output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Line(String),
    /// Transient status overwritten by the next output
    Flash(String),
}

impl Output {
    pub fn text(&self) -> &str {
        match self {
            Output::Line(text) | Output::Flash(text) => text,
        }
    }
}

/// Writes outputs to a terminal, overwriting flashes in place
pub struct Printer<W: io::Write> {
    out: W,
    flashing: bool,
}

impl<W: io::Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            flashing: false,
        }
    }

    pub fn write(&mut self, outputs: Vec<Output>) {
        if let Err(e) = self.try_write(outputs) {
            tracing::warn!(error = %e, "Failed to write output");
        }
    }

    fn try_write(&mut self, outputs: Vec<Output>) -> io::Result<()> {
        for output in outputs {
            match output {
                Output::Flash(text) => {
                    write!(self.out, "\r{}\x1b[K", text)?;
                    self.flashing = true;
                }
                Output::Line(text) => {
                    if self.flashing {
                        writeln!(self.out)?;
                        self.flashing = false;
                    }
                    writeln!(self.out, "{}", text)?;
                }
            }
        }
        self.out.flush()
    }
}
