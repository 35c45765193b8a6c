//! Terminal commands
//!
//! One command per input line. Members are addressed by their 1-based
//! position in the roster or by name (case-insensitive).

use standup_core::{MemberId, Roster};

/// A member as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    Position(usize),
    Name(String),
}

impl MemberRef {
    fn parse(token: &str) -> Self {
        let digits = token.strip_prefix('#').unwrap_or(token);
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => MemberRef::Position(n),
            _ => MemberRef::Name(token.to_string()),
        }
    }

    /// Find the member on `roster`
    pub fn resolve(&self, roster: &Roster) -> Option<MemberId> {
        match self {
            MemberRef::Position(n) => roster.members().get(n - 1).map(|m| m.id.clone()),
            MemberRef::Name(name) => roster.find_by_name(name).map(|m| m.id.clone()),
        }
    }
}

impl std::fmt::Display for MemberRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberRef::Position(n) => write!(f, "#{}", n),
            MemberRef::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    On,
    Off,
    Start(MemberRef),
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Remove(MemberRef),
    Rename(MemberRef, String),
    Toggle(MemberRef),
    EnableAll,
    DisableAll,
    ClearAll,
    Spin,
    Done(MemberRef),
    Blocker(MemberRef, String),
    Timer(TimerCommand),
    /// Minutes as typed; the session interprets it
    Duration(String),
    Celebrate(bool),
    CelebrateUrl(Option<String>),
    /// Clear a frozen timer badge, or dismiss the overlay when no one is named
    Ack(Option<MemberRef>),
    Share,
    Dsu,
    Link(String),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
Commands:
  add <name>              add a member
  rm <who>                remove a member
  rename <who> <name>     rename a member
  toggle <who>            include or skip a member
  enable-all | disable-all
  clear-all               remove everyone
  spin                    pick who speaks next
  done <who>              mark or unmark an update
  blocker <who> [text]    set or clear a blocker
  timer on|off            enable or disable the timer
  timer start <who>       start a countdown
  timer stop              stop the countdown
  duration <minutes>      countdown length
  celebrate on|off        celebration when time runs out
  celebrate-url [url]     celebration media
  ack [who]               clear a finished timer
  share                   copy the share link
  dsu                     copy the blocker summary
  link <path>             link to another page with this state
  status                  show the board
  quit
<who> is a position (1, #2) or a name.";

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => Command::Add(required(rest, "add <name>")?.to_string()),
        "rm" | "remove" => Command::Remove(member(rest, "rm <who>")?),
        "rename" => {
            let (who, name) = split_member(rest, "rename <who> <name>")?;
            if name.is_empty() {
                return Err(ParseError::Usage("rename <who> <name>"));
            }
            Command::Rename(who, name.to_string())
        }
        "toggle" => Command::Toggle(member(rest, "toggle <who>")?),
        "enable-all" => Command::EnableAll,
        "disable-all" => Command::DisableAll,
        "clear-all" => Command::ClearAll,
        "spin" | "next" => Command::Spin,
        "done" => Command::Done(member(rest, "done <who>")?),
        "blocker" => {
            let (who, text) = split_member(rest, "blocker <who> [text]")?;
            Command::Blocker(who, text.to_string())
        }
        "timer" => Command::Timer(parse_timer(rest)?),
        "duration" => Command::Duration(required(rest, "duration <minutes>")?.to_string()),
        "celebrate" => Command::Celebrate(on_off(rest, "celebrate on|off")?),
        "celebrate-url" => Command::CelebrateUrl(optional(rest)),
        "ack" => Command::Ack(optional(rest).map(|who| MemberRef::parse(&who))),
        "share" => Command::Share,
        "dsu" => Command::Dsu,
        "link" => Command::Link(required(rest, "link <path>")?.to_string()),
        "status" | "ls" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(ParseError::Unknown(word.to_string())),
    };

    Ok(Some(command))
}

fn parse_timer(rest: &str) -> Result<TimerCommand, ParseError> {
    const USAGE: &str = "timer on|off|start <who>|stop";

    let (word, rest) = match rest.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (rest, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "on" => Ok(TimerCommand::On),
        "off" => Ok(TimerCommand::Off),
        "start" => Ok(TimerCommand::Start(member(rest, USAGE)?)),
        "stop" => Ok(TimerCommand::Stop),
        _ => Err(ParseError::Usage(USAGE)),
    }
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest)
    }
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

fn member(rest: &str, usage: &'static str) -> Result<MemberRef, ParseError> {
    required(rest, usage).map(MemberRef::parse)
}

/// First word names the member, the remainder is free text
fn split_member<'a>(rest: &'a str, usage: &'static str) -> Result<(MemberRef, &'a str), ParseError> {
    let rest = required(rest, usage)?;
    match rest.split_once(char::is_whitespace) {
        Some((who, text)) => Ok((MemberRef::parse(who), text.trim())),
        None => Ok((MemberRef::parse(rest), "")),
    }
}

fn on_off(rest: &str, usage: &'static str) -> Result<bool, ParseError> {
    match rest.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err(ParseError::Usage(usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use standup_core::TeamMember;

    #[test]
    fn test_parse_basic() {
        assert_eq!(parse("  "), Ok(None));
        assert_eq!(parse("add Ann Lee"), Ok(Some(Command::Add("Ann Lee".into()))));
        assert_eq!(parse("SPIN"), Ok(Some(Command::Spin)));
        assert_eq!(parse("share"), Ok(Some(Command::Share)));
        assert_eq!(
            parse("rm 2"),
            Ok(Some(Command::Remove(MemberRef::Position(2))))
        );
        assert_eq!(
            parse("done #1"),
            Ok(Some(Command::Done(MemberRef::Position(1))))
        );
        assert_eq!(
            parse("toggle bo"),
            Ok(Some(Command::Toggle(MemberRef::Name("bo".into()))))
        );
    }

    #[test]
    fn test_parse_with_text() {
        assert_eq!(
            parse("rename 1 Ann Marie"),
            Ok(Some(Command::Rename(MemberRef::Position(1), "Ann Marie".into())))
        );
        assert_eq!(
            parse("blocker Bo waiting on the  DB team"),
            Ok(Some(Command::Blocker(
                MemberRef::Name("Bo".into()),
                "waiting on the  DB team".into()
            )))
        );
        assert_eq!(
            parse("blocker Bo"),
            Ok(Some(Command::Blocker(MemberRef::Name("Bo".into()), String::new())))
        );
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(parse("timer off"), Ok(Some(Command::Timer(TimerCommand::Off))));
        assert_eq!(
            parse("timer start 3"),
            Ok(Some(Command::Timer(TimerCommand::Start(MemberRef::Position(3)))))
        );
        assert_eq!(parse("duration 5"), Ok(Some(Command::Duration("5".into()))));
        assert_eq!(parse("celebrate off"), Ok(Some(Command::Celebrate(false))));
        assert_eq!(parse("celebrate-url"), Ok(Some(Command::CelebrateUrl(None))));
        assert_eq!(parse("ack"), Ok(Some(Command::Ack(None))));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".into())));
        assert!(matches!(parse("add"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("rename 1"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("timer later"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("celebrate maybe"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_resolve() {
        let roster = Roster::from_members(vec![
            TeamMember::new("Ann").with_id("a"),
            TeamMember::new("Bo").with_id("b"),
        ]);

        assert_eq!(MemberRef::Position(2).resolve(&roster), Some("b".into()));
        assert_eq!(MemberRef::Name("ANN".into()).resolve(&roster), Some("a".into()));
        assert_eq!(MemberRef::Position(3).resolve(&roster), None);
        assert_eq!(MemberRef::Name("Cy".into()).resolve(&roster), None);
    }
}
