//! Daily stand-up blocker summary
//!
//! Plain-text digest of the round's blockers, meant for pasting into chat.

use chrono::{Datelike, NaiveDate};

use crate::models::TeamMember;

/// English ordinal suffix for a day of the month
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// e.g. "Saturday the 17th of October 2026"
pub fn format_dsu_date(date: NaiveDate) -> String {
    format!(
        "{} the {}{} of {} {}",
        date.format("%A"),
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%B"),
        date.year()
    )
}

/// Header line plus one line per enabled member with a blocker
pub fn dsu_summary(members: &[TeamMember], date: NaiveDate) -> String {
    let mut lines = vec![format!("DSU blockers for {}:", format_dsu_date(date))];

    lines.extend(members.iter().filter(|m| m.enabled).filter_map(|m| {
        m.blocker_text()
            .map(|blocker| format!("- {}: {}", m.name, blocker))
    }));

    if lines.len() == 1 {
        lines.push("- None!".to_string());
    }

    lines.join("\n")
}
