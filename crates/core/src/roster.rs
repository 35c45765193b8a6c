//! Roster store
//!
//! Ordered collection of team members. Insertion order is the display
//! order; a selection round may reshuffle it, membership never changes
//! except through `add`, `remove` and `clear`.

use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{MemberId, TeamMember};

/// Updates given versus enabled members in the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub given: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.given == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} updates given", self.given, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    members: Vec<TeamMember>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from decoded members.
    ///
    /// Blank names are dropped, repeated ids keep their first occurrence
    /// and a non-empty blocker forces `update_given`.
    pub fn from_members(members: Vec<TeamMember>) -> Self {
        let mut seen = HashSet::new();
        let members = members
            .into_iter()
            .filter(|m| !m.name.trim().is_empty())
            .filter(|m| seen.insert(m.id.clone()))
            .map(|mut m| {
                if m.has_blocker() {
                    m.update_given = true;
                }
                m
            })
            .collect();

        Self { members }
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn to_vec(&self) -> Vec<TeamMember> {
        self.members.clone()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &MemberId) -> Option<&TeamMember> {
        self.members.iter().find(|m| &m.id == id)
    }

    fn get_mut(&mut self, id: &MemberId) -> Option<&mut TeamMember> {
        self.members.iter_mut().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.get(id).is_some()
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&TeamMember> {
        let name = name.trim().to_lowercase();
        self.members
            .iter()
            .find(|m| m.name.to_lowercase() == name)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Append a member, returning its id. Blank names are rejected.
    pub fn try_add(&mut self, name: &str) -> Option<MemberId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let member = TeamMember::new(name);
        let id = member.id.clone();
        self.members.push(member);
        Some(id)
    }

    pub fn add(&mut self, name: &str) -> &[TeamMember] {
        self.try_add(name);
        &self.members
    }

    /// Remove by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: &MemberId) -> &[TeamMember] {
        self.members.retain(|m| &m.id != id);
        &self.members
    }

    pub fn rename(&mut self, id: &MemberId, name: &str) -> &[TeamMember] {
        let name = name.trim();
        if !name.is_empty() {
            if let Some(member) = self.get_mut(id) {
                member.name = name.to_string();
            }
        }
        &self.members
    }

    /// Enable or disable a member. Update and blocker state are kept.
    pub fn set_enabled(&mut self, id: &MemberId, enabled: bool) -> &[TeamMember] {
        if let Some(member) = self.get_mut(id) {
            member.enabled = enabled;
        }
        &self.members
    }

    pub fn toggle_enabled(&mut self, id: &MemberId) -> &[TeamMember] {
        if let Some(member) = self.get_mut(id) {
            member.enabled = !member.enabled;
        }
        &self.members
    }

    pub fn enable_all(&mut self) -> &[TeamMember] {
        self.members.iter_mut().for_each(|m| m.enabled = true);
        &self.members
    }

    pub fn disable_all(&mut self) -> &[TeamMember] {
        self.members.iter_mut().for_each(|m| m.enabled = false);
        &self.members
    }

    pub fn clear(&mut self) -> &[TeamMember] {
        self.members.clear();
        &self.members
    }

    /// Set the blocker note. Non-empty text also marks the update as given;
    /// blank text clears the note.
    pub fn set_blocker(&mut self, id: &MemberId, text: &str) -> bool {
        let Some(member) = self.get_mut(id) else {
            return false;
        };

        if text.trim().is_empty() {
            member.blocker = None;
        } else {
            member.blocker = Some(text.to_string());
            member.update_given = true;
        }
        true
    }

    /// Mark or unmark a member's update.
    ///
    /// Unmarking is refused while the member has blocker text.
    pub fn set_update_given(&mut self, id: &MemberId, given: bool) -> bool {
        let Some(member) = self.get_mut(id) else {
            return false;
        };

        if !given && member.has_blocker() {
            return false;
        }

        member.update_given = given;
        true
    }

    /// Clear every member's update and blocker for a new round
    pub fn reset_round(&mut self) {
        for member in &mut self.members {
            member.update_given = false;
            member.blocker = None;
        }
    }

    /// Fisher-Yates shuffle of the whole roster, disabled members included
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.members.shuffle(rng);
    }

    /// Uniformly random enabled member
    pub fn choose_enabled<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&TeamMember> {
        let enabled: Vec<&TeamMember> = self.enabled().collect();
        enabled.choose(rng).copied()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            given: self.enabled().filter(|m| m.update_given).count(),
            total: self.enabled_count(),
        }
    }

    /// True when every other enabled member has already given their update
    pub fn is_last_outstanding(&self, id: &MemberId) -> bool {
        self.contains(id)
            && self
                .enabled()
                .filter(|m| &m.id != id)
                .all(|m| m.update_given)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster_of(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for name in names {
            roster.add(name);
        }
        roster
    }

    fn id_of(roster: &Roster, name: &str) -> MemberId {
        roster.find_by_name(name).unwrap().id.clone()
    }

    #[test]
    fn test_add_trims_and_appends() {
        let mut roster = Roster::new();
        let members = roster.add("  Ann ");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Ann");
        assert!(members[0].enabled);
        assert!(!members[0].update_given);

        roster.add("Bo");
        let names: Vec<_> = roster.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Bo"]);
    }

    #[test]
    fn test_add_rejects_blank() {
        let mut roster = Roster::new();
        assert!(roster.try_add("   ").is_none());
        assert!(roster.add("").is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut roster = roster_of(&["Ann", "Bo"]);
        let ann = id_of(&roster, "Ann");

        let once = roster.remove(&ann).to_vec();
        let twice = roster.remove(&ann).to_vec();
        assert_eq!(once, twice);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_rename() {
        let mut roster = roster_of(&["Ann"]);
        let ann = id_of(&roster, "Ann");

        roster.rename(&ann, " ");
        assert_eq!(roster.get(&ann).unwrap().name, "Ann");

        roster.rename(&ann, "  Annie ");
        assert_eq!(roster.get(&ann).unwrap().name, "Annie");
    }

    #[test]
    fn test_disable_keeps_status() {
        let mut roster = roster_of(&["Ann"]);
        let ann = id_of(&roster, "Ann");
        roster.set_blocker(&ann, "DB down");

        roster.set_enabled(&ann, false);
        let member = roster.get(&ann).unwrap();
        assert!(!member.enabled);
        assert!(member.update_given);
        assert_eq!(member.blocker_text(), Some("DB down"));
    }

    #[test]
    fn test_enable_disable_all() {
        let mut roster = roster_of(&["Ann", "Bo", "Cy"]);
        roster.disable_all();
        assert_eq!(roster.enabled_count(), 0);
        roster.enable_all();
        assert_eq!(roster.enabled_count(), 3);
    }

    #[test]
    fn test_blocker_implies_update_given() {
        let mut roster = roster_of(&["Ann"]);
        let ann = id_of(&roster, "Ann");

        roster.set_blocker(&ann, "waiting on review");
        assert!(roster.get(&ann).unwrap().update_given);

        assert!(!roster.set_update_given(&ann, false));
        assert!(roster.get(&ann).unwrap().update_given);

        roster.set_blocker(&ann, "");
        assert!(roster.get(&ann).unwrap().blocker.is_none());
        assert!(roster.set_update_given(&ann, false));
        assert!(!roster.get(&ann).unwrap().update_given);
    }

    #[test]
    fn test_shuffle_keeps_membership() {
        let mut roster = roster_of(&["Ann", "Bo", "Cy", "Di", "Ed"]);
        let mut before: Vec<_> = roster.members().iter().map(|m| m.id.clone()).collect();

        roster.shuffle(&mut StdRng::seed_from_u64(7));

        let mut after: Vec<_> = roster.members().iter().map(|m| m.id.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_choose_enabled_skips_disabled() {
        let mut roster = roster_of(&["Ann", "Bo"]);
        let bo = id_of(&roster, "Bo");
        roster.set_enabled(&bo, false);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(roster.choose_enabled(&mut rng).unwrap().name, "Ann");
        }

        roster.disable_all();
        assert!(roster.choose_enabled(&mut rng).is_none());
    }

    #[test]
    fn test_progress_and_last_outstanding() {
        let mut roster = roster_of(&["Ann", "Bo", "Cy"]);
        let ann = id_of(&roster, "Ann");
        let bo = id_of(&roster, "Bo");
        let cy = id_of(&roster, "Cy");
        roster.set_enabled(&cy, false);

        roster.set_update_given(&ann, true);
        assert_eq!(roster.progress().to_string(), "1 of 2 updates given");
        assert!(roster.is_last_outstanding(&bo));
        assert!(!roster.is_last_outstanding(&ann));

        roster.set_update_given(&bo, true);
        assert!(roster.progress().is_complete());
    }

    #[test]
    fn test_from_members_normalizes() {
        let members = vec![
            TeamMember::new("Ann").with_id("1"),
            TeamMember::new("Ann again").with_id("1"),
            TeamMember::new("  ").with_id("2"),
            TeamMember::new("Bo").with_id("3").with_blocker("VPN"),
        ];

        let roster = Roster::from_members(members);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.members()[0].name, "Ann");
        assert!(roster.members()[1].update_given);
    }

    #[test]
    fn test_find_by_name_folds_non_ascii_case() {
        let roster = roster_of(&["ZOË", "Ann"]);

        assert_eq!(roster.find_by_name(" zoë ").unwrap().name, "ZOË");
        assert_eq!(roster.find_by_name("ANN").unwrap().name, "Ann");
        assert!(roster.find_by_name("zoe").is_none());
    }
}
