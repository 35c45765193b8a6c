//! Team member model

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque identifier of a team member.
///
/// Fresh ids are UUIDs. Links produced by older versions carry
/// millisecond timestamps, sometimes as JSON numbers, so both shapes
/// are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => MemberId(s),
            RawId::Unsigned(n) => MemberId(n.to_string()),
            RawId::Signed(n) => MemberId(n.to_string()),
        })
    }
}

fn default_enabled() -> bool {
    true
}

/// A team member on the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    /// Only enabled members take part in selection
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether the member reported their update this round
    #[serde(default)]
    pub update_given: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
}

impl TeamMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MemberId::new(),
            name: name.into(),
            enabled: true,
            update_given: false,
            blocker: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<MemberId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_blocker(mut self, blocker: impl Into<String>) -> Self {
        self.blocker = Some(blocker.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Trimmed blocker text, if any is present
    pub fn blocker_text(&self) -> Option<&str> {
        self.blocker
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn has_blocker(&self) -> bool {
        self.blocker_text().is_some()
    }
}
