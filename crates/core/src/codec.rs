//! URL state codec
//!
//! `ShareData` → JSON → unpadded URL-safe base64. Decoding also accepts
//! the padded standard alphabet written by older versions of the tool.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{
    clamp_timer_duration, ShareData, TeamMember, DEFAULT_TIMER_DURATION_SECS,
    MAX_TIMER_DURATION_SECS,
};
use crate::roster::Roster;
use crate::state::AppState;

/// Payload as found on the wire, before defaults and legacy keys are
/// resolved.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload {
    team_members: Vec<TeamMember>,
    timer_enabled: Option<bool>,
    timer_duration: Option<f64>,
    celebration_enabled: Option<bool>,
    celebration_media_url: Option<String>,
    // Legacy names of the celebration fields
    explosion_enabled: Option<bool>,
    explosion_gif_url: Option<String>,
}

impl WirePayload {
    fn into_share_data(self) -> ShareData {
        let team_members = Roster::from_members(self.team_members).to_vec();

        ShareData {
            team_members,
            timer_enabled: self.timer_enabled.unwrap_or(true),
            timer_duration: normalize_duration(self.timer_duration),
            celebration_enabled: self
                .celebration_enabled
                .or(self.explosion_enabled)
                .unwrap_or(true),
            celebration_media_url: self
                .celebration_media_url
                .or(self.explosion_gif_url)
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

fn normalize_duration(raw: Option<f64>) -> u32 {
    match raw {
        Some(secs) if secs.is_finite() && secs >= 1.0 => {
            let secs = secs.round().min(f64::from(MAX_TIMER_DURATION_SECS));
            clamp_timer_duration(secs as u32)
        }
        Some(secs) if secs.is_finite() && secs < 0.0 => clamp_timer_duration(0),
        _ => DEFAULT_TIMER_DURATION_SECS,
    }
}

/// Encode the persisted part of `state`
pub fn encode(state: &AppState) -> String {
    encode_share(&state.to_share_data())
}

pub fn encode_share(share: &ShareData) -> String {
    match serde_json::to_vec(share) {
        Ok(json) => URL_SAFE_NO_PAD.encode(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize share data");
            String::new()
        }
    }
}

/// Decode a link payload. Malformed input yields `None`, exactly as if
/// no payload had been given.
pub fn decode(encoded: &str) -> Option<ShareData> {
    match try_decode(encoded) {
        Ok(share) => Some(share),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring undecodable state payload");
            None
        }
    }
}

/// Decode a link payload, reporting why it failed
pub fn try_decode(encoded: &str) -> Result<ShareData> {
    let normalized: String = encoded
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            // A raw '+' turns into a space when a query string is form-decoded
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    if normalized.is_empty() {
        return Err(Error::Decode("empty payload".into()));
    }

    let json = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
    let payload: WirePayload = match serde_json::from_slice(&json) {
        Ok(payload) => payload,
        Err(e) if std::str::from_utf8(&json).is_err() => {
            // Older links carry one Latin-1 byte per character
            let text: String = json.iter().map(|&b| char::from(b)).collect();
            serde_json::from_str(&text).map_err(|_| e)?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(payload.into_share_data())
}
