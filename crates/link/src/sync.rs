//! URL synchronizer
//!
//! Reads the shared state out of the current address on start and writes
//! it back after every change. Writes always replace the current entry.

use standup_core::{codec, AppState, ShareData};

use crate::address::PageAddress;
use crate::error::{Error, Result};
use crate::location::Location;
use crate::STATE_PARAM;

pub struct UrlSync<L> {
    location: L,
    /// Last encoding written, to skip identical rewrites
    last_written: Option<String>,
}

impl<L: Location> UrlSync<L> {
    pub fn new(location: L) -> Self {
        Self {
            location,
            last_written: None,
        }
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    fn current_address(&self) -> Option<PageAddress> {
        let href = self.location.href()?;
        match PageAddress::parse(&href) {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::warn!(error = %e, "Current address is not usable");
                None
            }
        }
    }

    /// Shared state from the `state` parameter, if there is a readable one
    pub fn load_from_location(&mut self) -> Option<ShareData> {
        let address = self.current_address()?;
        let encoded = address.query_param(STATE_PARAM)?;

        let share = codec::decode(encoded);
        match &share {
            Some(share) => {
                tracing::info!(members = share.team_members.len(), "Loaded state from address");
                self.last_written = Some(codec::encode_share(share));
            }
            None => tracing::warn!("Address carries a state parameter that could not be read"),
        }
        share
    }

    /// Write `state` into the current address. Returns whether the address
    /// changed.
    pub fn sync_to_location(&mut self, state: &AppState) -> bool {
        if state.team_members.is_empty() {
            return false;
        }

        let Some(mut address) = self.current_address() else {
            return false;
        };

        let encoded = codec::encode(state);
        if self.last_written.as_deref() == Some(encoded.as_str())
            && address.query_param(STATE_PARAM) == Some(encoded.as_str())
        {
            return false;
        }

        address.set_query_param(STATE_PARAM, &encoded);
        self.location.replace(&address.to_url());
        tracing::debug!(len = encoded.len(), "Address updated");

        self.last_written = Some(encoded);
        true
    }

    /// The full current address, as the user would copy it
    pub fn share_link(&self) -> Result<String> {
        self.location.href().ok_or(Error::NoLocation)
    }

    /// Address of another page on the same origin carrying `state`
    pub fn link_with_state(&self, path: &str, state: &AppState) -> Result<String> {
        let mut address = self.current_address().ok_or(Error::NoLocation)?.with_path(path);
        address.set_query_param(STATE_PARAM, &codec::encode(state));
        Ok(address.to_url())
    }
}
