//! Stand-up Link Library
//!
//! Keeps the shareable part of a stand-up session in the page address.
//!
//! # Architecture
//!
//! - **Address**: parse and rebuild `scheme://host/path?query#fragment`
//! - **Location**: where the current address lives (a history entry)
//! - **UrlSync**: loads state from the `state` parameter and writes it
//!   back by replacing the current entry in place
//!
//! # Usage
//!
//! ```ignore
//! let mut sync = UrlSync::new(MemoryLocation::new("https://host/standup/?state=..."));
//! let session = Session::from_share(sync.load_from_location(), Timings::default());
//!
//! // after every change
//! sync.sync_to_location(session.state());
//! ```

pub mod address;
pub mod error;
pub mod location;
pub mod sync;

pub use address::PageAddress;
pub use error::{Error, Result};
pub use location::{Detached, Location, MemoryLocation};
pub use sync::UrlSync;

/// Query parameter carrying the encoded state
pub const STATE_PARAM: &str = "state";
