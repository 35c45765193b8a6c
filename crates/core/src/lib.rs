//! Stand-up Core Library
//!
//! Roster, selection and timer state machines for running a daily
//! stand-up, plus the codec that packs shareable state into a link.

pub mod codec;
pub mod dsu;
pub mod error;
pub mod invariants;
pub mod models;
pub mod roster;
pub mod selection;
pub mod session;
pub mod state;
pub mod timer;

pub use error::{Error, Result};
pub use models::*;
pub use roster::{Progress, Roster};
pub use selection::{CommitOutcome, RoundId, SelectionEngine, SelectionPhase};
pub use session::{Effect, Session, Timings};
pub use state::AppState;
pub use timer::{format_clock, ActiveTimer, TimerEngine, TimerEvent, TimerPhase, TimerTone};
