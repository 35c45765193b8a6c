//! Data models for the stand-up tracker

mod member;
mod share;

pub use member::*;
pub use share::*;
