//! Platform detection
//!
//! The clipboard fallback depends on which display server is running.

use std::env;

const WL_COPY_ARGS: &[&str] = &[];
const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];

/// Detected display server type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    /// Native Wayland session
    Wayland,
    /// X11 session (native or XWayland)
    X11,
    /// Unknown or headless
    Unknown,
}

impl DisplayServer {
    /// Detect the current display server from environment
    pub fn detect() -> Self {
        if env::var("WAYLAND_DISPLAY").is_ok() {
            return DisplayServer::Wayland;
        }

        if env::var("DISPLAY").is_ok() {
            return DisplayServer::X11;
        }

        DisplayServer::Unknown
    }

    /// Command-line clipboard tool and its arguments for this session
    pub fn clipboard_command(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            DisplayServer::Wayland => Some(("wl-copy", WL_COPY_ARGS)),
            DisplayServer::X11 => Some(("xclip", XCLIP_ARGS)),
            DisplayServer::Unknown => None,
        }
    }
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Log platform information at startup
pub fn log_platform_info() {
    let display_server = DisplayServer::detect();
    tracing::info!(display_server = %display_server, "Display server detected");

    match display_server.clipboard_command() {
        Some((tool, _)) => tracing::debug!(tool, "Clipboard fallback"),
        None => tracing::debug!("No clipboard fallback for this session"),
    }

    if let Ok(session_type) = env::var("XDG_SESSION_TYPE") {
        tracing::debug!(session_type = %session_type, "XDG session type");
    }
}
