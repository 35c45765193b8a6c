//! Clipboard access for share links and DSU summaries

use std::io::Write;
use std::process::{Command, Stdio};

use crate::platform::DisplayServer;

pub trait Clipboard {
    /// Put `text` on the clipboard. Returns false if nothing worked.
    fn copy(&mut self, text: &str) -> bool;
}

/// The desktop clipboard, with a command-line fallback
pub struct SystemClipboard {
    display_server: DisplayServer,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            display_server: DisplayServer::detect(),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> bool {
        // Try arboard first (works on X11 and some Wayland)
        if let Ok(mut clipboard) = arboard::Clipboard::new() {
            if clipboard.set_text(text).is_ok() {
                tracing::debug!("Copied to clipboard via arboard");
                return true;
            }
        }

        if let Some((tool, args)) = self.display_server.clipboard_command() {
            if pipe_to(tool, args, text) {
                tracing::debug!(tool, "Copied to clipboard via fallback");
                return true;
            }
        }

        tracing::warn!("All clipboard methods failed");
        false
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> bool {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(_) => return false,
    };

    // stdin is closed at the end of the match so the tool sees EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()).is_ok(),
        None => true,
    };

    // Always reap the child, even when the write failed
    let status = child.wait();
    written && matches!(status, Ok(status) if status.success())
}
