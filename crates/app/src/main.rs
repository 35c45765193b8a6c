//! Standup - daily stand-up facilitator
//!
//! Terminal host for the stand-up board. The shareable state lives in
//! the page address given as the first argument (or `base_url` from the
//! config file), so a printed link restores the same roster later.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use standup_core::Session;
use standup_link::{Detached, Location, MemoryLocation, UrlSync};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod clipboard;
mod commands;
mod config;
mod facilitator;
mod platform;
mod render;
mod scheduler;

use commands::Command;
use config::AppConfig;
use facilitator::Facilitator;
use render::{Output, Printer};
use scheduler::Scheduler;

fn main() {
    // Logs go to stderr, the board owns stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Standup");

    platform::log_platform_info();

    let config = AppConfig::load();
    let address = std::env::args().nth(1).or_else(|| config.base_url.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    runtime.block_on(run(config, address));
}

async fn run(config: AppConfig, address: Option<String>) {
    let location: Box<dyn Location> = match address {
        Some(address) => {
            tracing::info!(address = %address, "Using page address");
            Box::new(MemoryLocation::new(address))
        }
        None => {
            tracing::info!("No page address, state will not be kept");
            Box::new(Detached)
        }
    };

    let mut sync = UrlSync::new(location);
    let session = Session::from_share(sync.load_from_location(), config.timings());

    let (wakeup_tx, mut wakeup_rx) = mpsc::unbounded_channel();
    let mut facilitator = Facilitator::new(
        session,
        sync,
        Scheduler::new(wakeup_tx),
        Box::new(clipboard::SystemClipboard::new()),
        StdRng::from_entropy(),
    );

    let mut printer = Printer::new(std::io::stdout());
    printer.write(facilitator.greeting(Utc::now()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => {
                        printer.write(facilitator.handle_command(Command::Quit, Utc::now()));
                        break;
                    }
                    Ok(Some(command)) => {
                        printer.write(facilitator.handle_command(command, Utc::now()));
                    }
                    Ok(None) => {}
                    Err(e) => printer.write(vec![Output::Line(e.to_string())]),
                },
                Ok(None) => {
                    tracing::debug!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    break;
                }
            },
            Some(wakeup) = wakeup_rx.recv() => {
                printer.write(facilitator.handle_wakeup(wakeup, Utc::now()));
            }
        }
    }

    tracing::info!(
        members = facilitator.session().state().team_members.len(),
        "Standup finished"
    );
}
