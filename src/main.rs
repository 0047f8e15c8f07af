//! wfalert - Warframe alert tracker and reminder scheduler.
//!
//! This is the main entry point of wfalert, a console application keeping a local
//! cache of the active Warframe alerts and firing one-shot reminders.
//!
//! # Features
//!
//! - **Alert Polling**: Fetches the alerts of the selected platform on a fixed interval
//! - **Expiry Cleanup**: Removes expired alerts from the cache between two refreshes
//! - **Reminders**: Schedules one-shot reminders that survive restarts
//! - **YAML Configuration**: Simple configuration file format with environment variable support
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings, every key is optional:
//!
//! ```yaml
//! api:
//!   url: "https://api.warframestat.us"
//!   timeout: 10
//!
//! schedule:
//!   polling_interval: 600
//!   cleanup_interval: 3600
//!
//! default_platform: pc
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `WFALERT_` prefix:
//!
//! ```bash
//! export WFALERT_API__URL="https://api.warframestat.us"
//! export WFALERT_SCHEDULE__POLLING_INTERVAL=300
//! export WFALERT_DEFAULT_PLATFORM=ps4
//! ```
//!
//! # Usage
//!
//! ```bash
//! wfalert --config config.yaml --data ./wfalert-data
//! ```
//!
//! Then type commands on the standard input, e.g. `!wf help`.
//!
//! # Architecture
//!
//! - [`alerts`] - Alert synchronization engine and expired alert cleanup
//! - [`app`] - Application context owning every component
//! - [`commands`] - Console command parsing and execution
//! - [`config`] - YAML configuration loading with environment variable support
//! - [`reminders`] - Reminder scheduler
//! - [`store`] - Durable store of the alerts, reminders and platform
//! - [`time_source`] - Injectable clock
//! - [`warframe`] - Warframe status API client
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};

use crate::{
    app::App,
    commands::{CommandParseError, Commander},
    config::Config,
};

mod alerts;
mod app;
mod commands;
mod config;
mod reminders;
mod store;
mod time_source;
mod warframe;

/// Command-line arguments.
///
/// # Examples
///
/// ```bash
/// wfalert --config config.yaml --data ./wfalert-data
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// A missing file is allowed: defaults and `WFALERT_` environment variables apply.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the directory for storing persistent data.
    ///
    /// This directory will contain `store.json` with the alerts, the reminders
    /// and the selected platform.
    #[arg(short, long)]
    data: PathBuf,
}

/// Prints every message received on `receiver` until the channel closes.
fn spawn_printer<T, F>(mut receiver: broadcast::Receiver<T>, format: F)
where
    T: Clone + Send + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(message) => println!("{}", format(&message)),
                Err(RecvError::Lagged(skipped)) => warn!("{} events were not printed", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Reads console lines until end of input or Ctrl-C.
async fn run_console(app: &App) {
    let commander = Commander::new();
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("failed to read the standard input: {}", e);
                break;
            }
        };

        match commander.parse(&line) {
            Ok(command) => println!("{}", commander.parse_command(&command, app).await),
            Err(CommandParseError::InvalidCommand(message)) => println!("{}", message),
            Err(CommandParseError::NotForApp) => {}
        }
    }
}

/// Main entry point.
///
/// 1. **Logging Setup**: `info` level by default, overridden by `RUST_LOG`
/// 2. **Argument Parsing**: command-line arguments with `clap`
/// 3. **Configuration Loading**: YAML file merged with environment variables
/// 4. **Application Start**: store opened, reminders re-armed, background jobs started
/// 5. **Console**: commands read from the standard input until end of input or Ctrl-C
/// 6. **Shutdown**: timers and background jobs stopped
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting wfalert {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return Err(e.into());
        }
    };

    let app = App::new(&config, &args.data).await?;

    // Subscribe before starting so the first refresh and late reminders are printed
    spawn_printer(app.subscribe_sync(), Commander::get_sync_event_message);
    spawn_printer(
        app.subscribe_reminder_fired(),
        Commander::get_reminder_fired_message,
    );

    app.start().await;
    println!("Type `!wf help` for the list of commands.");

    run_console(&app).await;

    app.shutdown().await;
    info!("Bye");

    Ok(())
}
