//! feedbeacon
//!
//! Command-line front end for the feed reader's settings store and
//! server liveness beacon.
//!
//! Settings persist in a JSON file under the user's local data directory
//! unless `--storage` points elsewhere (`:memory:` keeps them volatile).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedbeacon::config::settings::{SettingKey, SettingValue, SettingsStore, ValueKind};
use feedbeacon::config::storage::{AnyStore, FileStore, MemoryStore};
use feedbeacon::network::beacon::{
    BeaconControl, BeaconOutcome, BeaconPoller, BeaconState, BEACON_ELEMENT, SUSPENDED,
};
use feedbeacon::network::client::{ClientConfig, HttpBeaconClient};
use feedbeacon::ui::message_log::{MessageLevel, MessageLog, MESSAGE_TABLE};
use feedbeacon::ui::page::Page;
use feedbeacon::utils::format::fmt_number;

const MEMORY_STORAGE: &str = ":memory:";

#[derive(Debug, Parser)]
#[command(name = "feedbeacon", version, about = "Feed reader settings and server liveness beacon")]
struct Cli {
    /// Settings file (":memory:" for a throwaway store)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the server's beacon and print every status change
    Run {
        /// Server address, e.g. localhost:9001 or http://reader.example.com
        #[arg(long, default_value = "http://localhost:9001")]
        server: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Suspend or resume the beacon
    Toggle,
    /// Print one setting
    Get { category: String, attribute: String },
    /// Change one setting; the value is JSON (true, false, 2500)
    Set {
        category: String,
        attribute: String,
        value: String,
    },
    /// Print all settings as JSON
    Show,
    /// Format a number: kind is "duration", "bytes" or anything else
    Fmt {
        kind: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
}

fn main() -> Result<()> {
    // Initialize file logging
    let file_appender = tracing_appender::rolling::never(".", "feedbeacon.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Install panic hook to log panics
    let next = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("Application panic: {}", info);
        next(info);
    }));

    let cli = Cli::parse();
    tracing::info!("Starting feedbeacon: {:?}", cli.command);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(dispatch(cli))
}

fn open_store(storage: Option<PathBuf>) -> Result<AnyStore> {
    match storage {
        Some(path) if path.as_os_str() == MEMORY_STORAGE => Ok(AnyStore::Memory(MemoryStore::new())),
        Some(path) => Ok(AnyStore::File(FileStore::open(path)?)),
        None => Ok(AnyStore::File(FileStore::open(FileStore::default_path())?)),
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let store = open_store(cli.storage)?;

    match cli.command {
        Command::Run {
            server,
            timeout,
            cycles,
        } => {
            let config = ClientConfig {
                server,
                timeout: Duration::from_secs(timeout),
            };
            run_beacon(store, config, cycles).await
        }
        Command::Toggle => {
            let settings = SettingsStore::initialize(store).into_shared();
            let page = Page::with_elements([BEACON_ELEMENT]).into_shared();
            let state = BeaconControl::new(settings, page)
                .toggle()
                .await
                .context("Failed to save beacon state")?;
            match state {
                BeaconState::Polling => println!("Beacon is active"),
                BeaconState::Suspended => println!("{}", SUSPENDED),
            }
            Ok(())
        }
        Command::Get {
            category,
            attribute,
        } => {
            let settings = SettingsStore::initialize(store);
            let value = settings
                .get(&category, &attribute)
                .with_context(|| format!("Unknown setting {}.{}", category, attribute))?;
            println!("{}", value);
            Ok(())
        }
        Command::Set {
            category,
            attribute,
            value,
        } => {
            let mut settings = SettingsStore::initialize(store);
            let key = SettingKey::lookup(&category, &attribute)
                .with_context(|| format!("Unknown setting {}.{}", category, attribute))?;
            let parsed = SettingValue::decode(key.kind(), &value).with_context(|| {
                let expected = match key.kind() {
                    ValueKind::Bool => "true or false",
                    ValueKind::Int => "a non-negative integer",
                };
                format!("{} expects {}, got {:?}", key.storage_key(), expected, value)
            })?;
            settings
                .set(&category, &attribute, parsed)
                .context("Failed to save setting")?;
            println!("{} = {}", key.storage_key(), parsed);
            Ok(())
        }
        Command::Show => {
            let settings = SettingsStore::initialize(store);
            println!("{}", serde_json::to_string_pretty(settings.settings())?);
            Ok(())
        }
        Command::Fmt { kind, value } => {
            println!("{}", fmt_number(&kind, value));
            Ok(())
        }
    }
}

async fn run_beacon(store: AnyStore, config: ClientConfig, cycles: Option<usize>) -> Result<()> {
    let settings = SettingsStore::initialize(store).into_shared();
    let page = Page::with_elements([BEACON_ELEMENT, MESSAGE_TABLE]).into_shared();
    let probe = HttpBeaconClient::new(&config).context("Failed to set up beacon client")?;
    let poller = BeaconPoller::new(probe, settings, page.clone());

    if poller.state().await == BeaconState::Suspended {
        println!("{} (run `feedbeacon toggle` to resume)", SUSPENDED);
    }

    let (tx, mut rx) = mpsc::channel(100);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(tx, cancel.clone()));

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, stopping beacon");
                cancel.cancel();
            }
        }
    });

    let mut log = MessageLog::new();
    let mut last: Option<BeaconOutcome> = None;
    let mut seen = 0usize;

    while let Some(report) = rx.recv().await {
        seen += 1;

        if let Some(outcome) = report.outcome {
            if last.as_ref() != Some(&outcome) {
                println!("{}", outcome.text());
                let level = if outcome.is_error() {
                    MessageLevel::Error
                } else {
                    MessageLevel::Info
                };
                log.add(outcome.text(), level);
                log.render_into(&mut *page.write().await);
                last = Some(outcome);
            }
        }

        if cycles.is_some_and(|limit| seen >= limit) {
            cancel.cancel();
        }
    }

    handle.await.context("Beacon task failed")?;
    tracing::info!("Beacon finished after {} cycles", seen);
    Ok(())
}
