use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use vigil_controller::{
    audit, ConsoleCommand, ControllerConfig, MonitorHandle, MonitorSettings, MonitorStatus, MonitorTask,
    SignalBoard,
};
use vigil_eventlog::{
    EventMonitor, FlushResult, FsStorage, PersistenceCoordinator, RecoveryStatus, SystemClock,
};
use vigil_logging::VigilSubscriberBuilder;

#[derive(Parser, Debug)]
#[command(name = "vigil-controller", about = "Home-security event log controller")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding persisted event files (overrides the config file)
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write JSONL log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll signals set from stdin and keep the event log
    Run,
    /// Print every event recovered from the storage directory
    Recover {
        /// One JSON object per event instead of the text listing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(root) = cli.storage_root {
        config = config.with_storage_root(root);
    }

    let mut logging = VigilSubscriberBuilder::new().with_config(config.logging.clone());
    if let Some(level) = cli.log_level {
        logging = logging.with_level(level);
    }
    if let Some(dir) = cli.log_dir {
        logging = logging.with_log_dir(dir);
    }
    let _guard = logging.try_init()?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Recover { json } => recover(&config, json),
    }
}

async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    let storage = Arc::new(
        FsStorage::create(&config.storage_root)
            .with_context(|| format!("opening {}", config.storage_root.display()))?,
    );
    let coordinator = PersistenceCoordinator::new();

    if !coordinator.probe(storage.as_ref()) {
        warn!(root = %config.storage_root.display(), "Storage unavailable; events stay in memory");
    } else if config.recover_on_start {
        let report = coordinator.recover_all(storage.as_ref());
        info!(
            files = report.files.len(),
            events = report.total_records(),
            "Startup recovery scan finished"
        );
    }

    let board = Arc::new(SignalBoard::new());
    let handle = MonitorTask::spawn(
        EventMonitor::new(config.log_capacity, SystemClock),
        board.clone(),
        storage,
        coordinator,
        MonitorSettings::from_config(&config)?,
    )?;

    println!("Commands: <SIGNAL> on|off, flush, status, quit");
    console(&handle, &board).await?;

    let result = handle.shutdown().await?;
    print_flush(&result);
    Ok(())
}

/// Read commands from stdin until quit, end of input, or Ctrl-C
async fn console(handle: &MonitorHandle, board: &SignalBoard) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Set { signal, state }) => board.set(signal.name(), state),
            Ok(ConsoleCommand::Flush) => print_flush(&handle.flush().await?),
            Ok(ConsoleCommand::Status) => print_status(&handle.status().await?),
            Ok(ConsoleCommand::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn recover(config: &ControllerConfig, json: bool) -> anyhow::Result<()> {
    let storage = FsStorage::new(&config.storage_root);
    let report = PersistenceCoordinator::new().recover_all(&storage);
    if json {
        print!("{}", audit::to_json_lines(&report)?);
    } else {
        print!("{}", audit::to_text(&report));
    }

    if report.status() == RecoveryStatus::Unavailable {
        anyhow::bail!("storage unavailable at {}", config.storage_root.display());
    }
    Ok(())
}

fn print_flush(result: &FlushResult) {
    match result {
        FlushResult::NothingToStore => println!("Nothing to store"),
        FlushResult::Flushed {
            file_name,
            written,
            failed,
        } => println!("{}: {} written, {} failed", file_name, written, failed),
    }
}

fn print_status(status: &MonitorStatus) {
    println!("Events: {}/{}", status.events, status.capacity);
    if let Some(newest) = &status.newest {
        println!("Newest: {}", newest);
    }
    for (signal, level) in &status.signals {
        println!("  {:<10} {}", signal, if *level { "on" } else { "off" });
    }
}
