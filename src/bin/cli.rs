//! atbench CLI - Command-line interface
//!
//! Drives AT-command transactions against a serial modem or the built-in
//! simulator, replays command files and runs the device-side emulator.

use anyhow::Context;
use atbench_core::cli::{exit_code_table, render_entry, OutputFormat};
use atbench_core::config::{AppConfig, ConfigError};
use atbench_core::core::batch::{self, BatchEvent, BatchJob, CancelFlag};
use atbench_core::core::emulator::ModemEmulator;
use atbench_core::core::logger::LogEntry;
use atbench_core::core::transport::STANDARD_BAUD_RATES;
use atbench_core::{
    CliResult, ExitCodes, Session, SessionHandle, Timings, Transaction, TransportKind,
    SIMULATED_CHANNEL,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Read timeout for the emulator's port
const EMULATOR_POLL: Duration = Duration::from_millis(100);

/// atbench CLI
#[derive(Parser, Debug)]
#[command(
    name = "atbench",
    version,
    about = "AT command workbench for serial modems",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Prefix text output with timestamps
    #[arg(long)]
    timestamps: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "ATBENCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which endpoint to talk to
#[derive(Args, Debug)]
struct TargetArgs {
    /// Use the simulated modem instead of a serial port
    #[arg(long)]
    demo: bool,

    /// Serial port name (e.g., COM3, /dev/ttyUSB0)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available channels
    ListPorts {
        /// List the simulator's channel
        #[arg(long)]
        demo: bool,
    },

    /// Send commands, one transaction each (reads stdin when none are given)
    Send {
        #[command(flatten)]
        target: TargetArgs,

        /// Commands to send
        commands: Vec<String>,
    },

    /// Replay a command file
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Command file
        #[arg(short, long)]
        file: PathBuf,

        /// Pause between commands (ms), overrides the config
        #[arg(short, long)]
        delay: Option<u64>,
    },

    /// Show the commands a file would run
    Parse {
        /// Command file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Act as a modem on a serial port
    Emulate {
        /// Serial port name
        #[arg(short, long)]
        port: String,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Pause before each reply (ms)
        #[arg(long, default_value = "500")]
        wait_ms: u64,
    },

    /// List exit codes
    ExitCodes,

    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match run(&cli).await {
        Ok(result) => result,
        Err(e) => CliResult::error(ExitCodes::ERROR, format!("{e:#}")),
    };

    match (&result, result.message()) {
        (CliResult::Error(..), Some(msg)) => eprintln!("Error: {msg}"),
        (CliResult::Success(_), Some(msg)) if !cli.quiet => eprintln!("{msg}"),
        _ => {}
    }

    result.to_exit_code()
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match cli.format {
        OutputFormat::Json => builder.json().init(),
        OutputFormat::Text => builder.init(),
    }
}

async fn run(cli: &Cli) -> anyhow::Result<CliResult> {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => return Ok(e.into()),
    };

    match &cli.command {
        Commands::ListPorts { demo } => Ok(list_ports(cli, *demo)?),
        Commands::Send { target, commands } => send(cli, &config, target, commands).await,
        Commands::Run { target, file, delay } => run_file(cli, &config, target, file, *delay).await,
        Commands::Parse { file } => Ok(parse_file(cli, file)?),
        Commands::Emulate { port, baud, wait_ms } => {
            let baud = baud.unwrap_or(config.serial.baud_rate);
            emulate(port, baud, *wait_ms).await
        }
        Commands::ExitCodes => {
            print!("{}", exit_code_table());
            Ok(CliResult::success())
        }
        Commands::Config { write } => Ok(show_config(cli, &config, *write)?),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => match AppConfig::load() {
            Err(ConfigError::NoConfigDir) => {
                warn!("No config directory on this platform, using defaults");
                Ok(AppConfig::default())
            }
            other => other,
        },
    }
}

fn list_ports(cli: &Cli, demo: bool) -> anyhow::Result<CliResult> {
    let kind = if demo { TransportKind::Simulated } else { TransportKind::Serial };
    let channels = Session::new(kind, Timings::default()).list_channels();

    if channels.is_empty() {
        return Ok(CliResult::success_with_message("No serial ports found."));
    }

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&channels)?),
        OutputFormat::Text => {
            for channel in &channels {
                println!("{channel}");
            }
        }
    }

    Ok(CliResult::success())
}

/// Build a session for the target and open its channel
fn open_session(target: &TargetArgs, config: &AppConfig) -> Result<Session, CliResult> {
    let kind = if target.demo { TransportKind::Simulated } else { TransportKind::Serial };
    let mut session = Session::new(kind, Timings::from(&config.timing))
        .with_simulator_seed(config.simulator.seed);

    let port = target
        .port
        .clone()
        .or_else(|| {
            if target.demo {
                Some(SIMULATED_CHANNEL.to_string())
            } else {
                config.serial.port.clone()
            }
        })
        .or_else(|| session.list_channels().into_iter().next());
    let Some(port) = port else {
        return Err(CliResult::port_not_found("no port given and none detected"));
    };
    let baud = target.baud.unwrap_or(config.serial.baud_rate);
    if !STANDARD_BAUD_RATES.contains(&baud) {
        warn!("{} is not a standard baud rate", baud);
    }

    info!("Connecting to {} @ {} baud", port, baud);
    session.connect(&port, baud)?;
    Ok(session)
}

fn print_entry(cli: &Cli, entry: &LogEntry) {
    println!("{}", render_entry(entry, cli.format, cli.timestamps));
}

fn print_transaction(cli: &Cli, transaction: &Transaction) {
    for entry in transaction.entries() {
        print_entry(cli, &entry);
    }
}

async fn send(
    cli: &Cli,
    config: &AppConfig,
    target: &TargetArgs,
    commands: &[String],
) -> anyhow::Result<CliResult> {
    let session = match open_session(target, config) {
        Ok(session) => session,
        Err(result) => return Ok(result),
    };
    let handle = SessionHandle::new(session);

    let mut sent = 0usize;
    let mut failed = 0usize;

    if commands.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("reading stdin")? {
            if line.trim().is_empty() {
                continue;
            }
            let transaction = handle.send(line).await;
            print_transaction(cli, &transaction);
            sent += 1;
            failed += usize::from(transaction.is_failure());
        }
    } else {
        for command in commands {
            let transaction = handle.send(command.as_str()).await;
            print_transaction(cli, &transaction);
            sent += 1;
            failed += usize::from(transaction.is_failure());
        }
    }

    if failed > 0 {
        return Ok(CliResult::error(
            ExitCodes::COMMAND_FAILED,
            format!("{failed} of {sent} commands failed"),
        ));
    }
    Ok(CliResult::success())
}

async fn run_file(
    cli: &Cli,
    config: &AppConfig,
    target: &TargetArgs,
    file: &Path,
    delay: Option<u64>,
) -> anyhow::Result<CliResult> {
    let session = match open_session(target, config) {
        Ok(session) => session,
        Err(result) => return Ok(result),
    };
    let handle = SessionHandle::new(session);

    let job = BatchJob::new(file, delay.unwrap_or(config.batch.delay_ms));
    let cancel = job.cancel_flag();
    ctrlc::set_handler(move || cancel.cancel()).context("installing Ctrl+C handler")?;

    let mut run = handle.run_batch(job);
    let mut file_error = None;

    while let Some(event) = run.events.recv().await {
        if let BatchEvent::FileError { kind, reason } = &event {
            file_error = Some(CliResult::file_access(*kind, reason.clone()));
        }
        print_entry(cli, &event.to_entry());
    }

    let status = match run.join.await {
        Ok(status) => status,
        Err(e) => {
            return Ok(CliResult::error(
                ExitCodes::INTERNAL_ERROR,
                format!("Batch worker failed: {e}"),
            ))
        }
    };
    Ok(file_error.unwrap_or_else(|| CliResult::from(status)))
}

fn parse_file(cli: &Cli, file: &Path) -> anyhow::Result<CliResult> {
    let commands = match batch::load_commands(file) {
        Ok(commands) => commands,
        Err(e) => return Ok(e.into()),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&commands)?),
        OutputFormat::Text => {
            for (i, command) in commands.iter().enumerate() {
                println!("{:>4}  {}", i + 1, command);
            }
        }
    }

    Ok(CliResult::success_with_message(format!("{} commands", commands.len())))
}

async fn emulate(port: &str, baud: u32, wait_ms: u64) -> anyhow::Result<CliResult> {
    let mut serial = match serialport::new(port, baud).timeout(EMULATOR_POLL).open() {
        Ok(serial) => serial,
        Err(e) => {
            return Ok(CliResult::error(
                ExitCodes::CONNECTION_FAILED,
                format!("Failed to open {port}: {e}"),
            ))
        }
    };
    info!("Emulating modem on {} @ {} baud. Press Ctrl+C to stop.", port, baud);

    let stop = CancelFlag::new();
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.cancel()).context("installing Ctrl+C handler")?;

    let mut emulator = ModemEmulator::new(Duration::from_millis(wait_ms));
    tokio::task::spawn_blocking(move || emulator.serve(serial.as_mut(), &stop))
        .await
        .context("emulator worker failed")??;

    Ok(CliResult::success())
}

fn show_config(cli: &Cli, config: &AppConfig, write: bool) -> anyhow::Result<CliResult> {
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml()?),
    }

    if !write {
        return Ok(CliResult::success());
    }

    let path = match &cli.config {
        Some(path) => {
            config.save_to(path)?;
            path.clone()
        }
        None => config.save()?,
    };
    Ok(CliResult::success_with_message(format!(
        "Wrote {}",
        path.display()
    )))
}
