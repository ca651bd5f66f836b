use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use perfmap_attach_core::attacher::create_attacher;
use perfmap_attach_core::error::{AttachError, Result as AttachResult};
use perfmap_attach_core::loader::{load_agent, LoadOutcome};
use perfmap_attach_core::platform::hotspot::AttachConfig;
use perfmap_attach_core::types::{AgentLibrary, ProcessId};
use perfmap_attach_utils::{info, init_logging, init_logging_with_level, log_format_from_env, LogLevel, LoggingError};

/// Attach once to a running JVM and load the perf map agent.
#[derive(Parser, Debug)]
#[command(name = "perfmap-attach")]
#[command(version)]
#[command(
    about = "Attach once to a running JVM and load liblo2s-perfmap.so from the working directory",
    long_about = None
)]
struct Cli
{
    /// Process ID (PID) of the target JVM
    pid: String,

    /// Directory holding the agent library (default: current directory)
    library_dir: Option<PathBuf>,

    /// Milliseconds to wait for the attach listener, also used as socket timeout
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main()
{
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match run(&cli) {
        Ok(outcome) => info!(?outcome, "done"),
        Err(e @ AttachError::LibraryMissing { .. }) => {
            // Reported on stdout for whoever launched us
            println!("{}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn setup_logging(level: Option<&str>) -> Result<(), LoggingError>
{
    // Reads RUST_LOG / PERFMAP_ATTACH_LOG_FORMAT unless a level was given
    match level {
        Some(raw) => {
            let level = raw.parse::<LogLevel>().map_err(LoggingError::InvalidLevel)?;
            init_logging_with_level(level, log_format_from_env()?)
        }
        None => init_logging(),
    }
}

fn run(cli: &Cli) -> AttachResult<LoadOutcome>
{
    let pid: ProcessId = cli.pid.parse()?;

    let mut library = AgentLibrary::perfmap();
    if let Some(dir) = &cli.library_dir {
        library = library.in_dir(dir);
    }

    let config = AttachConfig::default().with_timeout(Duration::from_millis(cli.timeout_ms));
    let attacher = create_attacher(config)?;

    info!(%pid, "loading perf map agent");
    load_agent(&attacher, pid, &library)
}
