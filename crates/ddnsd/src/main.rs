// # ddnsd - Dynamic DNS Client Daemon
//
// Thin integration layer: all DDNS logic lives in ddns-core. The daemon is
// responsible for:
// 1. Parsing the command line
// 2. Loading and validating the YAML configuration
// 3. Initializing logging and the runtime
// 4. Wiring the OpenDNS IP source, the system resolver and the DynDNS
//    dispatcher into the engine
// 5. Stopping the engine on an operator command or a signal
//
// ## Configuration
//
// The configuration file (default `/etc/ddns.conf`, override with `-c` or
// `DDNS_CONFIG`) is YAML:
//
// ```yaml
// Domains:
//   - example.com
//   - home.example.org
// DdnsUrl: https://dyndns.example.net/nic/update?hostname=
// Username: user
// Password: secret
// Frequency: 300
// Debug: false
// Wildcard: false
// Timeout: 30
// ```
//
// ## Operator commands
//
// Type `exit`, `quit` or `q` on stdin to stop the daemon. SIGINT and
// SIGTERM do the same.

use anyhow::Result;
use clap::Parser;
use ddns_core::{DdnsConfig, DdnsEngine, SystemDomainResolver};
use ddns_ip_opendns::OpenDnsIpSource;
use ddns_provider_dyndns::DynDnsDispatcher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound for the engine to wind down after the shutdown signal
const ENGINE_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for the runtime to drop leftover blocking tasks (stdin reader)
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "ddnsd", version, about = "Polling dynamic DNS client")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "DDNS_CONFIG", default_value = "/etc/ddns.conf")]
    config: PathBuf,

    /// Debug override: -1 keeps the file's Debug value, 0 turns it off, anything else on
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    verbosity: i8,
}

/// Why the daemon is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    OperatorCommand,
    Signal(&'static str),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::OperatorCommand => write!(f, "operator command"),
            StopReason::Signal(name) => write!(f, "{}", name),
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::ConfigError.into()
            } else {
                DdnsExitCode::CleanShutdown.into()
            };
        }
    };

    // Load configuration
    let config = match DdnsConfig::load(&args.config) {
        Ok(cfg) => cfg.with_verbosity(args.verbosity),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = if config.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded from {}: {} domain(s), every {:?}",
        args.config.display(),
        config.domains.len(),
        config.frequency
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    // The stdin reader blocks a runtime thread until the next line arrives
    rt.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    result.into()
}

/// Run the daemon until an operator command or a signal
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ip_source = OpenDnsIpSource::new(config.timeout);
    let resolver = SystemDomainResolver::new(config.timeout);
    let dispatcher = DynDnsDispatcher::from_config(&config)?;

    let wildcard = config.wildcard;

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(resolver),
        Box::new(dispatcher),
        config,
    )?;

    for domain in engine.domains() {
        debug!("Managing domain: {}", domain);
    }
    if wildcard {
        debug!("Wildcard updates enabled");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(shutdown_rx).await });

    // Ends when the engine is dropped
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            trace!(?event, "engine event");
        }
    });

    info!("Ready; type 'exit', 'quit' or 'q' to stop");

    let reason = tokio::select! {
        reason = wait_for_stop() => reason?,
        joined = &mut engine_handle => {
            // The engine only returns after a shutdown request
            joined??;
            anyhow::bail!("Engine stopped unexpectedly");
        }
    };

    info!("Received stop request: {}", reason);
    info!("Shutting down daemon");

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(ENGINE_SHUTDOWN_TIMEOUT, engine_handle).await {
        Ok(joined) => joined??,
        Err(_) => anyhow::bail!("Engine did not stop within {:?}", ENGINE_SHUTDOWN_TIMEOUT),
    }

    Ok(())
}

/// Wait for the first of an operator quit command or a termination signal
async fn wait_for_stop() -> Result<StopReason> {
    tokio::select! {
        _ = wait_for_quit_command() => Ok(StopReason::OperatorCommand),
        signal = wait_for_shutdown_signal() => signal.map(StopReason::Signal),
    }
}

/// Read stdin line by line until a quit command
///
/// End of input or a read error never completes this future: the daemon
/// keeps running until a signal arrives.
async fn wait_for_quit_command() {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    while let Some(line) = lines.next().await {
        match line {
            Ok(line) if is_quit_command(&line) => return,
            Ok(line) => {
                if !line.trim().is_empty() {
                    debug!("Ignoring unknown command: {}", line.trim());
                }
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    debug!("stdin closed; waiting for a signal");
    std::future::pending::<()>().await
}

/// Whether an operator line asks the daemon to stop
fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit" | "q")
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
