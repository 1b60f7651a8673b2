//! Semantics - media file routing
//!
//! Entry point: loads configuration, discovers modules once, then routes the
//! command line to a bundled module or a sibling module executable.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use tracing::{debug, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use semantics::app::App;
use semantics::config::{Config, LoggingConfig};
use semantics::error::SemanticsError;
use semantics::routing::args::{take_config, wants_verbose};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

/// Run one invocation and return its exit status.
///
/// The log guard is dropped on return, before the process exits, so the
/// file writer flushes every buffered line.
async fn run() -> i32 {
    let mut args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let config_path = take_config(&mut args).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => return report(&e),
    };

    let _guard = match setup_logging(wants_verbose(&args), &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    let app = App::new(config);
    let mut stdout = std::io::stdout();
    let code = match app.run(&args, &mut stdout).await {
        Ok(code) => code,
        Err(e) => report(&e),
    };
    debug!("Exiting with status {}", code);
    code
}

/// Print a user-facing error and return its exit status
fn report(err: &SemanticsError) -> i32 {
    match err {
        // Already formatted by clap
        SemanticsError::InvalidArguments(message) => eprint!("{}", message),
        SemanticsError::Interrupted => eprintln!("\nAborted!"),
        _ => eprintln!("Error: {}", err),
    }
    err.exit_code()
}

/// Setup logging to stderr and, when configured, to a daily rolling file
fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let log_level = if verbose {
        Level::DEBUG
    } else {
        Level::from_str(&logging.level)
            .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", logging.level))?
    };

    // Console layer on stderr; stdout carries module output
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Optional file layer with daily rotation, no ANSI colors
    let (file_layer, guard) = if logging.file {
        std::fs::create_dir_all(&logging.directory)?;
        let file_appender = rolling::daily(&logging.directory, "semantics.log");
        let (non_blocking_file, guard) = non_blocking(file_appender);
        let layer = fmt::layer()
            .with_writer(non_blocking_file)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!(
        "Logging initialized - level: {}, file: {}",
        log_level,
        if logging.file {
            logging.directory.join("semantics.log").display().to_string()
        } else {
            "disabled".to_string()
        }
    );

    Ok(guard)
}
