//! nestkv Console
//!
//! Reads commands from stdin, one per line, and prints their results.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use nestkv::{BackendKind, Config, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// nestkv Console
#[derive(Parser, Debug)]
#[command(name = "nestkv")]
#[command(about = "Line-oriented key-value store with nested transactions")]
#[command(version)]
struct Args {
    /// Storage backend
    #[arg(short, long, value_enum, default_value_t = Backend::Memory)]
    database: Backend,

    /// Remote store address (host:port), used with --database remote
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    remote: String,

    /// Connect timeout in milliseconds (0 = none)
    #[arg(long, default_value = "2000")]
    connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Do not print the prompt
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Memory,
    Remote,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Memory => BackendKind::Memory,
            Backend::Remote => BackendKind::Remote,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .backend(args.database.into())
        .remote_addr(&args.remote)
        .connect_timeout_ms(args.connect_timeout_ms)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    let session = match Session::open(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open {} session: {}", config.backend, e);
            return ExitCode::FAILURE;
        }
    };

    match run(&session, args.quiet) {
        Ok(()) => {
            session.close();
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Console error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(session: &Session, quiet: bool) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut lines = stdin.lock().lines();

    if !quiet {
        writeln!(stdout, "Enter commands (type 'END' to exit):")?;
    }

    while session.is_running() {
        if !quiet {
            write!(stdout, "> ")?;
            stdout.flush()?;
        }

        // EOF ends the session like END
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        match session.execute(&line) {
            Ok(outputs) => {
                for output in outputs {
                    writeln!(stdout, "{}", output)?;
                }
            }
            // Backend failures are reported and the session continues
            Err(e) => {
                tracing::error!("{}", e);
                writeln!(stdout, "ERROR: {}", e)?;
            }
        }
    }

    Ok(())
}
