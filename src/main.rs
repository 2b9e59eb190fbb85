// SPDX-License-Identifier: MIT
//
// kilo — a minimal terminal file viewer.
//
// This is the main binary that wires the two crates together:
//
//   kilo-term   → raw mode, key decoding, window size, frame output
//   kilo-editor → document, viewport, frame composition, the frame loop
//
// Startup order matters. Everything that can fail on bad input (arguments,
// options, loading the file, opening the log) happens while the terminal
// is still canonical, so those errors print normally. Only then is raw
// mode entered, scoped around the frame loop, and any error from inside
// it is printed after the terminal has been restored.
//
//   args → options → document → log → raw mode { size → session.run } → exit

use std::env;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use kilo_editor::options::Options;
use kilo_editor::{Document, Session};
use kilo_term::io::Stdio;
use kilo_term::terminal::{TerminalMode, is_tty};
use kilo_term::window::query_size;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Set to an `EnvFilter` directive (e.g. `debug`) to enable logging.
const LOG_ENV: &str = "KILO_LOG";

/// Log file path; defaults to `kilo.log` in the working directory.
const LOG_FILE_ENV: &str = "KILO_LOG_FILE";

const USAGE: &str = "usage: kilo [--set name=value]... [FILE]";

// ─── Command line ───────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    options: Options,
    path: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, Box<dyn Error>> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--set" => {
                let directive = args.next().ok_or("--set needs a name=value argument")?;
                parsed.options.set(&directive)?;
            }
            other => {
                if let Some(directive) = other.strip_prefix("--set=") {
                    parsed.options.set(directive)?;
                } else if other.starts_with('-') && other != "-" {
                    return Err(format!("unknown flag: {other}").into());
                } else if parsed.path.is_some() {
                    return Err(format!("unexpected argument: {other}").into());
                } else {
                    parsed.path = Some(PathBuf::from(other));
                }
            }
        }
    }
    Ok(parsed)
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Log to a file when `KILO_LOG` is set. The terminal is the user's screen,
/// so nothing is ever logged to stdout or stderr.
fn init_logging() -> Result<(), Box<dyn Error>> {
    let Ok(directive) = env::var(LOG_ENV) else {
        return Ok(());
    };
    let path = env::var_os(LOG_FILE_ENV).map_or_else(|| PathBuf::from("kilo.log"), PathBuf::from);
    let file = File::create(&path).map_err(|e| format!("{}: {e}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run() -> Result<(), Box<dyn Error>> {
    let args = parse_args(env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let doc = match &args.path {
        Some(path) => Document::open(path, args.options.tabstop)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => Document::with_tab_stop(args.options.tabstop),
    };

    init_logging()?;
    info!(path = ?args.path, lines = doc.len(), tabstop = args.options.tabstop, "starting");

    if !is_tty() {
        return Err("standard input is not a terminal".into());
    }

    let mut terminal = TerminalMode::new()?;
    terminal.with_raw_mode(|_| {
        let mut io = Stdio;
        let size = query_size(&mut io)?;
        Session::new(doc, size).run(&mut io)
    })?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("kilo: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
