use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{Level, info, warn};

mod host;
mod machine;

use host::comm::CommConfig;
use host::logging;
use host::scanner::{StallMonitor, spawn_scanner};
use machine::m68::System;

/// SORD M68 Keyboard Matrix Emulator
/// Lets the M68 scan a period keyboard whose keys are actually modern key
/// events arriving over a byte transport
#[derive(Parser)]
#[command(name = "m68kb")]
#[command(about = "A SORD M68 keyboard matrix emulator")]
struct Args {
    /// Read key events from a named pipe
    #[arg(long, value_name = "PIPE")]
    pipe: Option<PathBuf>,

    /// Execute a command and read key events from its stdout
    #[arg(long, value_name = "COMMAND")]
    exec: Option<String>,

    /// Execute a command and read key events from its pty
    #[cfg(feature = "pty")]
    #[arg(long = "exec-pty", value_name = "COMMAND")]
    exec_pty: Option<String>,

    /// Column select period of the simulated strobe, in microseconds
    #[arg(long, default_value_t = 15)]
    scan_period_us: u64,

    /// Write logs to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    if let Some(path) = &args.log_file {
        logging::setup_logging_file(level, path)?;
    } else {
        logging::setup_logging_stdio(level);
    }

    info!("M68 keyboard emulator starting...");

    #[cfg(feature = "pty")]
    let exec_pty = args.exec_pty;
    #[cfg(not(feature = "pty"))]
    let exec_pty = None;
    let config = CommConfig::from_args(args.pipe, args.exec, exec_pty);

    let mut system = System::new(config)?;
    let scanner = spawn_scanner(
        system.reader(),
        Duration::from_micros(args.scan_period_us),
    );

    let start_time = Instant::now();
    let mut monitor = StallMonitor::new(start_time);

    // ============ main loop ============
    loop {
        if !system.tick() {
            // Transport closed and every buffered byte applied.
            break;
        }
        if let Some(stalled) = monitor.observe(scanner.sweeps(), Instant::now()) {
            warn!("no strobe activity for {:?}", stalled);
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let elapsed = start_time.elapsed();
    info!("Transport closed, shutting down:");
    info!("  Key events applied: {}", system.events_applied());
    info!("  Matrix sweeps: {}", scanner.sweeps());
    info!("  Time elapsed: {:?}", elapsed);

    Ok(())
}
