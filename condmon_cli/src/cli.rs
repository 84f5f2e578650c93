//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "condmon", version, about = "Conductivity monitor CLI")]
pub struct Cli {
    /// Path to config TOML; built-in bench defaults when omitted
    #[arg(long, value_name = "FILE", env = "CONDMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Local testing profile: no CSV output, process log in the working
    /// directory, 2 s cadence
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Directory receiving the results CSV
    #[arg(long, global = true, value_name = "DIR", env = "CONDMON_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Process log written by the dosing application
    #[arg(long, global = true, value_name = "FILE", env = "CONDMON_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Override acquisition.measurement_rate_ms
    #[arg(long, global = true, value_name = "MS")]
    pub rate_ms: Option<u64>,

    /// Do not write the results CSV
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub no_save: bool,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire continuously and persist validated measurements until interrupted
    Run {
        /// Stop after this many bursts
        #[arg(long, value_name = "N")]
        bursts: Option<u64>,
        /// Sleep for the real duration of each simulated burst
        #[arg(long, action = ArgAction::SetTrue)]
        pace: bool,
    },
    /// Print the current process-log snapshot
    LogSnapshot,
    /// Read one burst and the process log, then exit
    SelfCheck,
}
