mod cli;
mod error_fmt;
mod run;

use std::path::Path;

use clap::Parser;
use condmon_config::Config;
use condmon_core::error::MonitorError;
use eyre::Result;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match real_main(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            std::process::exit(exit_code_for_error(&e));
        }
    }
}

fn real_main(cli: Cli) -> Result<i32> {
    let cfg = load_config(&cli)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(?cfg, "effective configuration");

    match cli.cmd {
        Commands::Run { bursts, pace } => run::run(&cfg, bursts, pace, cli.json),
        Commands::LogSnapshot => run::log_snapshot(&cfg, cli.json),
        Commands::SelfCheck => run::self_check(&cfg),
    }
}

/// File (or defaults) with the debug profile filling unset values, then
/// explicit overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let as_config_err = |e: eyre::Report| MonitorError::Config(format!("{e:#}"));
    let mut cfg = match &cli.config {
        Some(path) => condmon_config::load_file_with(path, cli.debug).map_err(as_config_err)?,
        None => {
            let mut cfg = Config::default();
            if cli.debug {
                cfg.apply_debug_profile();
            }
            cfg
        }
    };
    if let Some(dir) = &cli.output_dir {
        cfg.paths.output_dir = dir.clone();
    }
    if let Some(file) = &cli.log_file {
        cfg.paths.log_file = file.clone();
    }
    if let Some(ms) = cli.rate_ms {
        cfg.acquisition.measurement_rate_ms = ms;
    }
    if cli.no_save {
        cfg.output.enabled = false;
    }
    cfg.validate().map_err(as_config_err)?;
    Ok(cfg)
}

fn init_tracing(json: bool, cli_level: Option<&str>, logging: &condmon_config::Logging) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Optional JSON-lines file layer
    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or(path.as_os_str());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_ansi(false).with_writer(writer)
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
}
