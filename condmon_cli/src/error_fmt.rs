//! Human-readable error descriptions and structured JSON error formatting.

use condmon_core::error::{BuildError, MonitorError};

/// Map an eyre::Report to a human-readable explanation naming the failing
/// collaborator, with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the override flags, then rerun."
            ),
            other => format!(
                "What happened: The acquisition loop could not be assembled ({other}).\nLikely causes: A collaborator failed to initialize.\nHow to fix: Re-run with --log-level=debug to see which one."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Instrument(msg) => format!(
                "What happened: The instrument failed ({msg}).\nLikely causes: Device disconnected, already closed, or rejected the acquisition settings.\nHow to fix: Check the connection and [signal] settings, then start a new run."
            ),
            MonitorError::Persistence(msg) => format!(
                "What happened: The persistence sink could not write results ({msg}).\nLikely causes: Output directory missing, read-only, or the CSV is open in another program.\nHow to fix: Check paths.output_dir (or --output-dir) and close other programs holding the file."
            ),
            MonitorError::Config(msg) => format!(
                "What happened: The configuration is invalid ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            MonitorError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: Internal sequencing error.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("invalid configuration") || lower.contains("read config") {
        return "What happened: Configuration could not be loaded.\nLikely causes: Wrong --config path or a TOML syntax error.\nHow to fix: Fix the file and try again.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::Instrument(_)) => "Instrument",
        Some(MonitorError::Persistence(_)) => "Persistence",
        Some(MonitorError::Config(_)) => "Config",
        Some(MonitorError::State(_)) | None => "Error",
    }
}

/// Stable exit codes: 2 config/usage, 3 instrument, 4 persistence, 1 otherwise.
/// Interrupts exit with 1 without going through here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "Instrument" => 3,
        "Persistence" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
