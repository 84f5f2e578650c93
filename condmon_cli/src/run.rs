//! Command execution: config mapping, collaborator assembly, and the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use condmon_config::Config;
use condmon_core::error::{MonitorError, Result};
use condmon_core::plot::trace_frame;
use condmon_core::sink::output_path;
use condmon_core::{
    AcquisitionController, CsvSink, LogSnapshot, MeasurementSink, NullSink, PlotWorker,
    ProcessLogReader, RunSummary, StatsWindow, WindowCfg,
};
use condmon_hardware::{SimulatedCell, SimulatedInstrument};
use condmon_traits::{Clock, Instrument, SystemClock};
use eyre::WrapErr;

fn open_instrument(cfg: &Config) -> Result<SimulatedInstrument> {
    let cell = SimulatedCell {
        amplitude_uv_pp: cfg.signal.amplitude_uv_pp,
        frequency_hz: cfg.signal.frequency_hz,
        output_impedance_ohm: cfg.signal.output_impedance_ohm,
        ..SimulatedCell::default()
    };
    let dev = SimulatedInstrument::new(cell, cfg.signal.samples, cfg.signal.time_interval_ns)
        .map_err(|e| MonitorError::Instrument(e.to_string()))?;
    Ok(dev)
}

fn process_log(cfg: &Config) -> ProcessLogReader {
    ProcessLogReader::new(&cfg.paths.log_file, cfg.thresholds.staleness_minutes)
}

/// Run the acquisition loop. Returns the process exit code.
pub fn run(cfg: &Config, bursts: Option<u64>, pace: bool, json: bool) -> Result<i32> {
    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupt);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .wrap_err("install interrupt handler")?;
    }

    let instrument = open_instrument(cfg)?.paced(pace);
    let started = SystemClock::new().now();
    let sink: Box<dyn MeasurementSink> = if cfg.output.enabled {
        Box::new(CsvSink::create(output_path(&cfg.paths.output_dir, started))?)
    } else {
        tracing::info!("output disabled; measurements are not persisted");
        Box::new(NullSink)
    };
    let (plot, worker) = PlotWorker::spawn(trace_frame);

    let mut controller = AcquisitionController::builder()
        .with_instrument(instrument)
        .with_plot(plot)
        .with_boxed_sink(sink)
        .with_process_log(process_log(cfg))
        .with_window(cfg.into())
        .with_compensation(cfg.into())
        .with_gate((&cfg.thresholds).into())
        .with_cadence(cfg.into())
        .build()?;
    tracing::info!(
        log_file = %cfg.paths.log_file.display(),
        rate_ms = cfg.acquisition.measurement_rate_ms,
        "run start"
    );

    let result = controller.run(&interrupt, bursts);
    drop(controller);
    let frames = worker.join();
    tracing::debug!(frames, "plot worker joined");

    let summary = result?;
    print_summary(&summary, json);
    Ok(i32::from(summary.interrupted))
}

fn print_summary(s: &RunSummary, json: bool) {
    if json {
        let obj = serde_json::json!({
            "bursts": s.bursts,
            "attempts": s.attempts,
            "persisted": s.persisted,
            "rejected": s.rejected,
            "discarded": s.discarded,
            "interrupted": s.interrupted,
        });
        println!("{obj}");
    } else {
        println!(
            "run {}: {} bursts, {} attempts, persisted {}, rejected {}, discarded {}",
            if s.interrupted { "interrupted" } else { "complete" },
            s.bursts,
            s.attempts,
            s.persisted,
            s.rejected,
            s.discarded
        );
    }
}

/// Print the latest process-log snapshot. Exit code 1 when it is invalid.
pub fn log_snapshot(cfg: &Config, json: bool) -> Result<i32> {
    let reader = process_log(cfg);
    let snap = reader.read_latest(SystemClock::new().now());
    match (&snap, json) {
        (LogSnapshot::Valid(v), true) => println!(
            "{}",
            serde_json::json!({
                "valid": true,
                "concentration": v.concentration,
                "target_concentration": v.target_concentration,
                "volume": v.volume,
                "temperature": v.temperature,
            })
        ),
        (LogSnapshot::Valid(v), false) => println!(
            "concentration {} (target {}), volume {} mL, temperature {} C",
            v.concentration, v.target_concentration, v.volume, v.temperature
        ),
        (LogSnapshot::Invalid(reason), true) => println!(
            "{}",
            serde_json::json!({ "valid": false, "reason": reason.to_string() })
        ),
        (LogSnapshot::Invalid(reason), false) => {
            println!("invalid: {reason} ({})", reader.path().display());
        }
    }
    Ok(if snap.is_valid() { 0 } else { 1 })
}

/// One burst through a fresh window, then the process log.
pub fn self_check(cfg: &Config) -> Result<i32> {
    let mut dev = open_instrument(cfg)?;
    let burst = dev
        .get_data()
        .map_err(|e| MonitorError::Instrument(e.to_string()))?;
    let _ = dev.close();

    let mut window = StatsWindow::new(WindowCfg::from(cfg))?;
    if !window.add_sample(&burst.channel_a, &burst.channel_b) {
        return Err(MonitorError::Instrument("instrument returned an empty burst".into()).into());
    }
    let stats = window.stats();
    println!(
        "instrument ok: {} samples, {:.3} ms, V2 {:.3} mV, I {:.5} mA",
        burst.channel_a.len(),
        burst.elapsed_ms(),
        stats.voltage_mean,
        stats.current_mean
    );

    match process_log(cfg).read_latest(SystemClock::new().now()) {
        LogSnapshot::Valid(v) => println!(
            "process log ok: concentration {}, volume {} mL",
            v.concentration, v.volume
        ),
        LogSnapshot::Invalid(reason) => println!("process log unavailable: {reason}"),
    }
    Ok(0)
}
