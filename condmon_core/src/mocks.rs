//! Test and helper collaborators for driving the controller without hardware.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use condmon_traits::{Burst, Instrument, PlotSink};

use crate::error::MonitorError;
use crate::measurement::Measurement;
use crate::sink::MeasurementSink;

/// Instrument that replays scripted bursts, then repeats the last one.
/// An empty script fails every read.
#[derive(Debug, Default)]
pub struct ScriptedInstrument {
    script: VecDeque<Burst>,
    last: Option<Burst>,
    pub closed: Rc<RefCell<bool>>,
}

impl ScriptedInstrument {
    pub fn new(script: impl IntoIterator<Item = Burst>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Repeats one burst forever.
    pub fn constant(burst: Burst) -> Self {
        Self::new([burst])
    }
}

impl Instrument for ScriptedInstrument {
    fn get_data(&mut self) -> Result<Burst, Box<dyn std::error::Error + Send + Sync>> {
        if *self.closed.borrow() {
            return Err("scripted instrument closed".into());
        }
        if let Some(b) = self.script.pop_front() {
            self.last = Some(b.clone());
            return Ok(b);
        }
        self.last
            .clone()
            .ok_or_else(|| "scripted instrument has no bursts".into())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}

/// Plot sink counting frames and the finished sentinel.
#[derive(Debug, Default, Clone)]
pub struct CountingPlot {
    pub frames: Rc<RefCell<u64>>,
    pub finished: Rc<RefCell<bool>>,
}

impl PlotSink for CountingPlot {
    fn update_data(&mut self, _burst: Burst) {
        *self.frames.borrow_mut() += 1;
    }

    fn send_finished(&mut self) {
        *self.finished.borrow_mut() = true;
    }
}

/// In-memory sink; optionally fails every append.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub rows: Rc<RefCell<Vec<Measurement>>>,
    pub fail: bool,
}

impl MeasurementSink for MemorySink {
    fn append(&mut self, m: &Measurement) -> Result<(), MonitorError> {
        if self.fail {
            return Err(MonitorError::Persistence("memory sink refused row".into()));
        }
        self.rows.borrow_mut().push(m.clone());
        Ok(())
    }
}

/// Burst of `samples` points with constant-magnitude square waves, so the
/// RMS of each channel is exactly the given value.
pub fn square_burst(v_rms_mv: f64, b_rms_mv: f64, samples: usize, time_interval_ns: f64) -> Burst {
    let sign = |i: usize| if i % 2 == 0 { 1.0 } else { -1.0 };
    Burst {
        time_ms: (0..samples)
            .map(|i| i as f64 * time_interval_ns / 1_000_000.0)
            .collect(),
        channel_a: (0..samples).map(|i| v_rms_mv * sign(i)).collect(),
        channel_b: (0..samples).map(|i| b_rms_mv * sign(i)).collect(),
        time_interval_ns,
    }
}
