pub mod clock;

pub use clock::{Clock, SystemClock};

/// One block-mode acquisition: both channel waveforms in mV plus timing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Burst {
    /// Per-sample time offsets in ms, relative to the first sample.
    pub time_ms: Vec<f64>,
    /// Channel A (measured cell voltage), mV.
    pub channel_a: Vec<f64>,
    /// Channel B (generator side of the output impedance), mV.
    pub channel_b: Vec<f64>,
    /// Sampling interval reported by the instrument for this burst, ns.
    pub time_interval_ns: f64,
}

impl Burst {
    /// Real time covered by this burst in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.time_interval_ns * self.channel_a.len() as f64 / 1_000_000.0
    }
}

pub trait Instrument {
    /// Block until the next burst is available.
    fn get_data(&mut self) -> Result<Burst, Box<dyn std::error::Error + Send + Sync>>;
    /// Release the device. Further reads are expected to fail.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Fire-and-forget display of raw bursts.
pub trait PlotSink {
    fn update_data(&mut self, burst: Burst);
    fn send_finished(&mut self);
}
