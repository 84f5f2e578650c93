//! One-way, fire-and-forget hand-off of raw bursts to a display worker.
//!
//! The acquisition loop never waits on the display: messages go through an
//! unbounded channel and send failures (display gone) are ignored. The worker
//! thread exits on `PlotMsg::Finished` or when every sender is dropped, and
//! is joined when the `PlotWorker` is dropped.
use condmon_traits::{Burst, PlotSink};
use crossbeam_channel as xch;

#[derive(Debug, Clone, PartialEq)]
pub enum PlotMsg {
    Frame(Burst),
    Finished,
}

/// Sending half, owned by the controller.
#[derive(Debug, Clone)]
pub struct PlotChannel {
    tx: xch::Sender<PlotMsg>,
}

impl PlotChannel {
    /// Channel plus the receiving end, for callers that drive their own display.
    pub fn unbounded() -> (Self, xch::Receiver<PlotMsg>) {
        let (tx, rx) = xch::unbounded();
        (Self { tx }, rx)
    }
}

impl PlotSink for PlotChannel {
    fn update_data(&mut self, burst: Burst) {
        let _ = self.tx.send(PlotMsg::Frame(burst));
    }

    fn send_finished(&mut self) {
        let _ = self.tx.send(PlotMsg::Finished);
    }
}

/// Display-side thread consuming frames with a caller-supplied handler.
pub struct PlotWorker {
    join_handle: Option<std::thread::JoinHandle<u64>>,
}

impl PlotWorker {
    pub fn spawn<F>(mut on_frame: F) -> (PlotChannel, Self)
    where
        F: FnMut(&Burst) + Send + 'static,
    {
        let (channel, rx) = PlotChannel::unbounded();
        let join_handle = std::thread::spawn(move || {
            let mut frames = 0u64;
            for msg in rx {
                match msg {
                    PlotMsg::Frame(burst) => {
                        frames += 1;
                        on_frame(&burst);
                    }
                    PlotMsg::Finished => {
                        tracing::debug!(frames, "plot worker finished");
                        break;
                    }
                }
            }
            frames
        });
        (
            channel,
            Self {
                join_handle: Some(join_handle),
            },
        )
    }

    /// Wait for the worker to drain and return how many frames it handled.
    pub fn join(mut self) -> u64 {
        self.join_inner().unwrap_or(0)
    }

    fn join_inner(&mut self) -> Option<u64> {
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(frames) => Some(frames),
            Err(e) => {
                tracing::warn!(?e, "plot worker panicked");
                None
            }
        }
    }
}

impl Drop for PlotWorker {
    fn drop(&mut self) {
        let _ = self.join_inner();
    }
}

/// Handler that traces a one-line summary of each frame.
pub fn trace_frame(burst: &Burst) {
    let span = |x: &[f64]| {
        x.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    };
    let (a_lo, a_hi) = span(&burst.channel_a);
    let (b_lo, b_hi) = span(&burst.channel_b);
    tracing::trace!(
        samples = burst.channel_a.len(),
        t_end_ms = burst.time_ms.last().copied().unwrap_or_default(),
        a_lo,
        a_hi,
        b_lo,
        b_hi,
        "plot frame"
    );
}
