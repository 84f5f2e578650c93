//! Maps `Box<dyn Error>` from the instrument boundary to typed `MonitorError`.
//!
//! With the `hardware-errors` feature, `condmon_hardware::HwError` is
//! downcast so a closed device reads distinctly in reports.

use crate::error::MonitorError;

pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> MonitorError {
    #[cfg(feature = "hardware-errors")]
    {
        use condmon_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Closed => MonitorError::Instrument("device already closed".into()),
                HwError::Setup(msg) => MonitorError::Instrument(format!("setup rejected: {msg}")),
            };
        }
    }

    MonitorError::Instrument(e.to_string())
}
