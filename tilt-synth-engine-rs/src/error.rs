//! Error types for the control loop.

use core::fmt;

/// A collaborator fault observed by the control loop.
///
/// All variants are recoverable: the loop records the fault and carries on
/// with the next iteration. Nothing here ever reaches the synthesis tick.
#[derive(Debug)]
pub enum ControlError<S, D, L> {
    /// Sensor transport failure.
    Sensor(S),
    /// Display failure.
    Display(D),
    /// Slider read failure.
    Slider(L),
}

impl<S: fmt::Debug, D: fmt::Debug, L: fmt::Debug> fmt::Display for ControlError<S, D, L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlError::Sensor(e) => write!(f, "sensor error: {:?}", e),
            ControlError::Display(e) => write!(f, "display error: {:?}", e),
            ControlError::Slider(e) => write!(f, "slider error: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<S: defmt::Format, D: defmt::Format, L: defmt::Format> defmt::Format
    for ControlError<S, D, L>
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            ControlError::Sensor(e) => defmt::write!(f, "sensor error: {}", e),
            ControlError::Display(e) => defmt::write!(f, "display error: {}", e),
            ControlError::Slider(e) => defmt::write!(f, "slider error: {}", e),
        }
    }
}
