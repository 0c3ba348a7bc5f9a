//! Tilt-to-pitch mapping and sensor acquisition pacing.
//!
//! The accelerometer X axis selects a continuous note index:
//!
//! ```text
//! note_index = clamp(6.5 + x / 4096 * 6.0, 0, 12)
//! ```
//!
//! `4096` is the sensor's counts per g in 14-bit, ±2 g mode, so ±1 g of
//! tilt spans ±6 notes around the centre of the 13-note table. A sensor
//! with a different full-scale range needs a different [`COUNTS_PER_G`].

use crate::config::SensorReadyStrategy;
use crate::tables::MAX_NOTE_INDEX;

/// Note index at zero tilt (middle of the 13-note table).
pub const NOTE_CENTER: f32 = 6.5;

/// Notes covered by one g of tilt in each direction.
pub const NOTES_PER_G: f32 = 6.0;

/// Axis counts per g (14-bit samples, ±2 g range).
pub const COUNTS_PER_G: f32 = 4096.0;

/// Number of low-order status bits below a left-justified 14-bit sample.
pub const AXIS_SHIFT: u32 = 2;

/// Tick count between sensor reads with [`SensorReadyStrategy::Periodic`].
pub const DEFAULT_POLL_PERIOD_TICKS: u32 = 50;

/// Map a signed axis sample to a note index in `[0, 12]`.
///
/// Pure function; no hidden state.
pub fn note_index_from_tilt(x: i16) -> f32 {
    (NOTE_CENTER + f32::from(x) / COUNTS_PER_G * NOTES_PER_G).clamp(0.0, MAX_NOTE_INDEX)
}

/// Assemble a signed axis sample from the sensor's MSB/LSB register pair.
///
/// The 14-bit value is left-justified; the arithmetic shift keeps the sign.
pub fn axis_from_bytes(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb]) >> AXIS_SHIFT
}

/// Tick counter raising the sensor-ready condition every `period` ticks.
#[derive(Debug, Clone)]
pub struct SensorPoll {
    count: u32,
    period: u32,
}

impl SensorPoll {
    /// A period of zero is treated as one (ready every tick).
    pub const fn new(period_ticks: u32) -> Self {
        Self {
            count: 0,
            period: if period_ticks == 0 { 1 } else { period_ticks },
        }
    }

    /// Poll counter for a strategy, or `None` when the sensor's own
    /// interrupt line paces acquisition.
    pub fn for_strategy(strategy: SensorReadyStrategy) -> Option<Self> {
        match strategy {
            SensorReadyStrategy::EdgeTriggered => None,
            SensorReadyStrategy::Periodic { period_ticks } => Some(Self::new(period_ticks)),
        }
    }

    /// Advance by one tick. Returns `true` when the period elapsed; the
    /// counter restarts from zero.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.period {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

impl Default for SensorPoll {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_PERIOD_TICKS)
    }
}
