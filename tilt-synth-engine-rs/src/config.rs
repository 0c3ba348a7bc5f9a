//! Compile-time configuration for the synthesizer firmware.
//!
//! Like the display geometry, every tunable lives in a plain struct with a
//! [`Default`] that reproduces the reference behaviour; there are no
//! scattered module-level tunables.

/// How the control loop learns that a new sensor sample is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorReadyStrategy {
    /// The sensor's interrupt line raises the ready flag.
    EdgeTriggered,
    /// The synthesis tick raises the ready flag every `period_ticks` ticks.
    Periodic { period_ticks: u32 },
}

/// Button debounce timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceConfig {
    /// Number of line re-checks after the edge. Default: 2.
    pub rechecks: u8,
    /// Delay before each re-check in microseconds. Default: 5000.
    pub recheck_delay_us: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            rechecks: 2,
            recheck_delay_us: 5_000,
        }
    }
}

/// Resolution of the timer that paces the synthesis tick (1 MHz).
pub const TIMER_TICK_HZ: u64 = 1_000_000;

/// Top-level synthesizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SynthConfig {
    /// Requested synthesis tick rate in Hz. Every other tick produces a
    /// sample. The timer runs at [`delivered_tick_rate_hz`](Self::delivered_tick_rate_hz).
    /// Default: 32000.
    pub tick_rate_hz: u32,
    /// Sensor acquisition strategy. Default: edge-triggered.
    pub sensor_ready: SensorReadyStrategy,
    pub debounce: DebounceConfig,
    /// Pause between control-loop iterations in milliseconds. Default: 10.
    pub control_period_ms: u32,
    /// Upper bound for a single sensor or display transaction. Default: 50.
    pub transport_timeout_ms: u32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 32_000,
            sensor_ready: SensorReadyStrategy::EdgeTriggered,
            debounce: DebounceConfig::default(),
            control_period_ms: 10,
            transport_timeout_ms: 50,
        }
    }
}

impl SynthConfig {
    /// Tick period in whole timer ticks (microseconds), truncated and never
    /// zero. This is the period the tick source actually runs at.
    pub fn tick_period_us(&self) -> u64 {
        (TIMER_TICK_HZ / u64::from(self.tick_rate_hz.max(1))).max(1)
    }

    /// Tick rate delivered by a timer running at [`tick_period_us`].
    ///
    /// Differs from `tick_rate_hz` when the period does not divide one
    /// second exactly; pitch must be computed from this value.
    ///
    /// [`tick_period_us`]: Self::tick_period_us
    pub fn delivered_tick_rate_hz(&self) -> f32 {
        TIMER_TICK_HZ as f32 / self.tick_period_us() as f32
    }

    /// Rate at which output codes are produced.
    pub fn sample_rate_hz(&self) -> f32 {
        self.delivered_tick_rate_hz() / crate::dds::TICKS_PER_SAMPLE as f32
    }
}
