//! Everything the synthesis tick does, in one place.
//!
//! [`SynthTick`] pairs the [`DdsEngine`] with the poll counter of the
//! periodic sensor strategy. The engine is built for the tick rate the
//! timer actually delivers, not the requested one, so pitch stays exact when
//! the requested rate does not divide the timer clock.

use crate::config::SynthConfig;
use crate::dds::{DdsEngine, OutputSink};
use crate::events::{Event, PendingEvents};
use crate::state::SynthState;
use crate::tilt::SensorPoll;

/// Per-tick work of the high-priority context.
pub struct SynthTick {
    engine: DdsEngine,
    /// `None` when the sensor's interrupt line raises the ready flag.
    poll: Option<SensorPoll>,
}

impl SynthTick {
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            engine: DdsEngine::with_tick_rate(config.delivered_tick_rate_hz()),
            poll: SensorPoll::for_strategy(config.sensor_ready),
        }
    }

    pub fn engine(&self) -> &DdsEngine {
        &self.engine
    }

    /// Run one tick: maybe produce a sample, then advance the poll counter.
    /// Returns `true` when a code was loaded into `sink`.
    pub fn run<O: OutputSink>(
        &mut self,
        state: &SynthState,
        events: &PendingEvents,
        sink: &mut O,
    ) -> bool {
        let sampled = self.engine.tick(state, sink);
        if let Some(poll) = self.poll.as_mut() {
            if poll.tick() {
                events.raise(Event::SensorSampleReady);
            }
        }
        sampled
    }
}
