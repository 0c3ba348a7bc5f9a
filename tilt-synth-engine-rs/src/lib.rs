//! Real-time tone engine and input bridge for the tilt synthesizer.
//!
//! The crate splits the firmware into the parts that run in the synthesis
//! tick and the parts that run in the cooperative foreground:
//!
//! ```text
//!  tick (high priority)          foreground (thread executor)
//!  ────────────────────          ────────────────────────────
//!  SynthTick::run ──▶ sink       button tasks ──raise──┐
//!        ▲   SensorPoll ─raise─┐ sensor INT ──raise──┐ │
//!        │                     ▼                     ▼ ▼
//!        └── reads ── SynthState ◀── writes ── ControlLoop ◀── PendingEvents
//! ```
//!
//! - [`tables`]: fixed waveform and note tables.
//! - [`dds`]: phase accumulator, output scaling and the [`OutputSink`] seam.
//! - [`state`] / [`events`]: lock-free shared parameters and event flags.
//! - [`debounce`]: per-button debounce state machine and monitor loop.
//! - [`tilt`]: pure tilt-to-note mapping and tick-paced sensor polling.
//! - [`tick`]: the engine and poll counter as driven by the tick timer.
//! - [`control`]: the foreground loop and its collaborator traits.
//! - [`screen`]: text layout for the 16×2 character display.
//!
//! # Quick Start
//!
//! ```ignore
//! static STATE: SynthState = SynthState::new();
//! static EVENTS: PendingEvents = PendingEvents::new();
//!
//! // In the tick task:
//! let mut tick = SynthTick::new(&config);
//! let mut ticker = Ticker::every(Duration::from_micros(config.tick_period_us()));
//! loop {
//!     tick.run(&STATE, &EVENTS, &mut sink);
//!     ticker.next().await;
//! }
//!
//! // In the foreground task:
//! let mut control = ControlLoop::new(sensor, display, slider, &STATE, &EVENTS);
//! control.draw_all().await.ok();
//! loop {
//!     control.step().await.ok();
//!     Timer::after_millis(config.control_period_ms as u64).await;
//! }
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: [`defmt::Format`] on public types and debug logging.

#![no_std]

pub mod config;
pub mod control;
pub mod dds;
pub mod debounce;
pub mod error;
pub mod events;
pub mod screen;
pub mod state;
pub mod tables;
pub mod tick;
pub mod tilt;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use config::{DebounceConfig, SensorReadyStrategy, SynthConfig};
pub use control::{slider_percent, CharDisplay, ControlLoop, LoopStats, Slider, TiltSensor};
pub use dds::{DdsEngine, DutyCycleSink, OutputSink};
pub use debounce::{run_button, Button, Debouncer};
pub use error::ControlError;
pub use events::{Event, PendingEvents};
pub use screen::Screen;
pub use state::{SynthParams, SynthState};
pub use tables::Waveform;
pub use tick::SynthTick;
pub use tilt::{note_index_from_tilt, SensorPoll};
