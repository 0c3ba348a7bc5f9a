//! Async driver for the NXP MMA8451Q accelerometer.
//!
//! The tilt synthesizer reads the X axis of this sensor to select a note.
//! The driver is generic over any `embedded-hal-async` I2C implementation,
//! including shared-bus devices.
//!
//! # Architecture
//!
//! - **`driver`** (crate-private): one-byte register addressing, single and
//!   burst reads, register writes.
//! - **[`Mma8451`]** (public): configuration sequence, data-ready status,
//!   X-axis sampling, motion acknowledge, and the
//!   [`TiltSensor`](tilt_synth::TiltSensor) implementation.
//!
//! # Quick start
//!
//! ```no_run
//! use accel_driver::{Mma8451, Range, DEFAULT_ADDRESS};
//!
//! # async fn example(i2c: impl embedded_hal_async::i2c::I2c) {
//! let mut accel = Mma8451::new(i2c, DEFAULT_ADDRESS);
//! accel.init(Range::G2).await.unwrap();
//! let x = accel.read_x().await.unwrap();
//! # }
//! ```
//!
//! # Features
//!
//! - **`defmt`**: Enable [`defmt::Format`] implementations on error types
//!   for embedded logging.

#![no_std]

pub use accelerometer::{Mma8451, Range};
pub use error::AccelError;
pub use registers::DEFAULT_ADDRESS;

mod accelerometer;
mod driver;
mod error;
pub mod registers;
