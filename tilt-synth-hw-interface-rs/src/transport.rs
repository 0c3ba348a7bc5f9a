//! Bounded-time wrappers around the control loop's collaborators.
//!
//! A wedged I2C transfer must not stall the foreground forever, so every
//! sensor, display and slider call is raced against a timeout.

use embassy_time::{with_timeout, Duration};
use tilt_synth::{CharDisplay, Slider, TiltSensor};

/// A collaborator error or an expired deadline.
#[derive(Debug)]
pub enum TransportError<E> {
    Bus(E),
    Timeout,
}

impl<E: defmt::Format> defmt::Format for TransportError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TransportError::Bus(e) => defmt::write!(f, "bus error: {}", e),
            TransportError::Timeout => defmt::write!(f, "timeout"),
        }
    }
}

/// Wraps `T` so each call completes within `timeout`.
pub struct Timed<T> {
    inner: T,
    timeout: Duration,
}

impl<T> Timed<T> {
    pub fn new(inner: T, timeout_ms: u32) -> Self {
        Self {
            inner,
            timeout: Duration::from_millis(timeout_ms as u64),
        }
    }
}

async fn bounded<T, E>(
    timeout: Duration,
    fut: impl core::future::Future<Output = Result<T, E>>,
) -> Result<T, TransportError<E>> {
    match with_timeout(timeout, fut).await {
        Ok(result) => result.map_err(TransportError::Bus),
        Err(_) => Err(TransportError::Timeout),
    }
}

impl<T: TiltSensor> TiltSensor for Timed<T> {
    type Error = TransportError<T::Error>;

    async fn sample_ready(&mut self) -> Result<bool, Self::Error> {
        bounded(self.timeout, self.inner.sample_ready()).await
    }

    async fn read_tilt(&mut self) -> Result<i16, Self::Error> {
        bounded(self.timeout, self.inner.read_tilt()).await
    }

    async fn acknowledge(&mut self) -> Result<(), Self::Error> {
        bounded(self.timeout, self.inner.acknowledge()).await
    }
}

impl<T: CharDisplay> CharDisplay for Timed<T> {
    type Error = TransportError<T::Error>;

    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        bounded(self.timeout, self.inner.set_cursor(col, row)).await
    }

    async fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        bounded(self.timeout, self.inner.print(text)).await
    }

    async fn refresh(&mut self) -> Result<(), Self::Error> {
        bounded(self.timeout, self.inner.refresh()).await
    }
}

impl<T: Slider> Slider for Timed<T> {
    type Error = TransportError<T::Error>;

    async fn read_value(&mut self) -> Result<u8, Self::Error> {
        bounded(self.timeout, self.inner.read_value()).await
    }
}
