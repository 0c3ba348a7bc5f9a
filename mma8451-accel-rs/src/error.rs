//! Error types for the accelerometer driver.

use core::fmt;

/// Errors that can occur when communicating with the accelerometer.
#[derive(Debug)]
pub enum AccelError<E> {
    /// Underlying I2C bus error.
    I2c(E),

    /// `WHO_AM_I` returned an unexpected identifier.
    InvalidDevice(u8),

    /// Burst read longer than the register block.
    BlockTooLong,
}

// Allow ergonomic `?` propagation from raw I2C errors.
impl<E> From<E> for AccelError<E> {
    fn from(error: E) -> Self {
        AccelError::I2c(error)
    }
}

impl<E: fmt::Debug> fmt::Display for AccelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccelError::I2c(e) => write!(f, "I2C error: {:?}", e),
            AccelError::InvalidDevice(id) => write!(f, "Unexpected device id 0x{:02x}", id),
            AccelError::BlockTooLong => write!(f, "Block read too long"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for AccelError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            AccelError::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            AccelError::InvalidDevice(id) => defmt::write!(f, "Unexpected device id {=u8:#x}", id),
            AccelError::BlockTooLong => defmt::write!(f, "Block read too long"),
        }
    }
}
