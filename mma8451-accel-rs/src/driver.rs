//! Low-level register access over I2C.
//!
//! The MMA8451Q uses a one-byte register address and supports repeated
//! start, so reads are a single `write_read` transaction and burst reads
//! auto-increment the address.
//!
//! This module is crate-private; consumers use [`Mma8451`](crate::Mma8451).

use embedded_hal_async::i2c::I2c;

use crate::error::AccelError;
use crate::registers::MAX_BLOCK_LEN;

/// Register-level transport for one device on the bus.
pub(crate) struct RegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> RegisterBus<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    #[cfg(test)]
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Read one register.
    pub async fn read_register(&mut self, register: u8) -> Result<u8, AccelError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buf).await?;
        Ok(buf[0])
    }

    /// Read `buf.len()` consecutive registers starting at `register`.
    pub async fn read_block(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), AccelError<I2C::Error>> {
        if buf.len() > MAX_BLOCK_LEN {
            return Err(AccelError::BlockTooLong);
        }
        self.i2c.write_read(self.address, &[register], buf).await?;
        Ok(())
    }

    /// Write one register.
    pub async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), AccelError<I2C::Error>> {
        self.i2c.write(self.address, &[register, value]).await?;
        Ok(())
    }
}
