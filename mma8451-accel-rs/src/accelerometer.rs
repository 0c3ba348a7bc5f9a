//! High-level interface for the MMA8451Q.
//!
//! [`Mma8451`] wraps the register transport with the configuration
//! sequence used for tilt sensing, a data-ready check, and the X-axis read.
//! It also implements [`TiltSensor`] so the control loop can use it
//! directly.

use embedded_hal_async::i2c::I2c;
use tilt_synth::tilt::axis_from_bytes;
use tilt_synth::TiltSensor;

use crate::driver::RegisterBus;
use crate::error::AccelError;
use crate::registers::{
    CTRL1_ACTIVE, CTRL1_DR_50HZ, CTRL_REG1, CTRL_REG4, CTRL_REG5, DEVICE_ID, FF_MT_CFG, FF_MT_ELE,
    FF_MT_OAE, FF_MT_SRC, FF_MT_XEFE, INT_EN_FF_MT, OUT_X_MSB, STATUS, STATUS_ZYXDR, WHO_AM_I,
    XYZ_DATA_CFG,
};

/// Full-scale measurement range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Range {
    /// ±2 g, 4096 counts/g. The tilt mapping is calibrated for this range.
    #[default]
    G2 = 0b00,
    /// ±4 g, 2048 counts/g.
    G4 = 0b01,
    /// ±8 g, 1024 counts/g.
    G8 = 0b10,
}

/// Async driver for the NXP MMA8451Q accelerometer.
///
/// # Example
///
/// ```no_run
/// use accel_driver::{Mma8451, Range, DEFAULT_ADDRESS};
///
/// # async fn example(i2c: impl embedded_hal_async::i2c::I2c) {
/// let mut accel = Mma8451::new(i2c, DEFAULT_ADDRESS);
/// accel.init(Range::G2).await.unwrap();
///
/// if accel.data_ready().await.unwrap() {
///     let x = accel.read_x().await.unwrap();
/// }
/// # }
/// ```
pub struct Mma8451<I2C> {
    bus: RegisterBus<I2C>,
}

impl<I2C> Mma8451<I2C>
where
    I2C: I2c,
{
    /// Create a driver. No I2C traffic is generated.
    ///
    /// # Arguments
    /// * `i2c`: I2C peripheral or shared-bus device
    /// * `address`: 7-bit device address (typically 0x1D)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            bus: RegisterBus::new(i2c, address),
        }
    }

    // -----------------------------------------------------------------------
    // Register transport
    // -----------------------------------------------------------------------

    /// Read a single register.
    pub async fn read_register(&mut self, register: u8) -> Result<u8, AccelError<I2C::Error>> {
        self.bus.read_register(register).await
    }

    /// Read consecutive registers into `buf`.
    ///
    /// # Errors
    /// * [`AccelError::BlockTooLong`] if `buf` exceeds
    ///   [`MAX_BLOCK_LEN`](crate::registers::MAX_BLOCK_LEN)
    /// * [`AccelError::I2c`] on communication failure
    pub async fn read_block(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), AccelError<I2C::Error>> {
        self.bus.read_block(register, buf).await
    }

    /// Write a single register.
    pub async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), AccelError<I2C::Error>> {
        self.bus.write_register(register, value).await
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Check the device identifier.
    ///
    /// # Errors
    /// [`AccelError::InvalidDevice`] carrying the value read if it is not
    /// [`DEVICE_ID`].
    pub async fn verify(&mut self) -> Result<(), AccelError<I2C::Error>> {
        let id = self.read_register(WHO_AM_I).await?;
        if id != DEVICE_ID {
            return Err(AccelError::InvalidDevice(id));
        }
        Ok(())
    }

    /// Configure the sensor for tilt sensing and activate it.
    ///
    /// Sequence:
    /// 1. Verify `WHO_AM_I`.
    /// 2. Enter standby (configuration registers are only writable there).
    /// 3. Select the full-scale `range`.
    /// 4. Enable latched X-axis motion detection.
    /// 5. Enable the motion interrupt and route it to INT2.
    /// 6. Activate at 50 Hz in normal (14-bit) read mode.
    pub async fn init(&mut self, range: Range) -> Result<(), AccelError<I2C::Error>> {
        self.verify().await?;
        self.write_register(CTRL_REG1, 0x00).await?;
        self.write_register(XYZ_DATA_CFG, range as u8).await?;
        self.write_register(FF_MT_CFG, FF_MT_ELE | FF_MT_OAE | FF_MT_XEFE)
            .await?;
        self.write_register(CTRL_REG4, INT_EN_FF_MT).await?;
        self.write_register(CTRL_REG5, 0x00).await?;
        self.write_register(CTRL_REG1, CTRL1_DR_50HZ | CTRL1_ACTIVE)
            .await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("MMA8451Q active, range {}", range);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// `true` if a new sample set is available.
    pub async fn data_ready(&mut self) -> Result<bool, AccelError<I2C::Error>> {
        let status = self.read_register(STATUS).await?;
        Ok(status & STATUS_ZYXDR != 0)
    }

    /// Read the signed 14-bit X-axis sample.
    pub async fn read_x(&mut self) -> Result<i16, AccelError<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.read_block(OUT_X_MSB, &mut buf).await?;
        Ok(axis_from_bytes(buf[0], buf[1]))
    }

    /// Read (and thereby clear) the motion event source register.
    pub async fn acknowledge_motion(&mut self) -> Result<u8, AccelError<I2C::Error>> {
        self.read_register(FF_MT_SRC).await
    }
}

impl<I2C> TiltSensor for Mma8451<I2C>
where
    I2C: I2c,
{
    type Error = AccelError<I2C::Error>;

    async fn sample_ready(&mut self) -> Result<bool, Self::Error> {
        self.data_ready().await
    }

    async fn read_tilt(&mut self) -> Result<i16, Self::Error> {
        self.read_x().await
    }

    async fn acknowledge(&mut self) -> Result<(), Self::Error> {
        self.acknowledge_motion().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{DEFAULT_ADDRESS, MAX_BLOCK_LEN};
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};

    /// In-memory register file with address auto-increment.
    struct FakeBus {
        regs: [u8; 0x40],
        pointer: u8,
        fail: bool,
        /// Register writes in order, as `(register, value)`.
        writes: [(u8, u8); 16],
        write_count: usize,
    }

    impl FakeBus {
        fn new() -> Self {
            let mut regs = [0u8; 0x40];
            regs[WHO_AM_I as usize] = DEVICE_ID;
            Self {
                regs,
                pointer: 0,
                fail: false,
                writes: [(0, 0); 16],
                write_count: 0,
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail || address != DEFAULT_ADDRESS {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.pointer = bytes[0];
                        for &value in &bytes[1..] {
                            self.regs[self.pointer as usize] = value;
                            self.writes[self.write_count] = (self.pointer, value);
                            self.write_count += 1;
                            self.pointer += 1;
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.regs[self.pointer as usize];
                            if self.pointer == FF_MT_SRC {
                                self.regs[FF_MT_SRC as usize] = 0;
                            }
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn init_writes_configuration_in_order() {
        let mut accel = Mma8451::new(FakeBus::new(), DEFAULT_ADDRESS);
        block_on(accel.init(Range::G2)).unwrap();

        let bus = accel.bus.i2c_mut();
        assert_eq!(
            &bus.writes[..bus.write_count],
            &[
                (CTRL_REG1, 0x00),
                (XYZ_DATA_CFG, 0x00),
                (FF_MT_CFG, 0xC8),
                (CTRL_REG4, 0x04),
                (CTRL_REG5, 0x00),
                (CTRL_REG1, 0x21),
            ]
        );
    }

    #[test]
    fn init_rejects_unknown_device() {
        let mut bus = FakeBus::new();
        bus.regs[WHO_AM_I as usize] = 0x2A;
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        assert!(matches!(
            block_on(accel.init(Range::G2)),
            Err(AccelError::InvalidDevice(0x2A))
        ));
    }

    #[test]
    fn data_ready_checks_zyxdr() {
        let mut bus = FakeBus::new();
        bus.regs[STATUS as usize] = 0x07; // per-axis bits only
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        assert!(!block_on(accel.data_ready()).unwrap());

        accel.bus.i2c_mut().regs[STATUS as usize] = 0x0F;
        assert!(block_on(accel.data_ready()).unwrap());
    }

    #[test]
    fn read_x_sign_extends_the_pair() {
        let mut bus = FakeBus::new();
        bus.regs[OUT_X_MSB as usize] = 0xC0;
        bus.regs[OUT_X_MSB as usize + 1] = 0x00;
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        assert_eq!(block_on(accel.read_x()).unwrap(), -4096);
    }

    #[test]
    fn acknowledge_clears_motion_source() {
        let mut bus = FakeBus::new();
        bus.regs[FF_MT_SRC as usize] = 0x82;
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        assert_eq!(block_on(accel.acknowledge_motion()).unwrap(), 0x82);
        assert_eq!(block_on(accel.acknowledge_motion()).unwrap(), 0x00);
    }

    #[test]
    fn oversized_block_is_rejected_without_traffic() {
        let mut bus = FakeBus::new();
        bus.fail = true;
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        let mut buf = [0u8; MAX_BLOCK_LEN + 1];
        assert!(matches!(
            block_on(accel.read_block(STATUS, &mut buf)),
            Err(AccelError::BlockTooLong)
        ));
    }

    #[test]
    fn bus_errors_propagate() {
        let mut bus = FakeBus::new();
        bus.fail = true;
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);
        assert!(matches!(
            block_on(accel.read_register(STATUS)),
            Err(AccelError::I2c(ErrorKind::Other))
        ));
    }

    #[test]
    fn tilt_sensor_impl_reads_through() {
        let mut bus = FakeBus::new();
        bus.regs[STATUS as usize] = STATUS_ZYXDR;
        bus.regs[OUT_X_MSB as usize] = 0x20; // +0.5 g
        let mut accel = Mma8451::new(bus, DEFAULT_ADDRESS);

        assert!(block_on(TiltSensor::sample_ready(&mut accel)).unwrap());
        assert_eq!(block_on(TiltSensor::read_tilt(&mut accel)).unwrap(), 2048);
        block_on(TiltSensor::acknowledge(&mut accel)).unwrap();
    }
}
