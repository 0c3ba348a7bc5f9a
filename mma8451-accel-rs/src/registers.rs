//! MMA8451Q register map and bit constants.
//!
//! Only the registers used for tilt sensing and motion interrupts are
//! listed. Multi-byte reads auto-increment the register address.

// ---------------------------------------------------------------------------
// Data and status registers
// ---------------------------------------------------------------------------

/// Data status register. Bit 3 (`ZYXDR`) is set when a new X/Y/Z sample set
/// is available.
pub const STATUS: u8 = 0x00;

/// X-axis sample, MSB. The LSB follows at `0x02`; the 14-bit value is
/// left-justified across the pair.
pub const OUT_X_MSB: u8 = 0x01;

/// Device identification register.
pub const WHO_AM_I: u8 = 0x0D;

// ---------------------------------------------------------------------------
// Configuration registers
// ---------------------------------------------------------------------------

/// Full-scale range selection (bits 1:0).
pub const XYZ_DATA_CFG: u8 = 0x0E;

/// Freefall/motion detection configuration.
pub const FF_MT_CFG: u8 = 0x15;

/// Freefall/motion source register. Reading it clears the motion event
/// latch and releases the interrupt pin.
pub const FF_MT_SRC: u8 = 0x16;

/// System control 1: output data rate and active/standby.
pub const CTRL_REG1: u8 = 0x2A;

/// Interrupt enable register.
pub const CTRL_REG4: u8 = 0x2D;

/// Interrupt routing: a set bit routes to INT1, clear routes to INT2.
pub const CTRL_REG5: u8 = 0x2E;

// ---------------------------------------------------------------------------
// Bit fields
// ---------------------------------------------------------------------------

/// `STATUS`: new X, Y and Z data ready.
pub const STATUS_ZYXDR: u8 = 1 << 3;

/// `CTRL_REG1`: active mode.
pub const CTRL1_ACTIVE: u8 = 1 << 0;

/// `CTRL_REG1`: output data rate 50 Hz (`DR = 0b100`).
pub const CTRL1_DR_50HZ: u8 = 0b100 << 3;

/// `FF_MT_CFG`: latch events until `FF_MT_SRC` is read.
pub const FF_MT_ELE: u8 = 1 << 7;

/// `FF_MT_CFG`: motion (OR of axes) rather than freefall detection.
pub const FF_MT_OAE: u8 = 1 << 6;

/// `FF_MT_CFG`: X-axis event enable.
pub const FF_MT_XEFE: u8 = 1 << 3;

/// `CTRL_REG4`: freefall/motion interrupt enable.
pub const INT_EN_FF_MT: u8 = 1 << 2;

// ---------------------------------------------------------------------------
// Device constants
// ---------------------------------------------------------------------------

/// Expected `WHO_AM_I` value.
pub const DEVICE_ID: u8 = 0x1A;

/// Default I2C address (SA0 pulled high).
pub const DEFAULT_ADDRESS: u8 = 0x1D;

/// Longest burst read supported by [`read_block`](crate::Mma8451::read_block):
/// `STATUS` plus three 2-byte axis samples.
pub const MAX_BLOCK_LEN: usize = 7;
