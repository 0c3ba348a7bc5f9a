//! Resistive soft-pot slider on an ADC channel.
//!
//! The wiper is pulled to ground through a high-value resistor, so an
//! untouched strip reads near zero. [`slider_percent`] turns the reading
//! into the `0..=100` scale the control loop expects.

use embassy_rp::adc::{self, Adc, Async, Channel};
use tilt_synth::{slider_percent, Slider};

/// Full-scale ADC reading (12 bit).
const ADC_FULL_SCALE: u16 = 4095;

/// Raw readings at or below this count as "not touched".
pub const DEFAULT_DEAD_BAND: u16 = 64;

pub struct AdcSlider<'d> {
    adc: Adc<'d, Async>,
    channel: Channel<'d>,
    dead_band: u16,
}

impl<'d> AdcSlider<'d> {
    pub fn new(adc: Adc<'d, Async>, channel: Channel<'d>, dead_band: u16) -> Self {
        Self {
            adc,
            channel,
            dead_band,
        }
    }
}

impl Slider for AdcSlider<'_> {
    type Error = adc::Error;

    async fn read_value(&mut self) -> Result<u8, Self::Error> {
        let raw = self.adc.read(&mut self.channel).await?;
        Ok(slider_percent(raw, ADC_FULL_SCALE, self.dead_band))
    }
}
