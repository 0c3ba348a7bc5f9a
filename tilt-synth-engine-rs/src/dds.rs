//! Direct digital synthesis of the output tone.
//!
//! The [`DdsEngine`] steps a fractional phase accumulator through the
//! 20-entry waveform tables. Only every other tick produces a sample, so
//! the phase increment is derived from half the tick rate:
//!
//! ```text
//! freq      = NOTES[round(note_index)].frequency * 2^octave
//! increment = freq / (tick_rate / 2) * 20
//! code      = clamp(sample * volume / 100 + 2048, 0, 4095)
//! ```
//!
//! Nothing here blocks, allocates or logs; [`DdsEngine::tick`] is meant to
//! run in the highest-priority context.

use embedded_hal::pwm::SetDutyCycle;

use crate::state::{SynthParams, SynthState, MAX_OCTAVE, MAX_VOLUME, MIN_OCTAVE};
use crate::tables::{nearest_note, TABLE_LEN};

/// Ticks per produced sample.
pub const TICKS_PER_SAMPLE: u32 = 2;

/// Output code for a zero sample (12-bit mid-scale).
pub const MID_SCALE: i32 = 2048;

/// Largest 12-bit output code.
pub const FULL_SCALE: u16 = 4095;

const TABLE_LEN_F32: f32 = TABLE_LEN as f32;

/// Destination for output codes.
///
/// Implementations must be callable from interrupt context and must not
/// block: the code is latched and the call returns.
pub trait OutputSink {
    /// Latch a 12-bit code (`0..=4095`).
    fn load(&mut self, code: u16);
}

/// Frequency multiplier for an octave offset, as an exact power of two.
///
/// The offset is clamped to `[-3, 3]` first.
pub fn octave_multiplier(octave: i8) -> f32 {
    let octave = octave.clamp(MIN_OCTAVE, MAX_OCTAVE);
    if octave >= 0 {
        (1u32 << octave) as f32
    } else {
        1.0 / (1u32 << -octave) as f32
    }
}

/// Audible frequency for a continuous note index and octave offset.
pub fn effective_frequency(note_index: f32, octave: i8) -> f32 {
    nearest_note(note_index).frequency * octave_multiplier(octave)
}

/// Phase advance per produced sample, in table entries.
pub fn phase_increment(frequency: f32, tick_rate_hz: f32) -> f32 {
    frequency / (tick_rate_hz / TICKS_PER_SAMPLE as f32) * TABLE_LEN_F32
}

/// Scale a table sample by `volume` percent and offset it to mid-scale.
///
/// Integer division truncates toward zero. `volume == 0` yields exactly
/// [`MID_SCALE`].
pub fn output_code(sample: i16, volume: u8) -> u16 {
    let volume = i32::from(volume.min(MAX_VOLUME));
    let code = i32::from(sample) * volume / 100 + MID_SCALE;
    code.clamp(0, i32::from(FULL_SCALE)) as u16
}

/// Wrap a phase that has run past the table end, keeping the fraction.
pub fn wrap_phase(phase: f32) -> f32 {
    if phase >= TABLE_LEN_F32 {
        libm::fmodf(phase, TABLE_LEN_F32)
    } else {
        phase
    }
}

/// Phase-accumulator tone generator.
pub struct DdsEngine {
    /// Position within the table, always in `[0, 20)`.
    phase: f32,
    tick_rate_hz: f32,
    /// Toggled every tick; a sample is produced when it becomes `true`.
    sample_tick: bool,
}

impl DdsEngine {
    /// Create an engine for a tick source running at `tick_rate_hz`.
    pub fn new(tick_rate_hz: u32) -> Self {
        Self::with_tick_rate(tick_rate_hz as f32)
    }

    /// Create an engine for a tick source whose rate is not a whole number
    /// of hertz, such as a timer period rounded to whole microseconds.
    pub fn with_tick_rate(tick_rate_hz: f32) -> Self {
        Self {
            phase: 0.0,
            tick_rate_hz,
            sample_tick: false,
        }
    }

    /// Tick rate the phase increment is computed for.
    pub fn tick_rate_hz(&self) -> f32 {
        self.tick_rate_hz
    }

    /// Current phase accumulator value.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce one output code for `params` and advance the phase.
    pub fn next_code(&mut self, params: &SynthParams) -> u16 {
        let frequency = effective_frequency(params.note_index, params.octave);
        let increment = phase_increment(frequency, self.tick_rate_hz);

        let sample = params.waveform.table()[self.phase as usize % TABLE_LEN];
        let code = output_code(sample, params.volume);

        self.phase = wrap_phase(self.phase + increment);
        code
    }

    /// Handle one synthesis tick.
    ///
    /// On sample ticks the shared parameters are read, one code is written to
    /// `sink` and `true` is returned. The other ticks return `false` without
    /// touching the sink.
    pub fn tick<O: OutputSink>(&mut self, state: &SynthState, sink: &mut O) -> bool {
        self.sample_tick = !self.sample_tick;
        if !self.sample_tick {
            return false;
        }
        let code = self.next_code(&state.snapshot());
        sink.load(code);
        true
    }
}

/// [`OutputSink`] over any PWM channel, used as a 12-bit DAC.
///
/// The code range `0..=4095` is scaled onto the channel's duty range.
/// Channel errors are dropped: the sink is fire-and-forget.
pub struct DutyCycleSink<P> {
    channel: P,
}

impl<P: SetDutyCycle> DutyCycleSink<P> {
    pub fn new(channel: P) -> Self {
        Self { channel }
    }

    /// Release the underlying channel.
    pub fn into_inner(self) -> P {
        self.channel
    }
}

impl<P: SetDutyCycle> OutputSink for DutyCycleSink<P> {
    fn load(&mut self, code: u16) {
        let max = u32::from(self.channel.max_duty_cycle());
        let duty = u32::from(code.min(FULL_SCALE)) * max / u32::from(FULL_SCALE);
        let _ = self.channel.set_duty_cycle(duty as u16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{Waveform, NOTES, SAWTOOTH, SINE, TRIANGLE};

    struct LastCode {
        code: Option<u16>,
        loads: usize,
    }

    impl OutputSink for LastCode {
        fn load(&mut self, code: u16) {
            self.code = Some(code);
            self.loads += 1;
        }
    }

    fn params(note_index: f32, octave: i8, waveform: Waveform, volume: u8) -> SynthParams {
        SynthParams {
            note_index,
            octave,
            waveform,
            volume,
        }
    }

    #[test]
    fn frequency_matches_rounded_note_times_power_of_two() {
        for step in 0..=48 {
            let note_index = step as f32 * 0.25;
            for octave in MIN_OCTAVE..=MAX_OCTAVE {
                let expected = NOTES[libm::roundf(note_index) as usize].frequency
                    * libm::powf(2.0, octave as f32);
                let freq = effective_frequency(note_index, octave);
                assert!(freq > 0.0);
                assert!((freq - expected).abs() < 1e-3, "{note_index} {octave}");
            }
        }
    }

    #[test]
    fn octave_is_a_multiplier_not_a_semitone_offset() {
        assert_eq!(octave_multiplier(0), 1.0);
        assert_eq!(octave_multiplier(3), 8.0);
        assert_eq!(octave_multiplier(-3), 0.125);
        assert_eq!(effective_frequency(9.0, 1), 880.0);
    }

    #[test]
    fn increment_uses_half_the_tick_rate() {
        // A4 at a 32 kHz tick: 440 / 16000 * 20.
        let inc = phase_increment(440.0, 32_000.0);
        assert!((inc - 0.55).abs() < 1e-6);
    }

    #[test]
    fn phase_wrap_keeps_fraction() {
        assert_eq!(wrap_phase(19.5), 19.5);
        assert!((wrap_phase(20.75) - 0.75).abs() < 1e-6);
        assert!((wrap_phase(45.5) - 5.5).abs() < 1e-6);
        assert_eq!(wrap_phase(20.0), 0.0);
        // Wrapping an already wrapped phase is a no-op.
        assert_eq!(wrap_phase(wrap_phase(33.25)), wrap_phase(33.25));
    }

    #[test]
    fn zero_volume_is_mid_scale_for_every_waveform() {
        for table in [&SINE, &TRIANGLE, &SAWTOOTH] {
            for &sample in table.iter() {
                assert_eq!(output_code(sample, 0), MID_SCALE as u16);
            }
        }
    }

    #[test]
    fn output_code_stays_in_range() {
        for volume in 0..=255u8 {
            for sample in [i16::MIN, -4096, -2047, -1, 0, 1, 2047, 4096, i16::MAX] {
                assert!(output_code(sample, volume) <= FULL_SCALE);
            }
        }
        assert_eq!(output_code(2047, 100), 4095);
        assert_eq!(output_code(-2047, 100), 1);
        assert_eq!(output_code(i16::MIN, 100), 0);
    }

    #[test]
    fn output_code_truncates_toward_zero() {
        // 632 * 20 / 100 = 126.4 -> 126; -632 * 20 / 100 = -126.4 -> -126
        assert_eq!(output_code(632, 20), 2048 + 126);
        assert_eq!(output_code(-632, 20), 2048 - 126);
    }

    #[test]
    fn first_code_reads_table_start() {
        let mut engine = DdsEngine::new(32_000);
        let code = engine.next_code(&params(0.0, 0, Waveform::Sawtooth, 100));
        assert_eq!(code, 2048);
        let code = engine.next_code(&params(0.0, 3, Waveform::Sawtooth, 100));
        // C4 increment at 32 kHz is ~0.327, still inside entry 0.
        assert_eq!(code, 2048);
    }

    #[test]
    fn phase_never_resets_to_zero_on_wrap() {
        let mut engine = DdsEngine::new(32_000);
        let p = params(12.0, 3, Waveform::Sine, 50);
        let inc = phase_increment(effective_frequency(12.0, 3), 32_000.0);
        let mut expected = 0.0f32;
        for _ in 0..100 {
            engine.next_code(&p);
            expected = wrap_phase(expected + inc);
            assert!((engine.phase() - expected).abs() < 1e-3);
            assert!(engine.phase() >= 0.0 && engine.phase() < TABLE_LEN as f32);
        }
    }

    #[test]
    fn cycles_per_second_match_pitch() {
        let mut engine = DdsEngine::new(32_000);
        let p = params(9.0, 0, Waveform::Triangle, 100);
        let mut wraps = 0;
        let mut last = engine.phase();
        for _ in 0..16_000 {
            engine.next_code(&p);
            if engine.phase() < last {
                wraps += 1;
            }
            last = engine.phase();
        }
        assert!((439..=441).contains(&wraps), "wraps = {wraps}");
    }

    #[test]
    fn tick_produces_a_sample_every_other_call() {
        let state = SynthState::new();
        state.set_volume(0);
        let mut engine = DdsEngine::new(32_000);
        let mut sink = LastCode { code: None, loads: 0 };

        assert!(engine.tick(&state, &mut sink));
        assert!(!engine.tick(&state, &mut sink));
        assert!(engine.tick(&state, &mut sink));
        assert!(!engine.tick(&state, &mut sink));

        assert_eq!(sink.loads, 2);
        assert_eq!(sink.code, Some(2048));
    }

    struct FakePwm {
        max: u16,
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for FakePwm {
        type Error = core::convert::Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    #[test]
    fn duty_cycle_sink_scales_to_channel_range() {
        let mut sink = DutyCycleSink::new(FakePwm { max: 4095, duty: 0 });
        sink.load(2048);
        assert_eq!(sink.channel.duty, 2048);

        let mut sink = DutyCycleSink::new(FakePwm { max: 1000, duty: 0 });
        sink.load(4095);
        assert_eq!(sink.channel.duty, 1000);
        sink.load(0);
        assert_eq!(sink.channel.duty, 0);
        assert_eq!(sink.into_inner().max, 1000);
    }
}
