//! Synthesis parameters shared between the tick context and the foreground.
//!
//! Every field is a single-word atomic with exactly one writer role: the
//! control loop writes all four fields, the DDS tick only reads them. Since
//! no field has two writers, plain relaxed loads and stores are sufficient
//! and no critical section is needed around the read-modify-write helpers.
//! The phase accumulator is not part of this state; it lives inside
//! [`DdsEngine`](crate::dds::DdsEngine).

use core::sync::atomic::{AtomicI8, AtomicU32, AtomicU8, Ordering};

use crate::tables::{Waveform, MAX_NOTE_INDEX};

/// Lowest octave offset.
pub const MIN_OCTAVE: i8 = -3;
/// Highest octave offset.
pub const MAX_OCTAVE: i8 = 3;
/// Volume ceiling (percent).
pub const MAX_VOLUME: u8 = 100;
/// Volume at power-on.
pub const INITIAL_VOLUME: u8 = 20;

/// Plain copy of the shared parameters, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SynthParams {
    /// Continuous note position in `[0, 12]`.
    pub note_index: f32,
    /// Octave offset in `[-3, 3]`.
    pub octave: i8,
    pub waveform: Waveform,
    /// Volume percentage in `[0, 100]`.
    pub volume: u8,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            note_index: 0.0,
            octave: 0,
            waveform: Waveform::Sine,
            volume: INITIAL_VOLUME,
        }
    }
}

/// Lock-free shared parameter block, suitable for a `static`.
pub struct SynthState {
    /// `f32` bit pattern of the note index.
    note_index: AtomicU32,
    octave: AtomicI8,
    waveform: AtomicU8,
    volume: AtomicU8,
}

impl Default for SynthState {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthState {
    /// Power-on state: note 0, octave 0, sine, volume 20.
    pub const fn new() -> Self {
        Self {
            note_index: AtomicU32::new(0),
            octave: AtomicI8::new(0),
            waveform: AtomicU8::new(Waveform::Sine as u8),
            volume: AtomicU8::new(INITIAL_VOLUME),
        }
    }

    /// Read all fields. Each field is individually consistent; a snapshot
    /// may mix values from before and after a concurrent foreground write,
    /// which is harmless for a single sample.
    pub fn snapshot(&self) -> SynthParams {
        SynthParams {
            note_index: self.note_index(),
            octave: self.octave(),
            waveform: self.waveform(),
            volume: self.volume(),
        }
    }

    pub fn note_index(&self) -> f32 {
        f32::from_bits(self.note_index.load(Ordering::Relaxed))
    }

    /// Store a note index, saturating to `[0, 12]`. NaN is stored as 0.
    pub fn set_note_index(&self, note_index: f32) {
        let clamped = if note_index.is_nan() {
            0.0
        } else {
            note_index.clamp(0.0, MAX_NOTE_INDEX)
        };
        self.note_index.store(clamped.to_bits(), Ordering::Relaxed);
    }

    pub fn octave(&self) -> i8 {
        self.octave.load(Ordering::Relaxed)
    }

    /// Shift the octave by `delta`, saturating to `[-3, 3]`.
    ///
    /// Returns `true` if the stored octave changed.
    pub fn shift_octave(&self, delta: i8) -> bool {
        let current = self.octave();
        let next = current.saturating_add(delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
        self.octave.store(next, Ordering::Relaxed);
        next != current
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_u8(self.waveform.load(Ordering::Relaxed))
    }

    /// Advance to the next waveform and return it.
    pub fn cycle_waveform(&self) -> Waveform {
        let next = self.waveform().next();
        self.waveform.store(next as u8, Ordering::Relaxed);
        next
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    /// Store a volume, saturating at 100.
    pub fn set_volume(&self, volume: u8) {
        self.volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }
}
