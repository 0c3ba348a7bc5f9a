//! Fixed waveform and note tables.
//!
//! Both tables are compile-time constants. The waveform tables hold one
//! full period in [`TABLE_LEN`] signed samples; the note table covers one
//! chromatic octave from C4 to C5 inclusive.

/// Number of samples per waveform period.
pub const TABLE_LEN: usize = 20;

/// Number of entries in the note table (C through C, inclusive).
pub const NOTE_COUNT: usize = 13;

/// Highest valid note index, as a float for the continuous note position.
pub const MAX_NOTE_INDEX: f32 = (NOTE_COUNT - 1) as f32;

/// Sine table: `trunc(sin(i * 0.314159) * 2047)`.
pub const SINE: [i16; TABLE_LEN] = [
    0, 632, 1203, 1656, 1946, 2046, 1946, 1656, 1203, 632, 0, -632, -1203, -1656, -1946, -2046,
    -1946, -1656, -1203, -632,
];

/// Symmetric triangle, peaks at ±2045.
pub const TRIANGLE: [i16; TABLE_LEN] = [
    0, 409, 818, 1227, 1636, 2045, 1636, 1227, 818, 409, 0, -409, -818, -1227, -1636, -2045,
    -1636, -1227, -818, -409,
];

/// Rising sawtooth, jumps from +2047 to -2047 at the half-period.
pub const SAWTOOTH: [i16; TABLE_LEN] = [
    0, 205, 409, 614, 819, 1024, 1228, 1433, 1638, 1842, 2047, -2047, -1820, -1592, -1365, -1137,
    -910, -682, -455, -227,
];

/// Output waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Waveform {
    #[default]
    Sine = 0,
    Triangle = 1,
    Sawtooth = 2,
}

impl Waveform {
    /// Number of waveform variants.
    pub const COUNT: u8 = 3;

    /// Decode a stored waveform index. Out-of-range values wrap modulo
    /// [`Waveform::COUNT`].
    pub fn from_u8(v: u8) -> Self {
        match v % Self::COUNT {
            0 => Self::Sine,
            1 => Self::Triangle,
            _ => Self::Sawtooth,
        }
    }

    /// The next waveform in the `Sine → Triangle → Sawtooth → Sine` cycle.
    pub fn next(self) -> Self {
        Self::from_u8(self as u8 + 1)
    }

    /// The sample table for this waveform.
    pub fn table(self) -> &'static [i16; TABLE_LEN] {
        match self {
            Self::Sine => &SINE,
            Self::Triangle => &TRIANGLE,
            Self::Sawtooth => &SAWTOOTH,
        }
    }

    /// Fixed-width (8 character) label for the display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sine => "Sine    ",
            Self::Triangle => "Triangle",
            Self::Sawtooth => "Sawtooth",
        }
    }
}

/// One entry of the note table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Base frequency in Hz (octave offset 0).
    pub frequency: f32,
    /// Short display name.
    pub name: &'static str,
}

/// One chromatic octave, C4 to C5.
pub const NOTES: [Note; NOTE_COUNT] = [
    Note { frequency: 261.63, name: "C" },
    Note { frequency: 277.18, name: "C#" },
    Note { frequency: 293.66, name: "D" },
    Note { frequency: 311.13, name: "D#" },
    Note { frequency: 329.63, name: "E" },
    Note { frequency: 349.23, name: "F" },
    Note { frequency: 369.99, name: "F#" },
    Note { frequency: 392.00, name: "G" },
    Note { frequency: 415.30, name: "G#" },
    Note { frequency: 440.00, name: "A" },
    Note { frequency: 466.16, name: "A#" },
    Note { frequency: 493.88, name: "B" },
    Note { frequency: 523.25, name: "C" },
];

/// Round a continuous note index to a table slot.
///
/// The index is clamped to `[0, 12]` first; rounding is half away from zero.
/// NaN maps to slot 0.
pub fn note_slot(note_index: f32) -> usize {
    if note_index.is_nan() {
        return 0;
    }
    libm::roundf(note_index.clamp(0.0, MAX_NOTE_INDEX)) as usize
}

/// Look up the note nearest to a continuous index.
pub fn nearest_note(note_index: f32) -> &'static Note {
    &NOTES[note_slot(note_index)]
}
