//! Text layout for the 16×2 character display.
//!
//! ```text
//!   col 0       col 8
//! ┌────────────────┐
//! │C#4             │  row 0: note name + octave number
//! │Vol:  45Sine    │  row 1: volume, waveform name
//! └────────────────┘
//! ```
//!
//! Every field has a fixed width so a shorter value overwrites a longer
//! one without clearing the display.

use core::fmt::Write;

use heapless::String;

use crate::state::SynthParams;
use crate::tables::{note_slot, Waveform, NOTES, NOTE_COUNT};

/// Character columns on the display.
pub const COLUMNS: usize = 16;
/// Character rows on the display.
pub const ROWS: usize = 2;

/// Octave number shown for octave offset 0 (the table starts at C4).
pub const BASE_OCTAVE_LABEL: i8 = 4;

const NOTE_FIELD_WIDTH: usize = 4;

/// One of the three independently redrawn regions of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Note,
    Volume,
    Waveform,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Note, Field::Volume, Field::Waveform];

    /// `(column, row)` of the field's first character.
    pub fn position(self) -> (u8, u8) {
        match self {
            Field::Note => (0, 0),
            Field::Volume => (0, 1),
            Field::Waveform => (8, 1),
        }
    }
}

/// Octave number printed next to the note name.
///
/// The top entry of the note table is the C one octave above the base, so
/// it reads one higher.
pub fn octave_label(note_index: f32, octave: i8) -> i8 {
    let carry = (note_slot(note_index) / (NOTE_COUNT - 1)) as i8;
    BASE_OCTAVE_LABEL + octave + carry
}

/// Rendered text of every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    note: String<NOTE_FIELD_WIDTH>,
    volume: String<8>,
    waveform: &'static str,
}

impl Screen {
    /// Render the current parameters.
    pub fn from_params(params: &SynthParams) -> Self {
        let name = NOTES[note_slot(params.note_index)].name;
        let mut note: String<NOTE_FIELD_WIDTH> = String::new();
        // Longest is "C#8"; writes cannot overflow the buffer.
        let _ = write!(note, "{}{}", name, octave_label(params.note_index, params.octave));
        while note.len() < NOTE_FIELD_WIDTH {
            let _ = note.push(' ');
        }

        let mut volume: String<8> = String::new();
        let _ = write!(volume, "Vol: {:3}", params.volume);

        Self {
            note,
            volume,
            waveform: Waveform::label(params.waveform),
        }
    }

    /// Text of a single field.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Note => self.note.as_str(),
            Field::Volume => self.volume.as_str(),
            Field::Waveform => self.waveform,
        }
    }

    /// Fields whose text differs from `previous`; all fields when there is
    /// no previous frame.
    pub fn changed_fields(&self, previous: Option<&Screen>) -> [bool; 3] {
        let mut changed = [true; 3];
        if let Some(prev) = previous {
            for (i, field) in Field::ALL.iter().enumerate() {
                changed[i] = self.field(*field) != prev.field(*field);
            }
        }
        changed
    }
}
