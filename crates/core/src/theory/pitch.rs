//! Pitch & MIDI primitives (spec §4.1).
//!
//! Pure conversions between integer pitch numbers, note names, and
//! frequency. No state, no panics — out-of-range input returns an
//! explicit [`PitchOutOfRange`] sentinel rather than throwing.

use crate::error::PitchOutOfRange;

pub const MIN_PITCH: i32 = 0;
pub const MAX_PITCH: i32 = 127;

/// An integer pitch number in `[0, 127]`. 60 is middle C, 69 is A440.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch(u8);

impl Pitch {
    /// Build a pitch, rejecting values outside `[0, 127]`.
    pub fn new(value: i32) -> Result<Self, PitchOutOfRange> {
        if (MIN_PITCH..=MAX_PITCH).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PitchOutOfRange(value))
        }
    }

    /// Build a pitch by folding `value` into range by octaves, only
    /// falling back to clamping at the extremes. Used internally by
    /// chord/voice-leading construction, which works with unbounded
    /// intermediate semitone arithmetic and must still land on a
    /// schedulable pitch.
    pub(crate) fn fold_into_range(mut value: i32) -> Self {
        while value > MAX_PITCH {
            value -= 12;
        }
        while value < MIN_PITCH {
            value += 12;
        }
        Self(value.clamp(MIN_PITCH, MAX_PITCH) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_i32(self) -> i32 {
        i32::from(self.0)
    }

    /// Transpose by a signed semitone interval; `None` if the result
    /// would leave `[0, 127]`.
    pub fn transpose(self, interval: i32) -> Result<Self, PitchOutOfRange> {
        Self::new(self.as_i32() + interval)
    }

    /// Frequency in Hz using 12-tone equal temperament, A440.
    #[must_use]
    pub fn frequency_hz(self) -> f64 {
        440.0 * 2f64.powf((self.as_i32() as f64 - 69.0) / 12.0)
    }

    /// Note name and scientific-pitch octave (sharps preferred).
    #[must_use]
    pub fn to_name(self) -> NoteName {
        let pitch_class = self.as_i32().rem_euclid(12) as usize;
        let octave = self.as_i32() / 12 - 1;
        NoteName {
            letter: SHARP_NAMES[pitch_class],
            octave,
        }
    }
}

/// A note name such as "C#4". Always rendered with sharps; flats are
/// accepted on parse (`name_to_pitch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName {
    pub letter: &'static str,
    pub octave: i32,
}

impl NoteName {
    #[must_use]
    pub fn render(self) -> String {
        format!("{}{}", self.letter, self.octave)
    }
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Parse a note name like "C4", "Db3", "A#-1" back into a pitch.
/// Accepts both sharp (`#`) and flat (`b`) accidentals on input.
/// `name_to_pitch(pitch_to_name(p)) == p` holds for every valid `p`.
pub fn name_to_pitch(name: &str) -> Result<Pitch, PitchOutOfRange> {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return Err(PitchOutOfRange(i32::MIN));
    }
    let letter = bytes[0].to_ascii_uppercase();
    let base = match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return Err(PitchOutOfRange(i32::MIN)),
    };

    let mut rest = &name[1..];
    let mut accidental = 0;
    if let Some(stripped) = rest.strip_prefix('#') {
        accidental = 1;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('b') {
        accidental = -1;
        rest = stripped;
    }

    let octave: i32 = rest.parse().map_err(|_| PitchOutOfRange(i32::MIN))?;
    let value = base + accidental + (octave + 1) * 12;
    Pitch::new(value)
}

pub fn pitch_to_name(pitch: Pitch) -> String {
    pitch.to_name().render()
}

/// `linearToFrequency(x) = 20 * 1000^x`, mapping a UI unit interval to
/// `[20, 20000]` Hz.
#[must_use]
pub fn linear_to_frequency(x: f64) -> f64 {
    20.0 * 1000f64.powf(x)
}

/// Inverse of [`linear_to_frequency`].
#[must_use]
pub fn frequency_to_linear(freq_hz: f64) -> f64 {
    (freq_hz / 20.0).log(1000.0)
}
