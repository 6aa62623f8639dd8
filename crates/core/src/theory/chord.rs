//! Chord builder (spec §4.3).
//!
//! Triad/seventh construction by stacked intervals above a root, with
//! inversion support. Interval tables follow the same shape as the
//! `ChordKind` enum in the `lokrain-music` pack repo's
//! `music-theory` crate, narrowed to the qualities named in the data
//! model (§3).

use crate::error::TheoryError;
use crate::theory::pitch::Pitch;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished,
    FullyDiminished,
}

impl ChordQuality {
    /// Semitone offsets above the root, in root position.
    #[must_use]
    pub const fn intervals(self) -> &'static [i32] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::HalfDiminished => &[0, 3, 6, 10],
            Self::FullyDiminished => &[0, 3, 6, 9],
        }
    }

    /// Major if triad is major/augmented; minor if minor/diminished.
    /// Used to derive Roman-numeral casing (spec property 5).
    #[must_use]
    pub fn is_major_cased(self) -> bool {
        matches!(self, Self::Major | Self::Augmented | Self::Dominant7 | Self::Major7)
    }

    #[must_use]
    pub fn is_diminished(self) -> bool {
        matches!(self, Self::Diminished | Self::HalfDiminished | Self::FullyDiminished)
    }

    pub fn parse(name: &str) -> Result<Self, TheoryError> {
        match name {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "diminished" => Ok(Self::Diminished),
            "augmented" => Ok(Self::Augmented),
            "dominant7" => Ok(Self::Dominant7),
            "major7" => Ok(Self::Major7),
            "minor7" => Ok(Self::Minor7),
            "half-diminished" => Ok(Self::HalfDiminished),
            "fully-diminished" => Ok(Self::FullyDiminished),
            other => Err(TheoryError::UnknownChordQuality(other.to_string())),
        }
    }
}

/// A built chord: root, quality, inversion, and the resulting voicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub root_pitch: Pitch,
    pub quality: ChordQuality,
    pub inversion: u32,
    pub voiced_pitches: SmallVec<[Pitch; 4]>,
}

impl Chord {
    #[must_use]
    pub fn chord_size(&self) -> usize {
        self.quality.intervals().len()
    }
}

/// Stack `quality`'s intervals above `root_pitch`, then raise the
/// lowest `inversion mod chord_size` tones by an octave and re-sort.
/// Arithmetic that would leave `[0, 127]` is folded back in by octave
/// rather than dropped, so a chord always keeps all of its tones.
#[must_use]
pub fn build_chord(root_pitch: Pitch, quality: ChordQuality, inversion: u32) -> Chord {
    let intervals = quality.intervals();
    let chord_size = intervals.len();
    let inversion = inversion % chord_size as u32;

    let mut tones: Vec<i32> = intervals.iter().map(|i| root_pitch.as_i32() + i).collect();
    for tone in tones.iter_mut().take(inversion as usize) {
        *tone += 12;
    }
    tones.sort_unstable();

    let voiced_pitches = tones.into_iter().map(Pitch::fold_into_range).collect();

    Chord {
        root_pitch,
        quality,
        inversion,
        voiced_pitches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[test]
    fn c_major_root_position() {
        let chord = build_chord(p(60), ChordQuality::Major, 0);
        let values: Vec<u8> = chord.voiced_pitches.iter().map(|x| x.value()).collect();
        assert_eq!(values, vec![60, 64, 67]);
    }

    #[test]
    fn first_inversion_lifts_lowest_tone() {
        let chord = build_chord(p(60), ChordQuality::Major, 1);
        let values: Vec<u8> = chord.voiced_pitches.iter().map(|x| x.value()).collect();
        assert_eq!(values, vec![64, 67, 72]);
    }

    #[test]
    fn inversion_wraps_modulo_chord_size() {
        let triad = build_chord(p(60), ChordQuality::Major, 3);
        let root_position = build_chord(p(60), ChordQuality::Major, 0);
        assert_eq!(triad.voiced_pitches, root_position.voiced_pitches);
    }

    #[test]
    fn voiced_pitches_always_sorted() {
        for inversion in 0..4 {
            let chord = build_chord(p(60), ChordQuality::Dominant7, inversion);
            let mut sorted = chord.voiced_pitches.clone();
            sorted.sort_unstable();
            assert_eq!(chord.voiced_pitches, sorted);
        }
    }

    #[test]
    fn dominant_seventh_on_g() {
        let chord = build_chord(p(67), ChordQuality::Dominant7, 0);
        let values: Vec<u8> = chord.voiced_pitches.iter().map(|x| x.value()).collect();
        assert_eq!(values, vec![67, 71, 74, 77]);
    }

    #[test]
    fn casing_rule_matches_property_five() {
        assert!(ChordQuality::Major.is_major_cased());
        assert!(ChordQuality::Augmented.is_major_cased());
        assert!(!ChordQuality::Minor.is_major_cased());
        assert!(!ChordQuality::Diminished.is_major_cased());
        assert!(ChordQuality::Diminished.is_diminished());
        assert!(ChordQuality::HalfDiminished.is_diminished());
        assert!(!ChordQuality::Major.is_diminished());
    }

    #[test]
    fn unknown_quality_name_is_an_error() {
        assert!(matches!(
            ChordQuality::parse("power-chord"),
            Err(TheoryError::UnknownChordQuality(_))
        ));
    }
}
