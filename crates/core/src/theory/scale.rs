//! Scale catalogue (spec §4.2).
//!
//! A fixed, immutable catalogue of named scales loaded at process
//! start. Each entry's interval pattern never changes; callers get
//! pitches by tiling the pattern over a root and octave range.

use crate::error::TheoryError;
use crate::theory::pitch::Pitch;

/// Stable string identifier for a catalogue scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleId {
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    PentatonicMajor,
    PentatonicMinor,
    Blues,
}

impl ScaleId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::NaturalMinor => "naturalMinor",
            Self::HarmonicMinor => "harmonicMinor",
            Self::MelodicMinor => "melodicMinor",
            Self::Ionian => "ionian",
            Self::Dorian => "dorian",
            Self::Phrygian => "phrygian",
            Self::Lydian => "lydian",
            Self::Mixolydian => "mixolydian",
            Self::Aeolian => "aeolian",
            Self::Locrian => "locrian",
            Self::PentatonicMajor => "pentatonicMajor",
            Self::PentatonicMinor => "pentatonicMinor",
            Self::Blues => "blues",
        }
    }

    pub fn parse(id: &str) -> Result<Self, TheoryError> {
        ALL_SCALES
            .iter()
            .find(|d| d.id.as_str() == id)
            .map(|d| d.id)
            .ok_or_else(|| TheoryError::UnknownScale(id.to_string()))
    }

    /// Whether this scale behaves as a "major family" scale for
    /// harmonic-function purposes (major third + perfect fifth above
    /// the tonic) as opposed to a "minor family" scale.
    #[must_use]
    pub fn is_major_family(self) -> bool {
        matches!(
            self,
            Self::Major | Self::Ionian | Self::Lydian | Self::Mixolydian
        )
    }
}

/// {id, displayName, ascendingIntervals}. `ascendingIntervals` is
/// strictly increasing, starts at 0, ends below 12.
#[derive(Debug, Clone, Copy)]
pub struct ScaleDescriptor {
    pub id: ScaleId,
    pub display_name: &'static str,
    pub ascending_intervals: &'static [i32],
}

macro_rules! scale {
    ($id:expr, $name:expr, $intervals:expr) => {
        ScaleDescriptor {
            id: $id,
            display_name: $name,
            ascending_intervals: $intervals,
        }
    };
}

pub static ALL_SCALES: &[ScaleDescriptor] = &[
    scale!(ScaleId::Major, "Major", &[0, 2, 4, 5, 7, 9, 11]),
    scale!(
        ScaleId::NaturalMinor,
        "Natural Minor",
        &[0, 2, 3, 5, 7, 8, 10]
    ),
    scale!(
        ScaleId::HarmonicMinor,
        "Harmonic Minor",
        &[0, 2, 3, 5, 7, 8, 11]
    ),
    scale!(
        ScaleId::MelodicMinor,
        "Melodic Minor (ascending)",
        &[0, 2, 3, 5, 7, 9, 11]
    ),
    scale!(ScaleId::Ionian, "Ionian", &[0, 2, 4, 5, 7, 9, 11]),
    scale!(ScaleId::Dorian, "Dorian", &[0, 2, 3, 5, 7, 9, 10]),
    scale!(ScaleId::Phrygian, "Phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    scale!(ScaleId::Lydian, "Lydian", &[0, 2, 4, 6, 7, 9, 11]),
    scale!(ScaleId::Mixolydian, "Mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    scale!(ScaleId::Aeolian, "Aeolian", &[0, 2, 3, 5, 7, 8, 10]),
    scale!(ScaleId::Locrian, "Locrian", &[0, 1, 3, 5, 6, 8, 10]),
    scale!(
        ScaleId::PentatonicMajor,
        "Pentatonic Major",
        &[0, 2, 4, 7, 9]
    ),
    scale!(
        ScaleId::PentatonicMinor,
        "Pentatonic Minor",
        &[0, 3, 5, 7, 10]
    ),
    scale!(ScaleId::Blues, "Blues", &[0, 3, 5, 6, 7, 10]),
];

#[must_use]
pub fn list_scales() -> &'static [ScaleDescriptor] {
    ALL_SCALES
}

pub fn get_scale(id: ScaleId) -> &'static ScaleDescriptor {
    ALL_SCALES
        .iter()
        .find(|d| d.id == id)
        .expect("ALL_SCALES covers every ScaleId variant")
}

/// Ascending pitches of `scale_id` rooted at `root`, tiled across
/// `octaves` octave repetitions and filtered to `[0, 127]`.
pub fn pitches_of_scale(root: Pitch, scale_id: ScaleId, octaves: u32) -> Vec<Pitch> {
    let descriptor = get_scale(scale_id);
    let mut pitches = Vec::new();
    for octave in 0..octaves.max(1) {
        for interval in descriptor.ascending_intervals {
            let candidate = root.as_i32() + interval + (octave as i32) * 12;
            if let Ok(p) = Pitch::new(candidate) {
                pitches.push(p);
            }
        }
    }
    pitches
}

/// Whether `pitch` belongs to `scale_id` rooted at `root`, modulo
/// octave.
#[must_use]
pub fn is_in_scale(pitch: Pitch, root: Pitch, scale_id: ScaleId) -> bool {
    let offset = (pitch.as_i32() - root.as_i32()).rem_euclid(12);
    get_scale(scale_id).ascending_intervals.contains(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_at_least_thirteen_scales() {
        assert!(ALL_SCALES.len() >= 13);
    }

    #[test]
    fn unknown_scale_is_an_error() {
        assert!(matches!(
            ScaleId::parse("not-a-scale"),
            Err(TheoryError::UnknownScale(_))
        ));
    }

    #[test]
    fn scale_membership_matches_pattern_length() {
        let root = Pitch::new(60).unwrap();
        for descriptor in ALL_SCALES {
            let pitches = pitches_of_scale(root, descriptor.id, 1);
            assert_eq!(pitches.len(), descriptor.ascending_intervals.len());
            for p in &pitches {
                let offset = (p.as_i32() - root.as_i32()).rem_euclid(12);
                assert!(descriptor.ascending_intervals.contains(&offset));
            }
        }
    }

    #[test]
    fn every_interval_pattern_is_well_formed() {
        for descriptor in ALL_SCALES {
            let intervals = descriptor.ascending_intervals;
            assert_eq!(intervals[0], 0);
            assert!(intervals.windows(2).all(|w| w[0] < w[1]));
            assert!(*intervals.last().unwrap() < 12);
        }
    }

    #[test]
    fn c_major_pitches() {
        let root = Pitch::new(60).unwrap();
        let pitches = pitches_of_scale(root, ScaleId::Major, 1);
        let values: Vec<u8> = pitches.iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![60, 62, 64, 65, 67, 69, 71]);
    }
}
