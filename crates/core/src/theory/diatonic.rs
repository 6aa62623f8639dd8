//! Diatonic harmoniser (spec §4.4).
//!
//! Builds the diatonic chords of a scale by stacking scale tones in
//! thirds (degrees i, i+2, i+4, wrapping across octaves) and classifies
//! the resulting triad quality, Roman-numeral label, and harmonic
//! function.

use crate::theory::chord::{Chord, ChordQuality};
use crate::theory::pitch::Pitch;
use crate::theory::scale::{get_scale, ScaleId};
use smallvec::SmallVec;

/// Role of a chord within a key. The data model (spec §3) names
/// `{tonic, pre-dominant, subdominant, dominant, relative, other}`; the
/// worked example in spec §8 (scenario S1) additionally distinguishes a
/// `tonic-substitute` role for scale degree 3 from the `relative` role
/// of degree 6, so both are kept as distinct variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicFunction {
    Tonic,
    PreDominant,
    Subdominant,
    Dominant,
    Relative,
    TonicSubstitute,
    Other,
}

/// Fixed degree -> function lookup table (spec §4.4). The same table
/// is used for major-family and minor-family scales: the degree's role
/// in the key does not change between major and minor, only the chord
/// quality built on it does.
fn harmonic_function_for_degree(degree_one_indexed: usize) -> HarmonicFunction {
    match (degree_one_indexed - 1) % 7 {
        0 => HarmonicFunction::Tonic,
        1 => HarmonicFunction::PreDominant,
        2 => HarmonicFunction::TonicSubstitute,
        3 => HarmonicFunction::Subdominant,
        4 => HarmonicFunction::Dominant,
        5 => HarmonicFunction::Relative,
        6 => HarmonicFunction::Dominant, // leading-tone chord
        _ => HarmonicFunction::Other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiatonicChord {
    pub root_pitch: Pitch,
    pub quality: ChordQuality,
    pub inversion: u32,
    pub voiced_pitches: SmallVec<[Pitch; 4]>,
    pub roman: String,
    pub scale_degree: usize,
    pub harmonic_function: HarmonicFunction,
}

impl From<&DiatonicChord> for Chord {
    fn from(d: &DiatonicChord) -> Chord {
        Chord {
            root_pitch: d.root_pitch,
            quality: d.quality,
            inversion: d.inversion,
            voiced_pitches: d.voiced_pitches.clone(),
        }
    }
}

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

fn roman_label(degree_one_indexed: usize, quality: ChordQuality) -> String {
    let numeral = NUMERALS[(degree_one_indexed - 1) % 7];
    let mut label = if quality.is_major_cased() {
        numeral.to_string()
    } else {
        numeral.to_lowercase()
    };
    if quality.is_diminished() {
        label.push('\u{b0}'); // °
    }
    label
}

/// Classify a 3-tone interval stack (offsets above the root, mod 12,
/// ascending) as one of the four triad qualities.
fn classify_triad(third: i32, fifth: i32) -> ChordQuality {
    match (third, fifth) {
        (4, 7) => ChordQuality::Major,
        (3, 7) => ChordQuality::Minor,
        (3, 6) => ChordQuality::Diminished,
        (4, 8) => ChordQuality::Augmented,
        _ => ChordQuality::Major, // non-heptatonic scales (pentatonic, blues) can stack outside the four textbook triads
    }
}

/// The diatonic triads of `scale_id` rooted at `root_pitch`, one per
/// scale degree.
#[must_use]
pub fn diatonic_chords(root_pitch: Pitch, scale_id: ScaleId) -> Vec<DiatonicChord> {
    let descriptor = get_scale(scale_id);
    let len = descriptor.ascending_intervals.len();

    // Absolute semitone offsets above the root for two octaves of scale
    // tones, so degree+2 / degree+4 can read past the top of the scale.
    let mut offsets: Vec<i32> = Vec::with_capacity(len * 3);
    for octave in 0..3 {
        for interval in descriptor.ascending_intervals {
            offsets.push(interval + octave * 12);
        }
    }

    (0..len)
        .map(|i| {
            let degree = i + 1;
            let root_offset = offsets[i];
            let third_offset = offsets[i + 2] - root_offset;
            let fifth_offset = offsets[i + 4] - root_offset;
            let quality = classify_triad(third_offset, fifth_offset);

            // Built directly from the scale's own tones (not from the
            // classified quality's canonical interval table), so every
            // voiced pitch is guaranteed to be an actual scale member
            // even for non-heptatonic catalogue scales where the
            // stacked-thirds triad doesn't match a textbook quality.
            let mut voiced_pitches: SmallVec<[Pitch; 4]> = [
                offsets[i],
                offsets[i + 2],
                offsets[i + 4],
            ]
            .into_iter()
            .map(|offset| Pitch::fold_into_range(root_pitch.as_i32() + offset))
            .collect();
            voiced_pitches.sort_unstable();
            let chord_root = Pitch::fold_into_range(root_pitch.as_i32() + root_offset);

            DiatonicChord {
                root_pitch: chord_root,
                quality,
                inversion: 0,
                voiced_pitches,
                roman: roman_label(degree, quality),
                scale_degree: degree,
                harmonic_function: harmonic_function_for_degree(degree),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[test]
    fn c_major_seven_diatonic_triads() {
        let chords = diatonic_chords(p(60), ScaleId::Major);
        let romans: Vec<&str> = chords.iter().map(|c| c.roman.as_str()).collect();
        assert_eq!(romans, vec!["I", "ii", "iii", "IV", "V", "vi", "vii\u{b0}"]);

        let expected_roots = [60, 62, 64, 65, 67, 69, 71];
        let expected_thirds = [64, 65, 67, 69, 71, 72, 74];
        let expected_fifths = [67, 69, 71, 72, 74, 76, 77];
        for (i, chord) in chords.iter().enumerate() {
            let values: Vec<u8> = chord.voiced_pitches.iter().map(|x| x.value()).collect();
            assert_eq!(values[0], expected_roots[i]);
            assert_eq!(values[1], expected_thirds[i]);
            assert_eq!(values[2], expected_fifths[i]);
        }
    }

    #[test]
    fn c_major_harmonic_functions() {
        let chords = diatonic_chords(p(60), ScaleId::Major);
        let functions: Vec<HarmonicFunction> =
            chords.iter().map(|c| c.harmonic_function).collect();
        assert_eq!(
            functions,
            vec![
                HarmonicFunction::Tonic,
                HarmonicFunction::PreDominant,
                HarmonicFunction::TonicSubstitute,
                HarmonicFunction::Subdominant,
                HarmonicFunction::Dominant,
                HarmonicFunction::Relative,
                HarmonicFunction::Dominant,
            ]
        );
    }

    #[test]
    fn diatonic_closure_holds_for_every_catalogue_scale() {
        use crate::theory::scale::{is_in_scale, ALL_SCALES};
        let root = p(60);
        for descriptor in ALL_SCALES {
            if descriptor.ascending_intervals.len() < 5 {
                continue; // triad stacking needs at least 5 scale tones (i, i+2, i+4)
            }
            for chord in diatonic_chords(root, descriptor.id) {
                for pitch in &chord.voiced_pitches {
                    assert!(
                        is_in_scale(*pitch, root, descriptor.id),
                        "{:?} tone {:?} not in {:?}",
                        chord.roman,
                        pitch,
                        descriptor.id
                    );
                }
            }
        }
    }

    #[test]
    fn roman_casing_matches_property_five() {
        let chords = diatonic_chords(p(60), ScaleId::Major);
        for chord in &chords {
            let first_char_upper = chord
                .roman
                .chars()
                .next()
                .map(|c| c.is_uppercase())
                .unwrap_or(false);
            assert_eq!(first_char_upper, chord.quality.is_major_cased());
            if chord.quality.is_diminished() {
                assert!(chord.roman.ends_with('\u{b0}'));
            }
        }
    }
}
