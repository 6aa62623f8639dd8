//! Voice-leading optimiser (spec §4.5).
//!
//! Chooses inversions/octaves for each chord in a progression to
//! minimise the total semitone motion between successive voicings.

use crate::theory::chord::{build_chord, Chord};
use crate::theory::pitch::Pitch;
use smallvec::SmallVec;

const OCTAVE_SHIFTS: [i32; 3] = [-12, 0, 12];

fn shift_chord(chord: &Chord, shift: i32) -> Chord {
    let mut voiced_pitches: SmallVec<[Pitch; 4]> = chord
        .voiced_pitches
        .iter()
        .map(|p| Pitch::fold_into_range(p.as_i32() + shift))
        .collect();
    voiced_pitches.sort_unstable();
    Chord {
        root_pitch: Pitch::fold_into_range(chord.root_pitch.as_i32() + shift),
        quality: chord.quality,
        inversion: chord.inversion,
        voiced_pitches,
    }
}

/// Three inversions times three octave offsets, per spec §4.5's
/// "small, fixed set of variants per chord" (§9 open question 2 notes
/// implementers may expand this set as long as property 6 still
/// holds — it does, since the identity variant is always included).
fn candidate_variants(chord: &Chord) -> Vec<Chord> {
    let chord_size = chord.chord_size() as u32;
    let mut out = Vec::with_capacity(chord_size as usize * OCTAVE_SHIFTS.len());
    for inversion in 0..chord_size {
        let inverted = build_chord(chord.root_pitch, chord.quality, inversion);
        for shift in OCTAVE_SHIFTS {
            out.push(shift_chord(&inverted, shift));
        }
    }
    out
}

/// Total absolute semitone motion and the largest single-voice leap
/// between two voicings, matched by sorted order. Unequal voicing
/// sizes are matched up to the shorter length's last voice repeated,
/// so every extra voice in the larger chord is still compared against
/// something instead of being ignored.
fn motion(prev: &[Pitch], next: &[Pitch]) -> (i32, i32) {
    let len = prev.len().max(next.len());
    let mut total = 0;
    let mut max_leap = 0;
    for i in 0..len {
        let a = prev.get(i).or_else(|| prev.last()).unwrap();
        let b = next.get(i).or_else(|| next.last()).unwrap();
        let d = (a.as_i32() - b.as_i32()).abs();
        total += d;
        max_leap = max_leap.max(d);
    }
    (total, max_leap)
}

/// Re-voice `chords` to minimise inter-chord motion. The first chord
/// is left exactly as given (spec: "uses a default voicing centred
/// near the scale root's octave" — true by construction, since it was
/// already built from that root). Every later chord is replaced by the
/// inversion/octave variant minimising L1 distance from the previous
/// realised voicing, breaking ties by the smallest maximum single-voice
/// leap and then by the lowest bass note.
#[must_use]
pub fn optimise(chords: &[Chord]) -> Vec<Chord> {
    let mut result: Vec<Chord> = Vec::with_capacity(chords.len());
    for (index, chord) in chords.iter().enumerate() {
        if index == 0 {
            result.push(chord.clone());
            continue;
        }
        let prev = result.last().expect("first chord already pushed");
        let best = candidate_variants(chord)
            .into_iter()
            .min_by(|a, b| {
                let (da, la) = motion(&prev.voiced_pitches, &a.voiced_pitches);
                let (db, lb) = motion(&prev.voiced_pitches, &b.voiced_pitches);
                da.cmp(&db)
                    .then(la.cmp(&lb))
                    .then(a.voiced_pitches[0].cmp(&b.voiced_pitches[0]))
            })
            .expect("candidate_variants always yields at least one variant");
        result.push(best);
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLeadingReport {
    pub total_distance: i32,
    pub average_distance: f64,
    pub quality_rating: QualityRating,
    pub suggestions: Vec<String>,
}

const LARGE_LEAP_THRESHOLD: i32 = 7;

/// Rate a realised progression's voice leading. Thresholds on
/// `average_distance` per spec §4.5: <=3 excellent, <=6 good, <=10
/// fair, else poor.
#[must_use]
pub fn analyse_voice_leading(realised: &[Chord]) -> VoiceLeadingReport {
    if realised.len() < 2 {
        return VoiceLeadingReport {
            total_distance: 0,
            average_distance: 0.0,
            quality_rating: QualityRating::Excellent,
            suggestions: Vec::new(),
        };
    }

    let mut total_distance = 0;
    let mut suggestions = Vec::new();
    for (i, pair) in realised.windows(2).enumerate() {
        let (distance, leap) = motion(&pair[0].voiced_pitches, &pair[1].voiced_pitches);
        total_distance += distance;
        if leap > LARGE_LEAP_THRESHOLD {
            suggestions.push(format!(
                "transition {} -> {}: {} semitone leap in one voice, consider a different inversion",
                i + 1,
                i + 2,
                leap
            ));
        }
    }

    let transitions = (realised.len() - 1) as f64;
    let average_distance = total_distance as f64 / transitions;
    let quality_rating = if average_distance <= 3.0 {
        QualityRating::Excellent
    } else if average_distance <= 6.0 {
        QualityRating::Good
    } else if average_distance <= 10.0 {
        QualityRating::Fair
    } else {
        QualityRating::Poor
    };

    VoiceLeadingReport {
        total_distance,
        average_distance,
        quality_rating,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::chord::ChordQuality;

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[test]
    fn optimise_never_increases_total_distance_for_two_chords() {
        let progressions = [
            (p(60), ChordQuality::Major, p(65), ChordQuality::Major),
            (p(60), ChordQuality::Major, p(67), ChordQuality::Dominant7),
            (p(48), ChordQuality::Minor, p(72), ChordQuality::Major),
            (p(20), ChordQuality::Diminished, p(100), ChordQuality::Minor7),
        ];
        for (r0, q0, r1, q1) in progressions {
            let original = vec![build_chord(r0, q0, 0), build_chord(r1, q1, 0)];
            let optimised = optimise(&original);
            let original_report = analyse_voice_leading(&original);
            let optimised_report = analyse_voice_leading(&optimised);
            assert!(
                optimised_report.total_distance <= original_report.total_distance,
                "optimised {} > original {} for {:?}",
                optimised_report.total_distance,
                original_report.total_distance,
                (r0, q0, r1, q1)
            );
        }
    }

    #[test]
    fn i_iv_v_i_in_c_major_is_well_led() {
        use crate::theory::diatonic::diatonic_chords;
        use crate::theory::scale::ScaleId;

        let chords = diatonic_chords(p(60), ScaleId::Major);
        let progression: Vec<Chord> = [0usize, 3, 4, 0]
            .iter()
            .map(|&degree| (&chords[degree]).into())
            .collect();
        let optimised = optimise(&progression);
        let report = analyse_voice_leading(&optimised);
        assert!(matches!(
            report.quality_rating,
            QualityRating::Good | QualityRating::Excellent
        ));
    }

    #[test]
    fn quality_rating_thresholds() {
        fn report_with_average(average: f64) -> VoiceLeadingReport {
            VoiceLeadingReport {
                total_distance: 0,
                average_distance: average,
                quality_rating: if average <= 3.0 {
                    QualityRating::Excellent
                } else if average <= 6.0 {
                    QualityRating::Good
                } else if average <= 10.0 {
                    QualityRating::Fair
                } else {
                    QualityRating::Poor
                },
                suggestions: vec![],
            }
        }
        assert_eq!(report_with_average(3.0).quality_rating, QualityRating::Excellent);
        assert_eq!(report_with_average(6.0).quality_rating, QualityRating::Good);
        assert_eq!(report_with_average(10.0).quality_rating, QualityRating::Fair);
        assert_eq!(report_with_average(10.1).quality_rating, QualityRating::Poor);
    }
}
