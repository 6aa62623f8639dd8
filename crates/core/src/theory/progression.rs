//! Progression templates & generator (spec §4.6).

use crate::error::TheoryError;
use crate::theory::chord::Chord;
use crate::theory::diatonic::diatonic_chords;
use crate::theory::pitch::Pitch;
use crate::theory::scale::ScaleId;

/// A parsed Roman numeral: scale degree (1..=7) plus whatever
/// modifiers were present in the text. The modifiers are informational
/// only — spec §4.6 resolves a Roman numeral purely by degree, via the
/// diatonic harmoniser, so "ii" and "II" both resolve to the same
/// (correct) diatonic chord at degree 2. Round-tripping a progression
/// that already used the diatonic-correct casing reproduces it exactly
/// (spec §8's round-trip law); the input case is not otherwise
/// validated against the diatonic quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRoman {
    pub degree: usize,
    pub diminished_marker: bool,
}

/// Parse a Roman numeral like "I", "vii\u{b0}", "IV". Case-insensitive
/// on the numeral itself; accepts an optional trailing `°`.
pub fn parse_roman(text: &str) -> Result<ParsedRoman, TheoryError> {
    let trimmed = text.trim();
    let (numeral, diminished_marker) = match trimmed.strip_suffix('\u{b0}') {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };
    let upper = numeral.to_uppercase();
    let degree = match upper.as_str() {
        "I" => 1,
        "II" => 2,
        "III" => 3,
        "IV" => 4,
        "V" => 5,
        "VI" => 6,
        "VII" => 7,
        _ => return Err(TheoryError::UnknownRoman(text.to_string())),
    };
    Ok(ParsedRoman {
        degree,
        diminished_marker,
    })
}

/// Resolve a sequence of Roman numerals against a (root, scale) pair
/// into realised chords in root position (spec §4.6 resolution steps
/// a-c).
pub fn expand_progression(
    root_pitch: Pitch,
    scale_id: ScaleId,
    roman_sequence: &[&str],
) -> Result<Vec<Chord>, TheoryError> {
    let diatonic = diatonic_chords(root_pitch, scale_id);
    roman_sequence
        .iter()
        .map(|text| {
            let parsed = parse_roman(text)?;
            diatonic
                .get(parsed.degree - 1)
                .map(Chord::from)
                .ok_or_else(|| TheoryError::UnknownRoman((*text).to_string()))
        })
        .collect()
}

/// {id, romanSequence, genre, description}.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionTemplate {
    pub id: &'static str,
    pub roman_sequence: &'static [&'static str],
    pub genre: &'static str,
    pub description: &'static str,
}

pub static ALL_TEMPLATES: &[ProgressionTemplate] = &[
    ProgressionTemplate {
        id: "classic-cadence",
        roman_sequence: &["I", "IV", "V", "I"],
        genre: "classical",
        description: "Tonic-subdominant-dominant-tonic, the textbook cadence.",
    },
    ProgressionTemplate {
        id: "pop-axis",
        roman_sequence: &["I", "V", "vi", "IV"],
        genre: "pop",
        description: "The four-chord 'axis' progression behind countless pop songs.",
    },
    ProgressionTemplate {
        id: "fifties-doo-wop",
        roman_sequence: &["I", "vi", "IV", "V"],
        genre: "doo-wop",
        description: "The 1950s doo-wop changes.",
    },
    ProgressionTemplate {
        id: "jazz-two-five-one",
        roman_sequence: &["ii", "V", "I"],
        genre: "jazz",
        description: "The ii-V-I cadence, the backbone of jazz harmony.",
    },
    ProgressionTemplate {
        id: "minor-two-five-one",
        roman_sequence: &["ii\u{b0}", "V", "i"],
        genre: "jazz",
        description: "Minor-key ii-V-i with a half-diminished supertonic.",
    },
    ProgressionTemplate {
        id: "andalusian-cadence",
        roman_sequence: &["i", "VII", "VI", "V"],
        genre: "flamenco",
        description: "Descending Andalusian cadence.",
    },
    ProgressionTemplate {
        id: "jazz-turnaround",
        roman_sequence: &["vi", "ii", "V", "I"],
        genre: "jazz",
        description: "vi-ii-V-I turnaround back to the tonic.",
    },
    ProgressionTemplate {
        id: "pachelbel-walk",
        roman_sequence: &["I", "V", "vi", "iii", "IV", "I", "IV", "V"],
        genre: "classical",
        description: "The eight-chord Pachelbel's Canon ground bass.",
    },
    ProgressionTemplate {
        id: "lofi-loop",
        roman_sequence: &["ii", "V", "I", "vi"],
        genre: "lo-fi",
        description: "A relaxed ii-V-I-vi loop suited to a lo-fi groove.",
    },
    ProgressionTemplate {
        id: "blues-turnaround",
        roman_sequence: &["I", "IV", "I", "V"],
        genre: "blues",
        description: "A simple blues-adjacent turnaround.",
    },
    ProgressionTemplate {
        id: "minor-lament",
        roman_sequence: &["i", "VI", "III", "VII"],
        genre: "lo-fi",
        description: "Descending minor-key lament bass.",
    },
    ProgressionTemplate {
        id: "plagal-amen",
        roman_sequence: &["IV", "I"],
        genre: "classical",
        description: "The plagal 'amen' cadence.",
    },
];

#[must_use]
pub fn list_templates() -> &'static [ProgressionTemplate] {
    ALL_TEMPLATES
}

pub fn get_template(id: &str) -> Result<&'static ProgressionTemplate, TheoryError> {
    ALL_TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| TheoryError::UnknownTemplate(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::chord::ChordQuality;

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[test]
    fn catalogue_has_at_least_ten_templates() {
        assert!(ALL_TEMPLATES.len() >= 10);
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(matches!(
            get_template("does-not-exist"),
            Err(TheoryError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn ii_v_i_in_f_major_root_pitches() {
        // Scenario S3.
        let chords = expand_progression(p(65), ScaleId::Major, &["ii", "V", "I"]).unwrap();
        let roots: Vec<u8> = chords.iter().map(|c| c.root_pitch.value()).collect();
        assert_eq!(roots, vec![67, 72, 65]);
    }

    #[test]
    fn i_iv_v_i_in_c_major() {
        let chords = expand_progression(p(60), ScaleId::Major, &["I", "IV", "V", "I"]).unwrap();
        assert_eq!(chords.len(), 4);
        assert_eq!(chords[0].quality, ChordQuality::Major);
        assert_eq!(chords[1].root_pitch.value(), 65);
        assert_eq!(chords[2].root_pitch.value(), 67);
    }

    #[test]
    fn unparseable_roman_numeral_is_an_error() {
        assert!(matches!(
            expand_progression(p(60), ScaleId::Major, &["IX"]),
            Err(TheoryError::UnknownRoman(_))
        ));
    }

    #[test]
    fn round_trip_reproduces_correctly_cased_input() {
        let input = ["I", "ii", "iii", "IV", "V", "vi", "vii\u{b0}"];
        let chords = expand_progression(p(60), ScaleId::Major, &input).unwrap();
        let diatonic = diatonic_chords(p(60), ScaleId::Major);
        let romans: Vec<String> = chords
            .iter()
            .map(|c| {
                diatonic
                    .iter()
                    .find(|d| d.voiced_pitches == c.voiced_pitches)
                    .map(|d| d.roman.clone())
                    .unwrap()
            })
            .collect();
        for (got, expected) in romans.iter().zip(input.iter()) {
            assert_eq!(got, expected);
        }
    }
}
