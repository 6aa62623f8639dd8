//! Parameter store (spec §4.12, §6 UI interface).
//!
//! The canonical mutable record of every user-facing parameter.
//! Exclusively owned by this component; audio components read it only
//! through the diffs `update()` dispatches to their setters.

use crate::engine::effects::EffectChainParams;
use crate::engine::voice::Envelope;
use crate::error::AudioStatus;
use crate::theory::chord::Chord;
use crate::theory::pitch::Pitch;
use crate::theory::scale::ScaleId;
use std::collections::HashSet;

/// Addressable leaf under the store's reactive paths (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamPath {
    MasterLevel,
    EnvelopeAttackSec,
    EnvelopeDecaySec,
    EnvelopeSustainLevel,
    EnvelopeReleaseSec,
    SaturationAmount,
    SaturationTone,
    CompressorThresholdDb,
    CompressorRatio,
    CompressorAttackSec,
    CompressorReleaseSec,
    ReverbRoomMix,
    ReverbDecaySec,
    ReverbPreDelaySec,
    AgeAmount,
    ChordTempoBpm,
    ChordDurationBeats,
    ChordLoopEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
}

/// Chord-generator selection (spec §3 data model).
#[derive(Debug, Clone)]
pub struct ChordSelection {
    pub root_pitch: Pitch,
    pub scale_id: ScaleId,
    pub current_progression_template: Option<&'static str>,
    pub current_realised_progression: Vec<Chord>,
    pub tempo_bpm: f64,
    pub chord_duration_beats: f64,
    pub loop_enabled: bool,
}

impl Default for ChordSelection {
    fn default() -> Self {
        Self {
            root_pitch: Pitch::new(60).expect("60 is in range"),
            scale_id: ScaleId::Major,
            current_progression_template: None,
            current_realised_progression: Vec::new(),
            tempo_bpm: 90.0,
            chord_duration_beats: 2.0,
            loop_enabled: false,
        }
    }
}

/// Routes a clamped parameter write to its owning audio component,
/// at `getClock()` time (spec §4.12). The wasm host wires this to the
/// actual C8/C10 setters; a recording fake backs the unit tests.
pub trait AudioSink {
    fn apply(&mut self, path: ParamPath, value: ParamValue, at_time: f64);
}

/// {masterLevel, envelope, chord-generator selection, effect chain
/// state, activeVoices} (spec §3).
pub struct ParameterStore {
    pub master_level: f64,
    pub envelope: Envelope,
    pub chord: ChordSelection,
    pub effects: EffectChainParams,
    pub active_voices: HashSet<u8>,
    pub status: AudioStatus,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            master_level: 0.8,
            envelope: Envelope::default(),
            chord: ChordSelection::default(),
            effects: EffectChainParams::default(),
            active_voices: HashSet::new(),
            status: AudioStatus::default(),
        }
    }
}

impl ParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates, clamps, writes, and dispatches a diff to the owning
    /// audio component. UI observers (not modelled here beyond this
    /// return value) never block this path.
    pub fn update(&mut self, path: ParamPath, value: ParamValue, at_time: f64, sink: &mut impl AudioSink) {
        let clamped = match (path, value) {
            (ParamPath::MasterLevel, ParamValue::Number(v)) => {
                self.master_level = v.clamp(0.0, 1.0);
                ParamValue::Number(self.master_level)
            }
            (ParamPath::EnvelopeAttackSec, ParamValue::Number(v)) => {
                self.envelope.attack_sec = v.clamp(0.001, 2.0);
                ParamValue::Number(self.envelope.attack_sec)
            }
            (ParamPath::EnvelopeDecaySec, ParamValue::Number(v)) => {
                self.envelope.decay_sec = v.clamp(0.001, 4.0);
                ParamValue::Number(self.envelope.decay_sec)
            }
            (ParamPath::EnvelopeSustainLevel, ParamValue::Number(v)) => {
                self.envelope.sustain_level = v.clamp(0.0, 1.0);
                ParamValue::Number(self.envelope.sustain_level)
            }
            (ParamPath::EnvelopeReleaseSec, ParamValue::Number(v)) => {
                self.envelope.release_sec = v.clamp(0.001, 8.0);
                ParamValue::Number(self.envelope.release_sec)
            }
            (ParamPath::SaturationAmount, ParamValue::Number(v)) => {
                self.effects.saturation.amount = v.clamp(0.0, 1.0);
                ParamValue::Number(self.effects.saturation.amount)
            }
            (ParamPath::SaturationTone, ParamValue::Number(v)) => {
                self.effects.saturation.tone = v.clamp(0.0, 1.0);
                ParamValue::Number(self.effects.saturation.tone)
            }
            (ParamPath::CompressorThresholdDb, ParamValue::Number(v)) => {
                self.effects.compressor.threshold_db = v.clamp(-60.0, 0.0);
                ParamValue::Number(self.effects.compressor.threshold_db)
            }
            (ParamPath::CompressorRatio, ParamValue::Number(v)) => {
                self.effects.compressor.ratio = v.clamp(1.0, 20.0);
                ParamValue::Number(self.effects.compressor.ratio)
            }
            (ParamPath::CompressorAttackSec, ParamValue::Number(v)) => {
                self.effects.compressor.attack_sec = v.max(0.0);
                ParamValue::Number(self.effects.compressor.attack_sec)
            }
            (ParamPath::CompressorReleaseSec, ParamValue::Number(v)) => {
                self.effects.compressor.release_sec = v.max(0.0);
                ParamValue::Number(self.effects.compressor.release_sec)
            }
            (ParamPath::ReverbRoomMix, ParamValue::Number(v)) => {
                self.effects.reverb.room_mix = v.clamp(0.0, 1.0);
                ParamValue::Number(self.effects.reverb.room_mix)
            }
            (ParamPath::ReverbDecaySec, ParamValue::Number(v)) => {
                self.effects.reverb.decay_sec = v.clamp(0.1, 10.0);
                ParamValue::Number(self.effects.reverb.decay_sec)
            }
            (ParamPath::ReverbPreDelaySec, ParamValue::Number(v)) => {
                self.effects.reverb.pre_delay_sec = v.clamp(0.0, 0.2);
                ParamValue::Number(self.effects.reverb.pre_delay_sec)
            }
            (ParamPath::AgeAmount, ParamValue::Number(v)) => {
                self.effects.age_amount = v.clamp(0.0, 1.0);
                ParamValue::Number(self.effects.age_amount)
            }
            (ParamPath::ChordTempoBpm, ParamValue::Number(v)) => {
                self.chord.tempo_bpm = v.clamp(30.0, 240.0);
                ParamValue::Number(self.chord.tempo_bpm)
            }
            (ParamPath::ChordDurationBeats, ParamValue::Number(v)) => {
                self.chord.chord_duration_beats = snap_to_duration(v);
                ParamValue::Number(self.chord.chord_duration_beats)
            }
            (ParamPath::ChordLoopEnabled, ParamValue::Bool(v)) => {
                self.chord.loop_enabled = v;
                ParamValue::Bool(v)
            }
            _ => return,
        };
        sink.apply(path, clamped, at_time);
    }
}

/// Snaps to the nearest declared chord-duration value (spec §6:
/// `chordDurationBeats in {0.25, 0.5, 1, 2, 4, 8}`).
fn snap_to_duration(value: f64) -> f64 {
    const ALLOWED: [f64; 6] = [0.25, 0.5, 1.0, 2.0, 4.0, 8.0];
    ALLOWED
        .iter()
        .copied()
        .min_by(|a, b| (a - value).abs().partial_cmp(&(b - value).abs()).unwrap())
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        applied: Vec<(ParamPath, ParamValue, f64)>,
    }
    impl AudioSink for RecordingSink {
        fn apply(&mut self, path: ParamPath, value: ParamValue, at_time: f64) {
            self.applied.push((path, value, at_time));
        }
    }

    #[test]
    fn update_clamps_and_dispatches_a_diff() {
        let mut store = ParameterStore::new();
        let mut sink = RecordingSink::default();
        store.update(ParamPath::MasterLevel, ParamValue::Number(5.0), 1.0, &mut sink);
        assert_eq!(store.master_level, 1.0);
        assert_eq!(sink.applied.len(), 1);
        assert!(matches!(sink.applied[0].1, ParamValue::Number(v) if v == 1.0));
    }

    #[test]
    fn repeated_identical_update_is_stable() {
        let mut store = ParameterStore::new();
        let mut sink = RecordingSink::default();
        store.update(ParamPath::MasterLevel, ParamValue::Number(0.9), 1.0, &mut sink);
        store.update(ParamPath::MasterLevel, ParamValue::Number(0.9), 1.03, &mut sink);
        assert_eq!(store.master_level, 0.9);
        assert_eq!(sink.applied.len(), 2);
    }

    #[test]
    fn chord_duration_snaps_to_nearest_declared_value() {
        let mut store = ParameterStore::new();
        let mut sink = RecordingSink::default();
        store.update(ParamPath::ChordDurationBeats, ParamValue::Number(3.0), 0.0, &mut sink);
        assert_eq!(store.chord.chord_duration_beats, 2.0);
    }

    #[test]
    fn compressor_ratio_clamps_to_declared_range() {
        let mut store = ParameterStore::new();
        let mut sink = RecordingSink::default();
        store.update(ParamPath::CompressorRatio, ParamValue::Number(50.0), 0.0, &mut sink);
        assert_eq!(store.effects.compressor.ratio, 20.0);
    }
}
