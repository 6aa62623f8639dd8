//! `impl AudioSink for` a bridge fanning `ParameterStore` diffs out to
//! the concrete web nodes (C12's host-side half).
//!
//! The store dispatches one changed field at a time; this bridge keeps
//! a mirrored copy of each multi-field parameter group so it can push
//! a complete, consistent `SaturationParams`/`CompressorParams`/
//! `ReverbParams`/`Envelope` to the nodes that need the whole group.

use lofi_core::engine::effects::{CompressorParams, ReverbParams, SaturationParams};
use lofi_core::engine::store::{AudioSink, ParamPath, ParamValue};
use lofi_core::engine::voice::Envelope;
use lofi_core::engine::voices::NoteSink;
use std::cell::RefCell;
use std::rc::Rc;

use crate::effects_chain::EffectsChain;
use crate::voice_node::WebVoiceFactory;

pub struct WebAudioSink {
    effects: Rc<EffectsChain>,
    voices: Rc<RefCell<lofi_core::engine::voices::PolyVoiceManager<WebVoiceFactory>>>,
    envelope: Envelope,
    saturation: SaturationParams,
    compressor: CompressorParams,
    reverb: ReverbParams,
}

impl WebAudioSink {
    #[must_use]
    pub fn new(
        effects: Rc<EffectsChain>,
        voices: Rc<RefCell<lofi_core::engine::voices::PolyVoiceManager<WebVoiceFactory>>>,
    ) -> Self {
        Self {
            effects,
            voices,
            envelope: Envelope::default(),
            saturation: SaturationParams::new(0.2, 0.5),
            compressor: CompressorParams::new(-18.0, 3.0, 0.01, 0.2),
            reverb: ReverbParams::new(0.3, 2.5, 0.02, 0.4),
        }
    }
}

impl AudioSink for WebAudioSink {
    fn apply(&mut self, path: ParamPath, value: ParamValue, at_time: f64) {
        match (path, value) {
            (ParamPath::MasterLevel, ParamValue::Number(v)) => {
                self.effects.set_master_level(v, at_time);
            }
            (ParamPath::EnvelopeAttackSec, ParamValue::Number(v)) => {
                self.envelope = Envelope::new(v, self.envelope.decay_sec, self.envelope.sustain_level, self.envelope.release_sec);
                self.voices.borrow_mut().set_default_envelope(self.envelope);
            }
            (ParamPath::EnvelopeDecaySec, ParamValue::Number(v)) => {
                self.envelope = Envelope::new(self.envelope.attack_sec, v, self.envelope.sustain_level, self.envelope.release_sec);
                self.voices.borrow_mut().set_default_envelope(self.envelope);
            }
            (ParamPath::EnvelopeSustainLevel, ParamValue::Number(v)) => {
                self.envelope = Envelope::new(self.envelope.attack_sec, self.envelope.decay_sec, v, self.envelope.release_sec);
                self.voices.borrow_mut().set_default_envelope(self.envelope);
            }
            (ParamPath::EnvelopeReleaseSec, ParamValue::Number(v)) => {
                self.envelope = Envelope::new(self.envelope.attack_sec, self.envelope.decay_sec, self.envelope.sustain_level, v);
                self.voices.borrow_mut().set_default_envelope(self.envelope);
            }
            (ParamPath::SaturationAmount, ParamValue::Number(v)) => {
                self.saturation = SaturationParams::new(v, self.saturation.tone);
                self.effects.apply_saturation(self.saturation, at_time);
            }
            (ParamPath::SaturationTone, ParamValue::Number(v)) => {
                self.saturation = SaturationParams::new(self.saturation.amount, v);
                self.effects.apply_saturation(self.saturation, at_time);
            }
            (ParamPath::CompressorThresholdDb, ParamValue::Number(v)) => {
                self.compressor = CompressorParams::new(v, self.compressor.ratio, self.compressor.attack_sec, self.compressor.release_sec);
                self.effects.apply_compressor(self.compressor, at_time);
            }
            (ParamPath::CompressorRatio, ParamValue::Number(v)) => {
                self.compressor = CompressorParams::new(self.compressor.threshold_db, v, self.compressor.attack_sec, self.compressor.release_sec);
                self.effects.apply_compressor(self.compressor, at_time);
            }
            (ParamPath::CompressorAttackSec, ParamValue::Number(v)) => {
                self.compressor = CompressorParams::new(self.compressor.threshold_db, self.compressor.ratio, v, self.compressor.release_sec);
                self.effects.apply_compressor(self.compressor, at_time);
            }
            (ParamPath::CompressorReleaseSec, ParamValue::Number(v)) => {
                self.compressor = CompressorParams::new(self.compressor.threshold_db, self.compressor.ratio, self.compressor.attack_sec, v);
                self.effects.apply_compressor(self.compressor, at_time);
            }
            (ParamPath::ReverbRoomMix, ParamValue::Number(v)) => {
                self.reverb = ReverbParams::new(v, self.reverb.decay_sec, self.reverb.pre_delay_sec, self.reverb.feedback());
                self.effects.apply_reverb(self.reverb, at_time);
            }
            (ParamPath::ReverbDecaySec, ParamValue::Number(v)) => {
                self.reverb = ReverbParams::new(self.reverb.room_mix, v, self.reverb.pre_delay_sec, self.reverb.feedback());
                self.effects.apply_reverb(self.reverb, at_time);
            }
            (ParamPath::ReverbPreDelaySec, ParamValue::Number(v)) => {
                self.reverb = ReverbParams::new(self.reverb.room_mix, self.reverb.decay_sec, v, self.reverb.feedback());
                self.effects.apply_reverb(self.reverb, at_time);
            }
            (ParamPath::AgeAmount, ParamValue::Number(v)) => {
                let mapping = lofi_core::engine::effects::map_age(v);
                self.effects.apply_age_offset(mapping.saturation_offset, mapping.high_shelf_attenuation_db, at_time);
            }
            // Tempo, chord duration, and loop toggling are read directly from
            // `ParameterStore::chord` by the scheduler when `play()` is next
            // called; no live node needs to observe them mid-playback.
            (ParamPath::ChordTempoBpm, _)
            | (ParamPath::ChordDurationBeats, _)
            | (ParamPath::ChordLoopEnabled, _) => {}
            _ => {}
        }
    }
}

/// Delegates `NoteSink` to the shared voice manager, so the scheduler
/// and input adapters can be handed one small owned sink rather than a
/// borrow of the whole `Rc<RefCell<..>>`.
pub struct SharedVoiceSink {
    voices: Rc<RefCell<lofi_core::engine::voices::PolyVoiceManager<WebVoiceFactory>>>,
}

impl SharedVoiceSink {
    #[must_use]
    pub fn new(voices: Rc<RefCell<lofi_core::engine::voices::PolyVoiceManager<WebVoiceFactory>>>) -> Self {
        Self { voices }
    }
}

impl NoteSink for SharedVoiceSink {
    fn note_on(&mut self, pitch: lofi_core::theory::pitch::Pitch, velocity: f64, at_time: f64) {
        self.voices.borrow_mut().note_on(pitch, velocity, at_time);
    }
    fn note_off(&mut self, pitch: lofi_core::theory::pitch::Pitch, at_time: f64) {
        self.voices.borrow_mut().note_off(pitch, at_time);
    }
}
