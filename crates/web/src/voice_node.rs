//! Concrete detuned-oscillator voice (C8), generalising the teacher's
//! `trigger_one_shot` single-oscillator-per-note pattern in
//! `audio.rs` into a small persistent stack of slightly detuned
//! oscillators summed into one gain node, so a voice can be pooled
//! and re-triggered rather than rebuilt per note.

use lofi_core::engine::voice::{Envelope, VoiceHandle};
use lofi_core::engine::voices::VoiceFactory;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

/// Cents offset of each stacked oscillator; the lo-fi "detuned unison"
/// character comes from a small spread around zero.
const DETUNE_CENTS: [f32; 3] = [-7.0, 0.0, 7.0];

/// Smoothing window for pitch glide, mirroring
/// `lofi_core::engine::voice::PITCH_SMOOTHING_SEC`.
const PITCH_GLIDE_SEC: f64 = 0.02;

pub struct OscillatorVoiceHandle {
    oscillators: Vec<OscillatorNode>,
    gain: GainNode,
}

impl OscillatorVoiceHandle {
    fn new(ctx: &AudioContext, destination: &AudioNode) -> Result<Self, JsValue> {
        let gain = GainNode::new(ctx)?;
        gain.gain().set_value(0.0);
        gain.connect_with_audio_node(destination)?;

        let mut oscillators = Vec::with_capacity(DETUNE_CENTS.len());
        for &cents in &DETUNE_CENTS {
            let osc = OscillatorNode::new(ctx)?;
            osc.set_type(OscillatorType::Triangle);
            osc.detune().set_value(cents);
            osc.connect_with_audio_node(&gain)?;
            osc.start()?;
            oscillators.push(osc);
        }

        Ok(Self { oscillators, gain })
    }
}

impl VoiceHandle for OscillatorVoiceHandle {
    fn set_frequency(&mut self, frequency_hz: f64, at_time: f64) {
        for osc in &self.oscillators {
            let param = osc.frequency();
            let _ = param.cancel_scheduled_values(at_time);
            let _ = param.set_value_at_time(param.value(), at_time);
            let _ = param.exponential_ramp_to_value_at_time(
                frequency_hz.max(1e-3) as f32,
                at_time + PITCH_GLIDE_SEC,
            );
        }
    }

    fn trigger(&mut self, velocity: f64, start_time: f64, envelope: Envelope) {
        let gain = self.gain.gain();
        let _ = gain.cancel_scheduled_values(start_time);
        let _ = gain.set_value_at_time(0.0, start_time);
        let _ = gain.linear_ramp_to_value_at_time(velocity as f32, start_time + envelope.attack_sec);
        let sustain = (envelope.sustain_level * velocity) as f32;
        let _ = gain.linear_ramp_to_value_at_time(
            sustain,
            start_time + envelope.attack_sec + envelope.decay_sec,
        );
    }

    fn release(&mut self, end_time: f64, release_sec: f64) {
        let gain = self.gain.gain();
        let _ = gain.cancel_scheduled_values(end_time);
        let _ = gain.set_value_at_time(gain.value(), end_time);
        let _ = gain.linear_ramp_to_value_at_time(0.0, end_time + release_sec);
    }

    fn envelope_level(&self) -> f64 {
        f64::from(self.gain.gain().value())
    }
}

/// Builds a fresh `OscillatorVoiceHandle` wired into the effects
/// chain's input every time the manager's free pool is empty.
pub struct WebVoiceFactory {
    ctx: AudioContext,
    destination: AudioNode,
}

impl WebVoiceFactory {
    #[must_use]
    pub fn new(ctx: AudioContext, destination: AudioNode) -> Self {
        Self { ctx, destination }
    }
}

impl VoiceFactory for WebVoiceFactory {
    type Handle = OscillatorVoiceHandle;

    fn build(&mut self) -> Self::Handle {
        OscillatorVoiceHandle::new(&self.ctx, &self.destination)
            .expect("failed to build oscillator voice graph")
    }
}
