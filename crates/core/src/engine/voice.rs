//! Voice: oscillator(s) + ADSR envelope (spec §4.8).

use crate::theory::pitch::Pitch;

/// Clamped ADSR parameters (ranges normative, spec §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack_sec: f64,
    pub decay_sec: f64,
    pub sustain_level: f64,
    pub release_sec: f64,
}

impl Envelope {
    #[must_use]
    pub fn new(attack_sec: f64, decay_sec: f64, sustain_level: f64, release_sec: f64) -> Self {
        Self {
            attack_sec: attack_sec.clamp(0.001, 2.0),
            decay_sec: decay_sec.clamp(0.001, 4.0),
            sustain_level: sustain_level.clamp(0.0, 1.0),
            release_sec: release_sec.clamp(0.001, 8.0),
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(0.01, 0.15, 0.7, 0.4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceLifecycleState {
    Attacking,
    Sustaining,
    Releasing,
    Dead,
}

/// Envelope output below this level is considered inaudible (spec
/// §4.8 lifecycle: "collectable when envelope output drops below a
/// silence threshold").
pub const SILENCE_THRESHOLD: f64 = 1e-3;

/// Fixed safety timeout past which a releasing voice is reclaimed
/// regardless of its measured envelope output (spec §5 "Timeouts").
pub const SAFETY_MARGIN_SEC: f64 = 0.05;

/// Small fixed smoothing window for `setPitch`'s exponential ramp
/// (spec §4.8).
pub const PITCH_SMOOTHING_SEC: f64 = 0.02;

/// A voice's underlying subgraph: one or more detuned oscillators
/// summed into a gain node. Implemented by the wasm host against
/// `web_sys` nodes; a recording fake backs the unit tests below.
pub trait VoiceHandle {
    /// Exponentially ramp all oscillators to `frequency_hz`, smoothed
    /// over `PITCH_SMOOTHING_SEC`.
    fn set_frequency(&mut self, frequency_hz: f64, at_time: f64);

    /// Schedule 0 -> `velocity` over `envelope.attack_sec`, then ->
    /// `envelope.sustain_level * velocity` over `envelope.decay_sec`.
    fn trigger(&mut self, velocity: f64, start_time: f64, envelope: Envelope);

    /// Cancel future schedule, hold current value, ramp to 0 over
    /// `release_sec`.
    fn release(&mut self, end_time: f64, release_sec: f64);

    /// Best-effort envelope output estimate, used only to decide when
    /// a releasing voice may be collected.
    fn envelope_level(&self) -> f64;
}

/// {id, pitch, allocatedAt, state, assignedOscillatorRef,
/// assignedEnvelopeRef} (spec §3). The oscillator/envelope refs are
/// the `handle` itself rather than separate fields.
pub struct Voice<H> {
    pub id: u64,
    pub pitch: Pitch,
    pub allocated_at: f64,
    pub state: VoiceLifecycleState,
    pub envelope: Envelope,
    released_at: Option<f64>,
    active_release_sec: f64,
    handle: H,
}

impl<H: VoiceHandle> Voice<H> {
    pub fn create(id: u64, initial_pitch: Pitch, envelope: Envelope, allocated_at: f64, mut handle: H) -> Self {
        handle.set_frequency(initial_pitch.frequency_hz(), allocated_at);
        Self {
            id,
            pitch: initial_pitch,
            allocated_at,
            state: VoiceLifecycleState::Attacking,
            envelope,
            released_at: None,
            active_release_sec: envelope.release_sec,
            handle,
        }
    }

    pub fn trigger(&mut self, velocity: f64, start_time: f64) {
        self.handle.trigger(velocity, start_time, self.envelope);
        self.state = VoiceLifecycleState::Attacking;
    }

    pub fn release_note(&mut self, end_time: f64) {
        self.handle.release(end_time, self.envelope.release_sec);
        self.state = VoiceLifecycleState::Releasing;
        self.released_at = Some(end_time);
        self.active_release_sec = self.envelope.release_sec;
    }

    /// Releases with an explicit `release_sec` rather than the voice's
    /// own envelope setting, for voice-stealing's fast release (spec
    /// §4.9).
    pub fn force_fast_release(&mut self, at_time: f64, release_sec: f64) {
        self.handle.release(at_time, release_sec);
        self.state = VoiceLifecycleState::Releasing;
        self.released_at = Some(at_time);
        self.active_release_sec = release_sec;
    }

    /// Consumes the voice and returns its handle for reuse from the
    /// manager's free pool.
    #[must_use]
    pub fn into_handle(self) -> H {
        self.handle
    }

    pub fn set_pitch(&mut self, new_pitch: Pitch, at_time: f64) {
        self.pitch = new_pitch;
        self.handle.set_frequency(new_pitch.frequency_hz(), at_time);
    }

    /// Advance `Attacking` to `Sustaining` once past the attack+decay
    /// window. The manager calls this on its own poll/tick so voice
    /// bookkeeping doesn't require a timer of its own.
    pub fn advance_state(&mut self, now: f64) {
        match self.state {
            VoiceLifecycleState::Attacking
                if now >= self.allocated_at + self.envelope.attack_sec + self.envelope.decay_sec =>
            {
                self.state = VoiceLifecycleState::Sustaining;
            }
            VoiceLifecycleState::Releasing if self.is_collectable(now) => {
                self.state = VoiceLifecycleState::Dead;
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn is_collectable(&self, now: f64) -> bool {
        match self.released_at {
            Some(released_at) => {
                now >= released_at + self.active_release_sec + SAFETY_MARGIN_SEC
                    || self.handle.envelope_level() < SILENCE_THRESHOLD
            }
            None => false,
        }
    }

    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHandle {
        frequency_hz: f64,
        velocity: f64,
        level: f64,
    }

    impl VoiceHandle for FakeHandle {
        fn set_frequency(&mut self, frequency_hz: f64, _at_time: f64) {
            self.frequency_hz = frequency_hz;
        }
        fn trigger(&mut self, velocity: f64, _start_time: f64, _envelope: Envelope) {
            self.velocity = velocity;
            self.level = velocity;
        }
        fn release(&mut self, _end_time: f64, _release_sec: f64) {
            self.level = 0.0;
        }
        fn envelope_level(&self) -> f64 {
            self.level
        }
    }

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[test]
    fn trigger_then_release_transitions_state() {
        let mut voice = Voice::create(1, p(60), Envelope::default(), 0.0, FakeHandle::default());
        voice.trigger(0.8, 0.0);
        assert_eq!(voice.state, VoiceLifecycleState::Attacking);
        voice.advance_state(0.2); // past attack+decay
        assert_eq!(voice.state, VoiceLifecycleState::Sustaining);
        voice.release_note(1.0);
        assert_eq!(voice.state, VoiceLifecycleState::Releasing);
        assert!(voice.is_collectable(1.0 + voice.envelope.release_sec + SAFETY_MARGIN_SEC));
    }

    #[test]
    fn set_pitch_updates_underlying_frequency() {
        let mut voice = Voice::create(1, p(60), Envelope::default(), 0.0, FakeHandle::default());
        voice.set_pitch(p(72), 0.5);
        assert_eq!(voice.pitch.value(), 72);
        assert!((voice.handle().frequency_hz - p(72).frequency_hz()).abs() < 1e-9);
    }

    #[test]
    fn envelope_parameters_are_clamped() {
        let envelope = Envelope::new(10.0, -1.0, 2.0, 100.0);
        assert_eq!(envelope.attack_sec, 2.0);
        assert_eq!(envelope.decay_sec, 0.001);
        assert_eq!(envelope.sustain_level, 1.0);
        assert_eq!(envelope.release_sec, 8.0);
    }
}
