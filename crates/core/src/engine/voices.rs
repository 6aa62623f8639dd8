//! Polyphonic voice manager (spec §4.9, properties 9).

use crate::engine::voice::{Envelope, Voice, VoiceHandle, VoiceLifecycleState};
use crate::theory::pitch::Pitch;
use fnv::FnvHashMap;

pub const DEFAULT_MAX_VOICES: usize = 32;

/// Fast release applied to a stolen voice before reallocation, to
/// avoid clicks (spec §4.9).
pub const STEAL_RELEASE_SEC: f64 = 0.02;

/// The `noteOn`/`noteOff` surface C9 exposes to everything upstream of
/// it: the progression scheduler (C11) and the input adapters (C13).
/// `PolyVoiceManager` is the only implementor; scheduler and adapters
/// are written against this trait so they stay decoupled from its
/// concrete voice-stealing/pooling internals.
pub trait NoteSink {
    fn note_on(&mut self, pitch: Pitch, velocity: f64, at_time: f64);
    fn note_off(&mut self, pitch: Pitch, at_time: f64);
}

/// Constructs a fresh `VoiceHandle`, connected to the effects chain
/// input, when the manager's free pool is empty.
pub trait VoiceFactory {
    type Handle: VoiceHandle;
    fn build(&mut self) -> Self::Handle;
}

/// Tracks active voices keyed by pitch, allocating from a free pool
/// where possible and enforcing `max_voices` via oldest-releasing,
/// then oldest-sustaining voice stealing.
pub struct PolyVoiceManager<F: VoiceFactory> {
    factory: F,
    max_voices: usize,
    default_envelope: Envelope,
    active: FnvHashMap<u8, Voice<F::Handle>>,
    /// Voices evicted by `steal_one`, fading out under
    /// `force_fast_release` but not counted against `max_voices` (spec
    /// property 9 holds synchronously: a stolen voice leaves `active`
    /// the instant it's stolen, not on the next `collect_expired`).
    stolen: Vec<Voice<F::Handle>>,
    free_pool: Vec<F::Handle>,
    next_voice_id: u64,
}

impl<F: VoiceFactory> PolyVoiceManager<F> {
    pub fn new(factory: F, max_voices: usize, default_envelope: Envelope) -> Self {
        Self {
            factory,
            max_voices,
            default_envelope,
            active: FnvHashMap::default(),
            stolen: Vec::new(),
            free_pool: Vec::new(),
            next_voice_id: 0,
        }
    }

    /// Updates the envelope template applied to every subsequent
    /// `note_on`; voices already sounding keep whatever envelope they
    /// were triggered with (spec §4.12: store diffs apply going
    /// forward, not retroactively).
    pub fn set_default_envelope(&mut self, envelope: Envelope) {
        self.default_envelope = envelope;
    }

    /// Re-strike policy: noteOn on an already-sustaining (or
    /// attacking) pitch is ignored (spec §9 open question 1, taken as
    /// intended behaviour).
    pub fn note_on(&mut self, pitch: Pitch, velocity: f64, at_time: f64) {
        if let Some(existing) = self.active.get(&pitch.value()) {
            if existing.state != VoiceLifecycleState::Releasing {
                return;
            }
        }

        if self.active.len() >= self.max_voices && !self.active.contains_key(&pitch.value()) {
            self.steal_one(at_time);
        }

        let handle = self.free_pool.pop().unwrap_or_else(|| self.factory.build());
        let id = self.next_voice_id;
        self.next_voice_id += 1;
        let mut voice = Voice::create(id, pitch, self.default_envelope, at_time, handle);
        voice.trigger(velocity, at_time);
        self.active.insert(pitch.value(), voice);
    }

    pub fn note_off(&mut self, pitch: Pitch, at_time: f64) {
        if let Some(voice) = self.active.get_mut(&pitch.value()) {
            voice.release_note(at_time);
        }
    }

    #[must_use]
    pub fn all_active_notes(&self) -> Vec<Pitch> {
        self.active.keys().filter_map(|&v| Pitch::new(i32::from(v)).ok()).collect()
    }

    pub fn stop_all(&mut self, at_time: f64) {
        for voice in self.active.values_mut() {
            if voice.state != VoiceLifecycleState::Releasing {
                voice.release_note(at_time);
            }
        }
    }

    /// Advances every voice's lifecycle and reclaims any that have
    /// become collectable, returning stolen/expired handles to the
    /// free pool. Call periodically (e.g. once per scheduler tick).
    pub fn collect_expired(&mut self, now: f64) {
        let expired: Vec<u8> = self
            .active
            .iter_mut()
            .map(|(pitch, voice)| {
                voice.advance_state(now);
                (*pitch, voice.state)
            })
            .filter(|(_, state)| *state == VoiceLifecycleState::Dead)
            .map(|(pitch, _)| pitch)
            .collect();
        for pitch in expired {
            if let Some(voice) = self.active.remove(&pitch) {
                self.free_pool.push(voice.into_handle());
            }
        }

        let mut still_fading = Vec::with_capacity(self.stolen.len());
        for mut voice in self.stolen.drain(..) {
            voice.advance_state(now);
            if voice.state == VoiceLifecycleState::Dead {
                self.free_pool.push(voice.into_handle());
            } else {
                still_fading.push(voice);
            }
        }
        self.stolen = still_fading;
    }

    /// Evicts the oldest-releasing, then oldest-sustaining voice out of
    /// `active` immediately, so `active.len()` never exceeds
    /// `max_voices` even transiently. The evicted voice keeps fading
    /// under `force_fast_release` in `stolen` until `collect_expired`
    /// reclaims its handle.
    fn steal_one(&mut self, at_time: f64) {
        let victim = self
            .active
            .iter()
            .find(|(_, v)| v.state == VoiceLifecycleState::Releasing)
            .map(|(pitch, _)| *pitch)
            .or_else(|| {
                self.active
                    .iter()
                    .min_by(|a, b| a.1.allocated_at.partial_cmp(&b.1.allocated_at).unwrap())
                    .map(|(pitch, _)| *pitch)
            });
        if let Some(pitch) = victim {
            if let Some(mut voice) = self.active.remove(&pitch) {
                voice.force_fast_release(at_time, STEAL_RELEASE_SEC);
                self.stolen.push(voice);
            }
        }
    }
}

impl<F: VoiceFactory> NoteSink for PolyVoiceManager<F> {
    fn note_on(&mut self, pitch: Pitch, velocity: f64, at_time: f64) {
        PolyVoiceManager::note_on(self, pitch, velocity, at_time);
    }
    fn note_off(&mut self, pitch: Pitch, at_time: f64) {
        PolyVoiceManager::note_off(self, pitch, at_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHandle {
        level: f64,
    }
    impl VoiceHandle for FakeHandle {
        fn set_frequency(&mut self, _frequency_hz: f64, _at_time: f64) {}
        fn trigger(&mut self, velocity: f64, _start_time: f64, _envelope: Envelope) {
            self.level = velocity;
        }
        fn release(&mut self, _end_time: f64, _release_sec: f64) {
            self.level = 0.0;
        }
        fn envelope_level(&self) -> f64 {
            self.level
        }
    }

    struct FakeFactory;
    impl VoiceFactory for FakeFactory {
        type Handle = FakeHandle;
        fn build(&mut self) -> FakeHandle {
            FakeHandle::default()
        }
    }

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    fn manager() -> PolyVoiceManager<FakeFactory> {
        PolyVoiceManager::new(FakeFactory, 4, Envelope::default())
    }

    #[test]
    fn note_on_note_off_tracks_active_pitches() {
        let mut mgr = manager();
        mgr.note_on(p(60), 0.8, 0.0);
        mgr.note_on(p(64), 0.8, 0.0);
        mgr.note_on(p(67), 0.8, 0.0);
        let mut active: Vec<u8> = mgr.all_active_notes().iter().map(Pitch::value).collect();
        active.sort_unstable();
        assert_eq!(active, vec![60, 64, 67]);

        mgr.note_off(p(64), 0.0);
        mgr.collect_expired(0.0 + Envelope::default().release_sec + 1.0);
        let mut active: Vec<u8> = mgr.all_active_notes().iter().map(Pitch::value).collect();
        active.sort_unstable();
        assert_eq!(active, vec![60, 67]);
    }

    #[test]
    fn restriking_a_sustaining_pitch_is_ignored() {
        let mut mgr = manager();
        mgr.note_on(p(60), 0.5, 0.0);
        let first_count = mgr.active.len();
        mgr.note_on(p(60), 0.9, 0.0);
        assert_eq!(mgr.active.len(), first_count);
    }

    #[test]
    fn active_note_count_never_exceeds_max_voices_even_mid_steal() {
        let mut mgr = manager();
        for (i, pitch) in [60, 61, 62, 63, 64, 65].into_iter().enumerate() {
            mgr.note_on(p(pitch), 0.8, 0.0);
            assert!(
                mgr.all_active_notes().len() <= 4,
                "exceeded max_voices immediately after note_on #{i}"
            );
        }
    }

    #[test]
    fn stolen_voices_still_fade_out_and_are_eventually_reclaimed() {
        let mut mgr = manager();
        for pitch in [60, 61, 62, 63, 64, 65] {
            mgr.note_on(p(pitch), 0.8, 0.0);
        }
        assert_eq!(mgr.stolen.len(), 2);
        mgr.collect_expired(STEAL_RELEASE_SEC + Envelope::default().release_sec + 1.0);
        assert!(mgr.stolen.is_empty());
        assert!(mgr.all_active_notes().len() <= 4);
    }

    #[test]
    fn set_default_envelope_affects_only_future_note_ons() {
        let mut mgr = manager();
        mgr.note_on(p(60), 0.8, 0.0);
        let first_release = mgr.active.get(&60).unwrap().envelope.release_sec;

        let updated = Envelope::new(0.02, 0.1, 0.5, 1.5);
        mgr.set_default_envelope(updated);
        mgr.note_on(p(64), 0.8, 0.0);

        assert_eq!(mgr.active.get(&60).unwrap().envelope.release_sec, first_release);
        assert_eq!(mgr.active.get(&64).unwrap().envelope.release_sec, 1.5);
    }

    #[test]
    fn stop_all_releases_every_active_voice() {
        let mut mgr = manager();
        mgr.note_on(p(60), 0.8, 0.0);
        mgr.note_on(p(64), 0.8, 0.0);
        mgr.stop_all(1.0);
        for voice in mgr.active.values() {
            assert_eq!(voice.state, VoiceLifecycleState::Releasing);
        }
        mgr.collect_expired(1.0 + Envelope::default().release_sec + 1.0);
        assert!(mgr.all_active_notes().is_empty());
    }
}
