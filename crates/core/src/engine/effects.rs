//! Effects chain parameters (spec §4.10, property 11).
//!
//! Topology (`voices -> saturation -> compressor ->
//! parallel(dry, reverb) -> masterGain -> destination`) is wired on the
//! wasm side against `web_sys` nodes, grounded in the teacher's
//! `build_fx_buses`; this module owns only the clamped parameter
//! records and the pure AGE mapping function, so the policy is
//! host-testable.

/// Feedback-carrying paths must never exceed this, to guarantee
/// bounded output (spec §4.10, property 11).
pub const MAX_FEEDBACK: f64 = 0.8;

/// Typical smoothing window for effect parameter updates (spec
/// §4.10: "typically 20-50ms").
pub const SMOOTHING_WINDOW_SEC: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationParams {
    pub amount: f64,
    pub tone: f64,
}

impl SaturationParams {
    #[must_use]
    pub fn new(amount: f64, tone: f64) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
            tone: tone.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_sec: f64,
    pub release_sec: f64,
}

impl CompressorParams {
    #[must_use]
    pub fn new(threshold_db: f64, ratio: f64, attack_sec: f64, release_sec: f64) -> Self {
        Self {
            threshold_db: threshold_db.clamp(-60.0, 0.0),
            ratio: ratio.clamp(1.0, 20.0),
            attack_sec: attack_sec.max(0.0),
            release_sec: release_sec.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub room_mix: f64,
    pub decay_sec: f64,
    pub pre_delay_sec: f64,
    feedback: f64,
}

impl ReverbParams {
    #[must_use]
    pub fn new(room_mix: f64, decay_sec: f64, pre_delay_sec: f64, feedback: f64) -> Self {
        Self {
            room_mix: room_mix.clamp(0.0, 1.0),
            decay_sec: decay_sec.clamp(0.1, 10.0),
            pre_delay_sec: pre_delay_sec.clamp(0.0, 0.2),
            feedback: clamp_feedback(feedback),
        }
    }

    #[must_use]
    pub fn feedback(&self) -> f64 {
        self.feedback
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = clamp_feedback(feedback);
    }
}

#[must_use]
pub fn clamp_feedback(feedback: f64) -> f64 {
    feedback.clamp(0.0, MAX_FEEDBACK)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectChainParams {
    pub saturation: SaturationParams,
    pub compressor: CompressorParams,
    pub reverb: ReverbParams,
    pub age_amount: f64,
}

impl Default for EffectChainParams {
    fn default() -> Self {
        Self {
            saturation: SaturationParams::new(0.2, 0.5),
            compressor: CompressorParams::new(-18.0, 3.0, 0.01, 0.2),
            reverb: ReverbParams::new(0.3, 2.5, 0.02, 0.4),
            age_amount: 0.0,
        }
    }
}

/// Coordinated offsets the AGE meta-parameter derives from a single
/// [0,1] scalar (spec §4.10): saturation amount, a high-shelf
/// attenuation in dB, and a slow modulation depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeMapping {
    pub saturation_offset: f64,
    pub high_shelf_attenuation_db: f64,
    pub modulation_depth: f64,
}

/// Fixed monotone mapping from AGE amount to the coordinated offsets
/// it drives. Linear in each component, clamped to [0,1] first so the
/// mapping is well-defined for any real input.
#[must_use]
pub fn map_age(amount: f64) -> AgeMapping {
    let age = amount.clamp(0.0, 1.0);
    AgeMapping {
        saturation_offset: age * 0.3,
        high_shelf_attenuation_db: age * -6.0,
        modulation_depth: age * 0.15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_is_always_clamped_to_the_bound() {
        assert_eq!(clamp_feedback(5.0), MAX_FEEDBACK);
        assert_eq!(clamp_feedback(-5.0), 0.0);
        assert_eq!(clamp_feedback(0.5), 0.5);
        let mut reverb = ReverbParams::new(0.3, 2.0, 0.01, 0.95);
        assert_eq!(reverb.feedback(), MAX_FEEDBACK);
        reverb.set_feedback(2.0);
        assert_eq!(reverb.feedback(), MAX_FEEDBACK);
    }

    #[test]
    fn age_mapping_is_monotone_and_bounded() {
        let low = map_age(0.0);
        let mid = map_age(0.5);
        let high = map_age(1.0);
        assert!(low.saturation_offset <= mid.saturation_offset);
        assert!(mid.saturation_offset <= high.saturation_offset);
        assert!(low.high_shelf_attenuation_db >= mid.high_shelf_attenuation_db);
        assert!(mid.high_shelf_attenuation_db >= high.high_shelf_attenuation_db);
        assert_eq!(map_age(2.0), map_age(1.0));
        assert_eq!(map_age(-2.0), map_age(0.0));
    }

    #[test]
    fn saturation_and_compressor_params_clamp_to_declared_ranges() {
        let sat = SaturationParams::new(5.0, -5.0);
        assert_eq!(sat.amount, 1.0);
        assert_eq!(sat.tone, 0.0);

        let comp = CompressorParams::new(10.0, 50.0, -1.0, -1.0);
        assert_eq!(comp.threshold_db, 0.0);
        assert_eq!(comp.ratio, 20.0);
        assert_eq!(comp.attack_sec, 0.0);
    }
}
