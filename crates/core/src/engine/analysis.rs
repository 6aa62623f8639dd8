//! Analysis taps (spec §4.14).
//!
//! Read-only visualisation data off a side tap from the master bus
//! (grounded in the teacher's `create_analyser`, generalised from a
//! single frequency read to the lazy frame sequences spec §4.14
//! describes).

/// Backing source for analysis frames. The wasm host implements this
/// against `web_sys::AnalyserNode::get_byte_frequency_data` /
/// `get_float_time_domain_data`; a fixture-backed fake exercises the
/// polling contract in tests.
pub trait AnalysisSource {
    /// Frequency-domain magnitude bins, most recent frame.
    fn frequency_bins(&self) -> Vec<f32>;
    /// Time-domain samples, most recent frame.
    fn time_domain_samples(&self) -> Vec<f32>;
}

/// A lazy, restartable, non-blocking reader over an `AnalysisSource`.
/// Each poll returns whatever the source currently holds; it never
/// waits for a new frame.
pub struct AnalysisTap<S> {
    source: S,
}

impl<S: AnalysisSource> AnalysisTap<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn poll_spectrum_frame(&self) -> Vec<f32> {
        self.source.frequency_bins()
    }

    #[must_use]
    pub fn poll_time_domain_frame(&self) -> Vec<f32> {
        self.source.time_domain_samples()
    }

    /// Peak absolute sample in the current time-domain frame, used for
    /// a simple level meter.
    #[must_use]
    pub fn peak_level(&self) -> f32 {
        self.source
            .time_domain_samples()
            .iter()
            .fold(0.0_f32, |peak, &sample| peak.max(sample.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixtureSource {
        frequency: Vec<f32>,
        time_domain: Vec<f32>,
    }
    impl AnalysisSource for FixtureSource {
        fn frequency_bins(&self) -> Vec<f32> {
            self.frequency.clone()
        }
        fn time_domain_samples(&self) -> Vec<f32> {
            self.time_domain.clone()
        }
    }

    #[test]
    fn polling_never_blocks_and_reflects_the_current_frame() {
        let tap = AnalysisTap::new(FixtureSource {
            frequency: vec![0.1, 0.4, 0.9],
            time_domain: vec![-0.5, 0.2, 0.8, -0.9],
        });
        assert_eq!(tap.poll_spectrum_frame(), vec![0.1, 0.4, 0.9]);
        assert_eq!(tap.poll_time_domain_frame().len(), 4);
    }

    #[test]
    fn peak_level_is_the_largest_absolute_sample() {
        let tap = AnalysisTap::new(FixtureSource {
            frequency: vec![],
            time_domain: vec![-0.5, 0.2, 0.8, -0.95],
        });
        assert!((tap.peak_level() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn no_sample_exceeds_full_scale_stays_observable() {
        let tap = AnalysisTap::new(FixtureSource {
            frequency: vec![],
            time_domain: vec![1.0, -1.0, 0.999],
        });
        assert!(tap.peak_level() <= 1.0);
    }
}
