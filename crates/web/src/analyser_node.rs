//! `impl AnalysisSource for` a `web_sys::AnalyserNode` side tap (C14),
//! grounded in the teacher's `analyser`/`analyser_buf` polling in
//! `lib.rs` (`get_float_frequency_data` read each render tick).

use lofi_core::engine::analysis::AnalysisSource;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, AudioNode, AnalyserNode};

const FFT_SIZE: u32 = 1024;

pub struct WebAnalysisSource {
    analyser: AnalyserNode,
    frequency_buf: Vec<f32>,
    time_domain_buf: Vec<f32>,
}

impl WebAnalysisSource {
    pub fn build(ctx: &AudioContext, source: &AudioNode) -> Result<Self, JsValue> {
        let analyser = AnalyserNode::new(ctx)?;
        analyser.set_fft_size(FFT_SIZE);
        source.connect_with_audio_node(&analyser)?;

        let bins = analyser.frequency_bin_count() as usize;
        Ok(Self {
            analyser,
            frequency_buf: vec![0.0; bins],
            time_domain_buf: vec![0.0; FFT_SIZE as usize],
        })
    }
}

impl AnalysisSource for WebAnalysisSource {
    fn frequency_bins(&self) -> Vec<f32> {
        let mut buf = self.frequency_buf.clone();
        self.analyser.get_float_frequency_data(&mut buf);
        buf
    }

    fn time_domain_samples(&self) -> Vec<f32> {
        let mut buf = self.time_domain_buf.clone();
        self.analyser.get_float_time_domain_data(&mut buf);
        buf
    }
}
