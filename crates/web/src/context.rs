//! `web_sys::AudioContext` lifecycle wrapper implementing the core's
//! `AudioClock` trait, grounded in the teacher's `audio_ctx.resume()`
//! unlock-on-gesture pattern in `lib.rs`.

use lofi_core::engine::clock::AudioClock;
use wasm_bindgen::JsValue;
use web_sys::AudioContext;

/// Thin wrapper so `lofi_core::engine::clock::AudioContextLifecycle`
/// can be driven by a real `web_sys::AudioContext` without the core
/// crate depending on wasm at all.
pub struct WebAudioClock {
    ctx: AudioContext,
}

impl WebAudioClock {
    pub fn new() -> Result<Self, JsValue> {
        let ctx = AudioContext::new()?;
        Ok(Self { ctx })
    }

    #[must_use]
    pub fn context(&self) -> &AudioContext {
        &self.ctx
    }

    /// Must run inside a user-gesture handler on browsers that start
    /// contexts suspended (notably Safari and Firefox autoplay policy).
    pub fn resume(&self) -> Result<(), JsValue> {
        self.ctx.resume().map(|_| ())
    }

    pub fn suspend(&self) -> Result<(), JsValue> {
        self.ctx.suspend().map(|_| ())
    }
}

impl AudioClock for WebAudioClock {
    fn now(&self) -> f64 {
        self.ctx.current_time()
    }
}
