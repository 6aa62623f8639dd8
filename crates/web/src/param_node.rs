//! `impl AutomationParam for` a `web_sys::AudioParam` wrapper, the
//! concrete backing for `lofi_core::engine::param::Smoothed`.

use lofi_core::engine::param::AutomationParam;
use web_sys::AudioParam;

pub struct WebAutomationParam {
    param: AudioParam,
}

impl WebAutomationParam {
    #[must_use]
    pub fn new(param: AudioParam) -> Self {
        Self { param }
    }
}

impl AutomationParam for WebAutomationParam {
    fn value(&self) -> f64 {
        f64::from(self.param.value())
    }

    fn set_value_at_time(&mut self, value: f64, at_time: f64) {
        let _ = self.param.set_value_at_time(value as f32, at_time);
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        let _ = self.param.linear_ramp_to_value_at_time(value as f32, end_time);
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        let _ = self.param.exponential_ramp_to_value_at_time(value as f32, end_time);
    }

    fn cancel_scheduled_values(&mut self, at_time: f64) {
        let _ = self.param.cancel_scheduled_values(at_time);
    }
}
