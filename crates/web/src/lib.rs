#![cfg(target_arch = "wasm32")]
//! Web front-end wiring the lo-fi chord engine (`lofi_core`) to a
//! real `web_sys` `AudioContext` and DOM. Bootstrap shape (`start()`
//! -> `spawn_local(init())`, panic hook, log init) is the teacher's
//! `app-web/src/lib.rs` pattern.

mod analyser_node;
mod context;
mod effects_chain;
mod input;
mod param_node;
mod store_bridge;
mod voice_node;

use std::cell::RefCell;
use std::rc::Rc;

use lofi_core::engine::adapters::MidiFilter;
use lofi_core::engine::analysis::AnalysisTap;
use lofi_core::engine::clock::AudioContextLifecycle;
use lofi_core::engine::effects::EffectChainParams;
use lofi_core::engine::store::{ParamPath, ParamValue, ParameterStore};
use lofi_core::engine::voice::Envelope;
use lofi_core::engine::voices::PolyVoiceManager;
use lofi_core::theory::progression::{expand_progression, get_template};
use lofi_core::theory::scale::ScaleId;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

use crate::analyser_node::WebAnalysisSource;
use crate::context::WebAudioClock;
use crate::effects_chain::EffectsChain;
use crate::store_bridge::{SharedVoiceSink, WebAudioSink};
use crate::voice_node::WebVoiceFactory;

const DEFAULT_MAX_VOICES: usize = 16;
const PIANO_CONTAINER_ID: &str = "lofi-piano-keys";
const ROOT_PITCH_SELECT_ID: &str = "lofi-root-pitch";
const SCALE_SELECT_ID: &str = "lofi-scale";
const PROGRESSION_SELECT_ID: &str = "lofi-progression-template";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("lofi-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow::anyhow!("no document"))?;

    let clock = Rc::new(WebAudioClock::new().map_err(|e| anyhow::anyhow!("{:?}", e))?);
    let mut lifecycle = AudioContextLifecycle::new(WebAudioClockRef(clock.clone()));

    let ctx = clock.context().clone();
    let destination: web::AudioNode = ctx.destination().into();
    let effects = Rc::new(EffectsChain::build(&ctx, &destination).map_err(|e| anyhow::anyhow!("{:?}", e))?);

    let analysis_tap = Rc::new(AnalysisTap::new(
        WebAnalysisSource::build(&ctx, &effects.input()).map_err(|e| anyhow::anyhow!("{:?}", e))?,
    ));
    let _ = analysis_tap; // polled by a UI layer outside this crate's scope; kept alive here.

    let factory = WebVoiceFactory::new(ctx.clone(), effects.input());
    let voices = Rc::new(RefCell::new(PolyVoiceManager::new(
        factory,
        DEFAULT_MAX_VOICES,
        Envelope::default(),
    )));

    let store = Rc::new(RefCell::new(ParameterStore::new()));
    let mut sink = WebAudioSink::new(effects.clone(), voices.clone());

    {
        let mut store_mut = store.borrow_mut();
        store_mut.update(ParamPath::MasterLevel, ParamValue::Number(0.8), ctx.current_time(), &mut sink);
        let defaults = EffectChainParams::default();
        store_mut.update(ParamPath::SaturationAmount, ParamValue::Number(defaults.saturation.amount), 0.0, &mut sink);
        store_mut.update(ParamPath::SaturationTone, ParamValue::Number(defaults.saturation.tone), 0.0, &mut sink);
        store_mut.update(ParamPath::CompressorThresholdDb, ParamValue::Number(defaults.compressor.threshold_db), 0.0, &mut sink);
        store_mut.update(ParamPath::CompressorRatio, ParamValue::Number(defaults.compressor.ratio), 0.0, &mut sink);
        store_mut.update(ParamPath::ReverbRoomMix, ParamValue::Number(defaults.reverb.room_mix), 0.0, &mut sink);
        store_mut.update(ParamPath::ReverbDecaySec, ParamValue::Number(defaults.reverb.decay_sec), 0.0, &mut sink);
    }

    // Unlock on the first user gesture (browsers start contexts suspended).
    {
        let clock_for_unlock = clock.clone();
        let closure = Closure::wrap(Box::new(move || {
            let _ = clock_for_unlock.resume();
        }) as Box<dyn FnMut()>);
        window.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    lifecycle.unlock();

    let note_sink = Rc::new(RefCell::new(SharedVoiceSink::new(voices.clone())));
    input::keyboard::install(&window, clock.clone(), note_sink.clone())?;
    if let Some(container) = document.get_element_by_id(PIANO_CONTAINER_ID) {
        input::pointer::install(&container, clock.clone(), note_sink.clone())?;
    }
    {
        let navigator = window.navigator();
        let clock_for_midi = clock.clone();
        let note_sink_for_midi = note_sink.clone();
        spawn_local(async move {
            if let Err(e) = input::midi::install(&navigator, MidiFilter::default(), clock_for_midi, note_sink_for_midi).await {
                log::warn!("MIDI access unavailable: {:?}", e);
            }
        });
    }

    // Poll-driven scheduler tick, driven by requestAnimationFrame rather
    // than a JS timer (spec §4.11's cancellable-timer requirement is met
    // by ProgressionScheduler::stop() clearing the queue; this loop is
    // just the poll cadence).
    let scheduler = Rc::new(RefCell::new(lofi_core::engine::scheduler::ProgressionScheduler::new()));
    {
        let scheduler_tick = scheduler.clone();
        let clock_tick = clock.clone();
        let voices_tick = voices.clone();
        let note_sink_tick = note_sink.clone();
        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let now = clock_tick.now();
            scheduler_tick.borrow_mut().tick(now, &mut *note_sink_tick.borrow_mut());
            voices_tick.borrow_mut().collect_expired(now);
            if let Some(w) = web::window() {
                let _ = w.request_animation_frame(tick_clone.borrow().as_ref().unwrap().as_ref().unchecked_ref());
            }
        }) as Box<dyn FnMut()>));
        if let Some(w) = web::window() {
            w.request_animation_frame(tick.borrow().as_ref().unwrap().as_ref().unchecked_ref())?;
        }
    }

    // Wire optional root-pitch and scale pickers if the host page
    // provides them, e.g. `<select id="lofi-root-pitch">` with
    // numeric MIDI-pitch option values and `<select id="lofi-scale">`
    // with `ScaleId::as_str()` option values.
    if let Some(select_el) = document.get_element_by_id(ROOT_PITCH_SELECT_ID) {
        let store_for_select = store.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(target) = ev.target() else { return };
            let Ok(select) = target.dyn_into::<web::HtmlSelectElement>() else {
                return;
            };
            let Ok(raw) = select.value().parse::<i32>() else {
                return;
            };
            let Ok(pitch) = lofi_core::theory::pitch::Pitch::new(raw) else {
                log::warn!("root pitch out of range: {raw}");
                return;
            };
            store_for_select.borrow_mut().chord.root_pitch = pitch;
        }) as Box<dyn FnMut(_)>);
        select_el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(select_el) = document.get_element_by_id(SCALE_SELECT_ID) {
        let store_for_select = store.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(target) = ev.target() else { return };
            let Ok(select) = target.dyn_into::<web::HtmlSelectElement>() else {
                return;
            };
            let scale_name = select.value();
            let Ok(scale_id) = ScaleId::parse(&scale_name) else {
                log::warn!("unknown scale: {scale_name}");
                return;
            };
            store_for_select.borrow_mut().chord.scale_id = scale_id;
        }) as Box<dyn FnMut(_)>);
        select_el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Wire an optional progression-template picker if the host page
    // provides one, e.g. `<select id="lofi-progression-template">`.
    if let Some(select_el) = document.get_element_by_id(PROGRESSION_SELECT_ID) {
        let store_for_select = store.clone();
        let scheduler_for_select = scheduler.clone();
        let clock_for_select = clock.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(target) = ev.target() else { return };
            let Ok(select) = target.dyn_into::<web::HtmlSelectElement>() else {
                return;
            };
            let template_id = select.value();
            let Ok(template) = get_template(&template_id) else {
                log::warn!("unknown progression template: {template_id}");
                return;
            };
            let (root_pitch, scale_id) = {
                let store = store_for_select.borrow();
                (store.chord.root_pitch, store.chord.scale_id)
            };
            let Ok(chords) = expand_progression(root_pitch, scale_id, template.roman_sequence) else {
                return;
            };
            let (tempo_bpm, chord_duration_beats, loop_enabled) = {
                let store = store_for_select.borrow();
                (store.chord.tempo_bpm, store.chord.chord_duration_beats, store.chord.loop_enabled)
            };
            let now = clock_for_select.now();
            let _ = scheduler_for_select
                .borrow_mut()
                .play(chords, tempo_bpm, chord_duration_beats, loop_enabled, now);
        }) as Box<dyn FnMut(_)>);
        select_el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

/// `AudioClock` forwarding through an `Rc` so the lifecycle wrapper
/// and every event closure can share one context handle.
struct WebAudioClockRef(Rc<WebAudioClock>);

impl lofi_core::engine::clock::AudioClock for WebAudioClockRef {
    fn now(&self) -> f64 {
        self.0.now()
    }
}
