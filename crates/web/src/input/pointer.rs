//! On-screen piano-key pointer input (C13). Each key element carries a
//! `data-pitch` attribute; pointerdown/up on the container are
//! delegated rather than bound per key, mirroring the teacher's single
//! canvas-level `pointerdown`/`pointerup` listeners in `lib.rs`.

use lofi_core::engine::adapters::{pointer_down, pointer_up};
use lofi_core::engine::clock::AudioClock;
use lofi_core::engine::voices::NoteSink;
use lofi_core::theory::pitch::Pitch;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, PointerEvent};

fn pitch_from_event(ev: &PointerEvent) -> Option<Pitch> {
    let target = ev.target()?;
    let element = target.dyn_ref::<Element>()?;
    let attr = element.closest("[data-pitch]").ok().flatten()?;
    let raw = attr.get_attribute("data-pitch")?;
    let value: i32 = raw.parse().ok()?;
    Pitch::new(value).ok()
}

pub fn install<C, S>(container: &Element, clock: Rc<C>, sink: Rc<RefCell<S>>) -> Result<(), JsValue>
where
    C: AudioClock + 'static,
    S: NoteSink + 'static,
{
    {
        let clock = clock.clone();
        let sink = sink.clone();
        let closure = Closure::wrap(Box::new(move |ev: Event| {
            let Ok(ev) = ev.dyn_into::<PointerEvent>() else {
                return;
            };
            if let Some(pitch) = pitch_from_event(&ev) {
                let at_time = clock.now();
                pointer_down(pitch, None, &mut *sink.borrow_mut(), at_time);
            }
        }) as Box<dyn FnMut(_)>);
        container.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |ev: Event| {
            let Ok(ev) = ev.dyn_into::<PointerEvent>() else {
                return;
            };
            if let Some(pitch) = pitch_from_event(&ev) {
                let at_time = clock.now();
                pointer_up(pitch, &mut *sink.borrow_mut(), at_time);
            }
        }) as Box<dyn FnMut(_)>);
        container.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}
