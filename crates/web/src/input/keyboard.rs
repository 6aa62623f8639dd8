//! Physical-keyboard input (C13), mirroring the teacher's `keydown`
//! listener registration in `lib.rs`.

use lofi_core::engine::adapters::{keyboard_key_down, keyboard_key_up};
use lofi_core::engine::clock::AudioClock;
use lofi_core::engine::voices::NoteSink;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{KeyboardEvent, Window};

pub fn install<C, S>(window: &Window, clock: Rc<C>, sink: Rc<RefCell<S>>) -> Result<(), JsValue>
where
    C: AudioClock + 'static,
    S: NoteSink + 'static,
{
    {
        let clock = clock.clone();
        let sink = sink.clone();
        let closure = Closure::wrap(Box::new(move |ev: KeyboardEvent| {
            if ev.repeat() {
                return;
            }
            let at_time = clock.now();
            keyboard_key_down(&ev.code(), &mut *sink.borrow_mut(), at_time);
        }) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |ev: KeyboardEvent| {
            let at_time = clock.now();
            keyboard_key_up(&ev.code(), &mut *sink.borrow_mut(), at_time);
        }) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}
