//! MIDI-in adapter (C13). No teacher precedent (the teacher has no
//! MIDI support); grounded in the Web MIDI API shape directly since
//! the spec calls for MIDI note-on/off with channel filtering.

use lofi_core::engine::adapters::{midi_message, MidiFilter};
use lofi_core::engine::clock::AudioClock;
use lofi_core::engine::voices::NoteSink;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{MidiAccess, MidiInput, MidiMessageEvent, Navigator};

/// Requests MIDI access and wires every currently-connected input port
/// to `midi_message`. Ports connected after this call are not picked
/// up (no `onstatechange` handler); acceptable for the first cut of
/// this adapter.
pub async fn install<C, S>(
    navigator: &Navigator,
    filter: MidiFilter,
    clock: Rc<C>,
    sink: Rc<RefCell<S>>,
) -> Result<(), JsValue>
where
    C: AudioClock + 'static,
    S: NoteSink + 'static,
{
    let promise = navigator.request_midi_access()?;
    let access = JsFuture::from(promise).await?;
    let access: MidiAccess = access.dyn_into()?;

    let inputs = access.inputs();
    let iterator: js_sys::Iterator = inputs.values();

    loop {
        let next = iterator.next()?;
        if next.done() {
            break;
        }
        let input: MidiInput = next.value().dyn_into()?;
        let clock = clock.clone();
        let sink = sink.clone();
        let closure = Closure::wrap(Box::new(move |ev: MidiMessageEvent| {
            let Some(data) = ev.data() else {
                return;
            };
            if data.len() < 3 {
                return;
            }
            let at_time = clock.now();
            midi_message(filter, data[0], data[1], data[2], &mut *sink.borrow_mut(), at_time);
        }) as Box<dyn FnMut(_)>);
        input.set_onmidimessage(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
    }

    Ok(())
}
