//! DOM/MIDI event wiring (C13): the boundary where browser event
//! shapes get translated into `lofi_core::engine::adapters` calls.
//! Grounded in the teacher's `input.rs` + the keydown/pointerdown
//! wiring in `lib.rs`, generalised from camera/voice picking to
//! note-on/note-off dispatch.

pub mod keyboard;
pub mod midi;
pub mod pointer;
