//! Purely computational music theory (C1-C6): pitch, scale, chord,
//! diatonic harmonisation, voice leading, and progression generation.
//! None of this module depends on an audio runtime.

pub mod chord;
pub mod diatonic;
pub mod pitch;
pub mod progression;
pub mod scale;
pub mod voice_leading;
