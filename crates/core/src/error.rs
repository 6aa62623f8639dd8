use thiserror::Error;

/// Deterministic, fail-fast errors from the purely computational
/// components (pitch/scale/chord/diatonic/progression catalogues).
///
/// These are never thrown into the audio thread; they are returned
/// synchronously to whatever called the theory API, which in practice
/// means UI code validating a user's selection before it reaches the
/// audio graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TheoryError {
    #[error("unknown scale id: {0}")]
    UnknownScale(String),

    #[error("unknown chord quality: {0}")]
    UnknownChordQuality(String),

    #[error("unrecognized roman numeral: {0}")]
    UnknownRoman(String),

    #[error("unknown progression template id: {0}")]
    UnknownTemplate(String),
}

/// Returned instead of a pitch whenever arithmetic would fall outside
/// [0, 127]. Callers commonly iterate near the boundaries (e.g. voice
/// leading octave shifts), so this is a sentinel rather than a panic or
/// an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchOutOfRange(pub i32);

/// State-violation error for the progression scheduler.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("progression is already playing; call stop() first")]
    ProgressionAlreadyPlaying,
}

/// Degraded-mode status for the environmental (audio-runtime) failures
/// described in spec §7. These never unwind; components clamp inputs,
/// skip invalid events, and the host observes `AudioStatus` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioStatus {
    Ready,
    NotReady { reason: NotReadyReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    Unsupported,
    NotUnlocked,
}

impl Default for AudioStatus {
    fn default() -> Self {
        AudioStatus::NotReady {
            reason: NotReadyReason::NotUnlocked,
        }
    }
}
