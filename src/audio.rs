//! Audio adapter — best-effort sound playback.
//!
//! Playback is a boolean outcome, not an error: terminals may have no bell,
//! no audio, or a user who muted it, and the experience must not care.
//! Callers explicitly ignore a `false` instead of relying on a swallowed
//! failure. Only the scene controller talks to the adapter.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// The gift being unwrapped.
    Unwrap,
    /// The looping background tune.
    Ambient,
    /// The cake-cut celebration.
    Cheer,
}

pub trait AudioAdapter {
    /// Attempt a one-shot sound. Returns whether it actually played.
    fn play(&mut self, kind: SoundKind) -> bool;

    /// Start the looping ambient track at the given volume (0.0–1.0).
    /// Returns whether playback started.
    fn start_ambient(&mut self, volume: f64) -> bool;

    fn set_ambient_volume(&mut self, volume: f64);

    fn stop_ambient(&mut self);
}

/// Adapter for environments with no sound at all. Nothing ever plays.
pub struct SilentAudio;

impl AudioAdapter for SilentAudio {
    fn play(&mut self, _kind: SoundKind) -> bool {
        false
    }

    fn start_ambient(&mut self, _volume: f64) -> bool {
        false
    }

    fn set_ambient_volume(&mut self, _volume: f64) {}

    fn stop_ambient(&mut self) {}
}

/// Maps every playable sound to the terminal bell. Comically lo-fi, but it
/// exercises the full adapter contract: ambient state is tracked so volume
/// changes and stop are meaningful to callers.
pub struct BellAudio {
    ambient_volume: Option<f64>,
}

impl BellAudio {
    pub fn new() -> Self {
        BellAudio {
            ambient_volume: None,
        }
    }

    fn ring() -> bool {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07").and_then(|_| stdout.flush()).is_ok()
    }
}

impl Default for BellAudio {
    fn default() -> Self {
        BellAudio::new()
    }
}

impl AudioAdapter for BellAudio {
    fn play(&mut self, _kind: SoundKind) -> bool {
        Self::ring()
    }

    fn start_ambient(&mut self, volume: f64) -> bool {
        self.ambient_volume = Some(volume.clamp(0.0, 1.0));
        Self::ring()
    }

    fn set_ambient_volume(&mut self, volume: f64) {
        if let Some(v) = self.ambient_volume.as_mut() {
            *v = volume.clamp(0.0, 1.0);
        }
    }

    fn stop_ambient(&mut self) {
        self.ambient_volume = None;
    }
}
