//! Sound cues for game events
//!
//! Each cue is a single oscillator tone. The frontend synthesizes them;
//! this module only decides what to play and how loud.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Base gain before volume settings are applied
pub const BASE_GAIN: f32 = 0.1;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A switch changed direction
    SwitchToggle,
    /// Cart reached a target of its own colour
    DeliverySuccess,
    /// Cart reached the wrong target
    DeliveryFailure,
    /// Two carts collided
    CartCollision,
    /// Cart drove into a wall
    WallCrash,
    LevelComplete,
    GameOver,
    /// New best score
    NewBestScore,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single tone, ready to hand to an oscillator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: f32,
    pub waveform: Waveform,
    pub gain: f32,
}

impl SoundEffect {
    /// Cue for an event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let effect = match event {
            GameEvent::SwitchToggled { .. } => SoundEffect::SwitchToggle,
            GameEvent::DeliverySuccess { .. } => SoundEffect::DeliverySuccess,
            GameEvent::DeliveryFailure { .. } => SoundEffect::DeliveryFailure,
            GameEvent::CartCollision { .. } => SoundEffect::CartCollision,
            GameEvent::WallCollision { .. } => SoundEffect::WallCrash,
            GameEvent::LevelComplete { .. } => SoundEffect::LevelComplete,
            GameEvent::GameOver { .. } => SoundEffect::GameOver,
            GameEvent::NewBestScore { .. } => SoundEffect::NewBestScore,
            _ => return None,
        };
        Some(effect)
    }

    /// Tone at base gain
    pub fn tone(&self) -> Tone {
        let (frequency_hz, duration_ms, waveform) = match self {
            SoundEffect::SwitchToggle => (600.0, 150.0, Waveform::Sine),
            SoundEffect::DeliverySuccess => (800.0, 200.0, Waveform::Sine),
            SoundEffect::DeliveryFailure => (200.0, 400.0, Waveform::Sawtooth),
            SoundEffect::CartCollision => (150.0, 300.0, Waveform::Sawtooth),
            SoundEffect::WallCrash => (120.0, 120.0, Waveform::Triangle),
            SoundEffect::LevelComplete => (1000.0, 300.0, Waveform::Sine),
            SoundEffect::GameOver => (110.0, 600.0, Waveform::Square),
            SoundEffect::NewBestScore => (1200.0, 250.0, Waveform::Triangle),
        };
        Tone {
            frequency_hz,
            duration_ms,
            waveform,
            gain: BASE_GAIN,
        }
    }
}

/// Tones for a batch of events, scaled by the player's volume.
/// Empty when muted.
pub fn cues_for(events: &[GameEvent], settings: &Settings) -> Vec<Tone> {
    let volume = settings.effective_volume();
    if volume <= 0.0 {
        return Vec::new();
    }
    events
        .iter()
        .filter_map(SoundEffect::for_event)
        .map(|effect| {
            let tone = effect.tone();
            Tone {
                gain: tone.gain * volume,
                ..tone
            }
        })
        .collect()
}
