//! Frame driver
//!
//! Owns the session and everything around it that isn't simulation: the
//! wall clock, input queued between frames, the best score store and the
//! player's settings. Frontends call `frame` once per animation frame and
//! drain events afterwards.

use glam::Vec2;

use crate::consts::MAX_FRAME_DT_MS;
use crate::highscores::{BestScore, ScoreStore};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, LevelError, LevelSet, RenderSnapshot, TickInput, tick};
use crate::{cell_center, pixel_to_cell};

/// Game instance holding all state
#[derive(Debug)]
pub struct Game {
    state: GameState,
    input: TickInput,
    last_time: Option<f64>,
    events: Vec<GameEvent>,
    best: BestScore,
    settings: Settings,
    autopilot: bool,
}

impl Game {
    pub fn new(levels: LevelSet, seed: u64, store: Box<dyn ScoreStore>) -> Result<Self, LevelError> {
        Ok(Self::from_state(GameState::new(levels, seed)?, store))
    }

    pub fn from_state(state: GameState, store: Box<dyn ScoreStore>) -> Self {
        Self {
            state,
            input: TickInput::default(),
            last_time: None,
            events: Vec::new(),
            best: BestScore::new(store),
            settings: Settings::default(),
            autopilot: false,
        }
    }

    /// Advance to wall-clock time `now_ms`. Long gaps (a background tab)
    /// are clamped so carts don't teleport.
    pub fn frame(&mut self, now_ms: f64) {
        let dt = match self.last_time {
            Some(prev) => ((now_ms - prev).max(0.0) as f32).min(MAX_FRAME_DT_MS),
            None => 0.0,
        };
        self.last_time = Some(now_ms);
        self.step(dt);
    }

    /// Advance by an explicit `dt_ms`, consuming queued input
    pub fn step(&mut self, dt_ms: f32) {
        self.input.autopilot = self.autopilot;
        let events = tick(&mut self.state, &self.input, dt_ms);

        // Clear one-shot inputs after processing
        self.input = TickInput::default();

        let run_ended = events.iter().any(|e| {
            matches!(
                e,
                GameEvent::LevelComplete { .. }
                    | GameEvent::GameComplete { .. }
                    | GameEvent::GameOver { .. }
            )
        });
        self.events.extend(events);
        if run_ended && self.best.record(self.state.total_score) {
            self.events.push(GameEvent::NewBestScore {
                score: self.state.total_score,
            });
        }
    }

    /// Queue a click at a canvas pixel position
    pub fn click(&mut self, canvas_pos: Vec2) {
        self.input.clicks.push(canvas_pos);
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    pub fn restart(&mut self) {
        self.input.restart = true;
    }

    pub fn next_level(&mut self) {
        self.input.advance = true;
    }

    pub fn select_next_switch(&mut self) {
        self.input.select_next_switch = true;
    }

    pub fn toggle_selected(&mut self) {
        self.input.toggle_selected = true;
    }

    pub fn set_autopilot(&mut self, on: bool) {
        if self.autopilot != on {
            log::info!("Autopilot {}", if on { "on" } else { "off" });
        }
        self.autopilot = on;
    }

    /// Events since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn best_score(&self) -> u32 {
        self.best.get()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Render snapshot with the player's display preferences applied
    pub fn snapshot(&self) -> RenderSnapshot {
        let mut snap = RenderSnapshot::capture(&self.state);
        if !self.settings.show_hints {
            snap.hud.hint = None;
        }
        if self.settings.reduced_motion {
            for cart in &mut snap.carts {
                cart.center = cell_center(pixel_to_cell(cart.center));
            }
        }
        snap
    }
}
