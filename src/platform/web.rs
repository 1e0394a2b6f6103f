//! Browser bindings
//!
//! JavaScript owns the canvas, the animation frame loop and the oscillators.
//! Each frame it calls `frame`, draws the returned snapshot and plays the
//! tones from `drain_feedback`.

use glam::Vec2;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::{CanvasMapping, KeyAction, canvas_size, display_scale, key_action};
use crate::audio::{Tone, cues_for};
use crate::game::Game;
use crate::highscores::LocalStorageScoreStore;
use crate::settings::Settings;
use crate::sim::{GameEvent, LevelSet};

#[derive(Serialize)]
struct Feedback {
    events: Vec<GameEvent>,
    tones: Vec<Tone>,
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    /// On-screen canvas size in CSS pixels
    display: Vec2,
}

#[wasm_bindgen]
impl WebGame {
    /// New game from a JSON level set, or the built-in levels. Without a
    /// seed the run is seeded from the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>, levels_json: Option<String>) -> Result<WebGame, JsError> {
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        let levels = match levels_json {
            Some(json) => LevelSet::from_json_str(&json),
            None => LevelSet::builtin(),
        }
        .map_err(js_error)?;

        let mut game =
            Game::new(levels, seed, Box::new(LocalStorageScoreStore)).map_err(js_error)?;
        game.set_settings(Settings::load());
        log::info!("Game initialized with seed: {}", seed);

        Ok(Self {
            game,
            display: Vec2::ZERO,
        })
    }

    /// Canvas backing-store width for the current level
    pub fn canvas_width(&self) -> f32 {
        self.canvas().x
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas().y
    }

    /// CSS scale that fits the canvas in a viewport
    pub fn display_scale(&self, viewport_width: f32, viewport_height: f32) -> f32 {
        display_scale(self.canvas(), Vec2::new(viewport_width, viewport_height))
    }

    /// Tell the game how large the canvas is drawn on screen
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.display = Vec2::new(width, height);
    }

    /// Advance to `now` (from requestAnimationFrame) and return the render
    /// snapshot as JSON
    pub fn frame(&mut self, now: f64) -> Result<String, JsError> {
        self.game.frame(now);
        serde_json::to_string(&self.game.snapshot()).map_err(js_error)
    }

    /// Pointer press, relative to the canvas's top-left in CSS pixels.
    /// Returns true if it landed on a switch.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        let mapping = CanvasMapping::new(self.canvas(), self.display);
        let client = Vec2::new(x, y);
        if !self.game.state().board.grid.is_switch(mapping.to_cell(client)) {
            return false;
        }
        self.game.click(mapping.to_canvas(client));
        true
    }

    /// Returns true if the key was handled (the caller should prevent the
    /// default action)
    pub fn key_down(&mut self, key: &str) -> bool {
        let Some(action) = key_action(key) else {
            return false;
        };
        match action {
            KeyAction::SelectNextSwitch => self.game.select_next_switch(),
            KeyAction::ToggleSelected => self.game.toggle_selected(),
            KeyAction::Pause => self.game.toggle_pause(),
            KeyAction::Restart => self.game.restart(),
            KeyAction::NextLevel => self.game.next_level(),
        }
        true
    }

    pub fn toggle_pause(&mut self) {
        self.game.toggle_pause();
    }

    pub fn restart(&mut self) {
        self.game.restart();
    }

    pub fn next_level(&mut self) {
        self.game.next_level();
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.game.set_autopilot(on);
    }

    pub fn best_score(&self) -> u32 {
        self.game.best_score()
    }

    pub fn set_muted(&mut self, muted: bool) {
        let mut settings = self.game.settings().clone();
        settings.muted = muted;
        settings.save();
        self.game.set_settings(settings);
    }

    pub fn set_volume(&mut self, master: f32) {
        let mut settings = self.game.settings().clone();
        settings.set_master_volume(master);
        settings.save();
        self.game.set_settings(settings);
    }

    /// Events since the last call plus the tones to play for them, as JSON
    pub fn drain_feedback(&mut self) -> Result<String, JsError> {
        let events = self.game.drain_events();
        let tones = cues_for(&events, self.game.settings());
        serde_json::to_string(&Feedback { events, tones }).map_err(js_error)
    }
}

impl WebGame {
    fn canvas(&self) -> Vec2 {
        let grid = &self.game.state().board.grid;
        canvas_size(grid.width(), grid.height())
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Cart Sorter starting...");
}
