//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Pointer coordinates (CSS pixels to canvas pixels)
//! - Keyboard bindings
//! - Storage (LocalStorage on web, see `web`)

use glam::{IVec2, Vec2};

use crate::consts::CELL_SIZE;
use crate::pixel_to_cell;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Space kept around the canvas when fitting it to the window
pub const DISPLAY_MARGIN: f32 = 40.0;

/// Canvas size in pixels for a grid
pub fn canvas_size(width: i32, height: i32) -> Vec2 {
    Vec2::new(width as f32, height as f32) * CELL_SIZE
}

/// Scale that fits the canvas in the viewport with a margin, never
/// enlarging it
pub fn display_scale(canvas: Vec2, viewport: Vec2) -> f32 {
    let room = (viewport - Vec2::splat(DISPLAY_MARGIN * 2.0)).max(Vec2::ZERO);
    (room / canvas).min_element().clamp(0.0, 1.0)
}

/// Maps pointer positions on a canvas drawn at a different size than its
/// backing store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMapping {
    /// Backing store size (canvas pixels)
    pub canvas: Vec2,
    /// On-screen size (CSS pixels)
    pub display: Vec2,
}

impl CanvasMapping {
    pub fn new(canvas: Vec2, display: Vec2) -> Self {
        Self { canvas, display }
    }

    /// Position relative to the canvas's top-left, CSS pixels to canvas
    /// pixels. An unsized display maps one to one.
    pub fn to_canvas(&self, client: Vec2) -> Vec2 {
        if self.display.x <= 0.0 || self.display.y <= 0.0 {
            return client;
        }
        client * self.canvas / self.display
    }

    pub fn to_cell(&self, client: Vec2) -> IVec2 {
        pixel_to_cell(self.to_canvas(client))
    }
}

/// What a key press asks the game to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SelectNextSwitch,
    ToggleSelected,
    Pause,
    Restart,
    NextLevel,
}

/// Key bindings, by `KeyboardEvent.key`
pub fn key_action(key: &str) -> Option<KeyAction> {
    let action = match key {
        "Tab" => KeyAction::SelectNextSwitch,
        " " | "Enter" => KeyAction::ToggleSelected,
        "Escape" | "p" | "P" => KeyAction::Pause,
        "r" | "R" => KeyAction::Restart,
        "n" | "N" => KeyAction::NextLevel,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_scales_to_canvas() {
        // 480x320 canvas shown at half size
        let m = CanvasMapping::new(Vec2::new(480.0, 320.0), Vec2::new(240.0, 160.0));
        assert_eq!(m.to_canvas(Vec2::new(30.0, 20.0)), Vec2::new(60.0, 40.0));
        assert_eq!(m.to_cell(Vec2::new(70.0, 21.0)), IVec2::new(3, 1));
    }

    #[test]
    fn test_unsized_display_is_identity() {
        let m = CanvasMapping::new(Vec2::new(480.0, 320.0), Vec2::ZERO);
        assert_eq!(m.to_canvas(Vec2::new(99.0, 5.0)), Vec2::new(99.0, 5.0));
    }

    #[test]
    fn test_display_scale() {
        let canvas = canvas_size(12, 8);
        assert_eq!(canvas, Vec2::new(480.0, 320.0));
        assert_eq!(display_scale(canvas, Vec2::new(1920.0, 1080.0)), 1.0);
        assert_eq!(display_scale(canvas, Vec2::new(320.0, 1080.0)), 0.5);
        assert_eq!(display_scale(canvas, Vec2::new(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_action("Tab"), Some(KeyAction::SelectNextSwitch));
        assert_eq!(key_action(" "), Some(KeyAction::ToggleSelected));
        assert_eq!(key_action("Escape"), Some(KeyAction::Pause));
        assert_eq!(key_action("x"), None);
    }
}
