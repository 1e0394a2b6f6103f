//! Cart Sorter - a switch-routing puzzle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, switch routing, carts, difficulty, session)
//! - `audio`: Feedback cues derived from simulation events
//! - `highscores`: Best score capability (LocalStorage on web)
//! - `settings`: Player preferences
//! - `game`: Frame driver that turns wall-clock frames into simulation ticks
//! - `platform`: Browser/native platform abstraction

pub mod audio;
pub mod game;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use highscores::{BestScore, MemoryScoreStore, ScoreStore};
pub use settings::Settings;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Side length of one grid cell in canvas pixels
    pub const CELL_SIZE: f32 = 40.0;

    /// Lives at the start of a run (and after an explicit restart)
    pub const STARTING_LIVES: u8 = 3;

    /// Largest frame delta fed to the simulation (ms), so a backgrounded
    /// tab doesn't teleport carts when it comes back
    pub const MAX_FRAME_DT_MS: f32 = 250.0;

    /// Every this many points of total score raise the difficulty one step
    pub const SCORE_PER_BOOST: u32 = 3;
    /// Move time shaved off per difficulty step (ms per cell)
    pub const MOVE_BOOST_MS: f32 = 30.0;
    /// Spawn interval shaved off per difficulty step (ms)
    pub const SPAWN_BOOST_MS: f32 = 100.0;

    /// Score bonus for a switch exit that closes in on a delivery target
    pub const FORWARD_BIAS: i32 = 10;
    /// Most exits a switch offers
    pub const MAX_SWITCH_EXITS: usize = 2;
}

/// Top-left corner of a grid cell in canvas pixels
#[inline]
pub fn cell_to_pixel(cell: IVec2) -> Vec2 {
    cell.as_vec2() * consts::CELL_SIZE
}

/// Center of a grid cell in canvas pixels
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell_to_pixel(cell) + Vec2::splat(consts::CELL_SIZE / 2.0)
}

/// Grid cell containing a canvas pixel (floor division by the cell size)
#[inline]
pub fn pixel_to_cell(pixel: Vec2) -> IVec2 {
    (pixel / consts::CELL_SIZE).floor().as_ivec2()
}

/// Manhattan distance between two grid cells
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_cell_floors() {
        assert_eq!(pixel_to_cell(Vec2::new(0.0, 0.0)), IVec2::new(0, 0));
        assert_eq!(pixel_to_cell(Vec2::new(39.9, 79.9)), IVec2::new(0, 1));
        assert_eq!(pixel_to_cell(Vec2::new(40.0, 80.0)), IVec2::new(1, 2));
        assert_eq!(pixel_to_cell(Vec2::new(-1.0, 5.0)), IVec2::new(-1, 0));
    }

    #[test]
    fn test_cell_center() {
        assert_eq!(cell_center(IVec2::new(2, 1)), Vec2::new(100.0, 60.0));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(manhattan(IVec2::new(1, 1), IVec2::new(4, 3)), 5);
        assert_eq!(manhattan(IVec2::new(4, 3), IVec2::new(1, 1)), 5);
    }
}
