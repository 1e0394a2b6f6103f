//! Difficulty scheduler
//!
//! Every few points of total score shave time off both the move and the
//! spawn cadence, down to a per-level floor.

use serde::{Deserialize, Serialize};

use super::level::LevelDescriptor;
use crate::consts::{MOVE_BOOST_MS, SCORE_PER_BOOST, SPAWN_BOOST_MS};

/// Lowest fraction of the base timings the scheduler may reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedFloors {
    pub move_factor: f32,
    pub spawn_factor: f32,
}

impl SpeedFloors {
    /// Gentler floor for tutorial levels
    pub const TUTORIAL: SpeedFloors = SpeedFloors {
        move_factor: 0.75,
        spawn_factor: 0.85,
    };
}

impl Default for SpeedFloors {
    fn default() -> Self {
        Self {
            move_factor: 0.6,
            spawn_factor: 0.7,
        }
    }
}

/// Current cadences, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speeds {
    /// Time for a cart to cross one cell; also the movement tick period
    pub move_ms: f32,
    /// Time between spawn attempts
    pub spawn_interval_ms: f32,
}

/// Cadences for a level given the run's total score
pub fn current_speeds(total_score: u32, level: &LevelDescriptor) -> Speeds {
    speeds_for(total_score, level.move_speed, level.spawn_interval, level.floors)
}

pub fn speeds_for(
    total_score: u32,
    base_move_ms: f32,
    base_spawn_ms: f32,
    floors: SpeedFloors,
) -> Speeds {
    let boost = (total_score / SCORE_PER_BOOST) as f32;
    Speeds {
        move_ms: (base_move_ms - boost * MOVE_BOOST_MS).max(base_move_ms * floors.move_factor),
        spawn_interval_ms: (base_spawn_ms - boost * SPAWN_BOOST_MS)
            .max(base_spawn_ms * floors.spawn_factor),
    }
}
