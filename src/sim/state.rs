//! Game state and core simulation types
//!
//! `GameState` is the session: lives, scores, level index and the phase
//! machine. `Board` is everything that is rebuilt when a level loads.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::grid::{ColorTag, Direction, Grid};
use super::level::{ColorOrder, Level, LevelDescriptor, LevelError, LevelSet, spawn_facing};
use super::routing::Switch;
use super::tick::Trigger;
use crate::consts::STARTING_LIVES;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Spawning, moving and accepting switch clicks
    Running,
    /// Spawn/move ticks and animation frozen
    Paused,
    /// Attempt quota reached; waiting for "advance"
    LevelComplete { level_score: u32, attempts: u32 },
    /// Final level completed
    GameComplete { total_score: u32 },
    /// Out of lives; waiting for "restart"
    GameOver,
}

impl GamePhase {
    pub fn is_running(&self) -> bool {
        matches!(self, GamePhase::Running)
    }

    /// Phase after a pause toggle; terminal phases ignore it
    pub fn toggled_pause(self) -> Self {
        match self {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Running => "running",
            GamePhase::Paused => "paused",
            GamePhase::LevelComplete { .. } => "level-complete",
            GamePhase::GameComplete { .. } => "game-complete",
            GamePhase::GameOver => "game-over",
        }
    }
}

/// Why a spawn attempt didn't produce a cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnSkip {
    /// A cart stands on (or is entering) the spawn cell
    Blocked,
    /// The level's in-flight limit is reached
    AtCapacity,
}

/// Discrete events the core emits for feedback layers (audio, speech, HUD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GameEvent {
    LevelStarted { level: usize },
    CartSpawned { id: u32, color: ColorTag },
    SpawnSkipped { reason: SpawnSkip },
    SwitchToggled { pos: IVec2, direction: Direction },
    DeliverySuccess { id: u32, color: ColorTag },
    DeliveryFailure { id: u32, color: ColorTag, target: ColorTag },
    /// A cart drove into a wall or off the map (no life lost)
    WallCollision { id: u32, at: IVec2 },
    /// Two carts claimed the same cell; both are gone
    CartCollision { id: u32, other: u32, at: IVec2 },
    LifeLost { remaining: u8 },
    LevelComplete { level: usize, level_score: u32, attempts: u32 },
    GameComplete { total_score: u32 },
    GameOver { level: usize, total_score: u32 },
    Paused,
    Resumed,
    /// Emitted by the frame driver when the stored best score improves
    NewBestScore { score: u32 },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::LevelStarted { .. } => "level-started",
            GameEvent::CartSpawned { .. } => "cart-spawned",
            GameEvent::SpawnSkipped { .. } => "spawn-skipped",
            GameEvent::SwitchToggled { .. } => "switch-toggled",
            GameEvent::DeliverySuccess { .. } => "delivery-success",
            GameEvent::DeliveryFailure { .. } => "delivery-failure",
            GameEvent::WallCollision { .. } => "wall-collision",
            GameEvent::CartCollision { .. } => "cart-collision",
            GameEvent::LifeLost { .. } => "life-lost",
            GameEvent::LevelComplete { .. } => "level-complete",
            GameEvent::GameComplete { .. } => "game-complete",
            GameEvent::GameOver { .. } => "game-over",
            GameEvent::Paused => "paused",
            GameEvent::Resumed => "resumed",
            GameEvent::NewBestScore { .. } => "new-best-score",
        }
    }
}

/// Per-level state, rebuilt on every level load
#[derive(Debug, Clone)]
pub struct Board {
    pub descriptor: LevelDescriptor,
    pub grid: Grid,
    pub switches: Vec<Switch>,
    /// In-flight carts, in spawn (id) order
    pub carts: Vec<Cart>,
    /// Switch the keyboard acts on; the last one clicked
    pub selected_switch: Option<usize>,
    pub spawn_facing: Direction,
    /// Deliveries attempted this level (right or wrong)
    pub attempts: u32,
    /// Correct deliveries this level
    pub level_score: u32,
    pub(crate) spawn_trigger: Trigger,
    pub(crate) move_trigger: Trigger,
    color_counter: usize,
}

impl Board {
    pub fn from_level(level: &Level) -> Self {
        Self {
            descriptor: level.descriptor.clone(),
            grid: level.grid.clone(),
            switches: level.switches.clone(),
            carts: Vec::new(),
            selected_switch: (!level.switches.is_empty()).then_some(0),
            spawn_facing: spawn_facing(&level.grid),
            attempts: 0,
            level_score: 0,
            spawn_trigger: Trigger::default(),
            move_trigger: Trigger::default(),
            color_counter: 0,
        }
    }

    pub fn cart_index(&self, id: u32) -> Option<usize> {
        self.carts.iter().position(|c| c.id == id)
    }

    pub fn remove_cart(&mut self, id: u32) -> Option<Cart> {
        self.cart_index(id).map(|i| self.carts.remove(i))
    }

    pub fn switch_index(&self, pos: IVec2) -> Option<usize> {
        if !self.grid.is_switch(pos) {
            return None;
        }
        self.switches.iter().position(|s| s.pos == pos)
    }

    /// True if any cart stands on or is heading into `pos`
    pub fn is_claimed(&self, pos: IVec2) -> bool {
        self.carts.iter().any(|c| c.claims(pos))
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    levels: LevelSet,
    /// Current level (0-based)
    pub level_index: usize,
    pub lives: u8,
    /// Score banked from completed levels
    pub total_score: u32,
    /// `total_score` when the current level started; restored on restart
    level_start_total: u32,
    pub phase: GamePhase,
    pub board: Board,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Start a run at the first level
    pub fn new(levels: LevelSet, seed: u64) -> Result<Self, LevelError> {
        Self::starting_at(levels, seed, 0)
    }

    /// Start a run at a given level (0-based)
    pub fn starting_at(levels: LevelSet, seed: u64, index: usize) -> Result<Self, LevelError> {
        let level = levels.get(index).ok_or(LevelError::LevelOutOfRange {
            index,
            count: levels.len(),
        })?;
        let board = Board::from_level(level);
        log::info!("Starting run at level {} (seed {})", index + 1, seed);
        Ok(Self {
            seed,
            levels,
            level_index: index,
            lives: STARTING_LIVES,
            total_score: 0,
            level_start_total: 0,
            phase: GamePhase::Running,
            board,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        })
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn is_final_level(&self) -> bool {
        self.levels.is_last(self.level_index)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Colour for the next spawn. Advances even when the spawn is skipped.
    pub(crate) fn next_color(&mut self) -> ColorTag {
        let colors = &self.board.descriptor.colors;
        match self.board.descriptor.color_order {
            ColorOrder::Cycle => {
                let color = colors[self.board.color_counter % colors.len()];
                self.board.color_counter += 1;
                color
            }
            ColorOrder::Random => colors[self.rng.random_range(0..colors.len())],
        }
    }

    fn load_level(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let Some(level) = self.levels.get(index) else {
            // Indices are checked by callers; keep the current board
            log::error!("Level {} does not exist", index + 1);
            return;
        };
        self.board = Board::from_level(level);
        self.level_index = index;
        self.level_start_total = self.total_score;
        self.phase = GamePhase::Running;
        log::info!(
            "Level {} loaded ({} switches, {} targets)",
            index + 1,
            self.board.switches.len(),
            self.board.grid.targets().len()
        );
        events.push(GameEvent::LevelStarted { level: index });
    }

    /// Lose a life for a mistake, unless the level forgives mistakes
    pub(crate) fn penalize(&mut self, events: &mut Vec<GameEvent>) {
        if self.board.descriptor.forgiving {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost {
            remaining: self.lives,
        });
        if self.lives == 0 {
            self.phase = GamePhase::GameOver;
            log::info!(
                "Game over on level {} (total score {})",
                self.level_index + 1,
                self.total_score
            );
            events.push(GameEvent::GameOver {
                level: self.level_index,
                total_score: self.total_score,
            });
        }
    }

    /// Bank the level score and leave the running phase
    pub(crate) fn complete_level(&mut self, events: &mut Vec<GameEvent>) {
        let level_score = self.board.level_score;
        let attempts = self.board.attempts;
        self.total_score += level_score;
        log::info!(
            "Level {} complete: {}/{} (total {})",
            self.level_index + 1,
            level_score,
            attempts,
            self.total_score
        );
        events.push(GameEvent::LevelComplete {
            level: self.level_index,
            level_score,
            attempts,
        });

        if self.is_final_level() {
            self.phase = GamePhase::GameComplete {
                total_score: self.total_score,
            };
            events.push(GameEvent::GameComplete {
                total_score: self.total_score,
            });
        } else {
            self.phase = GamePhase::LevelComplete {
                level_score,
                attempts,
            };
        }
    }

    /// Move on from a completed level. Lives carry over.
    pub(crate) fn advance(&mut self, events: &mut Vec<GameEvent>) -> bool {
        if !matches!(self.phase, GamePhase::LevelComplete { .. }) || self.is_final_level() {
            return false;
        }
        self.load_level(self.level_index + 1, events);
        true
    }

    /// Fresh lives and a fresh board. After finishing the whole run this
    /// starts over from the first level.
    pub(crate) fn restart(&mut self, events: &mut Vec<GameEvent>) {
        self.lives = STARTING_LIVES;
        let index = if matches!(self.phase, GamePhase::GameComplete { .. }) {
            self.level_start_total = 0;
            0
        } else {
            self.level_index
        };
        self.total_score = self.level_start_total;
        self.load_level(index, events);
    }
}
