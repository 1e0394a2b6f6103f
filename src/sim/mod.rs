//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time advances only through `tick`'s `dt`
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod cart;
pub mod difficulty;
pub mod grid;
pub mod level;
pub mod routing;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use cart::{Cart, Motion};
pub use difficulty::{SpeedFloors, Speeds, current_speeds};
pub use grid::{CellKind, ColorTag, Direction, Grid, Target};
pub use level::{ColorOrder, Level, LevelDescriptor, LevelError, LevelSet};
pub use routing::{Switch, admissible_directions, colors_reachable, resolve_heading};
pub use snapshot::{CartView, Hud, RenderSnapshot, SwitchView};
pub use state::{Board, GameEvent, GamePhase, GameState, SpawnSkip};
pub use tick::{TickInput, tick};
