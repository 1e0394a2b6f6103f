//! Read-only view of the game for renderers
//!
//! Everything a frontend needs to draw a frame: the map, carts at their
//! interpolated pixel positions, switch settings and the HUD values.

use glam::{IVec2, Vec2};
use serde::Serialize;

use super::grid::{CellKind, ColorTag, Direction};
use super::state::GameState;
use crate::consts::{CELL_SIZE, STARTING_LIVES};
use crate::pixel_to_cell;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: u32,
    pub color: ColorTag,
    /// Interpolated center in canvas pixels
    pub center: Vec2,
    pub facing: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchView {
    pub pos: IVec2,
    pub direction: Direction,
    pub exits: Vec<Direction>,
    /// Keyboard selection highlight
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hud {
    /// 1-based, for display
    pub level: usize,
    pub level_count: usize,
    pub level_name: Option<String>,
    pub level_score: u32,
    pub attempts: u32,
    pub quota: u32,
    pub total_score: u32,
    pub lives: u8,
    pub max_lives: u8,
    pub phase: &'static str,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub width: i32,
    pub height: i32,
    pub cell_size: f32,
    /// Row-major cell kinds
    pub cells: Vec<CellKind>,
    /// Map rows as symbols; `+` marks switches
    pub rows: Vec<String>,
    pub carts: Vec<CartView>,
    pub switches: Vec<SwitchView>,
    pub hud: Hud,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let board = &state.board;
        let grid = &board.grid;

        let rows = (0..grid.height())
            .map(|y| {
                (0..grid.width())
                    .map(|x| grid.symbol(IVec2::new(x, y)))
                    .collect()
            })
            .collect();

        let carts = board
            .carts
            .iter()
            .map(|c| CartView {
                id: c.id,
                color: c.color,
                center: c.pixel_center(),
                facing: c.facing,
            })
            .collect();

        let switches = board
            .switches
            .iter()
            .enumerate()
            .map(|(i, s)| SwitchView {
                pos: s.pos,
                direction: s.direction(),
                exits: s.exits().to_vec(),
                selected: board.selected_switch == Some(i),
            })
            .collect();

        Self {
            width: grid.width(),
            height: grid.height(),
            cell_size: CELL_SIZE,
            cells: grid.iter().map(|(_, kind)| kind).collect(),
            rows,
            carts,
            switches,
            hud: Hud {
                level: state.level_index + 1,
                level_count: state.levels().len(),
                level_name: board.descriptor.name.clone(),
                level_score: board.level_score,
                attempts: board.attempts,
                quota: board.descriptor.attempts,
                total_score: state.total_score,
                lives: state.lives,
                max_lives: STARTING_LIVES,
                phase: state.phase.as_str(),
                hint: board.descriptor.hint.clone(),
            },
        }
    }

    /// Text rendering of the board: switches show their setting as an
    /// arrow, carts show as their lowercase colour letter.
    pub fn to_ascii(&self) -> String {
        let mut canvas: Vec<Vec<char>> = self.rows.iter().map(|r| r.chars().collect()).collect();

        let mut put = |pos: IVec2, ch: char| {
            let (Ok(x), Ok(y)) = (usize::try_from(pos.x), usize::try_from(pos.y)) else {
                return;
            };
            if let Some(cell) = canvas.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = ch;
            }
        };

        for s in &self.switches {
            let arrow = match s.direction {
                Direction::North => '^',
                Direction::East => '>',
                Direction::South => 'v',
                Direction::West => '<',
            };
            put(s.pos, arrow);
        }
        for c in &self.carts {
            put(pixel_to_cell(c.center), c.color.0.to_ascii_lowercase());
        }

        let mut out = String::new();
        for row in canvas {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelSet;
    use crate::sim::tick::{TickInput, tick};

    #[test]
    fn test_capture_first_level() {
        let state = GameState::new(LevelSet::builtin().unwrap(), 3).unwrap();
        let snap = RenderSnapshot::capture(&state);
        assert_eq!(snap.width, 12);
        assert_eq!(snap.height, 8);
        assert_eq!(snap.rows[1], "#S--+--G  ##");
        assert_eq!(snap.hud.level, 1);
        assert_eq!(snap.hud.level_count, 5);
        assert_eq!(snap.hud.quota, 10);
        assert_eq!(snap.hud.phase, "running");
        assert!(snap.hud.hint.is_some());
        assert!(snap.switches[0].selected);
        assert!(snap.carts.is_empty());
        assert_eq!(snap.cells.len(), 12 * 8);
        assert_eq!(snap.cells[12 + 1], CellKind::Spawn);
        assert_eq!(snap.cells[12 + 7], CellKind::Target(ColorTag('G')));
    }

    #[test]
    fn test_ascii_shows_carts_and_switches() {
        let mut state = GameState::new(LevelSet::builtin().unwrap(), 3).unwrap();
        tick(&mut state, &TickInput::default(), 1.0);
        let text = RenderSnapshot::capture(&state).to_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "#g-->--G  ##");
        assert_eq!(lines[4], "#   ^--B  ##");
    }

    #[test]
    fn test_serializes_camel_case() {
        let state = GameState::new(LevelSet::builtin().unwrap(), 3).unwrap();
        let json = serde_json::to_value(RenderSnapshot::capture(&state)).unwrap();
        assert_eq!(json["cellSize"], 40.0);
        assert_eq!(json["hud"]["levelCount"], 5);
        assert_eq!(json["switches"][0]["direction"], "East");
    }
}
