//! Switch routing policy
//!
//! A switch offers one or two exits. When more than two neighbours are
//! open, exits are ranked by how far they lead from the spawn, with a bonus
//! for stepping closer to any delivery target, and the best two are kept.
//! That keeps a switch from offering a branch that only retreats.

use std::collections::HashSet;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{ColorTag, Direction, Grid};
use super::level::LevelError;
use crate::consts::{FORWARD_BIAS, MAX_SWITCH_EXITS};
use crate::manhattan;

/// Exits a switch at `pos` may offer, best first (at most two)
pub fn admissible_directions(grid: &Grid, pos: IVec2) -> Vec<Direction> {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| grid.is_traversable(pos + dir.offset()))
        .collect();

    if open.len() <= MAX_SWITCH_EXITS {
        return open;
    }

    let spawn = grid.spawn();
    let mut scored: Vec<(Direction, i32)> = open
        .into_iter()
        .map(|dir| {
            let stepped = pos + dir.offset();
            let closes_in = grid
                .targets()
                .iter()
                .any(|t| manhattan(stepped, t.pos) < manhattan(pos, t.pos));
            let score = manhattan(stepped, spawn) + if closes_in { FORWARD_BIAS } else { 0 };
            (dir, score)
        })
        .collect();

    // Stable sort: ties keep N, E, S, W order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(MAX_SWITCH_EXITS)
        .map(|(dir, _)| dir)
        .collect()
}

/// A user-controlled switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub pos: IVec2,
    /// Admissible exits, computed once at load
    exits: Vec<Direction>,
    /// Current exit; always one of `exits`
    direction: Direction,
}

impl Switch {
    /// Build the switch at `pos`, aimed at its first admissible exit
    pub fn new(grid: &Grid, pos: IVec2) -> Result<Self, LevelError> {
        let exits = admissible_directions(grid, pos);
        let direction = *exits
            .first()
            .ok_or(LevelError::IsolatedSwitch { x: pos.x, y: pos.y })?;
        Ok(Self {
            pos,
            exits,
            direction,
        })
    }

    pub fn exits(&self) -> &[Direction] {
        &self.exits
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance to the next admissible exit, wrapping.
    /// Returns false (and changes nothing) for a single-exit switch.
    pub fn cycle(&mut self) -> bool {
        if self.exits.len() < 2 {
            return false;
        }
        let current = self
            .exits
            .iter()
            .position(|&d| d == self.direction)
            .unwrap_or(0);
        self.direction = self.exits[(current + 1) % self.exits.len()];
        true
    }

    /// Aim the switch at a specific exit. Directions outside the admissible
    /// set are refused.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if self.direction == dir || !self.exits.contains(&dir) {
            return false;
        }
        self.direction = dir;
        true
    }
}

/// Heading a cart facing `facing` takes when leaving a switch set to
/// `selected`.
///
/// A cart never reverses through a switch while it has any alternative:
/// straight ahead if open, else the first non-reversing exit, and only
/// then the reversal itself.
pub fn guarded_heading(
    grid: &Grid,
    switch: &Switch,
    selected: Direction,
    facing: Direction,
) -> Direction {
    let back = facing.opposite();
    if selected != back {
        return selected;
    }
    if grid.is_traversable(switch.pos + facing.offset()) {
        return facing;
    }
    switch
        .exits()
        .iter()
        .copied()
        .find(|&d| d != back)
        .unwrap_or(selected)
}

/// Heading of a cart standing at `pos` facing `facing`: the (guarded)
/// switch setting on a switch, otherwise straight on.
pub fn resolve_heading(
    grid: &Grid,
    switches: &[Switch],
    pos: IVec2,
    facing: Direction,
) -> Direction {
    match switches.iter().find(|s| s.pos == pos) {
        Some(switch) => guarded_heading(grid, switch, switch.direction(), facing),
        None => facing,
    }
}

/// Target colours a cart could still reach after stepping from `from`
/// toward `heading`, if every switch ahead were set in its favour.
///
/// Follows the same forward-only rules carts move by; a wall ends a
/// branch, a target ends it with a delivery.
pub fn colors_reachable(
    grid: &Grid,
    switches: &[Switch],
    from: IVec2,
    heading: Direction,
) -> Vec<ColorTag> {
    let mut seen: HashSet<(IVec2, Direction)> = HashSet::new();
    let mut stack = vec![(from, heading)];
    let mut found = Vec::new();

    while let Some((pos, dir)) = stack.pop() {
        if !seen.insert((pos, dir)) {
            continue;
        }
        let next = pos + dir.offset();
        if !grid.is_traversable(next) {
            continue;
        }
        if let Some(color) = grid.target_at(next) {
            if !found.contains(&color) {
                found.push(color);
            }
            continue;
        }
        match switches.iter().find(|s| s.pos == next) {
            Some(switch) => {
                for &exit in switch.exits() {
                    stack.push((next, guarded_heading(grid, switch, exit, dir)));
                }
            }
            None => stack.push((next, dir)),
        }
    }

    found
}
