//! Carts: the moving items routed from the spawn to delivery targets

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::grid::{ColorTag, Direction};
use crate::cell_center;

/// Where a cart is in its current step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Standing on `Cart::cell`, waiting for the next movement tick
    Idle,
    /// Crossing from `Cart::cell` to `to`; `progress` is in [0, 1)
    Transiting { to: IVec2, progress: f32 },
}

/// A cart entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: u32,
    /// Cell the cart stands on (or is leaving)
    pub cell: IVec2,
    pub color: ColorTag,
    pub facing: Direction,
    pub motion: Motion,
}

impl Cart {
    pub fn new(id: u32, cell: IVec2, color: ColorTag, facing: Direction) -> Self {
        Self {
            id,
            cell,
            color,
            facing,
            motion: Motion::Idle,
        }
    }

    pub fn is_transiting(&self) -> bool {
        matches!(self.motion, Motion::Transiting { .. })
    }

    /// Cell the cart is heading to, if mid-step
    pub fn target(&self) -> Option<IVec2> {
        match self.motion {
            Motion::Transiting { to, .. } => Some(to),
            Motion::Idle => None,
        }
    }

    /// Movement progress through the current step (0 when idle)
    pub fn progress(&self) -> f32 {
        match self.motion {
            Motion::Transiting { progress, .. } => progress,
            Motion::Idle => 0.0,
        }
    }

    /// True if the cart stands on or is heading into `pos`
    pub fn claims(&self, pos: IVec2) -> bool {
        self.cell == pos || self.target() == Some(pos)
    }

    /// Start crossing one cell toward `heading`
    pub fn begin_step(&mut self, heading: Direction) {
        self.facing = heading;
        self.motion = Motion::Transiting {
            to: self.cell + heading.offset(),
            progress: 0.0,
        };
    }

    /// Accumulate `dt_ms / move_ms` of progress. On reaching 1 the cart
    /// snaps to its target cell, goes idle and this returns true.
    pub fn advance(&mut self, dt_ms: f32, move_ms: f32) -> bool {
        let Motion::Transiting { to, progress } = self.motion else {
            return false;
        };

        let progress = (progress + dt_ms / move_ms).min(1.0);
        if progress >= 1.0 {
            self.cell = to;
            self.motion = Motion::Idle;
            true
        } else {
            self.motion = Motion::Transiting { to, progress };
            false
        }
    }

    /// Interpolated pixel-space center, for rendering
    pub fn pixel_center(&self) -> Vec2 {
        let from = cell_center(self.cell);
        match self.motion {
            Motion::Transiting { to, progress } => from.lerp(cell_center(to), progress),
            Motion::Idle => from,
        }
    }
}
