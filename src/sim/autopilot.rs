//! Autopilot: plays the switches for demo/idle mode
//!
//! Runs just before a movement tick. Any cart waiting on a switch whose
//! current setting can't lead to the cart's colour gets the switch turned
//! to an exit that can.

use super::grid::Direction;
use super::routing::{colors_reachable, guarded_heading};
use super::state::{Board, GameEvent};

pub fn aim_switches(board: &mut Board, events: &mut Vec<GameEvent>) {
    for cart_index in 0..board.carts.len() {
        let cart = &board.carts[cart_index];
        if cart.is_transiting() {
            continue;
        }
        let Some(switch_index) = board.switch_index(cart.cell) else {
            continue;
        };

        let switch = &board.switches[switch_index];
        let reaches = |exit: Direction| {
            let heading = guarded_heading(&board.grid, switch, exit, cart.facing);
            colors_reachable(&board.grid, &board.switches, cart.cell, heading).contains(&cart.color)
        };
        if reaches(switch.direction()) {
            continue;
        }
        // No exit helps: leave it alone and let the cart take its chances
        let Some(better) = switch.exits().iter().copied().find(|&exit| reaches(exit)) else {
            continue;
        };

        let switch = &mut board.switches[switch_index];
        if switch.set_direction(better) {
            log::trace!("Autopilot turned switch at {} {}", switch.pos, better.as_str());
            events.push(GameEvent::SwitchToggled {
                pos: switch.pos,
                direction: better,
            });
        }
    }
}
