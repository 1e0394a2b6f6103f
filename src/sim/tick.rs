//! Simulation tick
//!
//! Advances the game by one frame. Spawning and movement run on their own
//! cadence triggers; cart animation advances every running frame.

use glam::Vec2;

use super::autopilot;
use super::cart::Cart;
use super::difficulty::current_speeds;
use super::routing::resolve_heading;
use super::state::{Board, GameEvent, GamePhase, GameState, SpawnSkip};
use crate::pixel_to_cell;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Clicks/taps this frame, in canvas pixels
    pub clicks: Vec<Vec2>,
    /// Move the keyboard selection to the next switch
    pub select_next_switch: bool,
    /// Cycle the selected switch
    pub toggle_selected: bool,
    /// Pause toggle
    pub pause: bool,
    /// Reload the current level with fresh lives
    pub restart: bool,
    /// Continue after a completed level
    pub advance: bool,
    /// Let the autopilot aim switches for carts standing on them
    pub autopilot: bool,
}

/// Fires once per `period_ms` of accumulated time. A fresh trigger fires
/// on its first check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trigger {
    since_last: Option<f32>,
}

impl Trigger {
    pub fn fire(&mut self, dt_ms: f32, period_ms: f32) -> bool {
        let elapsed = match self.since_last {
            None => {
                self.since_last = Some(0.0);
                return true;
            }
            Some(t) => t + dt_ms,
        };
        if elapsed >= period_ms {
            self.since_last = Some(0.0);
            true
        } else {
            self.since_last = Some(elapsed);
            false
        }
    }
}

/// Advance the game state by `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.restart {
        state.restart(&mut events);
        return events;
    }
    if input.advance && state.advance(&mut events) {
        return events;
    }

    if input.pause {
        let next = state.phase.toggled_pause();
        if next != state.phase {
            log::debug!("Phase {} -> {}", state.phase.as_str(), next.as_str());
            events.push(if next == GamePhase::Paused {
                GameEvent::Paused
            } else {
                GameEvent::Resumed
            });
            state.phase = next;
        }
    }

    // Nothing moves (and switches don't respond) outside the running phase
    if !state.phase.is_running() {
        return events;
    }

    handle_switch_input(state, input, &mut events);

    let speeds = current_speeds(state.total_score, &state.board.descriptor);

    if state
        .board
        .spawn_trigger
        .fire(dt_ms, speeds.spawn_interval_ms)
    {
        spawn_cart(state, &mut events);
    }

    if state.board.move_trigger.fire(dt_ms, speeds.move_ms) {
        if input.autopilot {
            autopilot::aim_switches(&mut state.board, &mut events);
        }
        move_carts(state, &mut events);
    }

    if state.phase.is_running() {
        animate_carts(state, dt_ms, speeds.move_ms, &mut events);
    }

    events
}

fn handle_switch_input(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    let board = &mut state.board;

    for &click in &input.clicks {
        let cell = pixel_to_cell(click);
        if let Some(index) = board.switch_index(cell) {
            board.selected_switch = Some(index);
            toggle_switch(board, index, events);
        }
    }

    if input.select_next_switch && !board.switches.is_empty() {
        let next = match board.selected_switch {
            Some(i) => (i + 1) % board.switches.len(),
            None => 0,
        };
        board.selected_switch = Some(next);
    }

    if input.toggle_selected {
        if let Some(index) = board.selected_switch {
            toggle_switch(board, index, events);
        }
    }
}

fn toggle_switch(board: &mut Board, index: usize, events: &mut Vec<GameEvent>) {
    let Some(switch) = board.switches.get_mut(index) else {
        return;
    };
    if switch.cycle() {
        events.push(GameEvent::SwitchToggled {
            pos: switch.pos,
            direction: switch.direction(),
        });
    }
}

fn spawn_cart(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let color = state.next_color();
    let board = &state.board;
    let spawn = board.grid.spawn();

    if board
        .descriptor
        .max_carts
        .is_some_and(|max| board.carts.len() >= max)
    {
        events.push(GameEvent::SpawnSkipped {
            reason: SpawnSkip::AtCapacity,
        });
        return;
    }
    if board.is_claimed(spawn) {
        events.push(GameEvent::SpawnSkipped {
            reason: SpawnSkip::Blocked,
        });
        return;
    }

    let id = state.next_entity_id();
    let facing = state.board.spawn_facing;
    state.board.carts.push(Cart::new(id, spawn, color, facing));
    log::trace!("Cart {} ({}) spawned", id, color);
    events.push(GameEvent::CartSpawned { id, color });
}

/// One movement tick: every idle cart picks its heading and starts a step,
/// in spawn order.
fn move_carts(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let ids: Vec<u32> = state.board.carts.iter().map(|c| c.id).collect();

    for id in ids {
        if !state.phase.is_running() {
            break;
        }
        let board = &mut state.board;
        // Carts removed by an earlier collision this tick are skipped
        let Some(index) = board.cart_index(id) else {
            continue;
        };
        let cart = &board.carts[index];
        if cart.is_transiting() {
            continue;
        }

        let heading = resolve_heading(&board.grid, &board.switches, cart.cell, cart.facing);
        let next = cart.cell + heading.offset();

        if !board.grid.is_traversable(next) {
            board.carts.remove(index);
            log::debug!("Cart {} ran into a wall at {}", id, next);
            events.push(GameEvent::WallCollision { id, at: next });
            continue;
        }

        let blocker = board
            .carts
            .iter()
            .find(|c| c.id != id && c.claims(next))
            .map(|c| c.id);
        if let Some(other) = blocker {
            board.remove_cart(id);
            board.remove_cart(other);
            log::debug!("Carts {} and {} collided at {}", id, other, next);
            events.push(GameEvent::CartCollision { id, other, at: next });
            state.penalize(events);
            continue;
        }

        board.carts[index].begin_step(heading);
    }
}

fn animate_carts(state: &mut GameState, dt_ms: f32, move_ms: f32, events: &mut Vec<GameEvent>) {
    let arrivals: Vec<u32> = state
        .board
        .carts
        .iter_mut()
        .filter_map(|cart| cart.advance(dt_ms, move_ms).then_some(cart.id))
        .collect();

    for id in arrivals {
        if !state.phase.is_running() {
            break;
        }
        deliver(state, id, events);
    }
}

/// Resolve a cart that just arrived on a cell, if that cell is a target
fn deliver(state: &mut GameState, id: u32, events: &mut Vec<GameEvent>) {
    let board = &mut state.board;
    let Some(index) = board.cart_index(id) else {
        return;
    };
    let Some(target) = board.grid.target_at(board.carts[index].cell) else {
        return;
    };

    let cart = board.carts.remove(index);
    board.attempts += 1;
    if cart.color == target {
        board.level_score += 1;
        events.push(GameEvent::DeliverySuccess {
            id,
            color: cart.color,
        });
    } else {
        events.push(GameEvent::DeliveryFailure {
            id,
            color: cart.color,
            target,
        });
        state.penalize(events);
    }

    // Running out of lives on the last attempt ends the game, not the level
    if state.phase.is_running() && state.board.attempts >= state.board.descriptor.attempts {
        state.complete_level(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_center;
    use crate::consts::STARTING_LIVES;
    use crate::sim::difficulty::SpeedFloors;
    use crate::sim::grid::{ColorTag, Direction};
    use crate::sim::level::{ColorOrder, LevelDescriptor, LevelSet};
    use glam::IVec2;
    use proptest::prelude::*;

    const DT: f32 = 50.0;

    const FORK: [&str; 5] = [
        "#######",
        "#S-+-G#",
        "#  |  #",
        "#  B  #",
        "#######",
    ];

    const DEAD_END: [&str; 5] = [
        "#######",
        "#S-+--#",
        "#  |  #",
        "#  G  #",
        "#######",
    ];

    fn descriptor(map: &[&str], colors: &str, attempts: u32) -> LevelDescriptor {
        LevelDescriptor {
            name: None,
            attempts,
            spawn_interval: 1000.0,
            move_speed: 100.0,
            colors: colors.chars().map(ColorTag).collect(),
            map: map.iter().map(|r| r.to_string()).collect(),
            floors: SpeedFloors::default(),
            forgiving: false,
            max_carts: None,
            color_order: ColorOrder::Cycle,
            hint: None,
        }
    }

    /// Two copies of a level, so finishing the first isn't the end of the run
    fn state_for(map: &[&str], colors: &str, attempts: u32) -> GameState {
        let d = descriptor(map, colors, attempts);
        let levels = LevelSet::new(vec![d.clone(), d]).unwrap();
        GameState::new(levels, 1).unwrap()
    }

    fn run(state: &mut GameState, input: &TickInput, frames: usize) -> Vec<GameEvent> {
        (0..frames).flat_map(|_| tick(state, input, DT)).collect()
    }

    #[test]
    fn test_trigger_cadence() {
        let mut t = Trigger::default();
        assert!(t.fire(DT, 100.0));
        assert!(!t.fire(DT, 100.0));
        assert!(t.fire(DT, 100.0));
        assert!(!t.fire(30.0, 100.0));
        assert!(!t.fire(30.0, 100.0));
        assert!(t.fire(40.0, 100.0));
    }

    #[test]
    fn test_first_cart_delivered() {
        let mut state = state_for(&FORK, "GB", 3);
        let events = run(&mut state, &TickInput::default(), 8);

        assert_eq!(events[0], GameEvent::CartSpawned { id: 1, color: ColorTag('G') });
        assert!(events.contains(&GameEvent::DeliverySuccess { id: 1, color: ColorTag('G') }));
        assert_eq!(state.board.attempts, 1);
        assert_eq!(state.board.level_score, 1);
        assert!(state.board.carts.is_empty());
    }

    #[test]
    fn test_quota_completes_with_carts_in_flight() {
        // Second cart spawns at frame 5 and is on the switch when the first
        // one reaches G at frame 8
        let mut d = descriptor(&FORK, "GB", 1);
        d.spawn_interval = 200.0;
        let levels = LevelSet::new(vec![d.clone(), d]).unwrap();
        let mut state = GameState::new(levels, 1).unwrap();

        let events = run(&mut state, &TickInput::default(), 8);
        assert!(events.contains(&GameEvent::CartSpawned { id: 2, color: ColorTag('B') }));
        assert!(events.contains(&GameEvent::LevelComplete {
            level: 0,
            level_score: 1,
            attempts: 1
        }));
        assert_eq!(
            state.phase,
            GamePhase::LevelComplete {
                level_score: 1,
                attempts: 1
            }
        );
        assert_eq!(state.board.carts.len(), 1);
        assert_eq!(state.board.carts[0].cell, IVec2::new(3, 1));

        // Carts left on the board stay frozen
        let carts = state.board.carts.clone();
        let events = run(&mut state, &TickInput::default(), 10);
        assert!(events.is_empty());
        assert_eq!(state.board.carts, carts);
        assert_eq!(state.board.attempts, 1);
    }

    #[test]
    fn test_level_scenario() {
        // G to G, B misrouted to G, G to G: two points from three attempts
        let mut state = state_for(&FORK, "GB", 3);
        let events = run(&mut state, &TickInput::default(), 60);

        assert!(events.contains(&GameEvent::DeliveryFailure {
            id: 2,
            color: ColorTag('B'),
            target: ColorTag('G'),
        }));
        assert!(events.contains(&GameEvent::LifeLost { remaining: 2 }));
        assert_eq!(
            state.phase,
            GamePhase::LevelComplete {
                level_score: 2,
                attempts: 3
            }
        );
        assert_eq!(state.total_score, 2);
        assert_eq!(state.lives, 2);
        assert!(events.contains(&GameEvent::LevelComplete {
            level: 0,
            level_score: 2,
            attempts: 3
        }));

        let events = tick(
            &mut state,
            &TickInput {
                advance: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 1 }]);
        assert_eq!(state.level_index, 1);
        assert_eq!(state.lives, 2);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_click_cycles_switch() {
        let mut state = state_for(&FORK, "GB", 3);
        assert_eq!(state.board.switches[0].direction(), Direction::East);

        let click = TickInput {
            clicks: vec![cell_center(IVec2::new(3, 1))],
            ..Default::default()
        };
        let events = tick(&mut state, &click, DT);
        assert!(events.contains(&GameEvent::SwitchToggled {
            pos: IVec2::new(3, 1),
            direction: Direction::South,
        }));

        // A click on plain corridor does nothing
        let miss = TickInput {
            clicks: vec![cell_center(IVec2::new(2, 1))],
            ..Default::default()
        };
        let events = tick(&mut state, &miss, DT);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::SwitchToggled { .. })));
        assert_eq!(state.board.switches[0].direction(), Direction::South);
    }

    #[test]
    fn test_keyboard_toggle() {
        let mut state = state_for(&FORK, "GB", 3);
        let input = TickInput {
            select_next_switch: true,
            toggle_selected: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.board.selected_switch, Some(0));
        assert_eq!(state.board.switches[0].direction(), Direction::South);
    }

    #[test]
    fn test_wall_collision_costs_no_life() {
        let mut state = state_for(&DEAD_END, "G", 3);
        assert_eq!(state.board.switches[0].direction(), Direction::South);
        let click = TickInput {
            clicks: vec![cell_center(IVec2::new(3, 1))],
            ..Default::default()
        };
        tick(&mut state, &click, DT);

        let events = run(&mut state, &TickInput::default(), 8);
        assert!(events.contains(&GameEvent::WallCollision {
            id: 1,
            at: IVec2::new(6, 1)
        }));
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.board.attempts, 0);
        assert!(state.board.carts.is_empty());
    }

    #[test]
    fn test_cart_collision() {
        let mut state = state_for(&DEAD_END, "G", 3);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        state
            .board
            .carts
            .push(Cart::new(a, IVec2::new(2, 1), ColorTag('G'), Direction::East));
        state
            .board
            .carts
            .push(Cart::new(b, IVec2::new(4, 1), ColorTag('G'), Direction::West));

        let events = tick(&mut state, &TickInput::default(), DT);
        assert!(events.contains(&GameEvent::CartCollision {
            id: b,
            other: a,
            at: IVec2::new(3, 1)
        }));
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert!(state.board.cart_index(a).is_none());
        assert!(state.board.cart_index(b).is_none());
    }

    #[test]
    fn test_spawn_blocked() {
        let mut state = state_for(&FORK, "GB", 3);
        let id = state.next_entity_id();
        let spawn = state.board.grid.spawn();
        // Parked on the spawn, mid-step so the movement tick leaves it alone
        let mut parked = Cart::new(id, spawn, ColorTag('B'), Direction::East);
        parked.begin_step(Direction::East);
        state.board.carts.push(parked);

        let events = tick(&mut state, &TickInput::default(), 1.0);
        assert!(events.contains(&GameEvent::SpawnSkipped {
            reason: SpawnSkip::Blocked
        }));
        assert_eq!(state.board.carts.len(), 1);
    }

    #[test]
    fn test_spawn_capacity() {
        let mut d = descriptor(&FORK, "GB", 3);
        d.max_carts = Some(1);
        d.spawn_interval = 100.0;
        d.move_speed = 1000.0;
        let mut state = GameState::new(LevelSet::new(vec![d]).unwrap(), 1).unwrap();

        let events = run(&mut state, &TickInput::default(), 6);
        assert!(events.contains(&GameEvent::SpawnSkipped {
            reason: SpawnSkip::AtCapacity
        }));
        assert_eq!(state.board.carts.len(), 1);
    }

    #[test]
    fn test_game_over_beats_level_complete() {
        let mut state = state_for(&FORK, "BG", 1);
        state.lives = 1;
        let events = run(&mut state, &TickInput::default(), 10);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelComplete { .. })));
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                level: 0,
                total_score: 0
            })
        );

        // Restart brings the level back with fresh lives
        let events = tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 0 }]);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = state_for(&FORK, "GB", 3);
        tick(&mut state, &TickInput::default(), DT);
        let before = state.board.carts.clone();

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        assert_eq!(tick(&mut state, &pause, DT), vec![GameEvent::Paused]);
        assert_eq!(state.phase, GamePhase::Paused);

        let click = TickInput {
            clicks: vec![cell_center(IVec2::new(3, 1))],
            ..Default::default()
        };
        assert!(run(&mut state, &click, 20).is_empty());
        assert_eq!(state.board.carts, before);
        assert_eq!(state.board.switches[0].direction(), Direction::East);

        assert_eq!(tick(&mut state, &pause, DT), vec![GameEvent::Resumed]);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_autopilot_routes_every_cart() {
        let mut state = state_for(&FORK, "GB", 3);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        run(&mut state, &input, 60);
        assert_eq!(
            state.phase,
            GamePhase::LevelComplete {
                level_score: 3,
                attempts: 3
            }
        );
        assert_eq!(state.lives, STARTING_LIVES);
    }

    #[test]
    fn test_determinism() {
        let levels = LevelSet::builtin().unwrap();
        let mut a = GameState::starting_at(levels.clone(), 99, 3).unwrap();
        let mut b = GameState::starting_at(levels, 99, 3).unwrap();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..400 {
            assert_eq!(tick(&mut a, &input, 16.0), tick(&mut b, &input, 16.0));
        }
        assert_eq!(a.board.carts, b.board.carts);
        assert_eq!(a.total_score, b.total_score);
    }

    proptest! {
        #[test]
        fn carts_never_share_a_cell(
            frames in proptest::collection::vec((1.0f32..250.0, proptest::bool::ANY), 1..300),
            seed in 0u64..1000,
        ) {
            let levels = LevelSet::builtin().unwrap();
            let mut state = GameState::starting_at(levels, seed, 4).unwrap();
            let switch_pos = state.board.switches[0].pos;
            let mut lives = state.lives;

            for (dt, click) in frames {
                let input = TickInput {
                    clicks: if click { vec![cell_center(switch_pos)] } else { Vec::new() },
                    ..Default::default()
                };
                tick(&mut state, &input, dt);

                let carts = &state.board.carts;
                for (i, a) in carts.iter().enumerate() {
                    for b in &carts[i + 1..] {
                        prop_assert!(!b.claims(a.cell));
                        if let Some(to) = a.target() {
                            prop_assert!(!b.claims(to));
                        }
                    }
                }
                prop_assert!(state.lives <= lives);
                lives = state.lives;
                prop_assert!(state.board.level_score <= state.board.attempts);
                prop_assert!(state.board.attempts <= state.board.descriptor.attempts);
            }
        }
    }
}
