//! Cart Sorter - headless runner
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this plays a level with the autopilot and prints the board.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;

    use cart_sorter::MemoryScoreStore;
    use cart_sorter::game::Game;
    use cart_sorter::sim::{GameEvent, GamePhase, GameState, LevelSet};

    #[derive(Parser)]
    #[command(name = "cart-sorter")]
    #[command(about = "Play a cart sorter level headlessly")]
    struct Cli {
        /// Level to play (1-based)
        #[arg(long, default_value = "1")]
        level: usize,

        /// Most frames to simulate
        #[arg(long, default_value = "5000")]
        frames: u32,

        /// Frame length in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: f32,

        /// RNG seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// JSON level set to use instead of the built-in levels
        #[arg(long)]
        levels: Option<PathBuf>,

        /// Leave the switches alone (no autopilot)
        #[arg(long)]
        manual: bool,

        /// Print the board every N frames (0: only at the end)
        #[arg(long, default_value = "0")]
        map_every: u32,
    }

    fn load_levels(path: Option<&PathBuf>) -> Result<LevelSet> {
        let Some(path) = path else {
            return Ok(LevelSet::builtin()?);
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading level set {}", path.display()))?;
        LevelSet::from_json_str(&json).with_context(|| format!("loading level set {}", path.display()))
    }

    fn describe(event: &GameEvent) -> Option<String> {
        let text = match event {
            GameEvent::DeliverySuccess { id, color } => format!("cart {id} delivered to {color}"),
            GameEvent::DeliveryFailure { id, color, target } => {
                format!("cart {id} ({color}) delivered to {target}")
            }
            GameEvent::CartCollision { id, other, at } => {
                format!("carts {id} and {other} collided at {at}")
            }
            GameEvent::WallCollision { id, at } => format!("cart {id} hit a wall at {at}"),
            GameEvent::LifeLost { remaining } => format!("life lost, {remaining} left"),
            GameEvent::NewBestScore { score } => format!("new best score {score}"),
            _ => return None,
        };
        Some(text)
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        let levels = load_levels(cli.levels.as_ref())?;
        let index = cli.level.saturating_sub(1);
        let state = GameState::starting_at(levels, cli.seed, index)
            .with_context(|| format!("starting level {}", cli.level))?;

        let mut game = Game::from_state(state, Box::new(MemoryScoreStore::default()));
        game.set_autopilot(!cli.manual);

        println!(
            "Level {} of {}, seed {}, {} ms frames",
            index + 1,
            game.state().levels().len(),
            cli.seed,
            cli.frame_ms
        );
        println!();

        let mut frame = 0;
        while frame < cli.frames {
            game.step(cli.frame_ms);
            frame += 1;

            for event in game.drain_events() {
                log::debug!("frame {}: {}", frame, event.name());
                if let Some(text) = describe(&event) {
                    println!("[{:>6.1}s] {}", frame as f32 * cli.frame_ms / 1000.0, text);
                }
            }

            if cli.map_every > 0 && frame % cli.map_every == 0 {
                println!("--- frame {} ---", frame);
                print!("{}", game.snapshot().to_ascii());
            }

            if !matches!(game.state().phase, GamePhase::Running | GamePhase::Paused) {
                break;
            }
        }

        let snap = game.snapshot();
        println!();
        println!("--- after {} frames ---", frame);
        print!("{}", snap.to_ascii());
        println!(
            "phase: {}  score: {}/{} (quota {})  total: {}  lives: {}",
            snap.hud.phase,
            snap.hud.level_score,
            snap.hud.attempts,
            snap.hud.quota,
            snap.hud.total_score,
            snap.hud.lives
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Cart Sorter (native) starting...");
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
