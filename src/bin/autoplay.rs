//! Self-playing demo.
//!
//! Plays the first hinted swap every turn until the move budget runs out, logging each
//! engine event. Useful for eyeballing cascades and for replaying a seed:
//!
//! ```bash
//! RUST_LOG=debug MATCH3_SEED=42 cargo run --bin match3-autoplay
//! ```

use anyhow::{Context, Result};
use log::{debug, info, warn};

use match3::core::{Engine, EngineConfig, EngineEvent, TurnOutcome};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from_env();
    let mut engine = Engine::new(config).context("failed to start the engine")?;
    info!(
        "autoplay: {}x{} board, {} moves",
        engine.config().grid_size,
        engine.config().grid_size,
        engine.stats().moves_remaining
    );

    let mut turns = 0u32;
    while !engine.is_game_over() {
        let Some(hint) = engine.hint() else {
            warn!("autoplay: no move left on the board");
            break;
        };

        let outcome = engine.request_swap(hint.from, hint.to)?;
        turns += 1;
        if let TurnOutcome::Committed {
            rounds,
            score_delta,
            wings_delta,
        } = outcome
        {
            info!(
                "turn {}: {} -> {}, {} round(s), +{} points, +{} wings",
                turns, hint.from, hint.to, rounds, score_delta, wings_delta
            );
        }

        for event in engine.drain_events() {
            match &event {
                EngineEvent::BoardReshuffled { .. } | EngineEvent::BoardStuck => {
                    info!("turn {}: {}", turns, event.name())
                }
                _ => debug!("turn {}: {:?}", turns, event),
            }
        }
    }

    let stats = engine.stats();
    info!(
        "autoplay finished after {} turns: score {}, wings {}, moves left {}",
        turns, stats.score, stats.wings_collected, stats.moves_remaining
    );
    Ok(())
}
