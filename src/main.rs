//! Headless match-3 host (default binary).
//!
//! Runs one engine and serves it to AI clients through the TCP adapter. Configure the
//! game with `MATCH3_*` variables and the socket with `MATCH3_AI_*` variables.

use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use match3::adapter::{Adapter, Session};
use match3::core::{Engine, EngineConfig};

const IDLE_POLL: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from_env();
    let engine = Engine::new(config).context("failed to start the engine")?;

    let Some(mut adapter) = Adapter::start_from_env()? else {
        info!("adapter disabled, nothing to serve");
        return Ok(());
    };

    let mut session = Session::new(engine);
    loop {
        let mut busy = false;
        while let Some(cmd) = adapter.try_recv() {
            busy = true;
            for msg in session.handle(cmd) {
                adapter.send(msg);
            }
        }
        if !busy {
            std::thread::sleep(IDLE_POLL);
        }
    }
}
