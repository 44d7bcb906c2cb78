// ==================== Imports ====================
use anyhow::Result;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
mod browser;
pub mod config;
pub mod engine;
pub mod game;
pub mod level;
pub mod loader;

use crate::config::Config;
use crate::engine::{GameLoop, LoopTicket};
use crate::game::Slingshot;
use crate::level::Levels;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - better panic messages
/// - starts the first level
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    start_level(0);
    Ok(())
}

/// Starts (or restarts) play at the zero based level `number`; a loop that
/// is already running is retired
#[wasm_bindgen]
pub fn start_level(number: usize) {
    // claimed before any await so a later start or stop always wins
    let ticket = LoopTicket::claim();
    browser::spawn_local(async move {
        if let Err(err) = run(number, ticket).await {
            error!("Could not start level {} : {:#}", number + 1, err);
        }
    });
}

/// Stops requesting animation frames for the running level
#[wasm_bindgen]
pub fn stop_game() {
    GameLoop::stop();
}

async fn run(level_number: usize, ticket: LoopTicket) -> Result<()> {
    let config = match Config::load(Config::DEFAULT_PATH).await {
        Ok(config) => config,
        Err(err) => {
            log!("Using default configuration ({:#})", err);
            Config::default()
        }
    };
    if !ticket.is_current() {
        return Ok(());
    }
    let levels = match &config.levels_path {
        Some(path) => Levels::fetch(path).await?,
        None => Levels::builtin().clone(),
    };
    if !ticket.is_current() {
        return Ok(());
    }
    let canvas_id = config.canvas_id.clone();
    GameLoop::start(Slingshot::new(config, levels, level_number), &canvas_id, ticket).await
}
