//! Terminal runner (default binary).
//!
//! Reads `BLOCKFALL_*` configuration, optionally logs to a file, and drives the
//! engine from crossterm input and real elapsed time.

use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use blockfall::core::GameSnapshot;
use blockfall::engine::{Config, Engine};
use blockfall::input::{handle_key_event, permitted, should_quit};
use blockfall::term::{FrameBuffer, GameView, TerminalRenderer, Viewport};

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Install a file logger when a log path is configured; stdout is the game.
fn init_logging(config: &Config) -> Result<()> {
    let Some(path) = &config.log_path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(LevelFilter::from_level(config.log_level))
        .init();

    info!(seed = config.seed, tick_ms = config.tick_ms, "logging initialized");
    Ok(())
}

fn run(term: &mut TerminalRenderer, config: &Config) -> Result<()> {
    let mut engine = Engine::new(config.seed);
    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut snap = GameSnapshot::default();

    let tick = Duration::from_millis(config.tick_ms as u64);
    let started = Instant::now();
    let mut last_advance = Instant::now();

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        engine.snapshot_into(&mut snap);
        view.render_into(&snap, Viewport::new(w, h), started.elapsed().as_millis() as u64, &mut fb);
        term.draw_swap(&mut fb)?;

        // Input with timeout until the next frame.
        if event::poll(tick)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(action) = handle_key_event(key) {
                        if permitted(action, engine.game().phase(), engine.is_paused()) {
                            engine.apply(action);
                        }
                    }
                }
                Event::Resize(_, _) => term.invalidate(),
                _ => {}
            }
        }

        // Let timers catch up with real time.
        let elapsed = last_advance.elapsed();
        let whole_ms = elapsed.as_millis() as u64;
        if whole_ms > 0 {
            engine.advance(whole_ms);
            last_advance += Duration::from_millis(whole_ms);
        }
    }
}
