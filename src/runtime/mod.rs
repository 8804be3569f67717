//! Startup wiring and the cooperative poll loop.
//!
//! The player (and the non-`Send` audio stream inside it) stays on the
//! main thread; the render tick reads a mutex-protected snapshot that the
//! main loop republishes every iteration.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::cursor::{self, Hide, Show};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{debug, trace};

use crate::cli::Cli;
use crate::config::Settings;
use crate::engine::RodioEngine;
use crate::library;
use crate::player::{NowPlaying, Player, PlayerEvent};
use crate::playlist::Playlist;
use crate::ui::{STATUS_ROWS, StatusLine};

mod event_loop;
mod settings;
mod ticker;

pub use settings::load_settings;

/// Shared snapshot read by the render tick while the main loop owns the
/// player.
pub type StatusHandle = Arc<Mutex<Option<NowPlaying>>>;

pub fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let mut playlist = Playlist::new();
    playlist.add_all(library::collect_tracks(&cli.inputs, &settings.library));
    if playlist.is_empty() {
        bail!("no playable files found");
    }
    if cli.shuffle {
        playlist.shuffle();
        trace!(
            "shuffled order: {:?}",
            playlist.tracks().iter().map(|t| &t.display).collect::<Vec<_>>()
        );
    }

    let engine = RodioEngine::new().context("failed to initialize audio output")?;

    let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();
    let mut player = Player::new(engine, playlist, event_tx);
    player.set_volume(settings.playback.start_volume);
    debug!("queued {} track(s)", player.playlist().len());

    // Reserve the status region and remember where it starts.
    let mut stdout = std::io::stdout();
    execute!(stdout, Print("\n".repeat(STATUS_ROWS as usize)))?;
    stdout.flush()?;
    let (_, row) = cursor::position()?;
    let status_line = StatusLine::new(row.saturating_sub(STATUS_ROWS));

    enable_raw_mode()?;
    execute!(stdout, Hide)?;

    let status: StatusHandle = Arc::new(Mutex::new(None));
    let running = Arc::new(AtomicBool::new(true));
    let tick = ticker::spawn_status_ticker(
        status.clone(),
        status_line,
        Duration::from_millis(settings.ui.tick_ms),
        running.clone(),
    );

    let run_result = (|| {
        player.play();
        status_line.render(player.now_playing().as_ref());
        event_loop::run(&mut player, &event_rx, &status, &status_line, settings)
    })();

    player.shutdown();
    running.store(false, Ordering::Relaxed);
    let _ = tick.join();

    let _ = execute!(stdout, Show);
    let _ = disable_raw_mode();
    println!();

    run_result
}
