//! Key dispatch and the cooperative poll loop.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Settings;
use crate::engine::AudioEngine;
use crate::player::{Player, PlayerEvent};
use crate::ui::StatusLine;

use super::StatusHandle;

enum KeyOutcome {
    Handled,
    Ignored,
    Quit,
}

/// Main loop: completion polling, transport events, key dispatch and
/// status publication. Returns when the user quits or the playlist ends.
pub(super) fn run<E: AudioEngine>(
    player: &mut Player<E>,
    events: &Receiver<PlayerEvent>,
    status: &StatusHandle,
    status_line: &StatusLine,
    settings: &Settings,
) -> Result<()> {
    let poll_timeout = Duration::from_millis(settings.ui.poll_ms);

    loop {
        // Auto-advance when the current stream has played out.
        player.poll();

        while let Ok(ev) = events.try_recv() {
            if ev == PlayerEvent::PlaylistFinished {
                return Ok(());
            }
        }

        publish(player, status);

        // The poll timeout doubles as the idle sleep; quit and interrupt
        // are observed every iteration.
        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(key, player, settings) {
                    KeyOutcome::Quit => return Ok(()),
                    KeyOutcome::Handled => {
                        publish(player, status);
                        status_line.render(player.now_playing().as_ref());
                    }
                    KeyOutcome::Ignored => {}
                }
            }
        }
    }
}

fn publish<E: AudioEngine>(player: &Player<E>, status: &StatusHandle) {
    if let Ok(mut s) = status.lock() {
        *s = player.now_playing();
    }
}

fn handle_key<E: AudioEngine>(
    key: KeyEvent,
    player: &mut Player<E>,
    settings: &Settings,
) -> KeyOutcome {
    let seek_secs = if key.modifiers.contains(KeyModifiers::SHIFT) {
        settings.playback.long_seek_seconds
    } else {
        settings.playback.seek_seconds
    };

    match key.code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        // Raw mode turns the interrupt into a key event; treat it as quit.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return KeyOutcome::Quit;
        }
        KeyCode::Char('>') | KeyCode::Enter => player.next(),
        KeyCode::Char('<') => player.prev(),
        KeyCode::Char(' ') => player.toggle_pause(),
        KeyCode::Up => {
            let v = player.volume() + settings.playback.volume_step;
            player.set_volume(v);
        }
        KeyCode::Down => {
            let v = player.volume() - settings.playback.volume_step;
            player.set_volume(v);
        }
        KeyCode::Left => {
            player.seek_by(-seek_secs);
        }
        KeyCode::Right => {
            player.seek_by(seek_secs);
        }
        _ => return KeyOutcome::Ignored,
    }

    KeyOutcome::Handled
}
