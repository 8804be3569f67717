use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::{AudioEngine, ChannelActivity, StreamHandle};
use crate::playlist::Playlist;

use super::types::{NowPlaying, PlaybackState, PlayerEvent};

/// The transport: one live stream at most, a cursor into the playlist, and
/// the cached volume that survives track changes.
pub struct Player<E: AudioEngine> {
    engine: E,
    playlist: Playlist,
    handle: Option<StreamHandle>,
    last_volume: f32,
    loading: bool,
    switching: bool,
    finished: bool,
    events: Sender<PlayerEvent>,
}

impl<E: AudioEngine> Player<E> {
    pub fn new(engine: E, playlist: Playlist, events: Sender<PlayerEvent>) -> Self {
        Self {
            engine,
            playlist,
            handle: None,
            last_volume: 1.0,
            loading: false,
            switching: false,
            finished: false,
            events,
        }
    }

    /// Open and start the current playlist entry.
    ///
    /// Tracks the engine cannot open or start are removed and the same
    /// index retried, so a single call either starts playback or exhausts
    /// the playlist (which fires the finished event). The cached volume is
    /// applied to every new stream.
    pub fn play(&mut self) -> bool {
        self.loading = true;
        // Free-on-replace: the previous stream dies before a new one opens.
        if let Some(old) = self.handle.take() {
            self.engine.free(old);
        }

        loop {
            let Some(path) = self.playlist.current().map(|t| t.path.clone()) else {
                self.loading = false;
                self.fire_finished();
                return false;
            };

            let handle = match self.engine.open(&path) {
                Ok(h) => h,
                Err(e) => {
                    warn!("dropping {}: {e}", path.display());
                    self.playlist.remove_current();
                    continue;
                }
            };

            if let Err(e) = self.engine.play(handle, false) {
                warn!("dropping {}: {e}", path.display());
                self.engine.free(handle);
                self.playlist.remove_current();
                continue;
            }

            self.engine.set_volume(handle, self.last_volume);
            self.handle = Some(handle);
            self.loading = false;
            debug!(
                "playing {} ({}/{})",
                path.display(),
                self.playlist.index() + 1,
                self.playlist.len()
            );
            let _ = self
                .events
                .send(PlayerEvent::TrackStarted(self.playlist.index()));
            return true;
        }
    }

    /// Stop the current stream. The handle stays live until it is replaced
    /// or the player shuts down.
    pub fn stop(&mut self) {
        if let Some(h) = self.handle {
            self.engine.stop(h);
        }
    }

    /// Pause; legal only while playing.
    pub fn pause(&mut self) {
        if self.is_playing() {
            if let Some(h) = self.handle {
                self.engine.pause(h);
            }
        }
    }

    /// Resume; legal only while paused.
    pub fn resume(&mut self) {
        if self.is_paused() {
            if let Some(h) = self.handle {
                let _ = self.engine.play(h, false);
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Advance to the next track, or fire playlist-finished when there is
    /// none. Guarded against reentry from the completion poll.
    pub fn next(&mut self) {
        if self.switching {
            return;
        }
        self.switching = true;
        let target = self.playlist.index() as isize + 1;
        if self.playlist.has_index(target) {
            self.stop();
            self.playlist.advance(1);
            self.play();
        } else {
            self.fire_finished();
        }
        self.switching = false;
    }

    /// Step back one track; a no-op from the first track.
    pub fn prev(&mut self) {
        if self.switching {
            return;
        }
        self.switching = true;
        let target = self.playlist.index() as isize - 1;
        if self.playlist.has_index(target) {
            self.stop();
            self.playlist.advance(-1);
            self.play();
        }
        self.switching = false;
    }

    /// Completion detection, called from the poll loop: a stream that
    /// reports stopped outside of a load or switch has played out.
    pub fn poll(&mut self) {
        if self.loading || self.switching || self.finished || self.handle.is_none() {
            return;
        }
        if !self.is_playing() && !self.is_paused() {
            self.next();
        }
    }

    pub fn position_secs(&self) -> f64 {
        match self.handle {
            Some(h) => self.engine.bytes_to_seconds(h, self.engine.position_bytes(h)),
            None => 0.0,
        }
    }

    pub fn length_secs(&self) -> f64 {
        match self.handle {
            Some(h) => self.engine.bytes_to_seconds(h, self.engine.length_bytes(h)),
            None => 0.0,
        }
    }

    /// Seek to an absolute position. Failures (no stream, negative target,
    /// engine rejection) leave the position unchanged.
    pub fn set_position_secs(&mut self, seconds: f64) -> bool {
        let Some(h) = self.handle else {
            return false;
        };
        if seconds < 0.0 {
            return false;
        }
        let bytes = self.engine.seconds_to_bytes(h, seconds);
        self.engine.set_position_bytes(h, bytes)
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta_secs: f64) -> bool {
        self.set_position_secs(self.position_secs() + delta_secs)
    }

    /// Set the stream volume. Values outside [0.0, 1.0] are ignored —
    /// the key handlers rely on this for a hard floor and ceiling.
    pub fn set_volume(&mut self, volume: f32) {
        if !(0.0..=1.0).contains(&volume) {
            return;
        }
        let volume = (volume * 1000.0).round() / 1000.0;
        self.last_volume = volume;
        if let Some(h) = self.handle {
            self.engine.set_volume(h, volume);
        }
    }

    /// The live stream's volume attribute, or the cached value when no
    /// stream is open.
    pub fn volume(&self) -> f32 {
        match self.handle {
            Some(h) => self.engine.volume(h),
            None => self.last_volume,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.activity(),
            Some(ChannelActivity::Playing | ChannelActivity::Stalled)
        )
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.activity(), Some(ChannelActivity::Paused))
    }

    pub fn state(&self) -> PlaybackState {
        if self.loading {
            return PlaybackState::Loading;
        }
        match self.activity() {
            None => PlaybackState::Idle,
            Some(ChannelActivity::Playing | ChannelActivity::Stalled) => PlaybackState::Playing,
            Some(ChannelActivity::Paused) => PlaybackState::Paused,
            Some(ChannelActivity::Stopped) => PlaybackState::Stopped,
        }
    }

    fn activity(&self) -> Option<ChannelActivity> {
        self.handle.map(|h| self.engine.activity(h))
    }

    /// Snapshot for the status renderer; `None` when nothing is loaded.
    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.handle?;
        let track = self.playlist.current()?;
        Some(NowPlaying {
            title: track.display.clone(),
            index: self.playlist.index() + 1,
            total: self.playlist.len(),
            position: Duration::from_secs_f64(self.position_secs().max(0.0)),
            duration: Duration::from_secs_f64(self.length_secs().max(0.0)),
            volume: self.volume(),
            paused: self.state() == PlaybackState::Paused,
        })
    }

    /// Stop and free the live stream. Device teardown happens when the
    /// engine is dropped with the player.
    pub fn shutdown(&mut self) {
        if let Some(h) = self.handle.take() {
            self.engine.stop(h);
            self.engine.free(h);
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    fn fire_finished(&mut self) {
        if !self.finished {
            self.finished = true;
            let _ = self.events.send(PlayerEvent::PlaylistFinished);
        }
    }
}
