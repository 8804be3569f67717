use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};

use crate::engine::{AudioEngine, ChannelActivity, EngineError, PcmFormat, StreamHandle};
use crate::library::Track;
use crate::playlist::Playlist;

use super::transport::Player;
use super::types::{PlaybackState, PlayerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeActivity {
    Playing,
    Paused,
    Stopped,
}

struct FakeStream {
    activity: FakeActivity,
    pos_secs: f64,
    len_secs: f64,
    volume: f32,
}

#[derive(Default)]
struct EngineState {
    streams: HashMap<u32, FakeStream>,
    opened: Vec<PathBuf>,
    freed: Vec<u32>,
    fail_open: HashSet<PathBuf>,
    next_id: u32,
}

/// Scripted engine: paths listed in `fail_open` refuse to open, everything
/// else becomes a 60-second stream. The shared state lets tests inspect
/// and manipulate streams from outside the player.
struct FakeEngine {
    state: Rc<RefCell<EngineState>>,
    format: PcmFormat,
}

impl FakeEngine {
    fn new(state: Rc<RefCell<EngineState>>) -> Self {
        Self {
            state,
            format: PcmFormat::default(),
        }
    }
}

impl AudioEngine for FakeEngine {
    fn open(&mut self, path: &Path) -> Result<StreamHandle, EngineError> {
        let mut state = self.state.borrow_mut();
        state.opened.push(path.to_path_buf());
        if state.fail_open.contains(path) {
            return Err(EngineError::Open {
                path: path.to_path_buf(),
                reason: "scripted failure".into(),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.streams.insert(
            id,
            FakeStream {
                activity: FakeActivity::Stopped,
                pos_secs: 0.0,
                len_secs: 60.0,
                volume: 1.0,
            },
        );
        Ok(StreamHandle(id))
    }

    fn play(&mut self, handle: StreamHandle, restart: bool) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        let Some(stream) = state.streams.get_mut(&handle.0) else {
            return Err(EngineError::BadHandle);
        };
        if restart {
            stream.pos_secs = 0.0;
        }
        stream.activity = FakeActivity::Playing;
        Ok(())
    }

    fn pause(&mut self, handle: StreamHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(stream) = state.streams.get_mut(&handle.0) {
            if stream.activity == FakeActivity::Playing {
                stream.activity = FakeActivity::Paused;
            }
        }
    }

    fn stop(&mut self, handle: StreamHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(stream) = state.streams.get_mut(&handle.0) {
            stream.activity = FakeActivity::Stopped;
        }
    }

    fn activity(&self, handle: StreamHandle) -> ChannelActivity {
        match self.state.borrow().streams.get(&handle.0).map(|s| s.activity) {
            Some(FakeActivity::Playing) => ChannelActivity::Playing,
            Some(FakeActivity::Paused) => ChannelActivity::Paused,
            _ => ChannelActivity::Stopped,
        }
    }

    fn position_bytes(&self, handle: StreamHandle) -> u64 {
        self.state
            .borrow()
            .streams
            .get(&handle.0)
            .map_or(0, |s| self.format.seconds_to_bytes(s.pos_secs))
    }

    fn set_position_bytes(&mut self, handle: StreamHandle, bytes: u64) -> bool {
        let secs = self.format.bytes_to_seconds(bytes);
        let mut state = self.state.borrow_mut();
        let Some(stream) = state.streams.get_mut(&handle.0) else {
            return false;
        };
        // End-clamp, like the real binding.
        stream.pos_secs = secs.min(stream.len_secs);
        true
    }

    fn length_bytes(&self, handle: StreamHandle) -> u64 {
        self.state
            .borrow()
            .streams
            .get(&handle.0)
            .map_or(0, |s| self.format.seconds_to_bytes(s.len_secs))
    }

    fn bytes_to_seconds(&self, _handle: StreamHandle, bytes: u64) -> f64 {
        self.format.bytes_to_seconds(bytes)
    }

    fn seconds_to_bytes(&self, _handle: StreamHandle, seconds: f64) -> u64 {
        self.format.seconds_to_bytes(seconds)
    }

    fn volume(&self, handle: StreamHandle) -> f32 {
        self.state
            .borrow()
            .streams
            .get(&handle.0)
            .map_or(0.0, |s| s.volume)
    }

    fn set_volume(&mut self, handle: StreamHandle, volume: f32) {
        let mut state = self.state.borrow_mut();
        if let Some(stream) = state.streams.get_mut(&handle.0) {
            stream.volume = volume;
        }
    }

    fn free(&mut self, handle: StreamHandle) {
        let mut state = self.state.borrow_mut();
        if state.streams.remove(&handle.0).is_some() {
            state.freed.push(handle.0);
        }
    }
}

fn track(name: &str) -> Track {
    Track {
        path: PathBuf::from(name),
        display: name.into(),
    }
}

fn player_with(
    names: &[&str],
    fail: &[&str],
) -> (
    Player<FakeEngine>,
    Rc<RefCell<EngineState>>,
    Receiver<PlayerEvent>,
) {
    let state = Rc::new(RefCell::new(EngineState::default()));
    state.borrow_mut().fail_open = fail.iter().map(PathBuf::from).collect();
    let engine = FakeEngine::new(state.clone());
    let mut playlist = Playlist::new();
    playlist.add_all(names.iter().map(|n| track(n)));
    let (tx, rx) = mpsc::channel();
    (Player::new(engine, playlist, tx), state, rx)
}

fn drain(rx: &Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Mark every live stream as played out.
fn end_current(state: &Rc<RefCell<EngineState>>) {
    for stream in state.borrow_mut().streams.values_mut() {
        stream.activity = FakeActivity::Stopped;
    }
}

fn live_stream_volume(state: &Rc<RefCell<EngineState>>) -> f32 {
    let state = state.borrow();
    assert_eq!(state.streams.len(), 1);
    state.streams.values().next().unwrap().volume
}

#[test]
fn play_starts_the_first_track_and_reports_it() {
    let (mut p, state, rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    assert!(p.play());
    assert!(p.is_playing());
    assert_eq!(p.state(), PlaybackState::Playing);
    assert_eq!(drain(&rx), vec![PlayerEvent::TrackStarted(0)]);
    assert_eq!(state.borrow().opened, vec![PathBuf::from("a.mp3")]);
}

#[test]
fn cached_volume_is_applied_to_every_new_stream() {
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.set_volume(0.3);
    p.play();
    assert!((live_stream_volume(&state) - 0.3).abs() < 1e-6);

    p.next();
    assert!((live_stream_volume(&state) - 0.3).abs() < 1e-6);
}

#[test]
fn unopenable_track_is_dropped_and_playback_continues() {
    // spec scenario: a plays, b refuses to open, c takes its place.
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3", "c.mp3"], &["b.mp3"]);

    assert!(p.play());
    p.next();

    assert_eq!(p.playlist().len(), 2);
    assert_eq!(p.playlist().index(), 1);
    assert_eq!(p.playlist().current().unwrap().display, "c.mp3");
    assert!(p.is_playing());
    // b.mp3 was attempted exactly once and never again
    assert_eq!(
        state.borrow().opened,
        vec![
            PathBuf::from("a.mp3"),
            PathBuf::from("b.mp3"),
            PathBuf::from("c.mp3"),
        ]
    );
}

#[test]
fn exhausting_the_playlist_through_failures_fires_finished() {
    let (mut p, _state, rx) = player_with(&["a.mp3", "b.mp3"], &["a.mp3", "b.mp3"]);

    assert!(!p.play());
    assert_eq!(drain(&rx), vec![PlayerEvent::PlaylistFinished]);
    assert!(p.playlist().is_empty());
    assert_eq!(p.state(), PlaybackState::Idle);
}

#[test]
fn finished_fires_exactly_once_at_the_end() {
    let (mut p, _state, rx) = player_with(&["a.mp3", "b.mp3", "c.mp3"], &[]);

    p.play();
    p.next();
    p.next();
    // N-1 next calls from index 0 reach the last track.
    assert_eq!(p.playlist().index(), 2);
    assert!(!drain(&rx).contains(&PlayerEvent::PlaylistFinished));

    p.next();
    assert_eq!(drain(&rx), vec![PlayerEvent::PlaylistFinished]);

    p.next();
    assert!(drain(&rx).is_empty());
}

#[test]
fn prev_from_the_first_track_is_a_noop() {
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.play();
    assert_eq!(state.borrow().opened.len(), 1);

    p.prev();
    assert_eq!(p.playlist().index(), 0);
    assert_eq!(state.borrow().opened.len(), 1);
    assert!(p.is_playing());
}

#[test]
fn prev_steps_back_to_the_first_track() {
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.play();
    p.next();
    assert_eq!(p.playlist().index(), 1);

    p.prev();
    assert_eq!(p.playlist().index(), 0);
    assert_eq!(
        state.borrow().opened,
        vec![
            PathBuf::from("a.mp3"),
            PathBuf::from("b.mp3"),
            PathBuf::from("a.mp3"),
        ]
    );
}

#[test]
fn volume_steps_down_to_a_hard_floor() {
    let (mut p, _state, _rx) = player_with(&["a.mp3"], &[]);
    p.play();
    assert!((p.volume() - 1.0).abs() < 1e-6);

    for _ in 0..10 {
        let v = p.volume() - 0.05;
        p.set_volume(v);
    }
    assert!((p.volume() - 0.5).abs() < 1e-3);

    // Out-of-range requests are ignored, leaving the cached value alone.
    p.set_volume(-0.1);
    assert!((p.volume() - 0.5).abs() < 1e-3);
    p.set_volume(1.2);
    assert!((p.volume() - 0.5).abs() < 1e-3);
}

#[test]
fn volume_set_before_any_stream_is_cached() {
    let (mut p, _state, _rx) = player_with(&["a.mp3"], &[]);
    p.set_volume(0.25);
    assert!((p.volume() - 0.25).abs() < 1e-6);
}

#[test]
fn seek_moves_and_clamps_at_the_stream_end() {
    let (mut p, _state, _rx) = player_with(&["a.mp3"], &[]);
    p.play();

    assert!(p.set_position_secs(10.0));
    assert!((p.position_secs() - 10.0).abs() < 1e-6);

    assert!(p.seek_by(30.0));
    assert!((p.position_secs() - 40.0).abs() < 1e-6);

    // Past the end: the engine clamps to the stream length.
    assert!(p.seek_by(30.0));
    assert!((p.position_secs() - 60.0).abs() < 1e-6);

    // A negative target is rejected without moving.
    assert!(!p.seek_by(-65.0));
    assert!((p.position_secs() - 60.0).abs() < 1e-6);

    assert!(p.seek_by(-5.0));
    assert!((p.position_secs() - 55.0).abs() < 1e-6);
}

#[test]
fn seek_without_a_stream_reports_failure() {
    let (mut p, _state, _rx) = player_with(&["a.mp3"], &[]);
    assert!(!p.set_position_secs(5.0));
    assert_eq!(p.position_secs(), 0.0);
}

#[test]
fn pause_and_resume_only_from_legal_states() {
    let (mut p, _state, _rx) = player_with(&["a.mp3"], &[]);
    p.play();
    assert!(p.is_playing());

    p.resume();
    assert!(p.is_playing());

    p.pause();
    assert!(p.is_paused());
    p.pause();
    assert!(p.is_paused());

    p.resume();
    assert!(p.is_playing());

    p.stop();
    assert_eq!(p.state(), PlaybackState::Stopped);
    p.pause();
    assert_eq!(p.state(), PlaybackState::Stopped);
}

#[test]
fn completion_poll_advances_to_the_next_track() {
    let (mut p, state, rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.play();
    end_current(&state);
    p.poll();

    assert_eq!(p.playlist().index(), 1);
    assert!(p.is_playing());
    assert_eq!(
        drain(&rx),
        vec![PlayerEvent::TrackStarted(0), PlayerEvent::TrackStarted(1)]
    );
}

#[test]
fn completion_poll_fires_finished_after_the_last_track() {
    let (mut p, state, rx) = player_with(&["a.mp3"], &[]);

    p.play();
    end_current(&state);
    p.poll();
    let events = drain(&rx);
    assert!(events.contains(&PlayerEvent::PlaylistFinished));

    // The finished latch keeps further polls quiet.
    p.poll();
    assert!(drain(&rx).is_empty());
}

#[test]
fn paused_stream_does_not_auto_advance() {
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.play();
    p.pause();
    p.poll();

    assert_eq!(p.playlist().index(), 0);
    assert_eq!(state.borrow().opened.len(), 1);
}

#[test]
fn streams_are_freed_on_replacement_and_shutdown() {
    let (mut p, state, _rx) = player_with(&["a.mp3", "b.mp3", "c.mp3"], &[]);

    p.play();
    p.next();
    p.next();
    assert_eq!(state.borrow().streams.len(), 1);
    assert_eq!(state.borrow().freed, vec![1, 2]);

    p.shutdown();
    assert!(state.borrow().streams.is_empty());
    assert_eq!(state.borrow().freed, vec![1, 2, 3]);
}

#[test]
fn stop_keeps_the_handle_alive() {
    let (mut p, state, _rx) = player_with(&["a.mp3"], &[]);

    p.play();
    p.stop();

    assert_eq!(p.state(), PlaybackState::Stopped);
    assert_eq!(state.borrow().streams.len(), 1);
    assert!(state.borrow().freed.is_empty());
}

#[test]
fn now_playing_snapshot_reflects_the_transport() {
    let (mut p, _state, _rx) = player_with(&["a.mp3", "b.mp3"], &[]);

    p.play();
    p.set_volume(0.8);
    p.set_position_secs(10.0);
    p.pause();

    let now = p.now_playing().unwrap();
    assert_eq!(now.title, "a.mp3");
    assert_eq!(now.index, 1);
    assert_eq!(now.total, 2);
    assert_eq!(now.position.as_secs(), 10);
    assert_eq!(now.duration.as_secs(), 60);
    assert!((now.volume - 0.8).abs() < 1e-6);
    assert!(now.paused);
}

#[test]
fn now_playing_is_none_before_playback() {
    let (p, _state, _rx) = player_with(&["a.mp3"], &[]);
    assert!(p.now_playing().is_none());
    assert_eq!(p.state(), PlaybackState::Idle);
}
