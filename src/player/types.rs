//! Transport-level types shared with the runtime and the renderer.

use std::time::Duration;

/// Coarse transport state derived from the live stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// No stream open.
    Idle,
    /// A stream-open is in flight; "not active yet" is not "finished".
    Loading,
    Playing,
    Paused,
    Stopped,
}

/// Notifications the transport emits. The runtime is the only subscriber,
/// so these travel over a plain mpsc channel rather than anything fancier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// A track started playing at the given playlist index.
    TrackStarted(usize),
    /// `next` ran out of tracks; fired at most once per run.
    PlaylistFinished,
}

/// Snapshot of everything the status renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    /// 1-based position within the playlist.
    pub index: usize,
    pub total: usize,
    pub position: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub paused: bool,
}
