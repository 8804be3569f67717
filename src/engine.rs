//! Audio engine seam.
//!
//! Decoding, mixing and device output are delegated to an engine behind the
//! `AudioEngine` trait; the transport addresses open streams through opaque
//! `StreamHandle`s and never touches the audio stack directly.

mod rodio;
mod types;

pub use self::rodio::RodioEngine;
pub use types::*;


use std::path::Path;

/// The fixed call surface the transport consumes.
///
/// Positions are byte offsets in the engine's own metric; the per-handle
/// conversion calls translate them to and from seconds. A failed `open`
/// stands for "no stream" and must leave the engine unchanged. Calls with a
/// handle the engine does not know are harmless no-ops for the `&self`
/// queries and `pause`/`stop`/`free`.
pub trait AudioEngine {
    /// Open a decodable stream for `path`.
    fn open(&mut self, path: &Path) -> Result<StreamHandle, EngineError>;

    /// Start or resume playback; `restart` rewinds to the beginning first.
    fn play(&mut self, handle: StreamHandle, restart: bool) -> Result<(), EngineError>;

    /// Pause playback, keeping the position.
    fn pause(&mut self, handle: StreamHandle);

    /// Stop playback. The handle stays valid until `free`.
    fn stop(&mut self, handle: StreamHandle);

    /// Playback status of the stream.
    fn activity(&self, handle: StreamHandle) -> ChannelActivity;

    fn position_bytes(&self, handle: StreamHandle) -> u64;

    /// Reposition the stream; returns false when the engine rejects the
    /// target.
    fn set_position_bytes(&mut self, handle: StreamHandle, bytes: u64) -> bool;

    fn length_bytes(&self, handle: StreamHandle) -> u64;

    fn bytes_to_seconds(&self, handle: StreamHandle, bytes: u64) -> f64;

    fn seconds_to_bytes(&self, handle: StreamHandle, seconds: f64) -> u64;

    /// Current volume attribute of the stream.
    fn volume(&self, handle: StreamHandle) -> f32;

    fn set_volume(&mut self, handle: StreamHandle, volume: f32);

    /// Release the stream and everything attached to it.
    fn free(&mut self, handle: StreamHandle);
}
