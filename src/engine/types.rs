//! Handle, status and error types shared across engine implementations.

use std::path::PathBuf;

use thiserror::Error;

/// Opaque identifier for an open engine stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub(crate) u32);

/// Engine-reported playback status for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelActivity {
    /// Not playing: never started, stopped, or the source ran dry.
    Stopped,
    /// Actively producing audio.
    Playing,
    /// Playing but starved for data.
    Stalled,
    /// Paused by request.
    Paused,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no usable audio output device: {0}")]
    Device(String),
    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("unknown stream handle")]
    BadHandle,
}

/// PCM byte metric for a stream: positions are byte offsets into an
/// interleaved 16-bit sample stream at the source rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    const BYTES_PER_SAMPLE: u64 = 2;

    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.channels) * Self::BYTES_PER_SAMPLE
    }

    pub fn bytes_to_seconds(&self, bytes: u64) -> f64 {
        let rate = self.byte_rate();
        if rate == 0 {
            return 0.0;
        }
        bytes as f64 / rate as f64
    }

    pub fn seconds_to_bytes(&self, seconds: f64) -> u64 {
        if seconds <= 0.0 {
            return 0;
        }
        (seconds * self.byte_rate() as f64) as u64
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
        }
    }
}
