use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/attacca/config.toml` or `~/.config/attacca/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ATTACCA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Volume change per Up/Down keypress.
    pub volume_step: f32,
    /// Seconds to seek on Left/Right.
    pub seek_seconds: f64,
    /// Seconds to seek on Shift+Left/Right.
    pub long_seek_seconds: f64,
    /// Volume applied before the first track starts.
    pub start_volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume_step: 0.05,
            seek_seconds: 5.0,
            long_seek_seconds: 30.0,
            start_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Status refresh interval (milliseconds).
    pub tick_ms: u64,
    /// Input poll timeout per loop iteration (milliseconds).
    pub poll_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            poll_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions treated as audio when expanding directories
    /// (case-insensitive, without dot). Explicit file arguments bypass
    /// this filter.
    pub extensions: Vec<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into(), "flac".into()],
        }
    }
}
