use std::path::PathBuf;

/// A single playable entry in the playlist. The engine re-probes the file
/// itself at stream-open, so only the path and the label live here.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    pub display: String,
}

/// Build the status-line label for a track: `Artist - Title` when the tags
/// are usable, otherwise the bare file name.
pub(crate) fn display_for(file_name: &str, title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => file_name.to_string(),
    }
}
