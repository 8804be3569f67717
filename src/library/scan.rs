use std::path::{Path, PathBuf};

use lofty::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Track, display_for};

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

/// Expand CLI inputs into tracks, preserving argument order.
///
/// A directory contributes its immediate audio files (no recursion) sorted
/// lexicographically; an explicit file path is taken as-is, even with an
/// unknown extension — the engine decides later whether it can play it.
pub fn collect_tracks(inputs: &[PathBuf], settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(input)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file() && is_audio_file(e.path(), settings))
                .map(|e| e.into_path())
                .collect();
            files.sort();
            tracks.extend(files.iter().map(|p| read_track(p)));
        } else if input.is_file() {
            tracks.push(read_track(input));
        } else {
            warn!("skipping {}: not a file or directory", input.display());
        }
    }

    tracks
}

/// Build a `Track`, labeling it from the tags when the file has readable
/// ones.
fn read_track(path: &Path) -> Track {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let default_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut title = default_title;
    let mut artist: Option<String> = None;

    if let Ok(tagged) = lofty::read_from_path(path) {
        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = tag.title() {
                let v = v.trim();
                if !v.is_empty() {
                    title = v.to_string();
                }
            }
            if let Some(v) = tag.artist() {
                let v = v.trim();
                if !v.is_empty() {
                    artist = Some(v.to_string());
                }
            }
        }
    }

    let display = display_for(&file_name, &title, artist.as_deref());

    Track {
        path: path.to_path_buf(),
        display,
    }
}
