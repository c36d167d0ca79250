//! Static track catalog: spoken aliases mapped to audio files.
//!
//! Loaded once at startup and never mutated. Entry order is significant:
//! when several aliases occur in one command, the first entry wins.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{CabinConfig, TrackEntry};

/// Aliases shipped with the demo, in match order.
const BUILTIN_TRACKS: &[(&str, &str)] = &[
    ("first song", "songs/song1.mp3"),
    ("second song", "songs/song2.mp3"),
    ("song one", "songs/song1.mp3"),
    ("song two", "songs/song2.mp3"),
];

/// One catalog entry. `alias` is stored lower-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub alias: String,
    pub path: PathBuf,
}

/// Display view of a catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct TrackInfo {
    pub alias: String,
    pub path: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// Build a catalog, resolving relative paths against `base_dir`.
    pub fn new<I>(entries: I, base_dir: &Path) -> Self
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let tracks = entries
            .into_iter()
            .filter_map(|(alias, path)| {
                let alias = alias.trim().to_lowercase();
                if alias.is_empty() {
                    return None;
                }
                let path = if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                };
                Some(Track { alias, path })
            })
            .collect();
        Self { tracks }
    }

    /// The demo catalog rooted at `base_dir`.
    pub fn builtin(base_dir: &Path) -> Self {
        Self::new(
            BUILTIN_TRACKS
                .iter()
                .map(|(alias, path)| (alias.to_string(), PathBuf::from(path))),
            base_dir,
        )
    }

    /// Catalog from config, or the built-in one when none is configured.
    pub fn from_config(config: &CabinConfig) -> Self {
        let base_dir = config
            .music_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        if config.tracks.is_empty() {
            return Self::builtin(&base_dir);
        }
        Self::new(
            config
                .tracks
                .iter()
                .map(|TrackEntry { alias, path }| (alias.clone(), path.clone())),
            &base_dir,
        )
    }

    /// First alias (in catalog order) that occurs anywhere in `command`.
    pub fn find_in(&self, command: &str) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|track| command.contains(track.alias.as_str()))
    }

    /// Path for an exact alias.
    pub fn resolve(&self, alias: &str) -> Option<&Path> {
        self.tracks
            .iter()
            .find(|track| track.alias == alias)
            .map(|track| track.path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Snapshot for the display, including whether each file exists.
    pub fn describe(&self) -> Vec<TrackInfo> {
        self.tracks
            .iter()
            .map(|track| TrackInfo {
                alias: track.alias.clone(),
                path: track.path.display().to_string(),
                available: track.path.is_file(),
            })
            .collect()
    }
}
