//! Tag metadata for a loaded track.
//!
//! Tags are read once at load time through lofty. Anything lofty cannot read
//! simply leaves the field empty; the title always falls back to the file stem.

use lofty::prelude::{Accessor, ItemKey, TaggedFileExt};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub filename: String,
    pub duration: f64,
}

impl TrackMetadata {
    /// Metadata from the path alone: file name, and the stem as title.
    pub fn from_path(path: &Path, duration: f64) -> Self {
        let mut metadata = Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            duration,
            ..Default::default()
        };
        metadata.fill_title_from_stem(path);
        metadata
    }

    fn fill_title_from_stem(&mut self, path: &Path) {
        if self.title.is_empty() {
            self.title = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
    }
}

/// Builds metadata for `path`. `duration` comes from the decoded stream.
pub fn extract(path: &Path, duration: f64) -> TrackMetadata {
    let mut metadata = TrackMetadata::from_path(path, duration);
    metadata.title.clear();

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                metadata.title = clean(tag.title().as_deref());
                metadata.artist = clean(tag.artist().as_deref());
                metadata.album = clean(tag.album().as_deref());
                metadata.year = tag
                    .items()
                    .find(|item| item.key() == ItemKey::RecordingDate)
                    .and_then(|item| item.value().text())
                    .map(|date| date.trim().chars().take(4).collect())
                    .unwrap_or_default();
            }
        }
        Err(e) => log::debug!("No readable tags in {}: {e}", path.display()),
    }

    metadata.fill_title_from_stem(path);
    metadata
}

fn clean(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
