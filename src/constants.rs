//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

/// Audio file extensions the deck can open (compared case-insensitively)
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "aiff", "aif", "flac"];

/// Volume range accepted by the transport
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

/// Playback speed (resampling ratio) range
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// `go_to_end` lands this far before the end so end-of-stream does not fire immediately
pub const END_GUARD_SECONDS: f64 = 0.1;

/// Bit depth of exported slices
pub const SLICE_BITS_PER_SAMPLE: u16 = 16;

/// Persisted setting key suffixes, prefixed with `<slot>_`
pub const KEY_LAST_FILE: &str = "lastFile";
pub const KEY_LAST_POSITION: &str = "lastPosition";
pub const KEY_LAST_SPEED: &str = "lastSpeed";

/// Playlist comment prefix
pub const PLAYLIST_COMMENT: char = '#';

/// Returns true if the path has one of the supported audio extensions.
pub fn has_audio_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}
