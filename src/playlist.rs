//! Newline-delimited playlists (`.m3u`, `.m3u8`, `.txt`).

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{PLAYLIST_COMMENT, has_audio_extension};

const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8", "txt"];

pub fn is_playlist(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|ext| PLAYLIST_EXTENSIONS.contains(&ext.as_str()))
}

/// Parses playlist text into audio file paths.
///
/// Blank lines and `#` comments (including extended M3U directives) are
/// skipped. `~` is expanded, relative entries resolve against `base_dir`, and
/// entries without a supported audio extension are dropped.
pub fn parse_playlist(contents: &str, base_dir: &Path) -> Vec<PathBuf> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(PLAYLIST_COMMENT))
        .map(|line| PathBuf::from(shellexpand::tilde(line).as_ref()))
        .map(|path| {
            if path.is_relative() {
                base_dir.join(path)
            } else {
                path
            }
        })
        .filter(|path| {
            let supported = has_audio_extension(path);
            if !supported {
                log::debug!("Skipping playlist entry {}", path.display());
            }
            supported
        })
        .collect()
}

pub fn load_playlist(path: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let entries = parse_playlist(&contents, base_dir);
    log::info!(
        "Loaded playlist {} with {} entries",
        path.display(),
        entries.len()
    );
    Ok(entries)
}
