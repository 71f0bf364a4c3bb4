use owo_colors::OwoColorize;
use std::error::Error;
use std::path::{Path, PathBuf};

use zim_deck::player::Player;
use zim_deck::player::slice::suggested_file_name;

use super::expand;

/// Cuts `[start, end)` out of `file` and writes it as 16-bit WAV.
pub fn handle_slice(
    file: &str,
    start: f64,
    end: f64,
    output: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let source = expand(file);
    let mut player = Player::new();
    if !player.load(&source) {
        return Err(format!("Could not load {}", source.display()).into());
    }

    player.set_segment(start, end);
    if !player.create_slice() {
        return Err(format!(
            "Nothing to slice between {start:.3}s and {end:.3}s (track is {:.3}s)",
            player.length()
        )
        .into());
    }

    let target = match output {
        Some(path) => expand(path),
        None => next_free_name(&source),
    };
    if !player.save_slice(&target) {
        return Err(format!("Failed to write {}", target.display()).into());
    }

    println!(
        "{} {} -> {}",
        "✓".green().bold(),
        player.slice_info(),
        target.display()
    );
    Ok(())
}

/// First `<stem>_edit*.wav` next to `source` that does not exist yet.
fn next_free_name(source: &Path) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let mut counter = 0;
    loop {
        let candidate = dir.join(suggested_file_name(source, counter));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
