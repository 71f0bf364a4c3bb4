use owo_colors::OwoColorize;
use std::error::Error;

use zim_deck::playlist::load_playlist;

use super::expand;

/// Lists the playable entries of a playlist and flags missing files.
pub fn handle_playlist(file: &str) -> Result<(), Box<dyn Error>> {
    let path = expand(file);
    let entries = load_playlist(&path)?;

    let mut missing = 0;
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_file() {
            println!("{:>3}. {} {}", index + 1, "✓".green(), entry.display());
        } else {
            missing += 1;
            println!("{:>3}. {} {}", index + 1, "✗".red(), entry.display());
        }
    }

    println!();
    println!(
        "{} entries, {} missing",
        entries.len().to_string().bold(),
        if missing > 0 {
            missing.to_string().red().to_string()
        } else {
            missing.to_string()
        }
    );
    Ok(())
}
