pub mod config;
pub mod info;
pub mod play;
pub mod playlist;
pub mod slice;

use simplelog::{CombinedLogger, LevelFilter, WriteLogger};
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join("zim-deck.log")
}

/// Sends all logging to a file so it never interleaves with the prompt.
pub fn init_logging(level: LevelFilter) -> Result<(), Box<dyn Error>> {
    CombinedLogger::init(vec![WriteLogger::new(
        level,
        simplelog::Config::default(),
        File::create(log_file_path())?,
    )])?;

    Ok(())
}

/// Expands `~` in a user supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
