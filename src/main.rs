//! zim-deck - a terminal audio deck for practising, sampling and editing.
//!
//! `zdeck play` opens one or two decks and reads commands from stdin: transport
//! control, whole-track and A-B looping, named markers, and sample-accurate
//! slicing of the A-B region to a new WAV file. The last file, position and
//! speed of each deck are restored on the next start.
//!
//! The remaining subcommands cover the same engine without the prompt:
//! `slice` for one-shot exports, `info` for tags and stream format, and
//! `playlist` to check a playlist before loading it.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use simplelog::LevelFilter;
use std::error::Error;
use std::io;

use zim_deck::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "zdeck")]
#[command(about = "Terminal audio deck with A-B looping, markers and sample-accurate slicing")]
#[command(version)]
struct Cli {
    /// Log at debug level regardless of the configured log_level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the deck and read commands from stdin
    Play {
        /// Audio files or playlists, one per deck
        inputs: Vec<String>,
        /// Run two decks mixed to one output
        #[arg(short, long)]
        dual: bool,
        /// Start empty instead of restoring the last session
        #[arg(long)]
        no_restore: bool,
    },
    /// Cut a region out of a file and save it as 16-bit WAV
    Slice {
        /// Source audio file
        file: String,
        /// Region start in seconds
        #[arg(short, long)]
        start: f64,
        /// Region end in seconds
        #[arg(short, long)]
        end: f64,
        /// Output path (defaults to <name>_edit.wav next to the source)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show tags and stream format of an audio file
    Info {
        /// Audio file
        file: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the playable entries of a playlist
    Playlist {
        /// Playlist file (.m3u, .m3u8 or .txt)
        file: String,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new([
            "seek_step_seconds",
            "default_volume",
            "block_size",
            "poll_interval_ms",
            "log_level",
            "restore_session",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        Config::load()
            .map(|config| config.log_level_filter())
            .unwrap_or(LevelFilter::Info)
    };
    if let Err(e) = cli::init_logging(level) {
        eprintln!("Logging disabled: {e}");
    }

    match cli.command {
        Commands::Play {
            inputs,
            dual,
            no_restore,
        } => {
            cli::play::handle_play(&inputs, dual, no_restore)?;
        }
        Commands::Slice {
            file,
            start,
            end,
            output,
        } => {
            cli::slice::handle_slice(&file, start, end, output.as_deref())?;
        }
        Commands::Info { file, json } => {
            cli::info::handle_info(&file, json)?;
        }
        Commands::Playlist { file } => {
            cli::playlist::handle_playlist(&file)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
