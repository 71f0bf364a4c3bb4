use owo_colors::OwoColorize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use zim_deck::commands::{Command, Deck, Outcome, slot_key};
use zim_deck::config::Config;
use zim_deck::player::poll::{StatusPoller, StatusSnapshot};
use zim_deck::session::TomlSettingsStore;

use super::expand;

pub fn handle_play(inputs: &[String], dual: bool, no_restore: bool) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let player_count = if dual || inputs.len() > 1 { 2 } else { 1 };

    let mut deck = Deck::new(player_count, config.seek_step_seconds);
    deck.set_volume_all(config.default_volume);

    let mut store = TomlSettingsStore::open(&Config::session_path()?);
    if config.restore_session && !no_restore {
        let restored = deck.restore_session(&store);
        log::info!("Restored {restored} player(s) from {}", store.path().display());
    }

    for (index, input) in inputs.iter().take(player_count).enumerate() {
        deck.dispatch(Command::Select(index + 1));
        report(deck.dispatch(Command::Load(expand(input))));
    }
    deck.dispatch(Command::Select(1));

    #[cfg(feature = "device")]
    let _output = match zim_deck::player::device::AudioOutput::open(
        deck.output_source(),
        config.block_size,
    ) {
        Ok(output) => Some(output),
        Err(e) => {
            log::warn!("No audio output: {e}");
            println!("{} No audio device available: {e}", "Note:".yellow());
            None
        }
    };

    #[cfg(not(feature = "device"))]
    println!(
        "{} Built without the 'device' feature; running silent.",
        "Note:".yellow()
    );

    let mut poller = StatusPoller::spawn(
        deck.handles(),
        Duration::from_millis(config.poll_interval_ms.max(1)),
    );

    println!(
        "{} {} player(s). Type {} for commands.",
        "zim-deck".cyan().bold(),
        deck.player_count(),
        "help".cyan()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        prompt(&deck, &poller.latest())?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if report(deck.dispatch(command)) {
                    break;
                }
            }
            Err(e) => println!("{} {e}", "Error:".red().bold()),
        }
        deck.check_boundaries();
    }

    poller.stop();
    if !deck.save_session(&mut store) {
        println!(
            "{} Could not save session to {}",
            "Warning:".yellow(),
            store.path().display()
        );
    }
    Ok(())
}

fn prompt(deck: &Deck, latest: &[StatusSnapshot]) -> io::Result<()> {
    let active = deck.active_index();
    if let Some(snapshot) = latest.get(active) {
        println!("{} {}", slot_key(active).dimmed(), snapshot.dimmed());
    }
    print!("{} ", ">".cyan());
    io::stdout().flush()
}

/// Prints a dispatch outcome. Returns true when the session should end.
fn report(outcome: Outcome) -> bool {
    match outcome {
        Outcome::Applied => false,
        Outcome::Ignored => {
            println!("{}", "(nothing to do)".dimmed());
            false
        }
        Outcome::Message(message) => {
            println!("{message}");
            false
        }
        Outcome::Quit => true,
    }
}
