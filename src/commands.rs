//! Text commands and the deck they drive.
//!
//! A `Deck` is the whole session: one or two players, which one commands go
//! to, the mute state, the playlist cursor and the slice edit counter. Every
//! user action arrives as a `Command`, parsed from a line of text.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{MAX_VOLUME, MIN_VOLUME};
use crate::player::Player;
use crate::player::mixer::Mixer;
use crate::player::poll::PlayerHandle;
use crate::player::slice::suggested_file_name;
use crate::player::source::AudioSource;
use crate::playlist;
use crate::session::{self, SettingsStore};

pub const MAX_PLAYERS: usize = 2;

pub const HELP: &str = "\
play | stop | toggle | restart        transport
loop                                  whole-track loop on/off
mute | vol <0-1> | speed <0.5-2>      output
fwd [s] | back [s] | seek <s> | end   move the playhead
a | b | clear-ab | ab-loop [on|off]   A-B segment
mark [label] | unmark <i> | jump <i>  markers (markers lists them)
clear-marks                           remove all markers
slice | save [path]                   cut A-B and write it as WAV
load <path> | next | prev             files and playlists
select <1|2> | status | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Stop,
    Toggle,
    Restart,
    Loop,
    Mute,
    Volume(f32),
    Speed(f32),
    Forward(Option<f64>),
    Back(Option<f64>),
    Seek(f64),
    End,
    MarkA,
    MarkB,
    ClearSegment,
    SegmentLoop(Option<bool>),
    AddMarker(Option<String>),
    RemoveMarker(i64),
    JumpToMarker(i64),
    ClearMarkers,
    Slice,
    Save(Option<PathBuf>),
    Load(PathBuf),
    Next,
    Prev,
    Select(usize),
    Status,
    Markers,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseCommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidArgument { command: &'static str, value: String },
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown(word) => write!(f, "unknown command '{word}' (try 'help')"),
            Self::MissingArgument(command) => write!(f, "'{command}' needs an argument"),
            Self::InvalidArgument { command, value } => {
                write!(f, "invalid argument for '{command}': {value}")
            }
        }
    }
}

impl Error for ParseCommandError {}

fn required<T: FromStr>(command: &'static str, arg: &str) -> Result<T, ParseCommandError> {
    if arg.is_empty() {
        return Err(ParseCommandError::MissingArgument(command));
    }
    arg.parse().map_err(|_| ParseCommandError::InvalidArgument {
        command,
        value: arg.to_string(),
    })
}

fn optional<T: FromStr>(command: &'static str, arg: &str) -> Result<Option<T>, ParseCommandError> {
    if arg.is_empty() {
        Ok(None)
    } else {
        required(command, arg).map(Some)
    }
}

fn optional_text(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

fn parse_switch(arg: &str) -> Result<Option<bool>, ParseCommandError> {
    match arg.to_lowercase().as_str() {
        "" => Ok(None),
        "on" | "true" | "1" => Ok(Some(true)),
        "off" | "false" | "0" => Ok(Some(false)),
        _ => Err(ParseCommandError::InvalidArgument {
            command: "ab-loop",
            value: arg.to_string(),
        }),
    }
}

fn expand_path(arg: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(arg).as_ref())
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => return Err(ParseCommandError::Empty),
            "play" => Command::Play,
            "stop" => Command::Stop,
            "toggle" => Command::Toggle,
            "restart" => Command::Restart,
            "loop" => Command::Loop,
            "mute" => Command::Mute,
            "vol" | "volume" => Command::Volume(required("vol", arg)?),
            "speed" => Command::Speed(required("speed", arg)?),
            "fwd" => Command::Forward(optional("fwd", arg)?),
            "back" => Command::Back(optional("back", arg)?),
            "seek" => Command::Seek(required("seek", arg)?),
            "end" => Command::End,
            "a" => Command::MarkA,
            "b" => Command::MarkB,
            "clear-ab" => Command::ClearSegment,
            "ab-loop" => Command::SegmentLoop(parse_switch(arg)?),
            "mark" => Command::AddMarker(optional_text(arg)),
            "unmark" => Command::RemoveMarker(required("unmark", arg)?),
            "jump" => Command::JumpToMarker(required("jump", arg)?),
            "clear-marks" => Command::ClearMarkers,
            "slice" => Command::Slice,
            "save" => Command::Save(optional_text(arg).map(|p| expand_path(&p))),
            "load" => {
                if arg.is_empty() {
                    return Err(ParseCommandError::MissingArgument("load"));
                }
                Command::Load(expand_path(arg))
            }
            "next" => Command::Next,
            "prev" => Command::Prev,
            "select" => Command::Select(required("select", arg)?),
            "status" => Command::Status,
            "markers" => Command::Markers,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Err(ParseCommandError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Ignored,
    Message(String),
    Quit,
}

/// Session key prefix for player `index` (`player1`, `player2`).
pub fn slot_key(index: usize) -> String {
    format!("player{}", index + 1)
}

pub struct Deck {
    players: Vec<Player>,
    active: usize,
    muted: bool,
    saved_volumes: Vec<f32>,
    seek_step: f64,
    edit_counter: u32,
    playlist: Vec<PathBuf>,
    playlist_index: Option<usize>,
}

impl Deck {
    /// A deck with `player_count` players (one or two).
    pub fn new(player_count: usize, seek_step: f64) -> Self {
        let count = player_count.clamp(1, MAX_PLAYERS);
        let seek_step = if seek_step.is_finite() && seek_step > 0.0 {
            seek_step
        } else {
            10.0
        };

        Self {
            players: (0..count).map(|_| Player::new()).collect(),
            active: 0,
            muted: false,
            saved_volumes: vec![MAX_VOLUME; count],
            seek_step,
            edit_counter: 0,
            playlist: Vec::new(),
            playlist_index: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_player(&self) -> &Player {
        &self.players[self.active]
    }

    pub fn active_player_mut(&mut self) -> &mut Player {
        &mut self.players[self.active]
    }

    pub fn player(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn edit_counter(&self) -> u32 {
        self.edit_counter
    }

    /// Applies a starting volume to every player.
    pub fn set_volume_all(&mut self, volume: f32) {
        for (player, saved) in self.players.iter().zip(self.saved_volumes.iter_mut()) {
            if self.muted {
                *saved = volume.clamp(MIN_VOLUME, MAX_VOLUME);
            } else {
                player.set_volume(volume);
            }
        }
    }

    pub fn set_playlist(&mut self, entries: Vec<PathBuf>) {
        self.playlist = entries;
        self.playlist_index = None;
    }

    pub fn playlist(&self) -> &[PathBuf] {
        &self.playlist
    }

    pub fn dispatch(&mut self, command: Command) -> Outcome {
        let step = self.seek_step;
        let player = &mut self.players[self.active];

        match command {
            Command::Play => applied_if(player.has_track(), || player.play()),
            Command::Stop => {
                player.stop();
                Outcome::Applied
            }
            Command::Toggle => applied_if(player.has_track(), || {
                player.toggle_play();
            }),
            Command::Restart => applied_if(player.has_track(), || player.restart()),
            Command::Loop => {
                let looping = player.toggle_looping();
                Outcome::Message(format!("Loop {}", on_off(looping)))
            }
            Command::Mute => {
                let muted = self.toggle_mute();
                Outcome::Message(format!("Mute {}", on_off(muted)))
            }
            Command::Volume(volume) => self.set_volume(volume),
            Command::Speed(speed) => {
                player.set_speed(speed);
                Outcome::Message(format!("Speed {:.2}x", player.speed()))
            }
            Command::Forward(seconds) => {
                applied_if(player.has_track(), || {
                    player.seek_relative(seconds.unwrap_or(step).abs())
                })
            }
            Command::Back(seconds) => applied_if(player.has_track(), || {
                player.seek_relative(-seconds.unwrap_or(step).abs())
            }),
            Command::Seek(seconds) => {
                applied_if(player.has_track(), || player.seek_absolute(seconds))
            }
            Command::End => applied_if(player.has_track(), || player.go_to_end()),
            Command::MarkA => applied_if(player.set_marker_a(), || ()),
            Command::MarkB => applied_if(player.set_marker_b(), || ()),
            Command::ClearSegment => {
                player.clear_segment();
                Outcome::Applied
            }
            Command::SegmentLoop(enable) => {
                let enable = enable.unwrap_or(!player.is_segment_looping());
                let looping = player.set_segment_looping(enable);
                if enable && !looping {
                    Outcome::Message("Set A and B before enabling the A-B loop".to_string())
                } else {
                    Outcome::Message(format!("A-B loop {}", on_off(looping)))
                }
            }
            Command::AddMarker(label) => match player.add_marker_here(label.as_deref()) {
                Some(index) => Outcome::Message(format!(
                    "Added marker {index}: {}",
                    player.describe_marker(index).unwrap_or_default()
                )),
                None => Outcome::Ignored,
            },
            Command::RemoveMarker(index) => match usize::try_from(index) {
                Ok(index) => applied_if(player.remove_marker(index), || ()),
                Err(_) => Outcome::Ignored,
            },
            Command::JumpToMarker(index) => match usize::try_from(index) {
                Ok(index) => applied_if(player.jump_to_marker(index), || ()),
                Err(_) => Outcome::Ignored,
            },
            Command::ClearMarkers => {
                player.clear_markers();
                Outcome::Applied
            }
            Command::Slice => {
                if player.create_slice() {
                    Outcome::Message(player.slice_info())
                } else {
                    Outcome::Message("Set A and B inside a loaded track to slice".to_string())
                }
            }
            Command::Save(path) => self.save_slice(path),
            Command::Load(path) => self.load(&path),
            Command::Next => self.step_playlist(1),
            Command::Prev => self.step_playlist(-1),
            Command::Select(number) => {
                if (1..=self.players.len()).contains(&number) {
                    self.active = number - 1;
                    Outcome::Message(format!("Player {number} active"))
                } else {
                    Outcome::Ignored
                }
            }
            Command::Status => Outcome::Message(self.status()),
            Command::Markers => Outcome::Message(self.marker_list()),
            Command::Help => Outcome::Message(HELP.to_string()),
            Command::Quit => Outcome::Quit,
        }
    }

    /// Mute saves every player's volume and silences it; unmute restores.
    pub fn toggle_mute(&mut self) -> bool {
        if self.muted {
            for (player, saved) in self.players.iter().zip(&self.saved_volumes) {
                player.set_volume(*saved);
            }
            self.muted = false;
        } else {
            for (player, saved) in self.players.iter().zip(self.saved_volumes.iter_mut()) {
                *saved = player.volume();
                player.set_volume(MIN_VOLUME);
            }
            self.muted = true;
        }
        log::debug!("Mute {}", on_off(self.muted));
        self.muted
    }

    fn set_volume(&mut self, volume: f32) -> Outcome {
        if volume.is_nan() {
            return Outcome::Ignored;
        }
        let volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        if self.muted {
            // Takes effect on unmute
            self.saved_volumes[self.active] = volume;
        } else {
            self.players[self.active].set_volume(volume);
        }
        Outcome::Message(format!("Volume {volume:.2}"))
    }

    /// Loads `path` into the active player, or a playlist's first entry.
    pub fn load(&mut self, path: &Path) -> Outcome {
        if playlist::is_playlist(path) {
            return match playlist::load_playlist(path) {
                Ok(entries) if entries.is_empty() => {
                    Outcome::Message(format!("No playable entries in {}", path.display()))
                }
                Ok(entries) => {
                    self.set_playlist(entries);
                    self.step_playlist(1)
                }
                Err(e) => {
                    log::warn!("Failed to read playlist {}: {e}", path.display());
                    Outcome::Message(format!("Could not read playlist {}", path.display()))
                }
            };
        }
        self.load_track(path)
    }

    fn load_track(&mut self, path: &Path) -> Outcome {
        if !self.players[self.active].load(path) {
            return Outcome::Message(format!("Could not load {}", path.display()));
        }
        if self.muted {
            self.toggle_mute();
        }
        let player = &self.players[self.active];
        let title = player
            .metadata()
            .map(|m| m.title.clone())
            .unwrap_or_default();
        Outcome::Message(format!("Loaded {title} ({:.1}s)", player.length()))
    }

    fn step_playlist(&mut self, direction: isize) -> Outcome {
        if self.playlist.is_empty() {
            return Outcome::Ignored;
        }
        let next = match self.playlist_index {
            None => 0,
            Some(index) => match index.checked_add_signed(direction) {
                Some(next) if next < self.playlist.len() => next,
                _ => return Outcome::Ignored,
            },
        };
        self.playlist_index = Some(next);
        let path = self.playlist[next].clone();
        self.load_track(&path)
    }

    fn save_slice(&mut self, path: Option<PathBuf>) -> Outcome {
        let player = &self.players[self.active];
        if !player.has_slice() {
            return Outcome::Message("No slice to save; use 'slice' first".to_string());
        }

        let target = match path {
            Some(path) => path,
            None => {
                let Some(source) = player.current_file() else {
                    return Outcome::Ignored;
                };
                let name = suggested_file_name(source, self.edit_counter);
                source
                    .parent()
                    .map(|dir| dir.join(&name))
                    .unwrap_or_else(|| PathBuf::from(&name))
            }
        };

        if player.save_slice(&target) {
            self.edit_counter += 1;
            Outcome::Message(format!("Saved slice to {}", target.display()))
        } else {
            Outcome::Message(format!("Could not save slice to {}", target.display()))
        }
    }

    fn status(&self) -> String {
        self.players
            .iter()
            .enumerate()
            .map(|(i, player)| {
                let marker = if i == self.active { '*' } else { ' ' };
                let file = player
                    .current_file()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "(empty)".to_string());
                format!("{marker}{} {file}  {}", slot_key(i), player.handle().snapshot())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn marker_list(&self) -> String {
        let player = self.active_player();
        if player.marker_count() == 0 {
            return "No markers".to_string();
        }
        (0..player.marker_count())
            .filter_map(|i| player.describe_marker(i).map(|d| format!("{i}: {d}")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies the A–B wrap from the control side for every playing player.
    pub fn check_boundaries(&self) {
        for player in &self.players {
            player.check_boundary();
        }
    }

    /// The renderer for the output device: the single player, or a mix of both.
    pub fn output_source(&self) -> Box<dyn AudioSource> {
        if self.players.len() == 1 {
            return Box::new(self.players[0].source());
        }
        let mut mixer = Mixer::new();
        for player in &self.players {
            mixer.add_input(Box::new(player.source()));
        }
        Box::new(mixer)
    }

    pub fn handles(&self) -> Vec<PlayerHandle> {
        self.players.iter().map(Player::handle).collect()
    }

    pub fn save_session(&self, store: &mut dyn SettingsStore) -> bool {
        let mut saved = true;
        for (i, player) in self.players.iter().enumerate() {
            saved &= session::save(player, store, &slot_key(i));
        }
        saved
    }

    /// Restores every slot it can. Returns how many players got a track back.
    pub fn restore_session(&mut self, store: &dyn SettingsStore) -> usize {
        let mut restored = 0;
        for (i, player) in self.players.iter_mut().enumerate() {
            if session::restore(player, store, &slot_key(i)) {
                restored += 1;
            }
        }
        restored
    }
}

fn applied_if(condition: bool, action: impl FnOnce()) -> Outcome {
    if condition {
        action();
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DecodedAudio;
    use crate::session::MemorySettingsStore;
    use tempfile::TempDir;

    fn parse(line: &str) -> Command {
        line.parse().unwrap()
    }

    fn deck_with_track(seconds: usize) -> Deck {
        let mut deck = Deck::new(1, 10.0);
        deck.active_player_mut().load_decoded(
            Path::new("/music/take.wav"),
            DecodedAudio::new(vec![0.0; seconds * 1000], 1, 1000),
        );
        deck
    }

    fn write_wav(path: &Path, seconds: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..seconds * 8000 {
            writer.write_sample((i % 64) as i16 * 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("play"), Command::Play);
        assert_eq!(parse("  STOP  "), Command::Stop);
        assert_eq!(parse("a"), Command::MarkA);
        assert_eq!(parse("b"), Command::MarkB);
        assert_eq!(parse("clear-ab"), Command::ClearSegment);
        assert_eq!(parse("quit"), Command::Quit);
        assert_eq!(parse("q"), Command::Quit);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse("vol 0.5"), Command::Volume(0.5));
        assert_eq!(parse("speed 1.25"), Command::Speed(1.25));
        assert_eq!(parse("fwd"), Command::Forward(None));
        assert_eq!(parse("back 2.5"), Command::Back(Some(2.5)));
        assert_eq!(parse("seek 30"), Command::Seek(30.0));
        assert_eq!(parse("ab-loop"), Command::SegmentLoop(None));
        assert_eq!(parse("ab-loop off"), Command::SegmentLoop(Some(false)));
        assert_eq!(parse("unmark -1"), Command::RemoveMarker(-1));
        assert_eq!(parse("jump 2"), Command::JumpToMarker(2));
        assert_eq!(parse("select 2"), Command::Select(2));
    }

    #[test]
    fn test_parse_keeps_spaces_in_text() {
        assert_eq!(
            parse("mark the big drop"),
            Command::AddMarker(Some("the big drop".to_string()))
        );
        assert_eq!(parse("mark"), Command::AddMarker(None));
        assert_eq!(
            parse("load /music/my take.wav"),
            Command::Load(PathBuf::from("/music/my take.wav"))
        );
        assert_eq!(parse("save"), Command::Save(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(ParseCommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "vol".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("vol"))
        );
        assert!(matches!(
            "seek soon".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument { command: "seek", .. })
        ));
        assert!("ab-loop maybe".parse::<Command>().is_err());
        assert!("load".parse::<Command>().is_err());
    }

    #[test]
    fn test_transport_commands_need_track() {
        let mut deck = Deck::new(1, 10.0);
        assert_eq!(deck.dispatch(Command::Play), Outcome::Ignored);
        assert_eq!(deck.dispatch(Command::Forward(None)), Outcome::Ignored);
        assert_eq!(deck.dispatch(Command::MarkA), Outcome::Ignored);
        assert!(!deck.active_player().is_playing());
    }

    #[test]
    fn test_seek_step() {
        let mut deck = deck_with_track(60);
        deck.dispatch(Command::Forward(None));
        assert_eq!(deck.active_player().position(), 10.0);
        deck.dispatch(Command::Forward(Some(5.0)));
        assert_eq!(deck.active_player().position(), 15.0);
        deck.dispatch(Command::Back(None));
        assert_eq!(deck.active_player().position(), 5.0);
        deck.dispatch(Command::Back(None));
        assert_eq!(deck.active_player().position(), 0.0);
    }

    #[test]
    fn test_unmark_negative_is_noop() {
        let mut deck = deck_with_track(10);
        deck.dispatch(Command::AddMarker(None));
        assert_eq!(deck.dispatch(parse("unmark -1")), Outcome::Ignored);
        assert_eq!(deck.active_player().marker_count(), 1);
        assert_eq!(deck.dispatch(parse("unmark 0")), Outcome::Applied);
        assert_eq!(deck.active_player().marker_count(), 0);
    }

    #[test]
    fn test_mute_saves_and_restores_volume() {
        let mut deck = deck_with_track(10);
        deck.dispatch(Command::Volume(0.6));

        deck.dispatch(Command::Mute);
        assert!(deck.is_muted());
        assert_eq!(deck.active_player().volume(), 0.0);

        deck.dispatch(Command::Mute);
        assert!(!deck.is_muted());
        assert_eq!(deck.active_player().volume(), 0.6);
    }

    #[test]
    fn test_volume_while_muted_updates_saved_value() {
        let mut deck = deck_with_track(10);
        deck.dispatch(Command::Mute);

        deck.dispatch(Command::Volume(0.3));
        assert_eq!(deck.active_player().volume(), 0.0);

        deck.dispatch(Command::Mute);
        assert_eq!(deck.active_player().volume(), 0.3);
    }

    #[test]
    fn test_loading_clears_mute() {
        let temp_dir = TempDir::new().unwrap();
        let wav = temp_dir.path().join("take.wav");
        write_wav(&wav, 1);

        let mut deck = deck_with_track(10);
        deck.dispatch(Command::Volume(0.7));
        deck.dispatch(Command::Mute);

        assert!(matches!(deck.dispatch(Command::Load(wav)), Outcome::Message(_)));
        assert!(!deck.is_muted());
        assert_eq!(deck.active_player().volume(), 0.7);
    }

    #[test]
    fn test_failed_load_keeps_mute() {
        let mut deck = deck_with_track(10);
        deck.dispatch(Command::Mute);
        deck.dispatch(Command::Load(PathBuf::from("/nonexistent/x.wav")));
        assert!(deck.is_muted());
        assert!(deck.active_player().has_track());
    }

    #[test]
    fn test_segment_loop_needs_markers() {
        let mut deck = deck_with_track(10);
        assert_eq!(
            deck.dispatch(Command::SegmentLoop(Some(true))),
            Outcome::Message("Set A and B before enabling the A-B loop".to_string())
        );

        deck.dispatch(Command::Seek(2.0));
        deck.dispatch(Command::MarkA);
        deck.dispatch(Command::Seek(5.0));
        deck.dispatch(Command::MarkB);
        assert_eq!(
            deck.dispatch(Command::SegmentLoop(None)),
            Outcome::Message("A-B loop on".to_string())
        );
        assert!(deck.active_player().is_segment_looping());
    }

    #[test]
    fn test_select_player() {
        let mut deck = Deck::new(2, 10.0);
        assert_eq!(
            deck.dispatch(Command::Select(2)),
            Outcome::Message("Player 2 active".to_string())
        );
        assert_eq!(deck.active_index(), 1);
        assert_eq!(deck.dispatch(Command::Select(3)), Outcome::Ignored);
        assert_eq!(deck.dispatch(Command::Select(0)), Outcome::Ignored);
        assert_eq!(deck.active_index(), 1);
    }

    #[test]
    fn test_player_count_is_clamped() {
        assert_eq!(Deck::new(0, 10.0).player_count(), 1);
        assert_eq!(Deck::new(5, 10.0).player_count(), 2);
    }

    #[test]
    fn test_save_uses_suggested_names_and_counts_edits() {
        let temp_dir = TempDir::new().unwrap();
        let wav = temp_dir.path().join("take.wav");
        write_wav(&wav, 3);

        let mut deck = Deck::new(1, 10.0);
        deck.dispatch(Command::Load(wav));
        assert!(matches!(deck.dispatch(Command::Save(None)), Outcome::Message(_)));
        assert_eq!(deck.edit_counter(), 0);

        deck.dispatch(Command::Seek(0.5));
        deck.dispatch(Command::MarkA);
        deck.dispatch(Command::Seek(1.5));
        deck.dispatch(Command::MarkB);
        deck.dispatch(Command::Slice);
        deck.dispatch(Command::Save(None));
        deck.dispatch(Command::Save(None));

        assert_eq!(deck.edit_counter(), 2);
        assert!(temp_dir.path().join("take_edit.wav").exists());
        assert!(temp_dir.path().join("take_edit_2.wav").exists());

        let reader = hound::WavReader::open(temp_dir.path().join("take_edit.wav")).unwrap();
        assert_eq!(reader.duration(), 8000);
    }

    #[test]
    fn test_playlist_navigation() {
        let temp_dir = TempDir::new().unwrap();
        write_wav(&temp_dir.path().join("one.wav"), 1);
        write_wav(&temp_dir.path().join("two.wav"), 2);
        let list = temp_dir.path().join("set.m3u");
        std::fs::write(&list, "#EXTM3U\none.wav\ntwo.wav\n").unwrap();

        let mut deck = Deck::new(1, 10.0);
        deck.dispatch(Command::Load(list));
        assert_eq!(deck.playlist().len(), 2);
        assert_eq!(deck.active_player().length(), 1.0);

        deck.dispatch(Command::Next);
        assert_eq!(deck.active_player().length(), 2.0);
        assert_eq!(deck.dispatch(Command::Next), Outcome::Ignored);

        deck.dispatch(Command::Prev);
        assert_eq!(deck.active_player().length(), 1.0);
        assert_eq!(deck.dispatch(Command::Prev), Outcome::Ignored);
    }

    #[test]
    fn test_session_round_trip_per_slot() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.wav");
        let second = temp_dir.path().join("second.wav");
        write_wav(&first, 2);
        write_wav(&second, 3);

        let mut deck = Deck::new(2, 10.0);
        deck.dispatch(Command::Load(first.clone()));
        deck.dispatch(Command::Seek(1.5));
        deck.dispatch(Command::Select(2));
        deck.dispatch(Command::Load(second.clone()));
        deck.dispatch(Command::Speed(0.75));

        let mut store = MemorySettingsStore::new();
        assert!(deck.save_session(&mut store));

        let mut restored = Deck::new(2, 10.0);
        assert_eq!(restored.restore_session(&store), 2);
        let one = restored.player(0).unwrap();
        let two = restored.player(1).unwrap();
        assert_eq!(one.current_file(), Some(first.as_path()));
        assert_eq!(one.position(), 1.5);
        assert_eq!(two.current_file(), Some(second.as_path()));
        assert_eq!(two.speed(), 0.75);
    }

    #[test]
    fn test_output_source_mixes_both_players() {
        let mut deck = Deck::new(2, 10.0);
        for index in 0..2 {
            deck.active = index;
            deck.active_player_mut().load_decoded(
                Path::new("tone.wav"),
                DecodedAudio::new(vec![0.25; 1000], 1, 1000),
            );
            deck.dispatch(Command::Play);
        }

        let mut source = deck.output_source();
        source.prepare(16, 1000, 1);
        let mut out = vec![0.0; 16];
        source.render(&mut out);

        assert!(out.iter().all(|&s| s == 0.5));
        assert_eq!(deck.handles().len(), 2);
    }

    #[test]
    fn test_status_lists_every_player() {
        let deck = Deck::new(2, 10.0);
        let status = deck.status();
        assert_eq!(status.lines().count(), 2);
        assert!(status.starts_with("*player1 (empty)"));
    }
}
