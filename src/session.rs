//! Per-slot session persistence: last file, position and speed.
//!
//! Keys are namespaced by slot (`player1_lastFile`, `player2_lastSpeed`, ...)
//! so two decks can share one store. Restoring never fails loudly; a missing
//! or unusable entry leaves the player empty and ready for use.

use log::{info, warn};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{KEY_LAST_FILE, KEY_LAST_POSITION, KEY_LAST_SPEED, has_audio_extension};
use crate::player::Player;

/// A flat key/value settings backend.
pub trait SettingsStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn set_string(&mut self, key: &str, value: &str);
    fn set_f64(&mut self, key: &str, value: f64);
    fn flush(&mut self) -> Result<(), Box<dyn Error>>;
}

fn table_string(table: &toml::Table, key: &str) -> Option<String> {
    table.get(key)?.as_str().map(str::to_string)
}

fn table_f64(table: &toml::Table, key: &str) -> Option<f64> {
    match table.get(key)? {
        toml::Value::Float(value) => Some(*value),
        toml::Value::Integer(value) => Some(*value as f64),
        toml::Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

/// Settings kept in a flat TOML table on disk.
pub struct TomlSettingsStore {
    path: PathBuf,
    table: toml::Table,
    dirty: bool,
}

impl TomlSettingsStore {
    /// Opens the store at `path`. A missing file gives an empty store, and so
    /// does a corrupt one (with a warning); the file is replaced on the next flush.
    pub fn open(path: &Path) -> Self {
        let table = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<toml::Table>(&contents).unwrap_or_else(|e| {
                warn!("Ignoring unreadable session file {}: {e}", path.display());
                toml::Table::new()
            }),
            Err(_) => toml::Table::new(),
        };

        Self {
            path: path.to_path_buf(),
            table,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get_string(&self, key: &str) -> Option<String> {
        table_string(&self.table, key)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        table_f64(&self.table, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.table
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self.dirty = true;
    }

    fn set_f64(&mut self, key: &str, value: f64) {
        self.table.insert(key.to_string(), toml::Value::Float(value));
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<(), Box<dyn Error>> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string(&self.table)?)?;
        self.dirty = false;
        Ok(())
    }
}

/// Settings that live only as long as the value itself.
#[derive(Default)]
pub struct MemorySettingsStore {
    table: toml::Table,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_string(&self, key: &str) -> Option<String> {
        table_string(&self.table, key)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        table_f64(&self.table, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.table
            .insert(key.to_string(), toml::Value::String(value.to_string()));
    }

    fn set_f64(&mut self, key: &str, value: f64) {
        self.table.insert(key.to_string(), toml::Value::Float(value));
    }

    fn flush(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

fn slot_key(slot: &str, key: &str) -> String {
    format!("{slot}_{key}")
}

/// Writes the player's file, position and speed under `slot` and flushes.
pub fn save(player: &Player, store: &mut dyn SettingsStore, slot: &str) -> bool {
    let file = player
        .current_file()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    store.set_string(&slot_key(slot, KEY_LAST_FILE), &file);
    store.set_f64(&slot_key(slot, KEY_LAST_POSITION), player.position());
    store.set_f64(&slot_key(slot, KEY_LAST_SPEED), player.speed() as f64);

    match store.flush() {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save session for {slot}: {e}");
            false
        }
    }
}

/// Reloads the last file for `slot` and reapplies its position and speed.
/// Returns false, leaving the player as it was, when there is nothing usable.
pub fn restore(player: &mut Player, store: &dyn SettingsStore, slot: &str) -> bool {
    let Some(file) = store.get_string(&slot_key(slot, KEY_LAST_FILE)) else {
        return false;
    };
    if file.is_empty() {
        return false;
    }

    let path = PathBuf::from(&file);
    if !path.is_file() || !has_audio_extension(&path) {
        info!("Last {slot} file is gone or unsupported: {file}");
        return false;
    }
    if !player.load(&path) {
        return false;
    }

    let position = store
        .get_f64(&slot_key(slot, KEY_LAST_POSITION))
        .filter(|p| p.is_finite())
        .unwrap_or(0.0);
    let speed = store
        .get_f64(&slot_key(slot, KEY_LAST_SPEED))
        .filter(|s| s.is_finite())
        .unwrap_or(1.0);

    player.seek_absolute(position);
    player.set_speed(speed as f32);
    info!("Restored {slot}: {} at {position:.2}s, speed {speed:.2}", path.display());
    true
}
