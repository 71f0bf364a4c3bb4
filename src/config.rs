//! Application configuration management.
//!
//! This module handles the persistent configuration for zim-deck: seek step,
//! starting volume, audio block size, status refresh rate, log level and
//! whether the last session is restored on start. Configuration is stored in
//! the user's config directory (typically ~/.config/zim-deck/config.toml). The
//! per-slot session state lives next to it in session.toml.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "zim-deck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_seek_step_seconds")]
    pub seek_step_seconds: f64,
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_restore_session")]
    pub restore_session: bool,
}

fn default_seek_step_seconds() -> f64 {
    10.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_block_size() -> usize {
    512
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_restore_session() -> bool {
    true
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            seek_step_seconds: default_seek_step_seconds(),
            default_volume: default_volume(),
            block_size: default_block_size(),
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
            restore_session: default_restore_session(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(APP_DIR)
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join(APP_DIR)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn session_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("session.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "seek_step_seconds" => {
                let step = value
                    .parse::<f64>()
                    .map_err(|_| "Value must be a number of seconds")?;
                if !step.is_finite() || step <= 0.0 {
                    return Err("Seek step must be greater than zero".into());
                }
                self.seek_step_seconds = step;
            }
            "default_volume" => {
                let volume = value
                    .parse::<f32>()
                    .map_err(|_| "Value must be a number between 0.0 and 1.0")?;
                if !(0.0..=1.0).contains(&volume) {
                    return Err("Volume must be between 0.0 and 1.0".into());
                }
                self.default_volume = volume;
            }
            "block_size" => {
                let size = value
                    .parse::<usize>()
                    .map_err(|_| "Value must be a whole number of frames")?;
                if !(16..=16384).contains(&size) {
                    return Err("Block size must be between 16 and 16384 frames".into());
                }
                self.block_size = size;
            }
            "poll_interval_ms" => {
                let interval = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
                if interval == 0 {
                    return Err("Poll interval must be greater than zero".into());
                }
                self.poll_interval_ms = interval;
            }
            "log_level" => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(format!("Log level must be one of: {}", LOG_LEVELS.join(", ")).into());
                }
                self.log_level = level;
            }
            "restore_session" => {
                self.restore_session = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }

    /// The configured level, falling back to `Info` for anything unrecognised.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}
