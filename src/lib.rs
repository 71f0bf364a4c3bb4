pub mod commands;
pub mod config;
pub mod constants;
pub mod media;
pub mod player;
pub mod playlist;
pub mod session;
