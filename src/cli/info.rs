use owo_colors::OwoColorize;
use serde::Serialize;
use std::error::Error;

use zim_deck::media::{self, TrackMetadata};

use super::expand;

#[derive(Serialize)]
struct InfoReport {
    #[serde(flatten)]
    metadata: TrackMetadata,
    channels: u16,
    sample_rate: u32,
    frames: usize,
}

pub fn handle_info(file: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let path = expand(file);
    let audio = media::open(&path)?;
    let report = InfoReport {
        metadata: media::metadata::extract(&path, audio.duration_seconds()),
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        frames: audio.frames(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let metadata = &report.metadata;
    println!("{}", metadata.title.cyan().bold());
    field("file", &metadata.filename);
    field("artist", &metadata.artist);
    field("album", &metadata.album);
    field("year", &metadata.year);
    field("duration", &format!("{:.3}s", metadata.duration));
    field(
        "format",
        &format!(
            "{} Hz, {} ch, {} frames",
            report.sample_rate, report.channels, report.frames
        ),
    );
    Ok(())
}

fn field(name: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<9} {}", format!("{name}:").dimmed(), value);
    }
}
