use std::path::{Path, PathBuf};
use tempfile::TempDir;

use zim_deck::player::Player;
use zim_deck::player::events::PlayerEvent;
use zim_deck::player::source::AudioSource;

const RATE: u32 = 44100;

/// Writes a stereo 16-bit WAV whose left channel ramps with the frame index.
fn write_fixture(dir: &Path, name: &str, seconds: f64) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (seconds * RATE as f64) as usize;
    for i in 0..frames {
        let left = ((i % 1000) as i16) * 30;
        writer.write_sample(left).unwrap();
        writer.write_sample(-left).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_load_file_resets_state() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_fixture(temp_dir.path(), "first.wav", 6.0);
    let second = write_fixture(temp_dir.path(), "second.wav", 2.0);

    let mut player = Player::new();
    assert!(player.load(&first));
    assert!((player.length() - 6.0).abs() < 1e-6);

    player.add_marker(1.0, None);
    player.set_segment(2.0, 5.0);
    player.set_segment_looping(true);
    player.create_slice();
    player.set_speed(1.5);
    player.seek_absolute(3.0);

    assert!(player.load(&second));
    assert_eq!(player.position(), 0.0);
    assert_eq!(player.speed(), 1.0);
    assert_eq!(player.marker_count(), 0);
    assert!(!player.has_segment());
    assert!(!player.is_segment_looping());
    assert!(!player.has_slice());
    assert_eq!(player.metadata().unwrap().filename, "second.wav");
}

#[test]
fn test_rejected_files_leave_player_empty() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "not audio").unwrap();
    let fake = temp_dir.path().join("fake.wav");
    std::fs::write(&fake, "not a riff header").unwrap();

    let mut player = Player::new();
    assert!(!player.load(&notes));
    assert!(!player.load(&fake));
    assert!(!player.load(&temp_dir.path().join("missing.wav")));
    assert!(!player.has_track());

    player.play();
    assert!(!player.is_playing());
}

#[test]
fn test_segment_loop_keeps_position_inside_region() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fixture(temp_dir.path(), "loop.wav", 8.0);

    let mut player = Player::new();
    assert!(player.load(&path));
    player.set_segment(2.0, 5.0);
    assert!(player.set_segment_looping(true));

    let mut source = player.source();
    source.prepare(512, RATE, 2);
    player.seek_absolute(4.9);
    player.play();

    let mut block = vec![0.0; 512 * 2];
    let mut wrapped = false;
    let mut previous = player.position();
    for _ in 0..400 {
        source.render(&mut block);
        let position = player.position();
        assert!(position >= 2.0 && position < 5.0, "position {position}");
        if position < previous {
            wrapped = true;
        }
        previous = position;
    }

    assert!(wrapped);
    assert!(player.is_playing());
}

#[test]
fn test_playback_stops_at_end() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fixture(temp_dir.path(), "short.wav", 0.5);

    let mut player = Player::new();
    assert!(player.load(&path));
    let mut source = player.source();
    source.prepare(512, RATE, 2);
    player.play();

    let mut block = vec![0.0; 512 * 2];
    for _ in 0..100 {
        source.render(&mut block);
    }

    assert!(!player.is_playing());
    assert_eq!(player.position(), player.length());
}

#[test]
fn test_slice_matches_region_and_exports() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fixture(temp_dir.path(), "take.wav", 6.0);
    let out = temp_dir.path().join("take_edit.wav");

    let mut player = Player::new();
    assert!(player.load(&path));
    player.set_segment(2.0, 5.0);
    assert!(player.create_slice());

    let expected = 3 * RATE as usize;
    assert!(player.slice_frames().abs_diff(expected) <= 1);
    assert!(player.save_slice(&out));

    let reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, RATE);
    assert!((reader.duration() as usize).abs_diff(expected) <= 1);
}

#[test]
fn test_slice_round_trips_samples() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fixture(temp_dir.path(), "take.wav", 2.0);
    let out = temp_dir.path().join("cut.wav");

    let mut player = Player::new();
    assert!(player.load(&path));
    player.set_segment(1.0, 1.5);
    player.create_slice();
    player.save_slice(&out);

    let mut reader = hound::WavReader::open(&out).unwrap();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();

    // Frame 44100 of the source has left = (44100 % 1000) * 30
    let first_left = ((RATE as usize % 1000) as i16) * 30;
    assert!((samples[0] - first_left).abs() <= 1);
    assert!((samples[1] + first_left).abs() <= 1);
}

#[test]
fn test_events_follow_edits() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fixture(temp_dir.path(), "take.wav", 3.0);

    let mut player = Player::new();
    let events = player.subscribe();
    player.load(&path);
    player.add_marker(1.0, None);
    player.set_segment(0.5, 1.5);
    player.create_slice();

    let received: Vec<PlayerEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            PlayerEvent::TrackLoaded(path.clone()),
            PlayerEvent::MarkersChanged,
            PlayerEvent::SegmentChanged,
            PlayerEvent::SliceChanged,
        ]
    );
}
