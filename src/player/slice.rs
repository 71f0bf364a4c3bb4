//! Cutting the A–B region into its own buffer and writing it out as WAV.
//!
//! Slices are always exported as 16-bit integer PCM at the source sample rate
//! and channel count, whatever the source format was.

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};
use std::error::Error;
use std::path::Path;

use super::segment::SegmentBounds;
use crate::constants::SLICE_BITS_PER_SAMPLE;
use crate::media::DecodedAudio;

#[derive(Debug, Clone)]
pub struct Slice {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    start: f64,
    end: f64,
}

impl Slice {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

#[derive(Debug, Default)]
pub struct SliceEngine {
    slice: Option<Slice>,
}

impl SliceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `[A, B)` out of `audio`. Any previous slice is discarded first.
    pub fn create(&mut self, audio: Option<&DecodedAudio>, bounds: SegmentBounds) -> bool {
        self.slice = None;

        let (Some(audio), Some(a), Some(b)) = (audio, bounds.a, bounds.b) else {
            return false;
        };
        if !bounds.has_markers() {
            return false;
        }

        let rate = audio.sample_rate() as f64;
        let total = audio.frames();
        let count = ((b - a) * rate).round() as i64;
        if count <= 0 {
            warn!("Slice {a:.3}s - {b:.3}s is empty at {rate} Hz");
            return false;
        }
        if (b * rate).round() as usize > total {
            warn!("Slice {a:.3}s - {b:.3}s runs past the end of the track ({total} frames)");
            return false;
        }

        // Rounding start and count separately can overshoot the last frame by one
        let count = count as usize;
        let start = ((a * rate).round() as usize).min(total.saturating_sub(count));
        let Some(region) = audio.read_frames(start, count) else {
            warn!("Slice {a:.3}s - {b:.3}s could not be read ({total} frames)");
            return false;
        };

        self.slice = Some(Slice {
            samples: region.to_vec(),
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            start: a,
            end: b,
        });
        info!("Created slice {a:.3}s - {b:.3}s ({count} frames)");
        true
    }

    /// Writes the slice as 16-bit PCM WAV. Returns false if there is no slice
    /// or the file cannot be written.
    pub fn save_to_file(&self, path: &Path) -> bool {
        let Some(slice) = &self.slice else {
            return false;
        };

        match write_wav(slice, path) {
            Ok(()) => {
                info!("Saved slice to: {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to save slice to {}: {e}", path.display());
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slice.as_ref().is_some_and(|s| s.frames() > 0)
    }

    pub fn slice(&self) -> Option<&Slice> {
        self.slice.as_ref()
    }

    pub fn frames(&self) -> usize {
        self.slice.as_ref().map(Slice::frames).unwrap_or(0)
    }

    pub fn info(&self) -> String {
        match &self.slice {
            Some(slice) => format!(
                "Slice: {:.1}s - {:.1}s ({:.1}s)",
                slice.start,
                slice.end,
                slice.end - slice.start
            ),
            None => "No slice created".to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.slice = None;
    }
}

fn write_wav(slice: &Slice, path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = WavSpec {
        channels: slice.channels,
        sample_rate: slice.sample_rate,
        bits_per_sample: SLICE_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &slice.samples {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// File name offered when saving a slice without an explicit path:
/// `<stem>_edit.wav` for the first edit, `<stem>_edit_<n+1>.wav` after that.
pub fn suggested_file_name(source: &Path, edit_counter: u32) -> String {
    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    if edit_counter == 0 {
        format!("{base_name}_edit.wav")
    } else {
        format!("{}_edit_{}.wav", base_name, edit_counter + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bounds(a: f64, b: f64) -> SegmentBounds {
        SegmentBounds {
            a: Some(a),
            b: Some(b),
            looping: false,
        }
    }

    fn stereo_track(seconds: usize, rate: u32) -> DecodedAudio {
        let frames = seconds * rate as usize;
        let samples = (0..frames)
            .flat_map(|i| {
                let v = (i % 100) as f32 / 100.0;
                [v, -v]
            })
            .collect();
        DecodedAudio::new(samples, 2, rate)
    }

    #[test]
    fn test_create_without_track_fails() {
        let mut engine = SliceEngine::new();
        assert!(!engine.create(None, bounds(1.0, 2.0)));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_create_without_markers_fails() {
        let audio = stereo_track(4, 1000);
        let mut engine = SliceEngine::new();
        assert!(!engine.create(Some(&audio), SegmentBounds::default()));
        assert!(!engine.create(Some(&audio), bounds(2.0, 2.0)));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_create_copies_exact_region() {
        let audio = stereo_track(4, 1000);
        let mut engine = SliceEngine::new();

        assert!(engine.create(Some(&audio), bounds(1.0, 2.5)));
        assert!(engine.is_ready());

        let slice = engine.slice().unwrap();
        assert_eq!(slice.frames(), 1500);
        assert_eq!(slice.channels(), 2);
        assert_eq!(slice.sample_rate(), 1000);
        assert_eq!(slice.samples(), audio.read_frames(1000, 1500).unwrap());
    }

    #[test]
    fn test_frame_count_rounds() {
        let audio = stereo_track(2, 44100);
        let mut engine = SliceEngine::new();

        assert!(engine.create(Some(&audio), bounds(0.1, 0.35)));

        let expected = ((0.35 - 0.1) * 44100.0f64).round() as usize;
        assert!(engine.frames().abs_diff(expected) <= 1);
    }

    #[test]
    fn test_region_ending_at_track_end() {
        let audio = stereo_track(1, 1000);
        let mut engine = SliceEngine::new();

        // A sits on a half frame, so start and count both round up
        assert!(engine.create(Some(&audio), bounds(0.0015, 1.0)));

        let frames = engine.frames();
        assert!(frames.abs_diff(999) <= 1);
        let slice = engine.slice().unwrap();
        assert_eq!(slice.samples(), audio.read_frames(1000 - frames, frames).unwrap());
    }

    #[test]
    fn test_region_past_end_fails_and_clears_previous() {
        let audio = stereo_track(2, 1000);
        let mut engine = SliceEngine::new();
        assert!(engine.create(Some(&audio), bounds(0.0, 1.0)));

        assert!(!engine.create(Some(&audio), bounds(1.5, 3.0)));
        assert!(!engine.is_ready());
        assert_eq!(engine.info(), "No slice created");
    }

    #[test]
    fn test_info() {
        let audio = stereo_track(6, 100);
        let mut engine = SliceEngine::new();
        assert_eq!(engine.info(), "No slice created");

        engine.create(Some(&audio), bounds(2.0, 5.0));
        assert_eq!(engine.info(), "Slice: 2.0s - 5.0s (3.0s)");
    }

    #[test]
    fn test_save_without_slice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let engine = SliceEngine::new();
        assert!(!engine.save_to_file(&temp_dir.path().join("out.wav")));
    }

    #[test]
    fn test_save_writes_16bit_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.wav");
        let audio = stereo_track(3, 8000);
        let mut engine = SliceEngine::new();
        engine.create(Some(&audio), bounds(0.5, 1.0));

        assert!(engine.save_to_file(&path));

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(reader.duration(), 4000);
    }

    #[test]
    fn test_save_to_unwritable_path_fails() {
        let audio = stereo_track(1, 1000);
        let mut engine = SliceEngine::new();
        engine.create(Some(&audio), bounds(0.0, 0.5));

        assert!(!engine.save_to_file(Path::new("/nonexistent/dir/out.wav")));
    }

    #[test]
    fn test_to_i16() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(-1.0), -i16::MAX);
        assert_eq!(to_i16(3.0), i16::MAX);
        assert_eq!(to_i16(0.5), 16384);
    }

    #[test]
    fn test_suggested_file_name() {
        let source = Path::new("/music/take.flac");
        assert_eq!(suggested_file_name(source, 0), "take_edit.wav");
        assert_eq!(suggested_file_name(source, 1), "take_edit_2.wav");
        assert_eq!(suggested_file_name(Path::new(""), 0), "audio_edit.wav");
    }
}
