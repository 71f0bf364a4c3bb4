//! Decoded audio handles.
//!
//! Every supported format is decoded up front into interleaved `f32` samples
//! so the playback path can index frames directly and slicing can copy a
//! region without touching the file again.

use std::error::Error;
use std::path::Path;

pub mod decode;
pub mod metadata;

pub use metadata::TrackMetadata;

/// Fully decoded, interleaved PCM for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let mut samples = samples;
        // Drop a trailing partial frame
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);

        Self {
            samples,
            channels,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Interleaved samples of one frame, or `None` past the end.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let channels = self.channels as usize;
        let start = index.checked_mul(channels)?;
        self.samples.get(start..start + channels)
    }

    /// Block read of `count` frames starting at `start`.
    ///
    /// Returns `None` when the region runs past the end of the track.
    pub fn read_frames(&self, start: usize, count: usize) -> Option<&[f32]> {
        let channels = self.channels as usize;
        let end = start.checked_add(count)?;
        if end > self.frames() {
            return None;
        }
        self.samples.get(start * channels..end * channels)
    }
}

/// Opens and decodes `path`, dispatching on its extension.
pub fn open(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    decode::decode_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize) -> DecodedAudio {
        let samples = (0..frames)
            .flat_map(|i| [i as f32, -(i as f32)])
            .collect::<Vec<_>>();
        DecodedAudio::new(samples, 2, 10)
    }

    #[test]
    fn test_frames_and_duration() {
        let audio = stereo_ramp(25);
        assert_eq!(audio.frames(), 25);
        assert_eq!(audio.channels(), 2);
        assert!((audio.duration_seconds() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_partial_frame_is_dropped() {
        let audio = DecodedAudio::new(vec![0.1, 0.2, 0.3], 2, 44100);
        assert_eq!(audio.frames(), 1);
        assert_eq!(audio.samples(), &[0.1, 0.2]);
    }

    #[test]
    fn test_frame_lookup() {
        let audio = stereo_ramp(4);
        assert_eq!(audio.frame(3), Some(&[3.0, -3.0][..]));
        assert!(audio.frame(4).is_none());
    }

    #[test]
    fn test_read_frames_in_range() {
        let audio = stereo_ramp(10);
        let block = audio.read_frames(2, 3).unwrap();
        assert_eq!(block, &[2.0, -2.0, 3.0, -3.0, 4.0, -4.0]);
    }

    #[test]
    fn test_read_frames_short_read_fails() {
        let audio = stereo_ramp(10);
        assert!(audio.read_frames(8, 3).is_none());
        assert!(audio.read_frames(usize::MAX, 2).is_none());
        assert_eq!(audio.read_frames(10, 0), Some(&[][..]));
    }

    #[test]
    fn test_zero_channels_and_rate_are_guarded() {
        let audio = DecodedAudio::new(vec![0.0; 4], 0, 0);
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.sample_rate(), 1);
        assert_eq!(audio.frames(), 4);
    }
}
