//! Bridges an `AudioSource` onto the default rodio output stream.
//!
//! rodio pulls samples one at a time; `DeviceSource` refills a fixed block
//! from the wrapped source whenever it runs dry. The stream's mixer converts
//! from our fixed output format to whatever the device runs at.

use rodio::{OutputStream, OutputStreamBuilder, Source};
use std::error::Error;
use std::time::Duration;

use super::source::AudioSource;

pub const OUTPUT_SAMPLE_RATE: u32 = 44100;
pub const OUTPUT_CHANNELS: u16 = 2;

pub struct DeviceSource<S: AudioSource> {
    inner: S,
    block: Vec<f32>,
    cursor: usize,
}

impl<S: AudioSource> DeviceSource<S> {
    pub fn new(mut inner: S, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        inner.prepare(block_size, OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS);
        let len = block_size * OUTPUT_CHANNELS as usize;
        Self {
            inner,
            block: vec![0.0; len],
            cursor: len,
        }
    }
}

impl<S: AudioSource> Iterator for DeviceSource<S> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.block.len() {
            self.inner.render(&mut self.block);
            self.cursor = 0;
        }
        let sample = self.block[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl<S: AudioSource> Source for DeviceSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        OUTPUT_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        OUTPUT_SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl<S: AudioSource> Drop for DeviceSource<S> {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// Keeps the output stream alive for as long as playback should run.
pub struct AudioOutput {
    _stream: OutputStream,
}

impl AudioOutput {
    pub fn open<S>(source: S, block_size: usize) -> Result<Self, Box<dyn Error>>
    where
        S: AudioSource + 'static,
    {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio prints to stderr when the stream drops, which garbles the prompt
        stream.log_on_drop(false);
        stream.mixer().add(DeviceSource::new(source, block_size));
        log::info!(
            "Audio output opened: {OUTPUT_SAMPLE_RATE} Hz, {OUTPUT_CHANNELS} ch, {block_size} frame blocks"
        );
        Ok(Self { _stream: stream })
    }
}
