//! The audio-thread side of a player.
//!
//! `render` runs once per device block. It only reads atomics and `ArcSwap`
//! snapshots and never allocates, locks or touches the file system.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::segment::SegmentBounds;
use super::transport::TransportShared;

const DEFAULT_DEVICE_RATE: u32 = 44100;
const DEFAULT_DEVICE_CHANNELS: u16 = 2;

/// A pull-based producer of interleaved `f32` blocks.
pub trait AudioSource: Send {
    /// Called before the first `render` and whenever the device format changes.
    fn prepare(&mut self, block_size: usize, sample_rate: u32, channels: u16);

    /// Fills `out` (interleaved, a whole number of frames) with the next block.
    fn render(&mut self, out: &mut [f32]);

    fn release(&mut self);
}

impl<T: AudioSource + ?Sized> AudioSource for Box<T> {
    fn prepare(&mut self, block_size: usize, sample_rate: u32, channels: u16) {
        (**self).prepare(block_size, sample_rate, channels);
    }

    fn render(&mut self, out: &mut [f32]) {
        (**self).render(out);
    }

    fn release(&mut self) {
        (**self).release();
    }
}

pub struct PlayerSource {
    transport: Arc<TransportShared>,
    segment: Arc<ArcSwap<SegmentBounds>>,
    device_rate: u32,
    channels: u16,
}

impl PlayerSource {
    pub(crate) fn new(
        transport: Arc<TransportShared>,
        segment: Arc<ArcSwap<SegmentBounds>>,
    ) -> Self {
        Self {
            transport,
            segment,
            device_rate: DEFAULT_DEVICE_RATE,
            channels: DEFAULT_DEVICE_CHANNELS,
        }
    }

    pub fn device_rate(&self) -> u32 {
        self.device_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Where the read head ended up after stepping past a boundary.
enum Advance {
    Continue(f64),
    Ended,
}

fn wrap(pos: f64, region: Option<(f64, f64)>, total: f64, looping: bool) -> Advance {
    let pos = match region {
        Some((a, b)) if pos >= b => a,
        _ => pos,
    };
    if pos < total {
        Advance::Continue(pos)
    } else if looping {
        Advance::Continue(pos % total)
    } else {
        Advance::Ended
    }
}

impl AudioSource for PlayerSource {
    fn prepare(&mut self, block_size: usize, sample_rate: u32, channels: u16) {
        self.device_rate = sample_rate.max(1);
        self.channels = channels.max(1);
        log::debug!(
            "Player source prepared: {block_size} frames, {} Hz, {} ch",
            self.device_rate,
            self.channels
        );
    }

    fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        let shared = &self.transport;
        if !shared.is_playing() {
            return;
        }
        let generation = shared.generation();
        let guard = shared.source.load();
        let Some(audio) = &*guard else {
            return;
        };
        let frames = audio.frames();
        if frames == 0 {
            return;
        }

        let start_bits = shared.position.load(Ordering::Acquire);
        let mut pos = f64::from_bits(start_bits);

        let src_rate = audio.sample_rate() as f64;
        let step = shared.speed() as f64 * src_rate / self.device_rate as f64;
        let gain = shared.volume();
        let total = frames as f64;
        let looping = shared.is_looping();
        let region = self
            .segment
            .load()
            .loop_region()
            .map(|(a, b)| (a * src_rate, b * src_rate));

        let out_channels = self.channels as usize;
        let src_channels = audio.channels() as usize;
        let mut ended = false;

        for frame_out in out.chunks_exact_mut(out_channels) {
            pos = match wrap(pos, region, total, looping) {
                Advance::Continue(pos) => pos,
                Advance::Ended => {
                    ended = true;
                    break;
                }
            };

            let index = pos as usize;
            let frac = (pos - index as f64) as f32;
            let Some(current) = audio.frame(index) else {
                ended = true;
                break;
            };
            let next = audio.frame(index + 1).unwrap_or(current);

            for (channel, sample) in frame_out.iter_mut().enumerate() {
                let c = channel.min(src_channels - 1);
                let value = current[c] + (next[c] - current[c]) * frac;
                *sample = value * gain;
            }

            pos += step;
        }

        // Block end: never commit a position at or past B, or past the end
        if !ended {
            match wrap(pos, region, total, looping) {
                Advance::Continue(wrapped) => pos = wrapped,
                Advance::Ended => ended = true,
            }
        }
        if ended {
            pos = total;
        }

        // A seek or load from the control side wins over this block
        let committed = shared.commit_position(generation, start_bits, pos);

        if ended && committed {
            shared.playing.store(false, Ordering::Release);
        }
    }

    fn release(&mut self) {
        log::debug!("Player source released");
    }
}
