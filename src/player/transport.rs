//! Playback transport for a single track.
//!
//! The control side (`Transport`) and the audio side (`PlayerSource`) share a
//! `TransportShared` of atomics. The decoded track lives behind an
//! `ArcSwapOption`, so loading a new file swaps a fully built handle in one
//! step and the audio path never sees a half-installed source.
//!
//! Position is kept in source frames (as `f64` bits) so it stays exact across
//! device sample rates and speed changes.

use arc_swap::ArcSwapOption;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::constants::{
    END_GUARD_SECONDS, MAX_SPEED, MAX_VOLUME, MIN_SPEED, MIN_VOLUME, has_audio_extension,
};
use crate::media::{self, DecodedAudio};

pub(crate) struct TransportShared {
    pub(crate) source: ArcSwapOption<DecodedAudio>,
    pub(crate) position: AtomicU64,
    pub(crate) playing: AtomicBool,
    pub(crate) looping: AtomicBool,
    generation: AtomicU64,
    volume: AtomicU32,
    speed: AtomicU32,
}

impl TransportShared {
    fn new() -> Self {
        Self {
            source: ArcSwapOption::empty(),
            position: AtomicU64::new(0f64.to_bits()),
            playing: AtomicBool::new(false),
            looping: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            volume: AtomicU32::new(1f32.to_bits()),
            speed: AtomicU32::new(1f32.to_bits()),
        }
    }

    pub(crate) fn position_frames(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    fn store_position_frames(&self, frames: f64) {
        self.position.store(frames.to_bits(), Ordering::Release);
    }

    /// Bumped by every load, after the new track and its position are published.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Commits a position computed from `start_bits` under `generation`.
    ///
    /// Fails if the control side sought in the meantime or a load happened
    /// since `generation` was read. A fresh load also starts at frame 0, so a
    /// matching `start_bits` alone is not enough; if the load lands between the
    /// exchange and the generation check, the load's start position is put back.
    pub(crate) fn commit_position(&self, generation: u64, start_bits: u64, frames: f64) -> bool {
        if self.generation() != generation {
            return false;
        }
        let bits = frames.to_bits();
        if self
            .position
            .compare_exchange(start_bits, bits, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if self.generation() != generation {
            let _ = self.position.compare_exchange(
                bits,
                0f64.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return false;
        }
        true
    }

    pub(crate) fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub(crate) fn speed(&self) -> f32 {
        f32::from_bits(self.speed.load(Ordering::Relaxed))
    }

    pub(crate) fn position_seconds(&self) -> f64 {
        let guard = self.source.load();
        match &*guard {
            Some(audio) => self.position_frames() / audio.sample_rate() as f64,
            None => 0.0,
        }
    }

    pub(crate) fn length_seconds(&self) -> f64 {
        let guard = self.source.load();
        match &*guard {
            Some(audio) => audio.duration_seconds(),
            None => 0.0,
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }
}

pub struct Transport {
    shared: Arc<TransportShared>,
    current_file: Option<PathBuf>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(TransportShared::new()),
            current_file: None,
        }
    }

    /// Opens and decodes `path`. Leaves the current track untouched on failure.
    pub fn load(&mut self, path: &Path) -> bool {
        if !path.is_file() || !has_audio_extension(path) {
            log::warn!("Refusing to load {}: not a supported audio file", path.display());
            return false;
        }

        match media::open(path) {
            Ok(audio) => {
                self.load_decoded(path, audio);
                true
            }
            Err(e) => {
                log::warn!("Failed to open {}: {e}", path.display());
                false
            }
        }
    }

    /// Installs an already decoded track.
    pub fn load_decoded(&mut self, path: &Path, audio: DecodedAudio) {
        self.shared.playing.store(false, Ordering::Release);

        // Make before break: the new handle is complete before it is published
        let previous = self.shared.source.swap(Some(Arc::new(audio)));
        self.shared.store_position_frames(0.0);
        self.shared.speed.store(1f32.to_bits(), Ordering::Relaxed);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        drop(previous);

        self.current_file = Some(path.to_path_buf());
        log::info!("Loaded {} ({:.2}s)", path.display(), self.length());
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn has_track(&self) -> bool {
        self.shared.source.load().is_some()
    }

    pub fn audio(&self) -> Option<Arc<DecodedAudio>> {
        self.shared.source.load_full()
    }

    pub fn play(&self) {
        if !self.has_track() || self.is_playing() {
            return;
        }
        self.shared.playing.store(true, Ordering::Release);
        log::debug!("Play at {:.3}s", self.position());
    }

    pub fn stop(&self) {
        if self.shared.playing.swap(false, Ordering::AcqRel) {
            log::debug!("Stop at {:.3}s", self.position());
        }
    }

    pub fn restart(&self) {
        self.seek_absolute(0.0);
        self.play();
    }

    pub fn is_playing(&self) -> bool {
        self.shared.is_playing()
    }

    pub fn toggle_looping(&self) -> bool {
        let looping = !self.is_looping();
        self.set_looping(looping);
        looping
    }

    pub fn set_looping(&self, looping: bool) {
        self.shared.looping.store(looping, Ordering::Relaxed);
    }

    pub fn is_looping(&self) -> bool {
        self.shared.is_looping()
    }

    pub fn seek_relative(&self, delta_seconds: f64) {
        if delta_seconds.is_finite() {
            self.seek_absolute(self.position() + delta_seconds);
        }
    }

    /// Moves to `seconds`, clamped to `[0, length]`.
    pub fn seek_absolute(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let guard = self.shared.source.load();
        let Some(audio) = &*guard else {
            return;
        };

        let seconds = seconds.clamp(0.0, audio.duration_seconds());
        self.shared
            .store_position_frames(seconds * audio.sample_rate() as f64);
    }

    pub fn go_to_end(&self) {
        if self.has_track() {
            self.seek_absolute((self.length() - END_GUARD_SECONDS).max(0.0));
        }
    }

    pub fn position(&self) -> f64 {
        self.shared.position_seconds()
    }

    pub fn length(&self) -> f64 {
        self.shared.length_seconds()
    }

    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        self.shared.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        self.shared.volume()
    }

    /// Sets the resampling ratio, clamped to `[0.5, 2.0]`.
    pub fn set_speed(&self, speed: f32) {
        if speed.is_nan() {
            return;
        }
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.shared.speed.store(speed.to_bits(), Ordering::Relaxed);
    }

    pub fn speed(&self) -> f32 {
        self.shared.speed()
    }

    pub(crate) fn shared(&self) -> Arc<TransportShared> {
        Arc::clone(&self.shared)
    }
}
