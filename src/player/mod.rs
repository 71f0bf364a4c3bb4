//! One deck slot: a transport plus the markers, A–B segment and slice that
//! belong to the loaded track.
//!
//! `Player` owns the cross-module rules: loading resets everything tied to the
//! old track, and whole-track looping and A–B looping never run together.

#[cfg(feature = "device")]
pub mod device;
pub mod events;
pub mod markers;
pub mod mixer;
pub mod poll;
pub mod segment;
pub mod slice;
pub mod source;
pub mod transport;

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::media::{self, DecodedAudio, TrackMetadata};
use events::{EventBus, PlayerEvent};
use markers::{Marker, MarkerStore};
use poll::PlayerHandle;
use segment::{SegmentBounds, SegmentEngine};
use slice::SliceEngine;
use source::PlayerSource;
use transport::Transport;

#[derive(Default)]
pub struct Player {
    transport: Transport,
    markers: MarkerStore,
    segment: SegmentEngine,
    slice: SliceEngine,
    metadata: Option<TrackMetadata>,
    events: EventBus,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` and makes it the current track. On failure the previous
    /// track and all its state stay as they were.
    pub fn load(&mut self, path: &Path) -> bool {
        if !self.transport.load(path) {
            return false;
        }
        let duration = self.transport.length();
        self.after_load(path, media::metadata::extract(path, duration));
        true
    }

    /// Installs already decoded audio as the current track.
    pub fn load_decoded(&mut self, path: &Path, audio: DecodedAudio) {
        self.transport.load_decoded(path, audio);
        let duration = self.transport.length();
        let metadata = TrackMetadata::from_path(path, duration);
        self.after_load(path, metadata);
    }

    fn after_load(&mut self, path: &Path, metadata: TrackMetadata) {
        self.markers.clear();
        self.segment.clear();
        self.slice.clear();
        self.transport.set_looping(false);
        self.metadata = Some(metadata);
        self.events
            .emit(PlayerEvent::TrackLoaded(path.to_path_buf()));
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.transport.current_file()
    }

    pub fn has_track(&self) -> bool {
        self.transport.has_track()
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn audio(&self) -> Option<Arc<DecodedAudio>> {
        self.transport.audio()
    }

    // Transport

    pub fn play(&self) {
        self.transport.play();
    }

    pub fn stop(&self) {
        self.transport.stop();
    }

    /// Play if stopped, stop if playing. Returns the new playing state.
    pub fn toggle_play(&self) -> bool {
        if self.is_playing() {
            self.stop();
        } else {
            self.play();
        }
        self.is_playing()
    }

    pub fn restart(&self) {
        self.transport.restart();
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn seek_relative(&self, delta_seconds: f64) {
        self.transport.seek_relative(delta_seconds);
    }

    pub fn seek_absolute(&self, seconds: f64) {
        self.transport.seek_absolute(seconds);
    }

    pub fn go_to_end(&self) {
        self.transport.go_to_end();
    }

    pub fn position(&self) -> f64 {
        self.transport.position()
    }

    pub fn length(&self) -> f64 {
        self.transport.length()
    }

    pub fn set_volume(&self, volume: f32) {
        self.transport.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.transport.volume()
    }

    pub fn set_speed(&self, speed: f32) {
        self.transport.set_speed(speed);
    }

    pub fn speed(&self) -> f32 {
        self.transport.speed()
    }

    /// Toggles whole-track looping. Turning it on ends any A–B loop.
    pub fn toggle_looping(&mut self) -> bool {
        let looping = self.transport.toggle_looping();
        if looping && self.segment.is_looping() {
            self.segment.set_looping(false);
            self.events.emit(PlayerEvent::SegmentChanged);
        }
        looping
    }

    pub fn is_looping(&self) -> bool {
        self.transport.is_looping()
    }

    // Markers

    pub fn add_marker(&mut self, time: f64, label: Option<&str>) -> Option<usize> {
        let index = self.markers.add(time, label)?;
        self.events.emit(PlayerEvent::MarkersChanged);
        Some(index)
    }

    pub fn add_marker_here(&mut self, label: Option<&str>) -> Option<usize> {
        if !self.has_track() {
            return None;
        }
        self.add_marker(self.position(), label)
    }

    pub fn remove_marker(&mut self, index: usize) -> bool {
        let removed = self.markers.remove(index);
        if removed {
            self.events.emit(PlayerEvent::MarkersChanged);
        }
        removed
    }

    pub fn jump_to_marker(&self, index: usize) -> bool {
        match self.markers.get(index) {
            Some(marker) if self.has_track() => {
                self.seek_absolute(marker.time);
                true
            }
            _ => false,
        }
    }

    pub fn clear_markers(&mut self) {
        if !self.markers.is_empty() {
            self.markers.clear();
            self.events.emit(PlayerEvent::MarkersChanged);
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn describe_marker(&self, index: usize) -> Option<String> {
        self.markers.describe(index)
    }

    // A–B segment

    pub fn set_marker_a(&mut self) -> bool {
        if !self.has_track() {
            return false;
        }
        self.segment.set_marker_a(self.position());
        self.events.emit(PlayerEvent::SegmentChanged);
        true
    }

    pub fn set_marker_b(&mut self) -> bool {
        if !self.has_track() {
            return false;
        }
        self.segment.set_marker_b(self.position());
        self.events.emit(PlayerEvent::SegmentChanged);
        true
    }

    /// Sets the bounds at explicit times, for scripted use and tests.
    pub fn set_segment(&mut self, a: f64, b: f64) {
        self.segment.set_region(a, b);
        self.events.emit(PlayerEvent::SegmentChanged);
    }

    pub fn clear_segment(&mut self) {
        self.segment.clear();
        self.events.emit(PlayerEvent::SegmentChanged);
    }

    /// Turns A–B looping on or off. It only turns on with a valid region, and
    /// doing so ends whole-track looping. Returns the resulting state.
    pub fn set_segment_looping(&mut self, enable: bool) -> bool {
        let looping = self.segment.set_looping(enable);
        if looping {
            self.transport.set_looping(false);
        }
        self.events.emit(PlayerEvent::SegmentChanged);
        looping
    }

    pub fn is_segment_looping(&self) -> bool {
        self.segment.is_looping()
    }

    pub fn has_segment(&self) -> bool {
        self.segment.has_markers()
    }

    pub fn segment_bounds(&self) -> SegmentBounds {
        self.segment.bounds()
    }

    /// Applies the A–B wrap from the control side. Only acts while playing.
    pub fn check_boundary(&self) -> bool {
        if !self.is_playing() {
            return false;
        }
        match self.segment.bounds().check_boundary(self.position()) {
            Some(a) => {
                self.seek_absolute(a);
                true
            }
            None => false,
        }
    }

    // Slice

    pub fn create_slice(&mut self) -> bool {
        let audio = self.transport.audio();
        let created = self
            .slice
            .create(audio.as_deref(), self.segment.bounds());
        self.events.emit(PlayerEvent::SliceChanged);
        created
    }

    pub fn save_slice(&self, path: &Path) -> bool {
        self.slice.save_to_file(path)
    }

    pub fn has_slice(&self) -> bool {
        self.slice.is_ready()
    }

    pub fn slice_frames(&self) -> usize {
        self.slice.frames()
    }

    pub fn slice_info(&self) -> String {
        self.slice.info()
    }

    // Audio thread and observers

    /// A renderer for the audio thread, sharing this player's state.
    pub fn source(&self) -> PlayerSource {
        PlayerSource::new(self.transport.shared(), self.segment.shared())
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::new(self.transport.shared(), self.segment.shared())
    }

    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}
