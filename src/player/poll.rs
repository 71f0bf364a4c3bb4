//! Low-frequency status snapshots for display.
//!
//! A `StatusPoller` thread reads the same shared state the audio path writes
//! and publishes one snapshot per player every interval. Only the latest set
//! is kept, so an idle reader never builds up a backlog. It never mutates
//! player state.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::segment::SegmentBounds;
use super::transport::TransportShared;

/// Read-only view of one player's shared state.
#[derive(Clone)]
pub struct PlayerHandle {
    transport: Arc<TransportShared>,
    segment: Arc<ArcSwap<SegmentBounds>>,
}

impl PlayerHandle {
    pub(crate) fn new(
        transport: Arc<TransportShared>,
        segment: Arc<ArcSwap<SegmentBounds>>,
    ) -> Self {
        Self { transport, segment }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            position: self.transport.position_seconds(),
            length: self.transport.length_seconds(),
            playing: self.transport.is_playing(),
            looping: self.transport.is_looping(),
            volume: self.transport.volume(),
            speed: self.transport.speed(),
            segment: **self.segment.load(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub position: f64,
    pub length: f64,
    pub playing: bool,
    pub looping: bool,
    pub volume: f32,
    pub speed: f32,
    pub segment: SegmentBounds,
}

fn clock(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0) as u64;
    format!("{:02}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.playing { "playing" } else { "stopped" };
        write!(
            f,
            "{state} {} / {}  vol {:.2}  speed {:.2}x",
            clock(self.position),
            clock(self.length),
            self.volume,
            self.speed
        )?;
        if self.looping {
            write!(f, "  [loop]")?;
        }
        if let (Some(a), Some(b)) = (self.segment.a, self.segment.b) {
            write!(f, "  A {} B {}", clock(a), clock(b))?;
            if self.segment.looping {
                write!(f, " [A-B loop]")?;
            }
        } else if let Some(a) = self.segment.a {
            write!(f, "  A {}", clock(a))?;
        } else if let Some(b) = self.segment.b {
            write!(f, "  B {}", clock(b))?;
        }
        Ok(())
    }
}

pub struct StatusPoller {
    latest: Arc<ArcSwap<Vec<StatusSnapshot>>>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Starts polling `handles` every `interval`. The thread exits on `stop`
    /// or on drop.
    pub fn spawn(handles: Vec<PlayerHandle>, interval: Duration) -> Self {
        let initial = handles.iter().map(PlayerHandle::snapshot).collect();
        let latest = Arc::new(ArcSwap::from_pointee(initial));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let published = Arc::clone(&latest);
        let thread = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let snapshots: Vec<StatusSnapshot> =
                    handles.iter().map(PlayerHandle::snapshot).collect();
                published.store(Arc::new(snapshots));
            }
            log::debug!("Status poller exiting");
        });

        Self {
            latest,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }
    }

    /// The most recently published snapshots, one per handle.
    pub fn latest(&self) -> Arc<Vec<StatusSnapshot>> {
        self.latest.load_full()
    }

    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::warn!("Status poller thread panicked");
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
