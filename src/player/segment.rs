//! A–B segment bounds and segment looping.
//!
//! Bounds are published as one immutable `SegmentBounds` value through
//! `ArcSwap`, so the audio path always reads an A/B pair that belongs
//! together.

use arc_swap::ArcSwap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentBounds {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub looping: bool,
}

impl SegmentBounds {
    /// True when both bounds are set and describe a non-empty region.
    pub fn has_markers(&self) -> bool {
        matches!((self.a, self.b), (Some(a), Some(b)) if a >= 0.0 && b > a)
    }

    /// `(a, b)` when segment looping is active.
    pub fn loop_region(&self) -> Option<(f64, f64)> {
        if !self.looping {
            return None;
        }
        match (self.a, self.b) {
            (Some(a), Some(b)) if a >= 0.0 && b > a => Some((a, b)),
            _ => None,
        }
    }

    /// Where playback should jump to, if `position` has reached B while looping.
    pub fn check_boundary(&self, position: f64) -> Option<f64> {
        let (a, b) = self.loop_region()?;
        (position >= b).then_some(a)
    }

    pub fn duration(&self) -> Option<f64> {
        match (self.a, self.b) {
            (Some(a), Some(b)) if self.has_markers() => Some(b - a),
            _ => None,
        }
    }
}

pub struct SegmentEngine {
    bounds: Arc<ArcSwap<SegmentBounds>>,
}

impl Default for SegmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentEngine {
    pub fn new() -> Self {
        Self {
            bounds: Arc::new(ArcSwap::from_pointee(SegmentBounds::default())),
        }
    }

    pub fn bounds(&self) -> SegmentBounds {
        **self.bounds.load()
    }

    pub fn set_marker_a(&self, position: f64) {
        self.update(|bounds| {
            bounds.a = Some(position);
            if let Some(b) = bounds.b
                && position > b
            {
                bounds.a = Some(b);
                bounds.b = Some(position);
            }
        });
    }

    pub fn set_marker_b(&self, position: f64) {
        self.update(|bounds| {
            bounds.b = Some(position);
            if let Some(a) = bounds.a
                && position < a
            {
                bounds.b = Some(a);
                bounds.a = Some(position);
            }
        });
    }

    /// Replaces both bounds at once, ordered so that A <= B.
    pub fn set_region(&self, a: f64, b: f64) {
        self.update(|bounds| {
            bounds.a = Some(a.min(b));
            bounds.b = Some(a.max(b));
        });
    }

    pub fn has_markers(&self) -> bool {
        self.bounds().has_markers()
    }

    /// Enables segment looping only if a valid region exists. Returns the stored state.
    pub fn set_looping(&self, enable: bool) -> bool {
        self.update(|bounds| bounds.looping = enable);
        self.is_looping()
    }

    pub fn is_looping(&self) -> bool {
        self.bounds().looping
    }

    pub fn clear(&self) {
        self.bounds.store(Arc::new(SegmentBounds::default()));
    }

    pub(crate) fn shared(&self) -> Arc<ArcSwap<SegmentBounds>> {
        Arc::clone(&self.bounds)
    }

    fn update(&self, change: impl FnOnce(&mut SegmentBounds)) {
        let mut next = self.bounds();
        change(&mut next);
        next.looping &= next.has_markers();
        self.bounds.store(Arc::new(next));
    }
}
