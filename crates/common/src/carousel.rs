//! Carousel view state
//!
//! Pure navigation state for the public carousel. Holds no slide data
//! and performs no I/O; callers render `window` slides starting at
//! `offset`. Auto-advance is driven externally by calling `tick` on a
//! fixed interval, which is a no-op while paused.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Carousel {
    total: usize,
    window: usize,
    offset: usize,
    paused: bool,
}

impl Carousel {
    /// A carousel over `total` slides showing `window` at a time
    pub fn new(total: usize, window: usize) -> Self {
        Self {
            total,
            window: window.max(1),
            offset: 0,
            paused: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last reachable offset; the window never extends past the end
    pub fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.window)
    }

    /// Advance one slide, wrapping to the start past the last
    /// reachable offset
    pub fn next(&mut self) {
        if self.offset >= self.max_offset() {
            self.offset = 0;
        } else {
            self.offset += 1;
        }
    }

    /// Step back one slide, wrapping to the last reachable offset
    /// from the start
    pub fn previous(&mut self) {
        if self.offset == 0 {
            self.offset = self.max_offset();
        } else {
            self.offset -= 1;
        }
    }

    /// Jump to a slide directly; out-of-range indices clamp to the
    /// last reachable offset
    pub fn go_to(&mut self, index: usize) {
        self.offset = index.min(self.max_offset());
    }

    /// Auto-advance step; honors pause
    pub fn tick(&mut self) {
        if !self.paused {
            self.next();
        }
    }

    /// Suspend auto-advance (pointer hover, active touch-drag)
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}
