//! Vertical space bookkeeping for one page at a time.
//!
//! Coordinates follow PDF user space: `y` decreases as content is placed.
//! Atomic units (a heading with its first line, an accent header with its first
//! point) are checked with [`PageCursor::needs_break`] before they are drawn, so
//! they never straddle a page boundary.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    /// Baseline where content starts on a fresh page.
    pub top: f32,
    /// Lowest usable baseline.
    pub bottom: f32,
    pub y: f32,
}

impl PageCursor {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom, y: top }
    }

    pub fn remaining(&self) -> f32 {
        (self.y - self.bottom).max(0.0)
    }

    pub fn fits(&self, height: f32) -> bool {
        height <= self.remaining()
    }

    /// True when an atomic unit of `min_height` must start on a new page.
    /// A unit taller than a whole page never forces a break on a fresh page.
    pub fn needs_break(&self, min_height: f32) -> bool {
        !self.fits(min_height) && !self.at_top()
    }

    pub fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    pub fn reset(&mut self) {
        self.y = self.top;
    }

    pub fn at_top(&self) -> bool {
        (self.y - self.top).abs() < f32::EPSILON
    }
}

/// Minimum height of a unit that must keep its header and first line together.
pub fn atomic_height(header_height: f32, first_line_height: f32) -> f32 {
    header_height + first_line_height
}
