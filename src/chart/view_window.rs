//! Visible-slice state of a chart: which contiguous candles are shown,
//! the active period and the crosshair position.

use std::ops::Range;

use crate::indicators::period::Period;

/// Bounds on the number of visible candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    pub min_visible: usize,
    pub max_visible: usize,
}

impl WindowLimits {
    pub fn new(min_visible: usize, max_visible: usize) -> Self {
        let min_visible = min_visible.max(1);
        Self {
            min_visible,
            max_visible: max_visible.max(min_visible),
        }
    }

    pub fn clamp(&self, count: usize) -> usize {
        count.clamp(self.min_visible, self.max_visible)
    }
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self::new(20, 150)
    }
}

/// Cursor overlay position relative to the plot origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crosshair {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

/// Window over a series of `series_len` candles.
///
/// Invariants, restored after every mutation:
/// `visible_count` lies within the limits, and
/// `start_index + min(visible_count, series_len) <= series_len`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewWindow {
    start_index: usize,
    visible_count: usize,
    selected_period: Period,
    is_dragging: bool,
    crosshair: Crosshair,
    series_len: usize,
    limits: WindowLimits,
}

impl ViewWindow {
    /// Creates a window showing the most recent candles for `period`.
    pub fn new(series_len: usize, period: Period, limits: WindowLimits) -> Self {
        let mut window = Self {
            start_index: 0,
            visible_count: limits.clamp(period.profile().visible_count),
            selected_period: period,
            is_dragging: false,
            crosshair: Crosshair::default(),
            series_len,
            limits,
        };
        window.jump_to_end();
        window
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Requested visible count, independent of the series length.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Number of candles actually shown (`visible_count` capped by the series).
    pub fn effective_count(&self) -> usize {
        self.visible_count.min(self.series_len)
    }

    pub fn selected_period(&self) -> Period {
        self.selected_period
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn crosshair(&self) -> Crosshair {
        self.crosshair
    }

    pub fn series_len(&self) -> usize {
        self.series_len
    }

    pub fn limits(&self) -> WindowLimits {
        self.limits
    }

    /// Largest valid `start_index`.
    pub fn max_start(&self) -> usize {
        self.series_len - self.effective_count()
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.start_index..self.start_index + self.effective_count()
    }

    pub fn visible_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.visible_range();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }

    /// Switches period and shows the most recent data with the period's
    /// default window size.
    pub fn set_period(&mut self, period: Period, series_len: usize) {
        self.selected_period = period;
        self.series_len = series_len;
        self.visible_count = self.limits.clamp(period.profile().visible_count);
        self.jump_to_end();
    }

    /// Replaces the series length (e.g. after a refetch), keeping the
    /// position where it is still valid.
    pub fn set_series_len(&mut self, series_len: usize) {
        self.series_len = series_len;
        self.clamp_start();
    }

    /// Moves the window by `delta` candles; positive pans towards newer data.
    pub fn pan(&mut self, delta: isize) {
        self.set_start(self.start_index as isize + delta);
    }

    /// Sets the start position, clamped into `0..=max_start()`.
    pub fn set_start(&mut self, start: isize) {
        self.start_index = start.clamp(0, self.max_start() as isize) as usize;
    }

    /// Grows (positive) or shrinks (negative) the window, keeping the start
    /// fixed where possible.
    pub fn zoom(&mut self, delta: isize) {
        self.visible_count = self.clamped_count(delta);
        self.clamp_start();
    }

    /// Zooms while keeping the candle at `anchor_ratio` (0 = left edge,
    /// 1 = right edge) under the same horizontal position.
    ///
    /// Candles are spaced `1 / (count - 1)` of the plot width apart, matching
    /// the render mapping, so the anchored candle is
    /// `start + round(ratio * (count - 1))` before and after the zoom.
    pub fn zoom_around(&mut self, delta: isize, anchor_ratio: f64) {
        let ratio = if anchor_ratio.is_finite() {
            anchor_ratio.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let anchor = self.start_index + self.anchor_offset(ratio);

        self.visible_count = self.clamped_count(delta);
        let new_start = anchor as isize - self.anchor_offset(ratio) as isize;
        self.set_start(new_start);
    }

    /// Index within the visible slice of the candle drawn at `ratio`.
    pub fn anchor_offset(&self, ratio: f64) -> usize {
        let last = self.effective_count().saturating_sub(1);
        ((ratio.clamp(0.0, 1.0) * last as f64).round() as usize).min(last)
    }

    pub fn jump_to_start(&mut self) {
        self.start_index = 0;
    }

    pub fn jump_to_end(&mut self) {
        self.start_index = self.max_start();
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.is_dragging = dragging;
    }

    pub fn set_crosshair(&mut self, x: f64, y: f64) {
        self.crosshair = Crosshair { x, y, visible: true };
    }

    pub fn clear_crosshair(&mut self) {
        self.crosshair.visible = false;
    }

    fn clamped_count(&self, delta: isize) -> usize {
        let requested = (self.visible_count as isize).saturating_add(delta).max(0) as usize;
        self.limits.clamp(requested)
    }

    fn clamp_start(&mut self) {
        self.start_index = self.start_index.min(self.max_start());
    }
}
