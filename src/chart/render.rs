//! Screen-space mapping of candles for an SVG/canvas renderer.
//!
//! X is index-based so non-trading days leave no gaps; Y is a linear price
//! scale with the top of the pane at `range.max`.

use serde::Serialize;

use crate::indicators::candle::Candle;
use crate::indicators::price_range::{PriceRange, VolumeRange};

const MIN_CANDLE_WIDTH: f64 = 2.0;
const MAX_CANDLE_WIDTH: f64 = 12.0;
const CANDLE_FILL_RATIO: f64 = 0.8;

/// Pixel geometry of the price and volume panes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotLayout {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub price_height: f64,
    pub volume_top: f64,
    pub volume_height: f64,
}

impl PlotLayout {
    /// Derives the panes from the chart size using the web client's margins
    /// (left 60, right 40, top 20, bottom 120) and an 80 px volume pane.
    pub fn from_size(width: f64, height: f64) -> Self {
        const LEFT: f64 = 60.0;
        const RIGHT: f64 = 40.0;
        const TOP: f64 = 20.0;
        const BOTTOM: f64 = 120.0;
        const VOLUME_HEIGHT: f64 = 80.0;
        const PANE_GAP: f64 = 20.0;

        let plot_width = (width - LEFT - RIGHT).max(0.0);
        let plot_height = (height - TOP - BOTTOM).max(0.0);
        let price_height = (plot_height - VOLUME_HEIGHT - PANE_GAP).max(0.0);
        Self {
            left: LEFT,
            top: TOP,
            width: plot_width,
            price_height,
            volume_top: TOP + price_height + PANE_GAP,
            volume_height: VOLUME_HEIGHT,
        }
    }
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self::from_size(800.0, 500.0)
    }
}

/// Drawable coordinates for one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandleGlyph {
    pub x: f64,
    pub open_y: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub close_y: f64,
    pub volume_y: Option<f64>,
    pub body_width: f64,
    pub rising: bool,
    pub ma5_y: Option<f64>,
    pub ma20_y: Option<f64>,
    pub ma60_y: Option<f64>,
}

/// `left + index / max(count - 1, 1) * width`
pub fn x_for_index(index: usize, count: usize, layout: &PlotLayout) -> f64 {
    let denom = count.saturating_sub(1).max(1) as f64;
    layout.left + (index as f64 / denom) * layout.width
}

/// `top + (1 - (price - min) / (max - min)) * price_height`
pub fn y_for_price(price: f64, range: &PriceRange, layout: &PlotLayout) -> f64 {
    let span = range.span();
    if span <= 0.0 {
        return layout.top + layout.price_height / 2.0;
    }
    layout.top + (1.0 - (price - range.min) / span) * layout.price_height
}

/// Inverse of [`y_for_price`], used for the crosshair price readout.
pub fn price_for_y(y: f64, range: &PriceRange, layout: &PlotLayout) -> f64 {
    if layout.price_height <= 0.0 {
        return range.min;
    }
    let ratio = 1.0 - (y - layout.top) / layout.price_height;
    range.min + ratio.clamp(0.0, 1.0) * range.span()
}

pub fn y_for_volume(volume: f64, range: &VolumeRange, layout: &PlotLayout) -> f64 {
    let bottom = layout.volume_top + layout.volume_height;
    if range.max <= 0.0 {
        return bottom;
    }
    bottom - (volume / range.max).clamp(0.0, 1.0) * layout.volume_height
}

/// Body width for `count` candles sharing the plot width.
pub fn candle_width(count: usize, layout: &PlotLayout) -> f64 {
    let slot = layout.width / count.max(1) as f64;
    (slot * CANDLE_FILL_RATIO).clamp(MIN_CANDLE_WIDTH, MAX_CANDLE_WIDTH)
}

/// Maps one candle at `index` of a slice of `count` candles.
pub fn to_screen(
    candle: &Candle,
    index: usize,
    count: usize,
    range: &PriceRange,
    volume: &VolumeRange,
    layout: &PlotLayout,
) -> CandleGlyph {
    let y = |price: f64| y_for_price(price, range, layout);
    let ma = candle.get_moving_averages();
    CandleGlyph {
        x: x_for_index(index, count, layout),
        open_y: y(candle.get_open()),
        high_y: y(candle.get_high()),
        low_y: y(candle.get_low()),
        close_y: y(candle.get_close()),
        volume_y: candle.get_volume().map(|v| y_for_volume(v, volume, layout)),
        body_width: candle_width(count, layout),
        rising: candle.is_rising(),
        ma5_y: ma.map(|m| y(m.ma5)),
        ma20_y: ma.map(|m| y(m.ma20)),
        ma60_y: ma.map(|m| y(m.ma60)),
    }
}

/// Maps a whole visible slice.
pub fn map_slice(candles: &[Candle], range: &PriceRange, layout: &PlotLayout) -> Vec<CandleGlyph> {
    let volume = VolumeRange::from_candles(candles);
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| to_screen(c, i, candles.len(), range, &volume, layout))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PlotLayout {
        PlotLayout {
            left: 60.0,
            top: 20.0,
            width: 700.0,
            price_height: 260.0,
            volume_top: 300.0,
            volume_height: 80.0,
        }
    }

    #[test]
    fn test_default_layout_matches_client_geometry() {
        let l = PlotLayout::default();
        assert_eq!(l.width, 700.0);
        assert_eq!(l.price_height, 260.0);
        assert_eq!(l.volume_top, 300.0);
    }

    #[test]
    fn test_x_spacing_is_index_based() {
        let l = layout();
        assert_eq!(x_for_index(0, 11, &l), 60.0);
        assert_eq!(x_for_index(10, 11, &l), 760.0);
        assert_eq!(x_for_index(5, 11, &l), 410.0);
        // Single candle sits on the left edge instead of dividing by zero
        assert_eq!(x_for_index(0, 1, &l), 60.0);
    }

    #[test]
    fn test_y_mapping_is_linear_and_invertible() {
        let l = layout();
        let range = PriceRange { min: 100.0, max: 200.0 };
        assert_eq!(y_for_price(200.0, &range, &l), 20.0);
        assert_eq!(y_for_price(100.0, &range, &l), 280.0);
        assert_eq!(y_for_price(150.0, &range, &l), 150.0);
        assert_eq!(price_for_y(150.0, &range, &l), 150.0);
        assert_eq!(price_for_y(-100.0, &range, &l), 200.0);
    }

    #[test]
    fn test_degenerate_range_maps_to_middle() {
        let l = layout();
        let range = PriceRange { min: 5.0, max: 5.0 };
        assert_eq!(y_for_price(5.0, &range, &l), 150.0);
    }

    #[test]
    fn test_volume_bars_grow_upwards() {
        let l = layout();
        let range = VolumeRange { max: 1000.0 };
        assert_eq!(y_for_volume(0.0, &range, &l), 380.0);
        assert_eq!(y_for_volume(1000.0, &range, &l), 300.0);
        assert_eq!(y_for_volume(500.0, &range, &l), 340.0);
    }

    #[test]
    fn test_candle_width_is_clamped() {
        let l = layout();
        assert_eq!(candle_width(1, &l), 12.0);
        assert_eq!(candle_width(1000, &l), 2.0);
        assert!((candle_width(100, &l) - 5.6).abs() < 1e-9);
    }

    #[test]
    fn test_map_slice_produces_one_glyph_per_candle() {
        let l = layout();
        let candles = vec![
            Candle::new(0, 100.0, 110.0, 95.0, 105.0).with_volume(10.0),
            Candle::new(1, 105.0, 115.0, 100.0, 102.0),
        ];
        let range = PriceRange { min: 90.0, max: 120.0 };
        let glyphs = map_slice(&candles, &range, &l);
        assert_eq!(glyphs.len(), 2);
        assert!(glyphs[0].rising);
        assert!(!glyphs[1].rising);
        assert!(glyphs[0].high_y < glyphs[0].low_y);
        assert_eq!(glyphs[0].volume_y, Some(300.0));
        assert_eq!(glyphs[1].volume_y, None);
        assert_eq!(glyphs[1].x, 760.0);
        assert!(glyphs[0].ma5_y.is_none());
    }
}
