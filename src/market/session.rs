//! Chart view session: the current selection, its loaded series and the view window.
//!
//! Fetches run without holding the session. Each `begin_load` issues a
//! ticket; a result is applied only if its ticket is still the latest, so a
//! slow response for a previous symbol or period can never overwrite the
//! current one.

use std::ops::Range;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chart::interaction::{ChartEvent, InteractionController, InteractionSettings};
use crate::chart::render::{CandleGlyph, PlotLayout, map_slice, price_for_y};
use crate::chart::view_window::{ViewWindow, WindowLimits};
use crate::error::{ChartError, ChartResult};
use crate::indicators::candle::Candle;
use crate::indicators::period::Period;
use crate::indicators::price_range::{PriceRange, RangePadding, compute_range_with};
use crate::market::cache::SeriesCache;
use crate::market::market_data::{PriceQuote, SeriesEntry, SeriesKey};
use crate::market::source::ChartSource;

#[derive(Debug, Clone)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    /// Shown as a "failed to load" state with a manual retry.
    Failed(ChartError),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

/// Identifies one `begin_load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub key: SeriesKey,
    generation: u64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub range: PriceRange,
    pub glyphs: Vec<CandleGlyph>,
    pub visible: Range<usize>,
    /// Price under the crosshair, when it is visible.
    pub crosshair_price: Option<f64>,
}

pub struct ChartSession {
    window: ViewWindow,
    controller: InteractionController,
    layout: PlotLayout,
    selection: Option<SeriesKey>,
    generation: u64,
    series: Option<Arc<SeriesEntry>>,
    current_price: Option<f64>,
    status: LoadStatus,
    include_ma: bool,
    view_padding: f64,
}

impl ChartSession {
    /// Creates a session drawing into the default 800×500 layout.
    pub fn new(limits: WindowLimits, settings: InteractionSettings) -> Self {
        let layout = PlotLayout::default();
        let mut controller = InteractionController::new(settings);
        controller.set_layout(&layout);
        Self {
            window: ViewWindow::new(0, Period::Daily, limits),
            controller,
            layout,
            selection: None,
            generation: 0,
            series: None,
            current_price: None,
            status: LoadStatus::Idle,
            include_ma: true,
            view_padding: 0.1,
        }
    }

    pub fn from_config(config: &crate::config::ChartConfig) -> Self {
        let mut session = Self::new(config.window_limits(), config.interaction());
        session.view_padding = config.view_range_padding;
        session
    }

    pub fn with_moving_averages_in_range(mut self, include_ma: bool) -> Self {
        self.include_ma = include_ma;
        self
    }

    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn layout(&self) -> &PlotLayout {
        &self.layout
    }

    /// Changes the plot geometry; pointer handling follows it.
    pub fn set_layout(&mut self, layout: PlotLayout) {
        self.controller.set_layout(&layout);
        self.layout = layout;
    }

    pub fn selection(&self) -> Option<&SeriesKey> {
        self.selection.as_ref()
    }

    pub fn series(&self) -> Option<&Arc<SeriesEntry>> {
        self.series.as_ref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Latest live price, falling back to the last close.
    pub fn current_price(&self) -> Option<f64> {
        self.current_price
            .or_else(|| self.series.as_ref().and_then(|s| s.last_close()))
    }

    /// Selects `(symbol, period)` and returns the ticket its result must carry.
    ///
    /// The previous series stays visible until the new one arrives.
    pub fn begin_load(&mut self, symbol: &str, period: Period) -> LoadTicket {
        let key = SeriesKey::new(symbol, period);
        self.generation += 1;
        if self.selection.as_ref().is_some_and(|k| k.symbol != key.symbol) {
            self.current_price = None;
        }
        self.selection = Some(key.clone());
        self.status = LoadStatus::Loading;
        debug!(key = %key, generation = self.generation, "load started");
        LoadTicket {
            key,
            generation: self.generation,
        }
    }

    /// Applies a load result. Returns false, leaving the session untouched,
    /// when a newer `begin_load` superseded `ticket`.
    pub fn complete(&mut self, ticket: &LoadTicket, result: ChartResult<Arc<SeriesEntry>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                key = %ticket.key,
                generation = ticket.generation,
                current = self.generation,
                "discarding superseded load result"
            );
            return false;
        }

        match result {
            Ok(entry) => {
                self.window.set_period(ticket.key.period, entry.len());
                info!(key = %ticket.key, candles = entry.len(), "series applied");
                self.series = Some(entry);
                self.status = LoadStatus::Ready;
            }
            Err(err) => {
                self.status = LoadStatus::Failed(err);
            }
        }
        true
    }

    /// Applies a polled price if it belongs to the selected symbol.
    pub fn apply_quote(&mut self, quote: &PriceQuote) -> bool {
        let matches = self
            .selection
            .as_ref()
            .is_some_and(|key| key.symbol == quote.symbol);
        if !matches {
            return false;
        }
        self.current_price = Some(quote.price);
        if let Some(series) = self.series.as_ref().filter(|s| s.key.symbol == quote.symbol) {
            let updated = series.with_live_price(quote.price);
            self.series = Some(Arc::new(updated));
        }
        true
    }

    /// Routes an input event to the view window.
    pub fn handle_event(&mut self, event: ChartEvent) -> bool {
        self.controller.handle(&mut self.window, event)
    }

    pub fn visible_candles(&self) -> &[Candle] {
        match &self.series {
            Some(series) => self.window.visible_slice(&series.candles),
            None => &[],
        }
    }

    /// Padded price scale of the visible slice.
    pub fn visible_range(&self) -> PriceRange {
        compute_range_with(
            self.visible_candles(),
            self.include_ma,
            RangePadding::SpanFraction(self.view_padding),
        )
    }

    /// Maps the visible slice into the session's layout.
    pub fn render_frame(&self) -> RenderFrame {
        let layout = &self.layout;
        let range = self.visible_range();
        let crosshair = self.window.crosshair();
        RenderFrame {
            range,
            glyphs: map_slice(self.visible_candles(), &range, layout),
            visible: self.window.visible_range(),
            crosshair_price: crosshair
                .visible
                .then(|| price_for_y(crosshair.y + layout.top, &range, layout)),
        }
    }
}

/// Loads `(symbol, period)` into a shared session.
///
/// The session lock is released while the fetch runs, so input handling
/// stays responsive. Returns whether the result was applied.
pub async fn load_into<S: ChartSource>(
    session: &Mutex<ChartSession>,
    cache: &SeriesCache<S>,
    symbol: &str,
    period: Period,
) -> bool {
    let ticket = session.lock().await.begin_load(symbol, period);
    let result = cache.load_key(ticket.key.clone()).await;
    session.lock().await.complete(&ticket, result)
}
