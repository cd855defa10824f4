//! Periodic current-price polling.
//!
//! The loop itself is calendar-agnostic: each tick asks an injected
//! [`TradingWindow`] whether to poll, then fetches one price. Failed fetches
//! are logged and skipped; the loop keeps going until the receiver is gone.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc, Weekday};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::ChartConfig;
use crate::indicators::period::KST_OFFSET_SECS;
use crate::market::market_data::PriceQuote;
use crate::market::source::ChartSource;

const QUOTE_CHANNEL_CAPACITY: usize = 16;

/// Decides whether a poll should run at `now`.
pub trait TradingWindow: Send + Sync + 'static {
    fn is_within_trading_window(&self, now: DateTime<Utc>) -> bool;
}

/// KRX regular session: weekdays 09:00 to 15:30 KST, both ends inclusive.
///
/// Exchange holidays are not modelled.
#[derive(Debug, Clone, Copy)]
pub struct KrxTradingHours {
    open: NaiveTime,
    close: NaiveTime,
}

impl KrxTradingHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }
}

impl Default for KrxTradingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default(),
        }
    }
}

impl TradingWindow for KrxTradingHours {
    fn is_within_trading_window(&self, now: DateTime<Utc>) -> bool {
        let Some(kst) = FixedOffset::east_opt(KST_OFFSET_SECS) else {
            return false;
        };
        let local = now.with_timezone(&kst);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        time >= self.open && time <= self.close
    }
}

/// Polls around the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpen;

impl TradingWindow for AlwaysOpen {
    fn is_within_trading_window(&self, _now: DateTime<Utc>) -> bool {
        true
    }
}

pub struct PricePoller<S: ChartSource, W: TradingWindow = KrxTradingHours> {
    source: Arc<S>,
    window: Arc<W>,
    period: Duration,
}

impl<S: ChartSource, W: TradingWindow> Clone for PricePoller<S, W> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            window: Arc::clone(&self.window),
            period: self.period,
        }
    }
}

impl<S: ChartSource, W: TradingWindow> PricePoller<S, W> {
    pub fn new(source: Arc<S>, window: W, period: Duration) -> Self {
        Self {
            source,
            window: Arc::new(window),
            // tokio's interval panics on a zero period
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Uses the configured poll interval.
    pub fn from_config(source: Arc<S>, window: W, config: &ChartConfig) -> Self {
        Self::new(source, window, config.poll_interval())
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts polling `symbol` on a background task.
    ///
    /// Dropping the receiver stops the task at its next tick.
    pub fn spawn(&self, symbol: impl Into<String>) -> (JoinHandle<()>, mpsc::Receiver<PriceQuote>) {
        let (sender, receiver) = mpsc::channel(QUOTE_CHANNEL_CAPACITY);
        let poller = self.clone();
        let symbol = symbol.into();
        let handle = tokio::spawn(async move { poller.run(&symbol, sender).await });
        (handle, receiver)
    }

    pub async fn run(&self, symbol: &str, sender: mpsc::Sender<PriceQuote>) {
        info!(
            source = self.source.name(),
            %symbol,
            period_ms = self.period.as_millis() as u64,
            "price polling started"
        );
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                _ = sender.closed() => break,
            }

            let Some(quote) = self.poll_once(symbol, Utc::now()).await else {
                continue;
            };
            if sender.send(quote).await.is_err() {
                break;
            }
        }
        info!(%symbol, "price polling stopped");
    }

    /// One tick: checks the trading window and fetches a single price.
    pub async fn poll_once(&self, symbol: &str, now: DateTime<Utc>) -> Option<PriceQuote> {
        if !self.window.is_within_trading_window(now) {
            debug!(%symbol, "outside trading window, poll skipped");
            return None;
        }
        match self.source.fetch_price(symbol).await {
            Ok(price) => Some(PriceQuote::new(symbol, price, now.timestamp_millis())),
            Err(err) => {
                warn!(%symbol, %err, "price poll failed");
                None
            }
        }
    }
}
