//! View-window state, input handling and screen mapping for the candle chart.

pub mod interaction;
pub mod render;
pub mod view_window;

pub use interaction::{ChartEvent, ChartKey, InteractionController, InteractionSettings};
pub use render::{CandleGlyph, PlotLayout};
pub use view_window::{Crosshair, ViewWindow, WindowLimits};
