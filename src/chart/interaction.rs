//! Pointer, wheel and keyboard handling for the chart view.
//!
//! Events are applied synchronously to a [`ViewWindow`]; every mutation is
//! clamped arithmetic, so handling can never fail.

use crate::chart::render::PlotLayout;
use crate::chart::view_window::ViewWindow;

/// Keys the chart reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKey {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Other,
}

impl ChartKey {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowLeft" => ChartKey::ArrowLeft,
            "ArrowRight" => ChartKey::ArrowRight,
            "Home" => ChartKey::Home,
            "End" => ChartKey::End,
            _ => ChartKey::Other,
        }
    }
}

/// Input events, in element-relative pixels unless noted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartEvent {
    /// Scroll over the chart; positive `delta_y` scrolls down (zoom out).
    Wheel { delta_y: f64, x: f64 },
    /// Button pressed on the chart.
    PointerDown { x: f64 },
    /// Document-level pointer move; keeps dragging outside the chart bounds.
    PointerMove { x: f64 },
    /// Document-level button release.
    PointerUp,
    /// Pointer moved over the plot element.
    PlotHover { x: f64, y: f64 },
    /// Pointer left the plot element.
    PlotLeave,
    Key(ChartKey),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    /// Candles added or removed per wheel notch.
    pub wheel_step: usize,
    /// Candles panned per arrow key press.
    pub key_step: usize,
    /// Offset of the plot area inside the chart element.
    pub plot_origin: (f64, f64),
    /// Width of the plot area in pixels.
    pub plot_width: f64,
}

impl InteractionSettings {
    /// Pointer geometry matching what the renderer draws for `layout`.
    pub fn for_layout(layout: &PlotLayout) -> Self {
        Self {
            wheel_step: 5,
            key_step: 5,
            plot_origin: (layout.left, layout.top),
            plot_width: layout.width,
        }
    }
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self::for_layout(&PlotLayout::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    start_x: f64,
    start_index: usize,
}

/// Translates input events into view-window mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    settings: InteractionSettings,
    drag: Option<DragState>,
}

impl InteractionController {
    pub fn new(settings: InteractionSettings) -> Self {
        Self { settings, drag: None }
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    /// Re-reads the plot geometry after a resize.
    pub fn set_layout(&mut self, layout: &PlotLayout) {
        self.settings.plot_origin = (layout.left, layout.top);
        self.settings.plot_width = layout.width;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Applies one event. Returns true when the window changed.
    pub fn handle(&mut self, window: &mut ViewWindow, event: ChartEvent) -> bool {
        let before = window.clone();

        match event {
            ChartEvent::Wheel { delta_y, x } => self.on_wheel(window, delta_y, x),
            ChartEvent::PointerDown { x } => {
                self.drag = Some(DragState {
                    start_x: x,
                    start_index: window.start_index(),
                });
                window.set_dragging(true);
            }
            ChartEvent::PointerMove { x } => self.on_drag_move(window, x),
            ChartEvent::PointerUp => {
                self.drag = None;
                window.set_dragging(false);
            }
            ChartEvent::PlotHover { x, y } => {
                let (left, top) = self.settings.plot_origin;
                window.set_crosshair(x - left, y - top);
            }
            ChartEvent::PlotLeave => window.clear_crosshair(),
            ChartEvent::Key(key) => self.on_key(window, key),
        }

        *window != before
    }

    fn on_wheel(&self, window: &mut ViewWindow, delta_y: f64, x: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = self.settings.wheel_step as isize;
        let delta = if delta_y > 0.0 { step } else { -step };
        window.zoom_around(delta, self.pointer_ratio(x));
    }

    fn on_drag_move(&self, window: &mut ViewWindow, x: f64) {
        let Some(drag) = self.drag else {
            return;
        };
        let candle_width = self.candle_width(window);
        if candle_width <= 0.0 {
            return;
        }
        // Dragging right reveals older candles
        let candle_delta = ((x - drag.start_x) / candle_width).round() as isize;
        window.set_start(drag.start_index as isize - candle_delta);
    }

    fn on_key(&self, window: &mut ViewWindow, key: ChartKey) {
        let step = self.settings.key_step as isize;
        match key {
            ChartKey::ArrowLeft => window.pan(-step),
            ChartKey::ArrowRight => window.pan(step),
            ChartKey::Home => window.jump_to_start(),
            ChartKey::End => window.jump_to_end(),
            ChartKey::Other => {}
        }
    }

    /// Distance between neighbouring candle centres, as rendered.
    fn candle_width(&self, window: &ViewWindow) -> f64 {
        let gaps = window.effective_count().saturating_sub(1).max(1);
        self.settings.plot_width / gaps as f64
    }

    fn pointer_ratio(&self, x: f64) -> f64 {
        if self.settings.plot_width <= 0.0 {
            return 0.5;
        }
        ((x - self.settings.plot_origin.0) / self.settings.plot_width).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render::x_for_index;
    use crate::chart::view_window::WindowLimits;
    use crate::indicators::period::Period;

    fn setup() -> (InteractionController, ViewWindow) {
        let controller = InteractionController::new(InteractionSettings::default());
        let window = ViewWindow::new(300, Period::Daily, WindowLimits::default());
        (controller, window)
    }

    #[test]
    fn test_default_geometry_follows_render_layout() {
        let settings = InteractionSettings::default();
        let layout = PlotLayout::default();
        assert_eq!(settings.plot_origin, (layout.left, layout.top));
        assert_eq!(settings.plot_width, layout.width);
    }

    #[test]
    fn test_wheel_zooms_in_steps_around_pointer() {
        let (mut c, mut w) = setup();
        w.set_start(100);
        // Pointer at the plot centre (origin 60 + 350)
        assert!(c.handle(&mut w, ChartEvent::Wheel { delta_y: -120.0, x: 410.0 }));
        assert_eq!(w.visible_count(), 75);
        assert_eq!(w.start_index(), 103);

        assert!(c.handle(&mut w, ChartEvent::Wheel { delta_y: 120.0, x: 410.0 }));
        assert_eq!(w.visible_count(), 80);
    }

    #[test]
    fn test_wheel_keeps_rendered_candle_under_pointer() {
        let (mut c, mut w) = setup();
        let layout = PlotLayout::default();
        // Sixth visible candle, drawn at left + 5 / 79 of the width
        let x = x_for_index(5, w.effective_count(), &layout);
        let under_pointer = |w: &ViewWindow| {
            let ratio = (x - layout.left) / layout.width;
            w.start_index() + w.anchor_offset(ratio)
        };
        assert_eq!(under_pointer(&w), 225);

        for _ in 0..6 {
            c.handle(&mut w, ChartEvent::Wheel { delta_y: -100.0, x });
            let offset = under_pointer(&w) - w.start_index();
            let drawn_at = x_for_index(offset, w.effective_count(), &layout);
            assert_eq!(under_pointer(&w), 225);
            assert!((drawn_at - x).abs() <= layout.width / (w.effective_count() - 1) as f64 / 2.0);
        }
        assert_eq!(w.visible_count(), 50);
    }

    #[test]
    fn test_wheel_respects_limits() {
        let (mut c, mut w) = setup();
        for _ in 0..100 {
            c.handle(&mut w, ChartEvent::Wheel { delta_y: -1.0, x: 40.0 });
        }
        assert_eq!(w.visible_count(), 20);
        assert!(!c.handle(&mut w, ChartEvent::Wheel { delta_y: -1.0, x: 40.0 }));
    }

    #[test]
    fn test_drag_pans_relative_to_press_position() {
        let (mut c, mut w) = setup();
        w.set_start(100);
        c.handle(&mut w, ChartEvent::PointerDown { x: 300.0 });
        assert!(w.is_dragging());

        // 80 visible over 700 px: 700 / 79 px between candles
        let slot = 700.0 / 79.0;
        c.handle(&mut w, ChartEvent::PointerMove { x: 300.0 + 10.0 * slot });
        assert_eq!(w.start_index(), 90);
        // Moves are relative to the press, not cumulative
        c.handle(&mut w, ChartEvent::PointerMove { x: 300.0 - 10.0 * slot });
        assert_eq!(w.start_index(), 110);

        c.handle(&mut w, ChartEvent::PointerUp);
        assert!(!w.is_dragging());
        assert!(!c.is_dragging());
        assert!(!c.handle(&mut w, ChartEvent::PointerMove { x: 0.0 }));
    }

    #[test]
    fn test_drag_outside_plot_clamps() {
        let (mut c, mut w) = setup();
        c.handle(&mut w, ChartEvent::PointerDown { x: 300.0 });
        c.handle(&mut w, ChartEvent::PointerMove { x: -5000.0 });
        assert_eq!(w.start_index(), w.max_start());
        c.handle(&mut w, ChartEvent::PointerMove { x: 50_000.0 });
        assert_eq!(w.start_index(), 0);
    }

    #[test]
    fn test_keys_pan_and_jump() {
        let (mut c, mut w) = setup();
        c.handle(&mut w, ChartEvent::Key(ChartKey::ArrowLeft));
        assert_eq!(w.start_index(), 215);
        c.handle(&mut w, ChartEvent::Key(ChartKey::ArrowRight));
        c.handle(&mut w, ChartEvent::Key(ChartKey::ArrowRight));
        assert_eq!(w.start_index(), 220);
        c.handle(&mut w, ChartEvent::Key(ChartKey::Home));
        assert_eq!(w.start_index(), 0);
        c.handle(&mut w, ChartEvent::Key(ChartKey::End));
        assert_eq!(w.start_index(), 220);
        assert!(!c.handle(&mut w, ChartEvent::Key(ChartKey::from_dom_key("a"))));
    }

    #[test]
    fn test_hover_sets_crosshair_relative_to_plot() {
        let (mut c, mut w) = setup();
        c.handle(&mut w, ChartEvent::PlotHover { x: 160.0, y: 70.0 });
        let crosshair = w.crosshair();
        assert!(crosshair.visible);
        assert_eq!((crosshair.x, crosshair.y), (100.0, 50.0));
        c.handle(&mut w, ChartEvent::PlotLeave);
        assert!(!w.crosshair().visible);
    }
}
