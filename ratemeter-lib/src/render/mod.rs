//! Rendering surfaces.
//!
//! [`Renderer`] is a closed set of two surfaces. Each consumes one [`Frame`] per accepted
//! tick and pushes it to a backend trait object implemented by the embedding toolkit:
//!
//! - [`PlotRenderer`] over a [`PlotBackend`]: instantaneous and overall rate curves, plus a
//!   filled span showing progress when the total is known.
//! - [`WidgetRenderer`] over a [`WidgetBackend`]: a progress bar and text labels, with no
//!   curve history.
//!
//! [`headless`] provides recording backends for tests and the command-line simulator.

pub mod headless;
mod plot;
mod widget;

use crate::host::PumpPolicy;
use crate::stats::{AxisRange, SeriesBuffer};
use strum::Display;

pub use plot::{Curve, LegendPosition, PlotBackend, PlotLayout, PlotRenderer, SpanId, SpanRect, StaleResource};
pub use widget::{
    BarMode, CloseGesture, NoDefaultRoot, WINDOW_TITLE, WidgetBackend, WidgetRenderer, WidgetSetup, WidgetToolkit, WindowHandle,
    WindowParent, resolve_parent,
};

/// User interaction reported by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The window manager's close button was used.
    CloseRequested,

    /// The Cancel button was pressed.
    CancelPressed,
}

/// Everything a renderer may draw for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub count: u64,
    pub total: Option<u64>,
    pub now: f64,
    pub series: &'a SeriesBuffer,
    pub range: AxisRange,

    /// The range differs from the one last pushed to the backend.
    pub range_changed: bool,
    pub text: &'a str,
    pub desc: &'a str,
}

impl Frame<'_> {
    /// Completed fraction, when the total is known.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "loss of precision acceptable for percentage calculation")]
    pub fn fraction(&self) -> Option<f64> {
        match self.total? {
            0 => Some(1.0),
            total => Some((self.count as f64 / total as f64).min(1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SurfaceKind {
    Plot,
    Widget,
}

/// The surface a meter draws on.
#[derive(Debug)]
pub enum Renderer {
    Plot(PlotRenderer),
    Widget(WidgetRenderer),
}

impl Renderer {
    #[must_use]
    pub const fn kind(&self) -> SurfaceKind {
        match self {
            Self::Plot(_) => SurfaceKind::Plot,
            Self::Widget(_) => SurfaceKind::Widget,
        }
    }

    /// Push one frame to the backend. Safe to call on every tick.
    pub fn refresh(&mut self, frame: &Frame<'_>) {
        match self {
            Self::Plot(r) => r.refresh(frame),
            Self::Widget(r) => r.refresh(frame),
        }
    }

    /// Run one iteration of host event processing.
    pub fn pump(&mut self) {
        match self {
            Self::Plot(r) => r.pump(),
            Self::Widget(r) => r.pump(),
        }
    }

    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        match self {
            Self::Plot(_) => Vec::new(),
            Self::Widget(r) => r.take_events(),
        }
    }

    /// Keep the final frame showing after close.
    pub fn leave_visible(&mut self) {
        match self {
            Self::Plot(_) => {}
            Self::Widget(r) => r.leave_visible(),
        }
    }

    /// Destroy the surface.
    pub fn teardown(&mut self, policy: PumpPolicy) {
        match self {
            Self::Plot(r) => r.teardown(),
            Self::Widget(r) => r.teardown(policy),
        }
    }

    pub fn reset(&mut self, total: Option<u64>) {
        match self {
            Self::Plot(r) => r.reset(total),
            Self::Widget(r) => r.reset(total),
        }
    }
}
