use super::Frame;
use crate::host::HostLoop;
use crate::stats::{AxisRange, SeriesMode};
use core::fmt::{Debug, Display, Formatter};

const LOG_TARGET: &str = "       plot";

/// Handle to a filled span created by a [`PlotBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanId(pub u64);

/// Rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanRect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// The two curves a plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Curve {
    Instantaneous,
    Overall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    CenterRight,
    LowerLeft,
}

/// Axes setup for a plot surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLayout {
    /// Figure size in inches.
    pub size: (f64, f64),
    pub x_range: (f64, f64),

    /// Larger x values are drawn on the left (used for "seconds ago").
    pub invert_x: bool,
    pub x_label: &'static str,
    pub y_label: String,
    pub y_range: AxisRange,
    pub legend: [&'static str; 2],
    pub legend_position: LegendPosition,
    pub curve_colours: [&'static str; 2],

    /// Show y tick labels in scientific notation.
    pub scientific_y: bool,
    pub grid: bool,
    pub toolbar: bool,
}

impl PlotLayout {
    /// Layout for a run with the given total.
    #[must_use]
    pub fn for_total(total: Option<u64>, unit: &str, unit_scale: bool) -> Self {
        let unit = if unit.is_empty() { "it" } else { unit };
        let (x_range, invert_x, x_label, legend_position) = if total.is_some() {
            ((0.0, 100.0), false, "percent", LegendPosition::CenterRight)
        } else {
            ((0.0, 60.0), true, "seconds", LegendPosition::LowerLeft)
        };

        Self {
            size: (9.0, 2.2),
            x_range,
            invert_x,
            x_label,
            y_label: format!("{unit}/s"),
            y_range: AxisRange::default(),
            legend: ["cur", "est"],
            legend_position,
            curve_colours: ["b", "k"],
            scientific_y: unit_scale,
            grid: true,
            toolbar: false,
        }
    }

    #[must_use]
    pub const fn x_max(&self) -> f64 {
        self.x_range.1
    }
}

/// A span handle that the backend no longer recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleResource(pub SpanId);

impl Display for StaleResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "fill span {} is no longer valid", self.0.0)
    }
}

impl core::error::Error for StaleResource {}

/// A plotting canvas supplied by the embedding application.
///
/// Every method updates existing drawables in place; none of them may allocate a new
/// drawable per call except [`create_span`](Self::create_span).
pub trait PlotBackend: HostLoop + Debug {
    /// Set up axes, labels and legend. Called at construction and when a run is reset.
    fn configure(&mut self, layout: &PlotLayout);

    /// Replace the points of `curve`.
    fn set_curve(&mut self, curve: Curve, points: &[(f64, f64)]);

    fn set_y_limits(&mut self, range: AxisRange);

    /// Full canvas redraw, needed after the axis limits change.
    fn redraw_axes(&mut self);

    fn create_span(&mut self, colour: &str) -> SpanId;

    fn update_span(&mut self, id: SpanId, rect: SpanRect) -> Result<(), StaleResource>;

    fn remove_span(&mut self, id: SpanId);

    fn set_title(&mut self, title: &str);

    /// Process pending host events once.
    fn pump(&mut self);

    /// Close the figure.
    fn close(&mut self);
}

/// Draws rate curves and, for determinate runs, a progress span.
#[derive(Debug)]
pub struct PlotRenderer {
    backend: Box<dyn PlotBackend>,
    layout: PlotLayout,
    colour: String,
    unit: String,
    unit_scale: bool,
    span: Option<SpanId>,
    instant: Vec<(f64, f64)>,
    overall: Vec<(f64, f64)>,
}

impl PlotRenderer {
    /// Configure `backend` for a run with the given total.
    #[must_use]
    pub fn new(mut backend: Box<dyn PlotBackend>, total: Option<u64>, colour: &str, unit: &str, unit_scale: bool) -> Self {
        let layout = PlotLayout::for_total(total, unit, unit_scale);
        backend.configure(&layout);
        backend.set_y_limits(layout.y_range);

        let span = total.map(|_| backend.create_span(colour));

        Self {
            backend,
            layout,
            colour: colour.to_string(),
            unit: unit.to_string(),
            unit_scale,
            span,
            instant: Vec::new(),
            overall: Vec::new(),
        }
    }

    #[must_use]
    pub const fn layout(&self) -> &PlotLayout {
        &self.layout
    }

    #[must_use]
    pub fn backend(&self) -> &dyn PlotBackend {
        self.backend.as_ref()
    }

    pub fn refresh(&mut self, frame: &Frame<'_>) {
        if frame.range_changed {
            self.backend.set_y_limits(frame.range);
            self.backend.redraw_axes();
        }

        self.instant.clear();
        self.overall.clear();

        // a lone point has no line to draw
        if frame.series.len() >= 2 {
            let shift = match frame.series.mode() {
                SeriesMode::Percent { .. } => None,
                SeriesMode::Timeline { .. } => Some(frame.now),
            };

            for p in frame.series.as_sequence() {
                let x = shift.map_or(p.x, |now| now - p.x);
                self.instant.push((x, p.y_instant));
                self.overall.push((x, p.y_overall));
            }
        }

        self.backend.set_curve(Curve::Instantaneous, &self.instant);
        self.backend.set_curve(Curve::Overall, &self.overall);

        if let Some(fraction) = frame.fraction() {
            self.update_span(SpanRect {
                x0: self.layout.x_range.0,
                x1: fraction * self.layout.x_max(),
                y0: frame.range.y_min,
                y1: frame.range.y_max,
            });
        }

        self.backend.set_title(frame.text);
    }

    fn update_span(&mut self, rect: SpanRect) {
        let id = match self.span {
            Some(id) => id,
            None => self.create_span(),
        };

        if let Err(e) = self.backend.update_span(id, rect) {
            log::debug!(target: LOG_TARGET, "{e}, recreating it");
            let id = self.create_span();
            if let Err(e) = self.backend.update_span(id, rect) {
                log::warn!(target: LOG_TARGET, "Could not update the progress span: {e}");
            }
        }
    }

    fn create_span(&mut self) -> SpanId {
        let id = self.backend.create_span(&self.colour);
        self.span = Some(id);
        id
    }

    pub fn pump(&mut self) {
        self.backend.pump();
    }

    pub fn teardown(&mut self) {
        self.backend.close();
    }

    /// Reconfigure the axes for a new run.
    pub fn reset(&mut self, total: Option<u64>) {
        self.layout = PlotLayout::for_total(total, &self.unit, self.unit_scale);
        self.backend.configure(&self.layout);
        self.backend.set_y_limits(self.layout.y_range);

        match (total, self.span) {
            (Some(_), None) => {
                let _ = self.create_span();
            }
            (None, Some(id)) => {
                self.backend.remove_span(id);
                self.span = None;
            }
            _ => {}
        }
    }
}
