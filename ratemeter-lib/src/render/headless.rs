//! Backends that record what they are asked to draw instead of drawing it.
//!
//! Each backend shares its record through a handle, so the caller can keep inspecting
//! (and poking) the surface after handing the backend to a meter.

use super::{
    BarMode, CloseGesture, Curve, NoDefaultRoot, PlotBackend, PlotLayout, SpanId, SpanRect, StaleResource, SurfaceEvent, WidgetBackend,
    WidgetToolkit, WindowHandle, WindowParent,
};
use crate::host::HostLoop;
use crate::stats::AxisRange;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Dispatch entry point reported by the headless backends.
pub const HEADLESS_MAINLOOP: &str = "ratemeter_headless_mainloop";

/// Everything a [`RecordingPlot`] was told.
#[derive(Debug, Clone, Default)]
pub struct PlotRecord {
    pub layout: Option<PlotLayout>,
    pub title: String,
    pub y_limits: Option<AxisRange>,
    pub instant: Vec<(f64, f64)>,
    pub overall: Vec<(f64, f64)>,

    /// Live spans by id.
    pub spans: BTreeMap<u64, (String, SpanRect)>,
    pub spans_created: usize,
    pub configure_calls: usize,
    pub axes_redraws: usize,
    pub pumps: usize,
    pub close_calls: usize,
}

/// Shared view of a [`RecordingPlot`].
#[derive(Debug, Clone, Default)]
pub struct PlotHandle(Arc<Mutex<PlotRecord>>);

impl PlotHandle {
    pub fn record(&self) -> MutexGuard<'_, PlotRecord> {
        self.0.lock().expect("lock poisoned")
    }

    /// Drop every span, as a toolkit might after clearing the figure.
    pub fn invalidate_spans(&self) {
        self.record().spans.clear();
    }
}

/// A [`PlotBackend`] that records calls.
#[derive(Debug, Clone)]
pub struct RecordingPlot {
    handle: PlotHandle,
    next_span: u64,
    dispatching: Option<bool>,
}

impl RecordingPlot {
    /// A plot whose host loop reports that it is not dispatching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: PlotHandle::default(),
            next_span: 0,
            dispatching: Some(false),
        }
    }

    /// Override the native dispatching answer (`None` forces the frame probe).
    #[must_use]
    pub const fn with_dispatching(mut self, dispatching: Option<bool>) -> Self {
        self.dispatching = dispatching;
        self
    }

    #[must_use]
    pub fn handle(&self) -> PlotHandle {
        self.handle.clone()
    }
}

impl Default for RecordingPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLoop for RecordingPlot {
    fn dispatching(&self) -> Option<bool> {
        self.dispatching
    }

    fn dispatch_entry_points(&self) -> &[&'static str] {
        &[HEADLESS_MAINLOOP]
    }
}

impl PlotBackend for RecordingPlot {
    fn configure(&mut self, layout: &PlotLayout) {
        let mut record = self.handle.record();
        record.layout = Some(layout.clone());
        record.configure_calls += 1;
    }

    fn set_curve(&mut self, curve: Curve, points: &[(f64, f64)]) {
        let mut record = self.handle.record();
        let target = match curve {
            Curve::Instantaneous => &mut record.instant,
            Curve::Overall => &mut record.overall,
        };
        target.clear();
        target.extend_from_slice(points);
    }

    fn set_y_limits(&mut self, range: AxisRange) {
        self.handle.record().y_limits = Some(range);
    }

    fn redraw_axes(&mut self) {
        self.handle.record().axes_redraws += 1;
    }

    fn create_span(&mut self, colour: &str) -> SpanId {
        let id = self.next_span;
        self.next_span += 1;

        let mut record = self.handle.record();
        let _ = record.spans.insert(
            id,
            (
                colour.to_string(),
                SpanRect {
                    x0: 0.0,
                    x1: 0.0,
                    y0: 0.0,
                    y1: 0.0,
                },
            ),
        );
        record.spans_created += 1;
        SpanId(id)
    }

    fn update_span(&mut self, id: SpanId, rect: SpanRect) -> Result<(), StaleResource> {
        let mut record = self.handle.record();
        let span = record.spans.get_mut(&id.0).ok_or(StaleResource(id))?;
        span.1 = rect;
        Ok(())
    }

    fn remove_span(&mut self, id: SpanId) {
        let _ = self.handle.record().spans.remove(&id.0);
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.handle.record().title);
    }

    fn pump(&mut self) {
        self.handle.record().pumps += 1;
    }

    fn close(&mut self) {
        self.handle.record().close_calls += 1;
    }
}

/// Everything a [`RecordingWidget`] was told.
#[derive(Debug, Clone)]
pub struct WidgetRecord {
    pub window: WindowHandle,
    pub parent: WindowParent,
    pub title: String,
    pub desc: String,
    pub text: String,
    pub value: u64,
    pub mode: Option<BarMode>,
    pub cancel_button: bool,
    pub grabbed: bool,
    pub close_route: Option<CloseGesture>,
    pub pumps: usize,
    pub destroy_scheduled: bool,
    pub destroyed: bool,

    /// Ordered journal of notable operations.
    pub ops: Vec<String>,
    pending: Vec<SurfaceEvent>,
}

/// Shared view of a [`RecordingWidget`].
#[derive(Debug, Clone)]
pub struct WidgetHandle(Arc<Mutex<WidgetRecord>>);

impl WidgetHandle {
    pub fn record(&self) -> MutexGuard<'_, WidgetRecord> {
        self.0.lock().expect("lock poisoned")
    }

    /// Queue a user interaction to be reported on the next poll.
    pub fn push_event(&self, event: SurfaceEvent) {
        self.record().pending.push(event);
    }

    /// Append an entry to the operation journal.
    pub fn note(&self, op: impl Into<String>) {
        self.record().ops.push(op.into());
    }
}

/// A [`WidgetBackend`] that records calls.
#[derive(Debug, Clone)]
pub struct RecordingWidget {
    handle: WidgetHandle,
}

impl RecordingWidget {
    #[must_use]
    pub fn new(window: WindowHandle, parent: WindowParent) -> Self {
        Self {
            handle: WidgetHandle(Arc::new(Mutex::new(WidgetRecord {
                window,
                parent,
                title: String::new(),
                desc: String::new(),
                text: String::new(),
                value: 0,
                mode: None,
                cancel_button: false,
                grabbed: false,
                close_route: None,
                pumps: 0,
                destroy_scheduled: false,
                destroyed: false,
                ops: Vec::new(),
                pending: Vec::new(),
            }))),
        }
    }

    #[must_use]
    pub fn handle(&self) -> WidgetHandle {
        self.handle.clone()
    }
}

impl WidgetBackend for RecordingWidget {
    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.handle.record().title);
    }

    fn set_bar_mode(&mut self, mode: BarMode) {
        self.handle.record().mode = Some(mode);
    }

    fn set_value(&mut self, value: u64) {
        self.handle.record().value = value;
    }

    fn set_desc(&mut self, desc: &str) {
        desc.clone_into(&mut self.handle.record().desc);
    }

    fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.handle.record().text);
    }

    fn add_cancel_button(&mut self) {
        self.handle.record().cancel_button = true;
    }

    fn grab(&mut self) {
        self.handle.record().grabbed = true;
    }

    fn route_close_gesture(&mut self, route: CloseGesture) {
        self.handle.record().close_route = Some(route);
    }

    fn pump(&mut self) {
        let mut record = self.handle.record();
        record.pumps += 1;
        if record.destroy_scheduled && !record.destroyed {
            record.destroyed = true;
            record.ops.push("destroyed".to_string());
        }
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent> {
        core::mem::take(&mut self.handle.record().pending)
    }

    fn schedule_destroy(&mut self) {
        let mut record = self.handle.record();
        if !record.destroy_scheduled {
            record.destroy_scheduled = true;
            record.ops.push("destroy".to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Available(Option<WindowHandle>),
    Unavailable,
}

/// A [`WidgetToolkit`] that opens [`RecordingWidget`] windows.
#[derive(Debug, Clone)]
pub struct HeadlessToolkit {
    root: Root,
    next_window: u64,
    dispatching: Option<bool>,
    windows: Vec<WidgetHandle>,
}

impl HeadlessToolkit {
    /// A toolkit with no windows yet, whose loop reports it is not dispatching.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: Root::Available(None),
            next_window: 1,
            dispatching: Some(false),
            windows: Vec::new(),
        }
    }

    /// A toolkit on which default root discovery has been turned off.
    #[must_use]
    pub fn without_default_root() -> Self {
        Self {
            root: Root::Unavailable,
            ..Self::new()
        }
    }

    #[must_use]
    pub const fn with_dispatching(mut self, dispatching: Option<bool>) -> Self {
        self.dispatching = dispatching;
        self
    }

    /// Handles to every window opened so far, oldest first.
    #[must_use]
    pub fn windows(&self) -> &[WidgetHandle] {
        &self.windows
    }

    #[must_use]
    pub fn last_window(&self) -> Option<WidgetHandle> {
        self.windows.last().cloned()
    }
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLoop for HeadlessToolkit {
    fn dispatching(&self) -> Option<bool> {
        self.dispatching
    }

    fn dispatch_entry_points(&self) -> &[&'static str] {
        &[HEADLESS_MAINLOOP]
    }
}

impl WidgetToolkit for HeadlessToolkit {
    fn default_root(&self) -> Result<Option<WindowHandle>, NoDefaultRoot> {
        match self.root {
            Root::Available(root) => Ok(root),
            Root::Unavailable => Err(NoDefaultRoot),
        }
    }

    fn open_window(&mut self, parent: WindowParent) -> Box<dyn WidgetBackend> {
        let window = WindowHandle(self.next_window);
        self.next_window += 1;

        if parent == WindowParent::NewRoot {
            self.root = Root::Available(Some(window));
        }

        let widget = RecordingWidget::new(window, parent);
        self.windows.push(widget.handle());
        Box::new(widget)
    }
}
