//! GUI progress meters.
//!
//! A [`GuiMeter`] wraps a [`Counter`] and one rendering surface. Every call to
//! [`GuiMeter::update`] is a tick: the throttle decides whether it renders, and an accepted
//! tick samples the counter, derives rates, extends the history, adjusts the rate axis and
//! refreshes the surface. When the host event loop was not found running at construction,
//! the meter pumps one host iteration after each refresh and then handles any user
//! interaction that pump produced.

use crate::Result;
use crate::config::MeterConfig;
use crate::counter::{BasicCounter, Counter, MeterFields, WIDGET_TEMPLATE};
use crate::host::PumpPolicy;
use crate::lifecycle::{InstanceId, Lifecycle, LifecycleState, Registry};
use crate::render::{
    Frame, PlotBackend, PlotRenderer, Renderer, SurfaceEvent, SurfaceKind, WidgetRenderer, WidgetSetup, WidgetToolkit, WindowHandle,
    resolve_parent,
};
use crate::stats::{AxisRange, AxisRangeController, ClockSampler, RatePair, RefreshThrottle, Sample, SeriesBuffer, SeriesPoint};
use core::fmt::{Debug, Formatter};
use ohno::IntoAppError;
use serde::Serialize;
use std::sync::Arc;

const LOG_TARGET: &str = "      meter";

/// Invoked when the user cancels a widget meter.
pub type CancelCallback = Box<dyn FnMut()>;

/// Construction options for a [`GuiMeter`].
#[derive(Default)]
pub struct GuiOptions {
    pub config: MeterConfig,

    /// Parent window for widget surfaces; the toolkit's default root is used when absent.
    pub tk_parent: Option<WindowHandle>,

    /// Called before closing when the user cancels a widget surface.
    pub cancel_callback: Option<CancelCallback>,
}

impl GuiOptions {
    #[must_use]
    pub fn new(config: MeterConfig) -> Self {
        Self {
            config,
            tk_parent: None,
            cancel_callback: None,
        }
    }

    #[must_use]
    pub const fn with_parent(mut self, parent: WindowHandle) -> Self {
        self.tk_parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_cancel_callback(mut self, callback: impl FnMut() + 'static) -> Self {
        self.cancel_callback = Some(Box::new(callback));
        self
    }
}

impl Debug for GuiOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GuiOptions")
            .field("config", &self.config)
            .field("tk_parent", &self.tk_parent)
            .field("cancel_callback", &self.cancel_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Serializable view of a meter after a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub surface: String,
    pub state: String,
    pub count: u64,
    pub total: Option<u64>,
    pub elapsed: f64,
    pub instantaneous: Option<f64>,
    pub overall: Option<f64>,
    pub y_max: f64,
    pub points: usize,
    pub text: String,
}

/// Everything that only exists for an enabled meter.
struct Surface {
    renderer: Renderer,
    series: SeriesBuffer,
    axis: AxisRangeController,
    throttle: RefreshThrottle,
    lifecycle: Lifecycle,
    pump: PumpPolicy,
    leave: bool,
    torn_down: bool,
    bar_format: Option<String>,
    cancel_callback: Option<CancelCallback>,
    last_rates: Option<RatePair>,
    text: String,
}

impl Debug for Surface {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("renderer", &self.renderer)
            .field("series", &self.series)
            .field("axis", &self.axis)
            .field("throttle", &self.throttle)
            .field("lifecycle", &self.lifecycle)
            .field("pump", &self.pump)
            .field("leave", &self.leave)
            .field("torn_down", &self.torn_down)
            .field("bar_format", &self.bar_format)
            .field("cancel_callback", &self.cancel_callback.as_ref().map(|_| "<callback>"))
            .field("last_rates", &self.last_rates)
            .field("text", &self.text)
            .finish()
    }
}

impl Surface {
    fn new(renderer: Renderer, total: Option<u64>, lifecycle: Lifecycle, pump: PumpPolicy, leave: bool, options: GuiOptions) -> Self {
        let GuiOptions {
            config, cancel_callback, ..
        } = options;

        Self {
            renderer,
            series: SeriesBuffer::for_total(total, config.window.as_secs_f64()),
            axis: AxisRangeController::new(),
            throttle: RefreshThrottle::new(config.min_interval),
            lifecycle,
            pump,
            leave,
            torn_down: false,
            bar_format: config.bar_format,
            cancel_callback,
            last_rates: None,
            text: String::new(),
        }
    }

    /// Sample `counter` at `now`, update the statistics and refresh the surface.
    fn render<C: Counter + ?Sized>(&mut self, counter: &mut C, now: f64) {
        let sample = Sample::new(counter.n(), now);
        let prev = ClockSampler::last_displayed(counter);

        // Only the plot draws the history; widgets just need the latest rate for their text.
        let plotted = self.renderer.kind() == SurfaceKind::Plot;
        let mut range_changed = false;
        if let Some(rates) = RatePair::compute(sample, prev, counter.start_t()) {
            if plotted {
                let point = SeriesPoint::new(self.series.x_for(sample), rates);
                self.series.append(point);
                range_changed = self.axis.observe(&point);
                if range_changed {
                    log::debug!(target: LOG_TARGET, "Rate axis raised to {:.3}", self.axis.range().y_max);
                }
            }
            self.last_rates = Some(rates);
        } else {
            log::trace!(target: LOG_TARGET, "No rate update at t={now:.3}");
        }
        if plotted {
            self.series.evict_expired(now);
        }

        let template = match self.renderer.kind() {
            SurfaceKind::Plot => None,
            SurfaceKind::Widget => Some(self.bar_format.as_deref().unwrap_or(WIDGET_TEMPLATE)),
        };

        self.text = counter.format(&MeterFields {
            n: sample.count,
            total: counter.total(),
            elapsed: now - counter.start_t(),
            rate: self.last_rates.map(|r| r.instantaneous),
            desc: counter.desc(),
            unit: counter.unit(),
            unit_scale: counter.unit_scale(),
            template,
        });

        self.renderer.refresh(&Frame {
            count: sample.count,
            total: counter.total(),
            now,
            series: &self.series,
            range: self.axis.range(),
            range_changed,
            text: &self.text,
            desc: counter.desc(),
        });

        counter.mark_printed(sample.count, now);

        if self.pump.pumps() {
            self.renderer.pump();
        }
    }

    fn teardown(&mut self) {
        if !self.torn_down {
            self.torn_down = true;
            self.renderer.teardown(self.pump);
        }
    }
}

/// A progress meter drawn on a GUI surface.
#[derive(Debug)]
pub struct GuiMeter<C: Counter = BasicCounter> {
    counter: C,
    surface: Option<Surface>,
}

impl<C: Counter> GuiMeter<C> {
    /// A meter drawing rate curves on `backend`.
    #[must_use]
    pub fn plot(counter: C, options: GuiOptions, backend: Box<dyn PlotBackend>, registry: Arc<Registry>) -> Self {
        if options.config.disable {
            log::debug!(target: LOG_TARGET, "Meter disabled, skipping plot setup");
            return Self::disabled(counter);
        }

        log::warn!(target: LOG_TARGET, "GUI meters are experimental");

        let pump = PumpPolicy::detect(backend.as_ref());
        let lifecycle = Lifecycle::register_with_env(registry, |env| {
            env.toolbar = false;
            env.interactive = true;
        });

        if options.cancel_callback.is_some() {
            log::debug!(target: LOG_TARGET, "Plot surfaces have no cancel control, ignoring the cancel callback");
        }

        let renderer = Renderer::Plot(PlotRenderer::new(
            backend,
            counter.total(),
            &options.config.colour,
            counter.unit(),
            counter.unit_scale(),
        ));

        let leave = options.config.leave;
        let options = GuiOptions {
            cancel_callback: None,
            ..options
        };

        log::debug!(target: LOG_TARGET, "Plot meter {} created ({pump})", lifecycle.id());
        let surface = Surface::new(renderer, counter.total(), lifecycle, pump, leave, options);
        Self {
            counter,
            surface: Some(surface),
        }
    }

    /// A meter showing a progress window opened through `toolkit`.
    ///
    /// # Errors
    ///
    /// Returns an error if no parent window was given and the toolkit has no default root.
    pub fn widget<T: WidgetToolkit + ?Sized>(counter: C, options: GuiOptions, toolkit: &mut T, registry: Arc<Registry>) -> Result<Self> {
        if options.config.disable {
            log::debug!(target: LOG_TARGET, "Meter disabled, skipping widget setup");
            return Ok(Self::disabled(counter));
        }

        let parent = resolve_parent(&*toolkit, options.tk_parent).into_app_err("unable to place the progress window")?;

        log::warn!(target: LOG_TARGET, "GUI meters are experimental");

        let pump = PumpPolicy::detect(&*toolkit);
        let mut leave = options.config.leave;
        if leave && pump.pumps() {
            // nothing would service a window left behind
            log::debug!(target: LOG_TARGET, "Host loop is not dispatching, the window will close with the meter");
            leave = false;
        }

        let backend = toolkit.open_window(parent);
        let lifecycle = Lifecycle::register(registry);
        let renderer = Renderer::Widget(WidgetRenderer::new(
            backend,
            &WidgetSetup {
                total: counter.total(),
                desc: counter.desc(),
                cancel_button: options.cancel_callback.is_some(),
                grab: options.config.grab,
            },
        ));

        log::debug!(target: LOG_TARGET, "Widget meter {} created ({pump})", lifecycle.id());
        let surface = Surface::new(renderer, counter.total(), lifecycle, pump, leave, options);
        Ok(Self {
            counter,
            surface: Some(surface),
        })
    }

    const fn disabled(counter: C) -> Self {
        Self { counter, surface: None }
    }

    /// Advance the counter by `delta` and render if the throttle allows it.
    ///
    /// Returns whether a render happened.
    pub fn update(&mut self, delta: u64) -> bool {
        self.counter.advance(delta);
        let is_last = self.counter.total().is_some_and(|total| self.counter.n() >= total);
        self.tick(is_last)
    }

    fn tick(&mut self, is_last: bool) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        if !surface.lifecycle.is_active() {
            return false;
        }

        let now = self.counter.now();
        if !surface.throttle.admit(now, is_last) {
            return false;
        }

        surface.render(&mut self.counter, now);
        self.poll_events();
        true
    }

    /// Render now, regardless of the throttle.
    pub fn display(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if surface.lifecycle.state() == LifecycleState::Closed {
            return;
        }

        let now = self.counter.now();
        surface.throttle.record(now);
        surface.render(&mut self.counter, now);
    }

    /// Handle user interaction reported by the surface since the last poll.
    ///
    /// Called automatically after every render. Hosts that pump their own loop call this
    /// after pumping.
    pub fn poll_events(&mut self) {
        let events = match self.surface.as_mut() {
            Some(surface) => surface.renderer.take_events(),
            None => return,
        };

        for event in events {
            match event {
                SurfaceEvent::CloseRequested => self.on_close_gesture(),
                SurfaceEvent::CancelPressed => self.cancel(),
            }
        }
    }

    /// The window manager's close button was used.
    ///
    /// While the meter runs this cancels it. After a leave-visible close it destroys the
    /// window that was left showing.
    pub fn on_close_gesture(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if surface.lifecycle.is_active() {
            self.cancel();
        } else {
            surface.teardown();
        }
    }

    /// Invoke the cancel callback, if any, then close.
    ///
    /// Does nothing once closing has started, so the callback runs at most once.
    pub fn cancel(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if !surface.lifecycle.is_active() {
            return;
        }

        if let Some(callback) = surface.cancel_callback.as_mut() {
            log::debug!(target: LOG_TARGET, "Meter {} cancelled", surface.lifecycle.id());
            callback();
        }

        self.close();
    }

    /// Close the meter. Only the first call has any effect.
    ///
    /// The meter leaves the registry and restores the shared environment first. Then the
    /// surface either shows one final frame and stays up (`leave`), or is destroyed.
    pub fn close(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if !surface.lifecycle.begin_close() {
            return;
        }

        if surface.leave {
            let now = self.counter.now();
            surface.throttle.record(now);
            surface.render(&mut self.counter, now);
            surface.renderer.leave_visible();
        } else {
            surface.teardown();
        }

        surface.lifecycle.finish_close();
    }

    /// Start a new run, optionally with a new total.
    pub fn reset(&mut self, total: Option<u64>) {
        self.counter.reset(total);

        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if !surface.lifecycle.is_active() {
            return;
        }

        let total = self.counter.total();
        surface.series.reset(total);
        surface.axis.reset();
        surface.throttle.rearm();
        surface.last_rates = None;
        surface.renderer.reset(total);
        if surface.pump.pumps() {
            surface.renderer.pump();
        }
    }

    /// GUI surfaces have nothing to clear.
    pub const fn clear(&self) {}

    #[must_use]
    pub const fn counter(&self) -> &C {
        &self.counter
    }

    pub const fn counter_mut(&mut self) -> &mut C {
        &mut self.counter
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.surface.is_none()
    }

    #[must_use]
    pub fn id(&self) -> Option<InstanceId> {
        self.surface.as_ref().map(|s| s.lifecycle.id())
    }

    #[must_use]
    pub fn state(&self) -> Option<LifecycleState> {
        self.surface.as_ref().map(|s| s.lifecycle.state())
    }

    #[must_use]
    pub fn kind(&self) -> Option<SurfaceKind> {
        self.surface.as_ref().map(|s| s.renderer.kind())
    }

    #[must_use]
    pub fn pump_policy(&self) -> Option<PumpPolicy> {
        self.surface.as_ref().map(|s| s.pump)
    }

    /// Whether the surface will stay up after close.
    #[must_use]
    pub fn leaves_visible(&self) -> bool {
        self.surface.as_ref().is_some_and(|s| s.leave)
    }

    /// Retained rate history. Only plot meters keep one; a widget meter's stays empty.
    #[must_use]
    pub fn series(&self) -> Option<&SeriesBuffer> {
        self.surface.as_ref().map(|s| &s.series)
    }

    #[must_use]
    pub fn axis_range(&self) -> Option<AxisRange> {
        self.surface.as_ref().map(|s| s.axis.range())
    }

    #[must_use]
    pub fn rates(&self) -> Option<RatePair> {
        self.surface.as_ref().and_then(|s| s.last_rates)
    }

    /// Effective minimum redraw interval in seconds.
    #[must_use]
    pub fn min_interval(&self) -> Option<f64> {
        self.surface.as_ref().map(|s| s.throttle.min_interval())
    }

    /// Text pushed to the surface by the last render.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.surface.as_ref().map(|s| s.text.as_str())
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<MeterSnapshot> {
        let surface = self.surface.as_ref()?;
        Some(MeterSnapshot {
            surface: surface.renderer.kind().to_string(),
            state: surface.lifecycle.state().to_string(),
            count: self.counter.n(),
            total: self.counter.total(),
            elapsed: self.counter.last_print_t() - self.counter.start_t(),
            instantaneous: surface.last_rates.map(|r| r.instantaneous),
            overall: surface.last_rates.map(|r| r.overall),
            y_max: surface.axis.range().y_max,
            points: surface.series.len(),
            text: surface.text.clone(),
        })
    }
}

impl<C: Counter> Drop for GuiMeter<C> {
    fn drop(&mut self) {
        self.close();
    }
}
