use super::{Frame, SurfaceEvent};
use crate::host::{HostLoop, PumpPolicy};
use core::fmt::{Debug, Display, Formatter};

const LOG_TARGET: &str = "     widget";

/// Title given to progress windows.
pub const WINDOW_TITLE: &str = "ratemeter";

/// Handle to a toolkit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowHandle(pub u64);

/// Where a new progress window goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowParent {
    /// No window exists yet; the progress window becomes the root.
    NewRoot,

    /// A child window of an existing one.
    Child(WindowHandle),
}

/// How the progress bar fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarMode {
    Determinate { maximum: u64 },
    Indeterminate,
}

impl BarMode {
    #[must_use]
    pub const fn for_total(total: Option<u64>) -> Self {
        match total {
            Some(maximum) => Self::Determinate { maximum },
            None => Self::Indeterminate,
        }
    }
}

/// What the window manager's close button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseGesture {
    /// Run the cancel sequence.
    Cancel,

    /// Just destroy the window (used once the meter is closed and left showing).
    Destroy,
}

/// The toolkit has no default root window and none was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoDefaultRoot;

impl Display for NoDefaultRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("no default root window is available, a parent window is required")
    }
}

impl core::error::Error for NoDefaultRoot {}

/// A native progress window supplied by the embedding application.
pub trait WidgetBackend: Debug {
    fn set_title(&mut self, title: &str);

    fn set_bar_mode(&mut self, mode: BarMode);

    fn set_value(&mut self, value: u64);

    fn set_desc(&mut self, desc: &str);

    fn set_text(&mut self, text: &str);

    fn add_cancel_button(&mut self);

    /// Take modal input grab.
    fn grab(&mut self);

    fn route_close_gesture(&mut self, route: CloseGesture);

    /// Process pending host events once.
    fn pump(&mut self);

    /// Events the user produced since the last call.
    fn take_events(&mut self) -> Vec<SurfaceEvent>;

    /// Ask the toolkit to destroy the window on its next iteration.
    fn schedule_destroy(&mut self);
}

/// The toolkit that creates progress windows.
pub trait WidgetToolkit: HostLoop {
    /// The process default root window; `Ok(None)` when no window exists yet.
    fn default_root(&self) -> Result<Option<WindowHandle>, NoDefaultRoot>;

    fn open_window(&mut self, parent: WindowParent) -> Box<dyn WidgetBackend>;
}

/// Choose the parent for a new progress window.
pub fn resolve_parent<T: WidgetToolkit + ?Sized>(toolkit: &T, explicit: Option<WindowHandle>) -> Result<WindowParent, NoDefaultRoot> {
    if let Some(parent) = explicit {
        return Ok(WindowParent::Child(parent));
    }

    Ok(toolkit.default_root()?.map_or(WindowParent::NewRoot, WindowParent::Child))
}

/// Options applied once when the window is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetSetup<'a> {
    pub total: Option<u64>,
    pub desc: &'a str,
    pub cancel_button: bool,
    pub grab: bool,
}

/// Drives a progress bar plus text labels.
#[derive(Debug)]
pub struct WidgetRenderer {
    backend: Box<dyn WidgetBackend>,
    mode: BarMode,
}

impl WidgetRenderer {
    #[must_use]
    pub fn new(mut backend: Box<dyn WidgetBackend>, setup: &WidgetSetup<'_>) -> Self {
        let mode = BarMode::for_total(setup.total);

        backend.route_close_gesture(CloseGesture::Cancel);
        backend.set_title(WINDOW_TITLE);
        backend.set_desc(setup.desc);
        backend.set_value(0);
        backend.set_bar_mode(mode);
        if setup.cancel_button {
            backend.add_cancel_button();
        }
        if setup.grab {
            backend.grab();
        }

        Self { backend, mode }
    }

    #[must_use]
    pub const fn mode(&self) -> BarMode {
        self.mode
    }

    pub fn refresh(&mut self, frame: &Frame<'_>) {
        let mode = BarMode::for_total(frame.total);
        if mode != self.mode {
            self.backend.set_bar_mode(mode);
            self.mode = mode;
        }

        self.backend.set_value(frame.count);
        self.backend.set_desc(frame.desc);
        self.backend.set_text(frame.text);
    }

    pub fn pump(&mut self) {
        self.backend.pump();
    }

    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        self.backend.take_events()
    }

    /// Keep the window showing; its close button now only destroys it.
    pub fn leave_visible(&mut self) {
        self.backend.route_close_gesture(CloseGesture::Destroy);
    }

    pub fn teardown(&mut self, policy: PumpPolicy) {
        log::debug!(target: LOG_TARGET, "Destroying progress window ({policy})");
        self.backend.route_close_gesture(CloseGesture::Destroy);
        self.backend.schedule_destroy();
        if policy.pumps() {
            self.backend.pump();
        }
    }

    pub fn reset(&mut self, total: Option<u64>) {
        self.mode = BarMode::for_total(total);
        self.backend.set_bar_mode(self.mode);
        self.backend.set_value(0);
    }
}
