//! Host event loop detection.
//!
//! A GUI meter never owns the event loop of the application it is embedded in. When that
//! loop is already dispatching, the meter only mutates display state and lets the loop
//! redraw; when it is not, nothing would ever repaint, so the meter pumps one iteration
//! itself after every change.
//!
//! [`is_host_loop_active`] is a best-effort probe. It asks, in order:
//!
//! 1. the toolkit itself, when it can answer natively;
//! 2. the process-wide [`frames`] registry, for any thread inside a known dispatch entry point;
//! 3. a backtrace of the current thread, searched for the same entry point names.
//!
//! A host that runs its dispatch loop behind an entry point it does not report, and which
//! cannot answer natively, goes undetected. The meter then pumps redundantly, which is
//! harmless apart from the cost.
//!
//! Step 3 needs symbol names. Release builds of the `ratemeter` binary strip them
//! (`strip = true`), so there the backtrace search never matches and only steps 1 and 2
//! can detect a running loop.

pub mod frames;

use std::backtrace::Backtrace;
use strum::Display;

pub use frames::{DispatchFrame, enter_dispatch};

const LOG_TARGET: &str = "      probe";

/// What a meter needs to know about the host event loop.
pub trait HostLoop {
    /// The toolkit's own answer to "is the loop dispatching right now", if it has one.
    fn dispatching(&self) -> Option<bool> {
        None
    }

    /// Names of the functions that run the host's dispatch loop.
    fn dispatch_entry_points(&self) -> &[&'static str] {
        &[]
    }
}

/// Whether the host's event loop is currently active anywhere in the process.
#[must_use]
pub fn is_host_loop_active<H: HostLoop + ?Sized>(host: &H) -> bool {
    if let Some(native) = host.dispatching() {
        log::debug!(target: LOG_TARGET, "Host reports dispatching={native}");
        return native;
    }

    let entry_points = host.dispatch_entry_points();
    if entry_points.is_empty() {
        log::debug!(target: LOG_TARGET, "Host loop cannot be probed, assuming it is not dispatching");
        return false;
    }

    if frames::any_context_dispatching(entry_points) {
        log::debug!(target: LOG_TARGET, "Found an announced dispatch frame");
        return true;
    }

    let found = current_stack_contains(entry_points);
    log::debug!(target: LOG_TARGET, "Backtrace search for dispatch entry points: found={found}");
    found
}

fn current_stack_contains(entry_points: &[&str]) -> bool {
    let trace = Backtrace::force_capture().to_string();
    entry_points.iter().any(|entry| trace.contains(entry))
}

/// How a meter gets its changes onto the screen, decided once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PumpPolicy {
    /// The host loop is running; only mutate state.
    HostDriven,

    /// Nobody else is pumping; run one host iteration after each change.
    SelfPump,
}

impl PumpPolicy {
    /// Probe `host` and pick the matching policy.
    #[must_use]
    pub fn detect<H: HostLoop + ?Sized>(host: &H) -> Self {
        if is_host_loop_active(host) { Self::HostDriven } else { Self::SelfPump }
    }

    #[must_use]
    pub const fn pumps(self) -> bool {
        matches!(self, Self::SelfPump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Native(Option<bool>);

    impl HostLoop for Native {
        fn dispatching(&self) -> Option<bool> {
            self.0
        }

        fn dispatch_entry_points(&self) -> &[&'static str] {
            &["host_test::never_called_entry_point"]
        }
    }

    struct Announced;

    impl HostLoop for Announced {
        fn dispatch_entry_points(&self) -> &[&'static str] {
            &["host_test::announced_mainloop"]
        }
    }

    struct Opaque;

    impl HostLoop for Opaque {}

    #[test]
    fn test_native_answer_wins() {
        assert!(is_host_loop_active(&Native(Some(true))));
        assert!(!is_host_loop_active(&Native(Some(false))));
    }

    #[test]
    fn test_unknown_entry_point_not_found() {
        assert!(!is_host_loop_active(&Native(None)));
    }

    #[test]
    fn test_announced_frame_is_found() {
        assert!(!is_host_loop_active(&Announced));
        let _frame = enter_dispatch("host_test::announced_mainloop");
        assert!(is_host_loop_active(&Announced));
        assert_eq!(PumpPolicy::detect(&Announced), PumpPolicy::HostDriven);
    }

    struct OtherThread;

    impl HostLoop for OtherThread {
        fn dispatch_entry_points(&self) -> &[&'static str] {
            &["host_test::other_thread_mainloop"]
        }
    }

    #[test]
    fn test_frame_on_other_thread_found_without_symbols() {
        use std::sync::mpsc;

        let (entered_tx, entered_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            let _frame = enter_dispatch("host_test::other_thread_mainloop");
            entered_tx.send(()).unwrap();
            let _ = done_rx.recv();
        });

        entered_rx.recv().unwrap();
        assert!(!current_stack_contains(OtherThread.dispatch_entry_points()));
        assert!(is_host_loop_active(&OtherThread));

        done_tx.send(()).unwrap();
        worker.join().unwrap();
        assert!(!is_host_loop_active(&OtherThread));
    }

    #[test]
    fn test_opaque_host_self_pumps() {
        let policy = PumpPolicy::detect(&Opaque);
        assert_eq!(policy, PumpPolicy::SelfPump);
        assert!(policy.pumps());
        assert_eq!(policy.to_string(), "self-pump");
    }
}
