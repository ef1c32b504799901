//! The progress counter that meters read from.
//!
//! A [`Counter`] owns the raw bookkeeping for one run: the current count, the optional
//! total, when the run started, and the position of the last sample that was actually
//! displayed. Meters never mutate the count themselves except through [`Counter::advance`];
//! they sample it at display time and report back what they displayed through
//! [`Counter::mark_printed`].

mod basic;
mod clock;
mod format;

pub use basic::BasicCounter;
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{DETERMINATE_TITLE, INDETERMINATE_TITLE, MeterFields, WIDGET_TEMPLATE, format_meter};

/// The counter contract consumed by GUI meters.
pub trait Counter: core::fmt::Debug {
    /// Current count.
    fn n(&self) -> u64;

    /// Total amount of work, when known.
    fn total(&self) -> Option<u64>;

    /// Clock reading at the start of the run.
    fn start_t(&self) -> f64;

    /// Count at the last displayed sample.
    fn last_print_n(&self) -> u64;

    /// Clock reading at the last displayed sample.
    fn last_print_t(&self) -> f64;

    fn desc(&self) -> &str;

    fn unit(&self) -> &str;

    /// Whether counts should be shown with digit grouping.
    fn unit_scale(&self) -> bool {
        false
    }

    /// Current monotonic clock reading, in seconds.
    fn now(&self) -> f64;

    /// Render meter text for the given fields.
    fn format(&self, fields: &MeterFields<'_>) -> String {
        format_meter(fields)
    }

    /// Add `delta` to the current count.
    fn advance(&mut self, delta: u64);

    /// Record that the sample `(n, t)` has been displayed.
    fn mark_printed(&mut self, n: u64, t: f64);

    /// Start a new run, optionally with a new total.
    fn reset(&mut self, total: Option<u64>);
}
