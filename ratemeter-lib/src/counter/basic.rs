use super::{Clock, Counter, SystemClock};
use std::sync::Arc;

/// A plain in-memory counter driven by an injected [`Clock`].
#[derive(Debug, Clone)]
pub struct BasicCounter {
    n: u64,
    total: Option<u64>,
    start_t: f64,
    last_print_n: u64,
    last_print_t: f64,
    desc: String,
    unit: String,
    unit_scale: bool,
    clock: Arc<dyn Clock>,
}

impl BasicCounter {
    /// Create a counter that starts its run now, according to `clock`.
    #[must_use]
    pub fn new(total: Option<u64>, clock: Arc<dyn Clock>) -> Self {
        let start_t = clock.now();
        Self {
            n: 0,
            total,
            start_t,
            last_print_n: 0,
            last_print_t: start_t,
            desc: String::new(),
            unit: "it".to_string(),
            unit_scale: false,
            clock,
        }
    }

    /// Create a counter timed by the system clock.
    #[must_use]
    pub fn with_system_clock(total: Option<u64>) -> Self {
        Self::new(total, Arc::new(SystemClock::new()))
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        self.unit = if unit.is_empty() { "it".to_string() } else { unit };
        self
    }

    #[must_use]
    pub const fn with_unit_scale(mut self, unit_scale: bool) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    pub fn set_desc(&mut self, desc: impl Into<String>) {
        self.desc = desc.into();
    }
}

impl Counter for BasicCounter {
    fn n(&self) -> u64 {
        self.n
    }

    fn total(&self) -> Option<u64> {
        self.total
    }

    fn start_t(&self) -> f64 {
        self.start_t
    }

    fn last_print_n(&self) -> u64 {
        self.last_print_n
    }

    fn last_print_t(&self) -> f64 {
        self.last_print_t
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn unit_scale(&self) -> bool {
        self.unit_scale
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn advance(&mut self, delta: u64) {
        self.n = self.n.saturating_add(delta);
    }

    fn mark_printed(&mut self, n: u64, t: f64) {
        self.last_print_n = n;
        self.last_print_t = t;
    }

    fn reset(&mut self, total: Option<u64>) {
        self.n = 0;
        if total.is_some() {
            self.total = total;
        }
        self.start_t = self.clock.now();
        self.last_print_n = 0;
        self.last_print_t = self.start_t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::ManualClock;

    #[test]
    fn test_new_counter_starts_at_clock_reading() {
        let clock = ManualClock::new(5.0);
        let counter = BasicCounter::new(Some(10), Arc::new(clock));
        assert_eq!(counter.n(), 0);
        assert_eq!(counter.total(), Some(10));
        assert!((counter.start_t() - 5.0).abs() < f64::EPSILON);
        assert!((counter.last_print_t() - 5.0).abs() < f64::EPSILON);
        assert_eq!(counter.unit(), "it");
    }

    #[test]
    fn test_reset_keeps_total_unless_given() {
        let clock = ManualClock::new(0.0);
        let mut counter = BasicCounter::new(Some(10), Arc::new(clock.clone()));
        counter.advance(4);
        counter.mark_printed(4, 1.0);

        clock.set(3.0);
        counter.reset(None);
        assert_eq!(counter.n(), 0);
        assert_eq!(counter.total(), Some(10));
        assert_eq!(counter.last_print_n(), 0);
        assert!((counter.start_t() - 3.0).abs() < f64::EPSILON);

        counter.reset(Some(20));
        assert_eq!(counter.total(), Some(20));
    }

    #[test]
    fn test_empty_unit_falls_back_to_it() {
        let counter = BasicCounter::with_system_clock(None).with_unit("");
        assert_eq!(counter.unit(), "it");
    }
}
