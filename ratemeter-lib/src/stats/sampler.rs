use crate::counter::Counter;

/// A `(count, time)` pair read from a counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub count: u64,
    pub time: f64,
}

impl Sample {
    #[must_use]
    pub const fn new(count: u64, time: f64) -> Self {
        Self { count, time }
    }
}

/// Reads samples from a [`Counter`] at display time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSampler;

impl ClockSampler {
    /// The counter's current position.
    #[must_use]
    pub fn current<C: Counter + ?Sized>(counter: &C) -> Sample {
        Sample::new(counter.n(), counter.now())
    }

    /// The last sample that was displayed.
    #[must_use]
    pub fn last_displayed<C: Counter + ?Sized>(counter: &C) -> Sample {
        Sample::new(counter.last_print_n(), counter.last_print_t())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{BasicCounter, ManualClock};
    use std::sync::Arc;

    #[test]
    fn test_samples_follow_counter() {
        let clock = ManualClock::new(1.0);
        let mut counter = BasicCounter::new(None, Arc::new(clock.clone()));

        clock.set(3.0);
        counter.advance(7);
        assert_eq!(ClockSampler::current(&counter), Sample::new(7, 3.0));
        assert_eq!(ClockSampler::last_displayed(&counter), Sample::new(0, 1.0));

        counter.mark_printed(7, 3.0);
        assert_eq!(ClockSampler::last_displayed(&counter), Sample::new(7, 3.0));
    }
}
