use super::Sample;

/// Throughput derived from one displayed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePair {
    /// Rate since the previously displayed sample.
    pub instantaneous: f64,

    /// Rate since the start of the run.
    pub overall: f64,
}

impl RatePair {
    /// Compute both rates for `sample`.
    ///
    /// Returns `None` when either interval is not positive, or when the count went
    /// backwards. Callers must not record anything for such a tick.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "acceptable for statistics")]
    pub fn compute(sample: Sample, prev: Sample, start: f64) -> Option<Self> {
        let dt = sample.time - prev.time;
        let elapsed = sample.time - start;
        if dt <= 0.0 || elapsed <= 0.0 || sample.count < prev.count {
            return None;
        }

        let instantaneous = (sample.count - prev.count) as f64 / dt;
        let overall = sample.count as f64 / elapsed;
        if !instantaneous.is_finite() || !overall.is_finite() {
            return None;
        }

        Some(Self { instantaneous, overall })
    }

    /// The larger of the two rates.
    #[must_use]
    pub const fn peak(&self) -> f64 {
        self.instantaneous.max(self.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_rate() {
        let rates = RatePair::compute(Sample::new(10, 2.0), Sample::new(0, 0.0), 0.0).unwrap();
        assert!((rates.instantaneous - 5.0).abs() < f64::EPSILON);
        assert!((rates.overall - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_instantaneous_uses_previous_sample() {
        let rates = RatePair::compute(Sample::new(30, 4.0), Sample::new(10, 2.0), 0.0).unwrap();
        assert!((rates.instantaneous - 10.0).abs() < f64::EPSILON);
        assert!((rates.overall - 7.5).abs() < f64::EPSILON);
        assert!((rates.peak() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_timestamp_is_no_update() {
        assert!(RatePair::compute(Sample::new(10, 2.0), Sample::new(10, 2.0), 0.0).is_none());
        assert!(RatePair::compute(Sample::new(12, 2.0), Sample::new(10, 2.0), 0.0).is_none());
    }

    #[test]
    fn test_zero_elapsed_is_no_update() {
        assert!(RatePair::compute(Sample::new(1, 5.0), Sample::new(0, 4.0), 5.0).is_none());
    }

    #[test]
    fn test_clock_going_backwards_is_no_update() {
        assert!(RatePair::compute(Sample::new(5, 1.0), Sample::new(0, 2.0), 0.0).is_none());
    }

    #[test]
    fn test_count_going_backwards_is_no_update() {
        assert!(RatePair::compute(Sample::new(1, 3.0), Sample::new(5, 2.0), 0.0).is_none());
    }

    #[test]
    fn test_no_progress_gives_zero_rates() {
        let rates = RatePair::compute(Sample::new(0, 3.0), Sample::new(0, 1.0), 0.0).unwrap();
        assert!(rates.instantaneous.abs() < f64::EPSILON);
        assert!(rates.overall.abs() < f64::EPSILON);
    }
}
