use super::SeriesPoint;

/// Ceiling a fresh run starts with.
pub const INITIAL_Y_MAX: f64 = 0.001;

/// Multiplier applied to a new peak when the ceiling is raised.
pub const HEADROOM: f64 = 1.1;

/// Vertical extent of the rate axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            y_min: 0.0,
            y_max: INITIAL_Y_MAX,
        }
    }
}

/// Keeps the rate axis ceiling above every displayed point.
///
/// The ceiling only grows within a run, so a single slow tick never makes the axis jump
/// back down. [`reset`](Self::reset) restores the initial ceiling for a new run.
#[derive(Debug, Clone, Default)]
pub struct AxisRangeController {
    range: AxisRange,
}

impl AxisRangeController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the range needed to show `point` given the `current` range.
    #[must_use]
    pub fn maybe_rescale(point: &SeriesPoint, current: AxisRange) -> (AxisRange, bool) {
        let peak = point.peak();
        if peak > current.y_max {
            (
                AxisRange {
                    y_min: current.y_min,
                    y_max: HEADROOM * peak,
                },
                true,
            )
        } else {
            (current, false)
        }
    }

    /// Fold `point` into the tracked range, returning whether the ceiling moved.
    pub fn observe(&mut self, point: &SeriesPoint) -> bool {
        let (range, changed) = Self::maybe_rescale(point, self.range);
        self.range = range;
        changed
    }

    #[must_use]
    pub const fn range(&self) -> AxisRange {
        self.range
    }

    pub fn reset(&mut self) {
        self.range = AxisRange::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(y_instant: f64, y_overall: f64) -> SeriesPoint {
        SeriesPoint {
            x: 0.0,
            y_instant,
            y_overall,
        }
    }

    #[test]
    fn test_rescale_adds_headroom() {
        let (range, changed) = AxisRangeController::maybe_rescale(&point(10.0, 4.0), AxisRange::default());
        assert!(changed);
        assert!((range.y_max - 11.0).abs() < 1e-9);
        assert!(range.y_min.abs() < f64::EPSILON);
    }

    #[test]
    fn test_overall_rate_can_trigger_rescale() {
        let (range, changed) = AxisRangeController::maybe_rescale(&point(1.0, 20.0), AxisRange { y_min: 0.0, y_max: 5.0 });
        assert!(changed);
        assert!((range.y_max - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_within_range_is_unchanged() {
        let current = AxisRange { y_min: 0.0, y_max: 5.0 };
        let (range, changed) = AxisRangeController::maybe_rescale(&point(5.0, 1.0), current);
        assert!(!changed);
        assert_eq!(range, current);
    }

    #[test]
    fn test_ceiling_never_shrinks() {
        let mut controller = AxisRangeController::new();
        let mut previous = controller.range().y_max;
        for y in [3.0, 50.0, 1.0, 0.0, 49.0, 80.0, 2.0] {
            let _ = controller.observe(&point(y, y / 2.0));
            let current = controller.range().y_max;
            assert!(current >= previous);
            assert!(current >= y);
            previous = current;
        }
        assert!((previous - 88.0).abs() < 1e-9);

        controller.reset();
        assert_eq!(controller.range(), AxisRange::default());
    }
}
