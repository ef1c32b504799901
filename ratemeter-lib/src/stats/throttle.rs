use core::time::Duration;

/// GUI redraws are expensive, so they are never scheduled more often than this.
pub const GUI_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Decide whether a tick at `now` warrants a redraw.
///
/// The first and last samples of a run always render. Everything else renders only once
/// `min_interval` seconds have passed since the last render.
#[must_use]
pub fn should_render(now: f64, last_render_time: Option<f64>, min_interval: f64, is_first: bool, is_last: bool) -> bool {
    if is_first || is_last {
        return true;
    }

    last_render_time.is_none_or(|last| now - last >= min_interval)
}

/// Stateful redraw gate for one meter.
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    min_interval: f64,
    last_render: Option<f64>,
}

impl RefreshThrottle {
    /// Create a throttle, raising `configured` to [`GUI_MIN_INTERVAL`] when it is smaller.
    #[must_use]
    pub fn new(configured: Duration) -> Self {
        Self {
            min_interval: configured.max(GUI_MIN_INTERVAL).as_secs_f64(),
            last_render: None,
        }
    }

    /// Effective minimum interval in seconds.
    #[must_use]
    pub const fn min_interval(&self) -> f64 {
        self.min_interval
    }

    /// Whether no render has happened yet in this run.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.last_render.is_none()
    }

    /// Check the tick at `now`; when it is admitted, it is recorded as the last render.
    pub fn admit(&mut self, now: f64, is_last: bool) -> bool {
        let admitted = should_render(now, self.last_render, self.min_interval, self.is_first(), is_last);
        if admitted {
            self.last_render = Some(now);
        }
        admitted
    }

    /// Record a render that happened outside of [`admit`](Self::admit).
    pub const fn record(&mut self, now: f64) {
        self.last_render = Some(now);
    }

    /// Treat the next tick as the first of a new run.
    pub const fn rearm(&mut self) {
        self.last_render = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_overrides_small_interval() {
        assert!((RefreshThrottle::new(Duration::from_millis(100)).min_interval() - 0.5).abs() < f64::EPSILON);
        assert!((RefreshThrottle::new(Duration::ZERO).min_interval() - 0.5).abs() < f64::EPSILON);
        assert!((RefreshThrottle::new(Duration::from_secs(2)).min_interval() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_half_second_throttle() {
        let mut throttle = RefreshThrottle::new(Duration::from_millis(500));
        let renders: Vec<bool> = [0.0, 0.2, 0.6].into_iter().map(|t| throttle.admit(t, false)).collect();
        assert_eq!(renders, [true, false, true]);
    }

    #[test]
    fn test_last_sample_always_renders() {
        let mut throttle = RefreshThrottle::new(GUI_MIN_INTERVAL);
        assert!(throttle.admit(0.0, false));
        assert!(!throttle.admit(0.1, false));
        assert!(throttle.admit(0.15, true));
    }

    #[test]
    fn test_rearm_makes_next_tick_first() {
        let mut throttle = RefreshThrottle::new(GUI_MIN_INTERVAL);
        assert!(throttle.admit(1.0, false));
        throttle.rearm();
        assert!(throttle.is_first());
        assert!(throttle.admit(1.1, false));
    }

    #[test]
    fn test_should_render_is_pure() {
        assert!(should_render(0.0, Some(0.0), 0.5, true, false));
        assert!(should_render(0.0, Some(0.0), 0.5, false, true));
        assert!(!should_render(0.4, Some(0.0), 0.5, false, false));
        assert!(should_render(0.5, Some(0.0), 0.5, false, false));
        assert!(should_render(0.0, None, 0.5, false, false));
    }
}
