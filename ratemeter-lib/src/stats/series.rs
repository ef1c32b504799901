use super::{RatePair, Sample};
use std::collections::VecDeque;

/// Default length of the trailing window kept when the total is unknown, in seconds.
pub const WINDOW_SECONDS: f64 = 66.0;

/// One plotted observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Percent complete when the total is known, otherwise the absolute sample time.
    pub x: f64,
    pub y_instant: f64,
    pub y_overall: f64,
}

impl SeriesPoint {
    #[must_use]
    pub const fn new(x: f64, rates: RatePair) -> Self {
        Self {
            x,
            y_instant: rates.instantaneous,
            y_overall: rates.overall,
        }
    }

    #[must_use]
    pub const fn peak(&self) -> f64 {
        self.y_instant.max(self.y_overall)
    }
}

/// How the x coordinate of the series is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesMode {
    /// `x` is percent complete; nothing is ever evicted.
    Percent { total: u64 },

    /// `x` is a timestamp; only the trailing `window` seconds are kept.
    Timeline { window: f64 },
}

/// History of displayed rates.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<SeriesPoint>,
    mode: SeriesMode,
    window: f64,
}

impl SeriesBuffer {
    /// Pick the mode from whether the total is known.
    #[must_use]
    pub fn for_total(total: Option<u64>, window: f64) -> Self {
        let mode = match total {
            Some(total) => SeriesMode::Percent { total },
            None => SeriesMode::Timeline { window },
        };

        Self {
            points: VecDeque::new(),
            mode,
            window,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SeriesMode {
        self.mode
    }

    /// Whether points are indexed by percent complete.
    #[must_use]
    pub const fn is_determinate(&self) -> bool {
        matches!(self.mode, SeriesMode::Percent { .. })
    }

    /// The x coordinate this buffer uses for `sample`.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "loss of precision acceptable for percentage calculation")]
    pub fn x_for(&self, sample: Sample) -> f64 {
        match self.mode {
            SeriesMode::Percent { total: 0 } => 100.0,
            SeriesMode::Percent { total } => (100.0 * sample.count as f64 / total as f64).clamp(0.0, 100.0),
            SeriesMode::Timeline { .. } => sample.time,
        }
    }

    /// Add a point, evicting expired points in timeline mode.
    pub fn append(&mut self, point: SeriesPoint) {
        self.points.push_back(point);
        if matches!(self.mode, SeriesMode::Timeline { .. }) {
            self.evict_expired(point.x);
        }
    }

    /// Drop points older than the window relative to `now`. No-op in percent mode.
    pub fn evict_expired(&mut self, now: f64) {
        let SeriesMode::Timeline { window } = self.mode else {
            return;
        };

        while self.points.front().is_some_and(|p| now - p.x > window) {
            let _ = self.points.pop_front();
        }
    }

    /// Points in arrival order.
    pub fn as_sequence(&self) -> impl ExactSizeIterator<Item = &SeriesPoint> + '_ {
        self.points.iter()
    }

    #[must_use]
    pub fn newest(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Forget all points and switch mode for a new run.
    pub fn reset(&mut self, total: Option<u64>) {
        *self = Self::for_total(total, self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> SeriesPoint {
        SeriesPoint {
            x,
            y_instant: y,
            y_overall: y,
        }
    }

    #[test]
    fn test_percent_mode_keeps_everything() {
        let mut buffer = SeriesBuffer::for_total(Some(100), WINDOW_SECONDS);
        for i in 0..=100 {
            buffer.append(point(f64::from(i), 1.0));
        }
        buffer.evict_expired(10_000.0);
        assert_eq!(buffer.len(), 101);
        assert!(buffer.is_determinate());
    }

    #[test]
    fn test_percent_x() {
        let buffer = SeriesBuffer::for_total(Some(200), WINDOW_SECONDS);
        assert!((buffer.x_for(Sample::new(50, 9.0)) - 25.0).abs() < f64::EPSILON);
        assert!((buffer.x_for(Sample::new(500, 9.0)) - 100.0).abs() < f64::EPSILON);

        let empty_total = SeriesBuffer::for_total(Some(0), WINDOW_SECONDS);
        assert!((empty_total.x_for(Sample::new(0, 1.0)) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timeline_x_is_time() {
        let buffer = SeriesBuffer::for_total(None, WINDOW_SECONDS);
        assert!((buffer.x_for(Sample::new(50, 9.5)) - 9.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timeline_window_slides() {
        let mut buffer = SeriesBuffer::for_total(None, WINDOW_SECONDS);
        for t in 0..200 {
            buffer.append(point(f64::from(t), 1.0));
            let newest = buffer.newest().unwrap().x;
            assert!(buffer.as_sequence().all(|p| newest - p.x <= WINDOW_SECONDS));
        }

        // points 133..=199 remain
        assert_eq!(buffer.len(), 67);
        assert!((buffer.as_sequence().next().unwrap().x - 133.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evict_after_long_gap() {
        let mut buffer = SeriesBuffer::for_total(None, WINDOW_SECONDS);
        buffer.append(point(0.0, 1.0));
        buffer.append(point(1.0, 1.0));
        buffer.append(point(500.0, 1.0));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_explicit_eviction_against_clock() {
        let mut buffer = SeriesBuffer::for_total(None, 10.0);
        buffer.append(point(0.0, 1.0));
        buffer.append(point(5.0, 1.0));
        buffer.evict_expired(12.0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_reset_switches_mode() {
        let mut buffer = SeriesBuffer::for_total(None, 30.0);
        buffer.append(point(1.0, 1.0));
        buffer.reset(Some(10));
        assert!(buffer.is_empty());
        assert_eq!(buffer.mode(), SeriesMode::Percent { total: 10 });

        buffer.reset(None);
        assert_eq!(buffer.mode(), SeriesMode::Timeline { window: 30.0 });
    }
}
