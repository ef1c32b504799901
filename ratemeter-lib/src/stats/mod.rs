//! Per-tick statistics for GUI meters.
//!
//! Each accepted tick flows through these pieces in order: a [`Sample`] is read by
//! [`ClockSampler`], turned into a [`RatePair`], stored in the [`SeriesBuffer`], and
//! folded into the [`AxisRangeController`]. [`RefreshThrottle`] decides whether the tick
//! happens at all.

mod axis;
mod rate;
mod sampler;
mod series;
mod throttle;

pub use axis::{AxisRange, AxisRangeController, HEADROOM, INITIAL_Y_MAX};
pub use rate::RatePair;
pub use sampler::{ClockSampler, Sample};
pub use series::{SeriesBuffer, SeriesMode, SeriesPoint, WINDOW_SECONDS};
pub use throttle::{GUI_MIN_INTERVAL, RefreshThrottle, should_render};
