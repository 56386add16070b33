//! Pure progress math for the countdown display.
//!
//! Everything here is a function of elapsed time, total duration and ring
//! geometry, so it can be tested without a browser.

use crate::config::MIN_VISIBLE_PERCENT;

/// Ease-out cubic: fast start, gentle finish.
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Display outputs for a single instant of the countdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressFrame {
    pub elapsed_ms: f64,
    pub remaining_ms: f64,
    /// Whole seconds left, rounded up.
    pub seconds_remaining: u32,
    /// Eased completion in `0.0..=1.0`.
    pub eased_fraction: f64,
    /// Linear bar width in percent, never below [`MIN_VISIBLE_PERCENT`].
    pub fill_percent: f64,
    /// Rounded eased percentage shown as text.
    pub percent_label: u32,
    /// Stroke dash offset of the ring; `0.0` means a full ring.
    pub ring_offset: f64,
}

impl ProgressFrame {
    /// Compute the frame `elapsed_ms` into a countdown of `total_ms`.
    ///
    /// Negative elapsed times are treated as zero. Once the remaining time
    /// reaches zero the result is exactly [`ProgressFrame::terminal`].
    pub fn at(elapsed_ms: f64, total_ms: u32, circumference: f64) -> Self {
        let total = f64::from(total_ms);
        let elapsed = if elapsed_ms.is_nan() { 0.0 } else { elapsed_ms.max(0.0) };
        let remaining = (total - elapsed).max(0.0);
        if remaining <= 0.0 {
            return Self::terminal(elapsed);
        }

        let fraction = (elapsed / total).min(1.0);
        let eased = ease_out_cubic(fraction);
        let eased_percent = eased * 100.0;

        Self {
            elapsed_ms: elapsed,
            remaining_ms: remaining,
            seconds_remaining: (remaining / 1000.0).ceil() as u32,
            eased_fraction: eased,
            fill_percent: eased_percent.max(MIN_VISIBLE_PERCENT),
            percent_label: eased_percent.round() as u32,
            ring_offset: circumference * (1.0 - eased),
        }
    }

    /// The pinned end state: nothing left, everything full.
    pub fn terminal(elapsed_ms: f64) -> Self {
        Self {
            elapsed_ms,
            remaining_ms: 0.0,
            seconds_remaining: 0,
            eased_fraction: 1.0,
            fill_percent: 100.0,
            percent_label: 100,
            ring_offset: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_ms <= 0.0
    }
}
