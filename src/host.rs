//! Seams between the countdown controller and whatever hosts it.
//!
//! The controller never touches the browser directly. It asks a [`Scheduler`]
//! for frames and a deadline, a [`Navigator`] for the redirect and writes its
//! outputs to a [`DisplaySurface`]. The browser implementations live in
//! [`crate::web`] and [`crate::hooks`]; tests use in-memory recorders.

/// Identifier of a pending animation frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Identifier of a pending deadline callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadlineHandle(pub u32);

/// Frame and timer scheduling.
///
/// Scheduled callbacks are delivered back to the controller by the host:
/// frames through `tick(now)` and the deadline through `on_deadline()`.
pub trait Scheduler {
    /// Monotonic clock in milliseconds.
    fn now(&self) -> f64;

    /// Request one animation frame. `None` if the host could not schedule it.
    fn request_frame(&mut self) -> Option<FrameHandle>;

    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Schedule the one-shot deadline `delay_ms` from now.
    fn schedule_deadline(&mut self, delay_ms: u32) -> Option<DeadlineHandle>;

    fn cancel_deadline(&mut self, handle: DeadlineHandle);
}

/// Full-page navigation.
pub trait Navigator {
    /// Navigate to `url` once `delay_ms` has passed.
    fn navigate_after(&mut self, delay_ms: u32, url: &str);
}

/// Write-only presentation outputs.
pub trait DisplaySurface {
    fn show_seconds_remaining(&mut self, seconds: u32);
    fn show_fill_percent(&mut self, percent: f64);
    fn show_percent_label(&mut self, percent: u32);
    fn show_ring_offset(&mut self, offset: f64);
    /// Visual feedback that a redirect is underway.
    fn fade_out(&mut self);
}
