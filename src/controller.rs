//! The countdown state machine.
//!
//! A [`CountdownController`] drives two independently scheduled callbacks: a
//! self-rescheduling display tick and a one-shot deadline. Both converge on the
//! same terminal display and the same redirect, and the redirect is issued at
//! most once per controller.

use crate::config::{CountdownConfig, REDIRECT_FEEDBACK_DELAY_MS, TRIGGER_KEY};
use crate::host::{DeadlineHandle, DisplaySurface, FrameHandle, Navigator, Scheduler};
use crate::progress::ProgressFrame;
use log::{debug, info, warn};

/// Mutable countdown bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownState {
    /// Latched by the first tick.
    pub start_time: Option<f64>,
    pub total_duration_ms: u32,
    pub is_running: bool,
    pub pending_frame_handle: Option<FrameHandle>,
    pub pending_deadline_handle: Option<DeadlineHandle>,
}

impl CountdownState {
    pub fn new(total_duration_ms: u32) -> Self {
        Self {
            start_time: None,
            total_duration_ms,
            is_running: true,
            pending_frame_handle: None,
            pending_deadline_handle: None,
        }
    }
}

pub struct CountdownController<H, D> {
    config: CountdownConfig,
    state: CountdownState,
    host: H,
    display: D,
    hidden: bool,
    started: bool,
    completed: bool,
    redirected: bool,
    /// The host refused the deadline; the tick loop redirects instead.
    deadline_unavailable: bool,
}

impl<H, D> CountdownController<H, D>
where
    H: Scheduler + Navigator,
    D: DisplaySurface,
{
    pub fn new(config: CountdownConfig, host: H, display: D) -> Self {
        let state = CountdownState::new(config.countdown_duration_ms);
        Self {
            config,
            state,
            host,
            display,
            hidden: false,
            started: false,
            completed: false,
            redirected: false,
            deadline_unavailable: false,
        }
    }

    /// Begin ticking and arm the deadline. Only the first call has an effect.
    pub fn start(&mut self) {
        if self.started || self.redirected {
            debug!("Countdown already started, ignoring start()");
            return;
        }
        self.started = true;
        self.state.is_running = !self.hidden;
        if self.state.is_running {
            self.request_frame();
        }
        self.state.pending_deadline_handle =
            self.host.schedule_deadline(self.state.total_duration_ms);
        if self.state.pending_deadline_handle.is_none() {
            self.deadline_unavailable = true;
            warn!("Deadline could not be scheduled; redirect relies on the tick loop");
        }
        info!(
            "Countdown started: {} ms until redirect to {}",
            self.state.total_duration_ms, self.config.redirect_url
        );
    }

    /// Per-frame update. `now` is the frame timestamp in milliseconds.
    pub fn tick(&mut self, now: f64) {
        // The frame that brought us here is no longer pending.
        self.state.pending_frame_handle = None;
        if !self.started || self.completed {
            return;
        }

        let start = *self.state.start_time.get_or_insert(now);
        let frame = ProgressFrame::at(
            now - start,
            self.state.total_duration_ms,
            self.config.circle_circumference,
        );

        if frame.is_finished() {
            if self.deadline_unavailable {
                self.finish();
            } else {
                self.complete();
            }
            return;
        }

        self.render(&frame);
        if self.state.is_running {
            self.request_frame();
        }
    }

    /// Force the terminal display. Idempotent.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.render(&ProgressFrame::terminal(f64::from(self.state.total_duration_ms)));
        debug!("Countdown display completed");
    }

    /// Cancel both pending callbacks and stop running. Idempotent.
    pub fn stop(&mut self) {
        self.cancel_frame();
        if let Some(handle) = self.state.pending_deadline_handle.take() {
            self.host.cancel_deadline(handle);
        }
        self.state.is_running = false;
    }

    /// User-initiated immediate redirect.
    pub fn trigger(&mut self) {
        if self.redirected {
            debug!("Redirect already issued, ignoring trigger()");
            return;
        }
        self.stop();
        self.redirect();
    }

    /// The deadline callback fired.
    pub fn on_deadline(&mut self) {
        // Fired timers are not cancelled; the host owns their cleanup.
        self.state.pending_deadline_handle = None;
        self.finish();
    }

    /// Pause while hidden, resume from the same baseline when visible again.
    ///
    /// The deadline stays armed while hidden, so the redirect can still fire.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        self.hidden = hidden;
        if hidden {
            self.state.is_running = false;
            self.cancel_frame();
            debug!("Display hidden, ticking paused");
        } else if self.awaiting_deadline() {
            self.state.is_running = true;
            self.request_frame();
            if let Some(elapsed) = self.elapsed_ms() {
                debug!("Display visible, resuming at {:.0} ms", elapsed);
            }
        }
    }

    /// Handle a key press; returns `true` if the key was consumed.
    pub fn on_key(&mut self, key: &str) -> bool {
        if key == TRIGGER_KEY && self.state.is_running {
            self.trigger();
            return true;
        }
        false
    }

    /// Whether leaving the page should ask for confirmation.
    pub fn should_confirm_unload(&self) -> bool {
        self.state.is_running
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn has_redirected(&self) -> bool {
        self.redirected
    }

    /// Milliseconds since the first tick, read from the host clock.
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.state.start_time.map(|start| self.host.now() - start)
    }

    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    pub fn config(&self) -> &CountdownConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Started, not yet redirected, and something will still end the countdown.
    fn awaiting_deadline(&self) -> bool {
        self.started
            && !self.redirected
            && (self.state.pending_deadline_handle.is_some() || self.deadline_unavailable)
    }

    fn request_frame(&mut self) {
        if self.state.pending_frame_handle.is_none() {
            self.state.pending_frame_handle = self.host.request_frame();
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.state.pending_frame_handle.take() {
            self.host.cancel_frame(handle);
        }
    }

    fn render(&mut self, frame: &ProgressFrame) {
        self.display.show_seconds_remaining(frame.seconds_remaining);
        self.display.show_fill_percent(frame.fill_percent);
        self.display.show_percent_label(frame.percent_label);
        self.display.show_ring_offset(frame.ring_offset);
    }

    /// Shared end of the countdown: stop ticking, pin the display, redirect.
    fn finish(&mut self) {
        if self.redirected {
            return;
        }
        self.cancel_frame();
        self.state.is_running = false;
        self.complete();
        self.redirect();
    }

    fn redirect(&mut self) {
        if self.redirected {
            return;
        }
        self.redirected = true;
        self.display.fade_out();
        self.host
            .navigate_after(REDIRECT_FEEDBACK_DELAY_MS, &self.config.redirect_url);
        info!("Redirecting to {}", self.config.redirect_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        clock: f64,
        next_id: i32,
        frames_requested: Vec<FrameHandle>,
        frames_cancelled: Vec<FrameHandle>,
        deadlines: Vec<(DeadlineHandle, u32)>,
        deadlines_cancelled: Vec<DeadlineHandle>,
        navigations: Vec<(u32, String)>,
        refuse_deadlines: bool,
    }

    impl Scheduler for FakeHost {
        fn now(&self) -> f64 {
            self.clock
        }

        fn request_frame(&mut self) -> Option<FrameHandle> {
            self.next_id += 1;
            let handle = FrameHandle(self.next_id);
            self.frames_requested.push(handle);
            Some(handle)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.frames_cancelled.push(handle);
        }

        fn schedule_deadline(&mut self, delay_ms: u32) -> Option<DeadlineHandle> {
            if self.refuse_deadlines {
                return None;
            }
            self.next_id += 1;
            let handle = DeadlineHandle(self.next_id as u32);
            self.deadlines.push((handle, delay_ms));
            Some(handle)
        }

        fn cancel_deadline(&mut self, handle: DeadlineHandle) {
            self.deadlines_cancelled.push(handle);
        }
    }

    impl Navigator for FakeHost {
        fn navigate_after(&mut self, delay_ms: u32, url: &str) {
            self.navigations.push((delay_ms, url.to_string()));
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Screen {
        seconds: Option<u32>,
        fill: Option<f64>,
        label: Option<u32>,
        ring: Option<f64>,
        faded: bool,
    }

    impl DisplaySurface for Screen {
        fn show_seconds_remaining(&mut self, seconds: u32) {
            self.seconds = Some(seconds);
        }
        fn show_fill_percent(&mut self, percent: f64) {
            self.fill = Some(percent);
        }
        fn show_percent_label(&mut self, percent: u32) {
            self.label = Some(percent);
        }
        fn show_ring_offset(&mut self, offset: f64) {
            self.ring = Some(offset);
        }
        fn fade_out(&mut self) {
            self.faded = true;
        }
    }

    fn controller() -> CountdownController<FakeHost, Screen> {
        CountdownController::new(CountdownConfig::default(), FakeHost::default(), Screen::default())
    }

    #[test]
    fn start_arms_frame_and_deadline() {
        let mut c = controller();
        c.start();
        assert!(c.is_running());
        assert_eq!(c.host().frames_requested.len(), 1);
        assert_eq!(c.host().deadlines.len(), 1);
        assert_eq!(c.host().deadlines[0].1, 5_000);
        assert!(c.state().pending_frame_handle.is_some());
        assert!(c.state().pending_deadline_handle.is_some());

        c.start();
        assert_eq!(c.host().deadlines.len(), 1);
    }

    #[test]
    fn first_tick_latches_start_time() {
        let mut c = controller();
        c.start();
        c.tick(1_000.0);
        c.tick(3_500.0);
        assert_eq!(c.state().start_time, Some(1_000.0));
        assert_eq!(c.display().seconds, Some(3));
        assert_eq!(c.display().label, Some(88));
        // One frame from start() plus one per tick.
        assert_eq!(c.host().frames_requested.len(), 3);
    }

    #[test]
    fn reaching_zero_completes_without_rescheduling() {
        let mut c = controller();
        c.start();
        c.tick(0.0);
        c.tick(6_000.0);
        assert_eq!(c.display().seconds, Some(0));
        assert_eq!(c.display().fill, Some(100.0));
        assert_eq!(c.display().label, Some(100));
        assert_eq!(c.display().ring, Some(0.0));
        assert!(c.state().pending_frame_handle.is_none());
        assert_eq!(c.host().frames_requested.len(), 2);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut c = controller();
        c.complete();
        c.complete();
        assert_eq!(c.display().seconds, Some(0));
        assert_eq!(c.display().label, Some(100));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut c = controller();
        c.start();
        c.stop();
        let once = c.state().clone();
        let cancelled = (c.host().frames_cancelled.len(), c.host().deadlines_cancelled.len());
        c.stop();
        c.stop();
        assert_eq!(c.state(), &once);
        assert_eq!(
            (c.host().frames_cancelled.len(), c.host().deadlines_cancelled.len()),
            cancelled
        );
        assert!(!c.is_running());
        assert!(once.pending_frame_handle.is_none());
        assert!(once.pending_deadline_handle.is_none());
    }

    #[test]
    fn trigger_cancels_deadline_and_redirects_once() {
        let mut c = controller();
        c.start();
        c.tick(0.0);
        c.trigger();
        assert_eq!(c.host().deadlines_cancelled.len(), 1);
        assert_eq!(
            c.host().navigations,
            vec![(REDIRECT_FEEDBACK_DELAY_MS, CountdownConfig::default().redirect_url)]
        );
        assert!(c.display().faded);

        c.trigger();
        c.on_deadline();
        assert_eq!(c.host().navigations.len(), 1);
    }

    #[test]
    fn deadline_completes_and_redirects() {
        let mut c = controller();
        c.start();
        c.tick(0.0);
        c.on_deadline();
        assert!(!c.is_running());
        assert!(!c.should_confirm_unload());
        assert_eq!(c.display().label, Some(100));
        assert_eq!(c.host().navigations.len(), 1);
        // The fired deadline is forgotten, not cancelled.
        assert!(c.host().deadlines_cancelled.is_empty());
        assert_eq!(c.host().frames_cancelled.len(), 1);
    }

    #[test]
    fn tick_loop_redirects_when_deadline_unavailable() {
        let host = FakeHost {
            refuse_deadlines: true,
            ..FakeHost::default()
        };
        let mut c = CountdownController::new(CountdownConfig::default(), host, Screen::default());
        c.start();
        assert!(c.state().pending_deadline_handle.is_none());
        c.tick(0.0);
        assert!(c.host().navigations.is_empty());

        c.tick(6_000.0);
        assert_eq!(c.host().navigations.len(), 1);
        assert!(!c.is_running());
        assert!(!c.should_confirm_unload());
        assert_eq!(c.display().label, Some(100));

        c.tick(7_000.0);
        c.on_deadline();
        assert_eq!(c.host().navigations.len(), 1);
    }

    #[test]
    fn visible_again_resumes_without_deadline() {
        let host = FakeHost {
            refuse_deadlines: true,
            ..FakeHost::default()
        };
        let mut c = CountdownController::new(CountdownConfig::default(), host, Screen::default());
        c.start();
        c.tick(0.0);
        c.on_visibility_change(true);
        c.on_visibility_change(false);
        assert!(c.is_running());
        c.tick(5_500.0);
        assert_eq!(c.host().navigations.len(), 1);
        assert!(!c.should_confirm_unload());
    }

    #[test]
    fn finished_tick_leaves_redirect_to_deadline() {
        let mut c = controller();
        c.start();
        c.tick(0.0);
        c.tick(6_000.0);
        assert!(c.host().navigations.is_empty());
        assert!(c.state().pending_deadline_handle.is_some());
    }

    #[test]
    fn hidden_pauses_ticking_but_keeps_deadline() {
        let mut c = controller();
        c.start();
        c.tick(0.0);
        c.on_visibility_change(true);
        assert!(!c.is_running());
        assert!(c.state().pending_frame_handle.is_none());
        assert!(c.state().pending_deadline_handle.is_some());

        c.on_deadline();
        assert_eq!(c.host().navigations.len(), 1);
    }

    #[test]
    fn visible_again_resumes_from_same_baseline() {
        let mut c = controller();
        c.start();
        c.tick(1_000.0);
        c.on_visibility_change(true);
        c.on_visibility_change(false);
        assert!(c.is_running());
        assert!(c.state().pending_frame_handle.is_some());
        c.tick(3_500.0);
        assert_eq!(c.state().start_time, Some(1_000.0));
        assert_eq!(c.display().seconds, Some(3));
    }

    #[test]
    fn visible_after_stop_stays_stopped() {
        let mut c = controller();
        c.start();
        c.stop();
        c.on_visibility_change(true);
        c.on_visibility_change(false);
        assert!(!c.is_running());
        assert!(c.state().pending_frame_handle.is_none());
    }

    #[test]
    fn start_while_hidden_waits_for_visibility() {
        let mut c = controller();
        c.on_visibility_change(true);
        c.start();
        assert!(!c.is_running());
        assert!(c.host().frames_requested.is_empty());
        assert_eq!(c.host().deadlines.len(), 1);

        c.on_visibility_change(false);
        assert!(c.is_running());
        assert_eq!(c.host().frames_requested.len(), 1);
    }

    #[test]
    fn enter_triggers_only_while_running() {
        let mut c = controller();
        c.start();
        assert!(!c.on_key("Escape"));
        assert!(c.on_key("Enter"));
        assert_eq!(c.host().navigations.len(), 1);
        assert!(!c.on_key("Enter"));
        assert_eq!(c.host().navigations.len(), 1);
    }

    #[test]
    fn elapsed_reads_host_clock() {
        let mut c = controller();
        assert_eq!(c.elapsed_ms(), None);
        c.start();
        c.tick(200.0);
        c.host_mut().clock = 1_200.0;
        assert_eq!(c.elapsed_ms(), Some(1_000.0));
    }
}
