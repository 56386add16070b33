//! Countdown-then-redirect widget.
//!
//! A progress ring, a linear bar and a numeric readout animate over a fixed
//! duration, after which the page navigates to the configured URL. The user
//! can skip the wait with the button or the Enter key.
//!
//! The state machine ([`controller`]) and its math ([`progress`]) are host
//! independent and talk to the outside world through the traits in [`host`].
//! [`web`], [`hooks`] and [`components`] bind it to the browser with Yew.

pub mod components;
pub mod config;
pub mod controller;
pub mod hooks;
pub mod host;
pub mod logging;
pub mod progress;
pub mod utils;
pub mod web;

pub use config::{ConfigError, CountdownConfig};
pub use controller::{CountdownController, CountdownState};
pub use host::{DeadlineHandle, DisplaySurface, FrameHandle, Navigator, Scheduler};
pub use progress::{ease_out_cubic, ProgressFrame};
