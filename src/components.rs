//! Pure Yew view components for the countdown card.
//!
//! These render from props only; the countdown itself is driven by
//! [`crate::hooks::use_countdown`].

use crate::config::RING_RADIUS;
use crate::hooks::CardView;
use crate::utils::{format_fill_width, format_percent_label};
use yew::prelude::*;

/// Circular progress ring with its gradient definition.
#[derive(Properties, PartialEq)]
pub struct ProgressRingProps {
    pub seconds_remaining: u32,
    pub circumference: f64,
    pub ring_offset: f64,
}

#[function_component(ProgressRing)]
pub fn progress_ring(props: &ProgressRingProps) -> Html {
    html! {
        <div class="circle-progress">
            <svg class="circle-svg" viewBox="0 0 100 100">
                <defs>
                    <linearGradient id="circleGradient" x1="0%" y1="0%" x2="100%" y2="100%">
                        <stop offset="0%" style="stop-color:#2ea043;stop-opacity:1" />
                        <stop offset="100%" style="stop-color:#58a6ff;stop-opacity:1" />
                    </linearGradient>
                </defs>
                <circle class="circle-track" cx="50" cy="50" r={RING_RADIUS.to_string()} />
                <circle
                    id="circleProgress"
                    class="circle-fill"
                    cx="50"
                    cy="50"
                    r={RING_RADIUS.to_string()}
                    stroke="url(#circleGradient)"
                    style={format!(
                        "stroke-dasharray: {}; stroke-dashoffset: {:.3}",
                        props.circumference, props.ring_offset
                    )}
                />
            </svg>
            <span id="countdownNum" class="countdown-num">{ props.seconds_remaining }</span>
        </div>
    }
}

/// Linear progress bar with its numeric label.
#[derive(Properties, PartialEq)]
pub struct ProgressBarProps {
    pub fill_percent: f64,
    pub percent_label: u32,
}

#[function_component(ProgressBar)]
pub fn progress_bar(props: &ProgressBarProps) -> Html {
    html! {
        <div class="progress-container">
            <div class="progress-bar">
                <div
                    id="progressFill"
                    class="progress-fill"
                    style={format!("width: {}", format_fill_width(props.fill_percent))}
                ></div>
            </div>
            <span id="progressPercent" class="progress-percent">
                { format_percent_label(props.percent_label) }
            </span>
        </div>
    }
}

/// The whole download card: readout, ring, bar and activation button.
#[derive(Properties, PartialEq)]
pub struct CountdownCardProps {
    pub view: CardView,
    pub circumference: f64,
    pub on_trigger: Callback<()>,
}

#[function_component(CountdownCard)]
pub fn countdown_card(props: &CountdownCardProps) -> Html {
    let view = &props.view;
    let onclick = {
        let on_trigger = props.on_trigger.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_trigger.emit(());
        })
    };

    html! {
        <div
            class="download-card"
            style={format!("transition: opacity 0.3s ease; opacity: {}", view.opacity)}
        >
            <h1 class="title">{ "Your download is being prepared" }</h1>
            <p class="subtitle">
                { "Redirecting in " }
                <span id="timeDisplay" class="time-display">{ view.seconds_remaining }</span>
                { " seconds" }
            </p>
            <ProgressRing
                seconds_remaining={view.seconds_remaining}
                circumference={props.circumference}
                ring_offset={view.ring_offset}
            />
            <ProgressBar fill_percent={view.fill_percent} percent_label={view.percent_label} />
            <button id="downloadBtn" class="primary-button" {onclick}>
                { "Download now" }
            </button>
            <p class="hint">{ "Press Enter to skip the wait" }</p>
        </div>
    }
}
