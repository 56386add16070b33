//! Yew state and the `use_countdown` hook that binds the countdown to a component.

use crate::config::{CountdownConfig, FADED_OPACITY};
use crate::host::DisplaySurface;
use crate::progress::ProgressFrame;
use crate::web::CountdownSession;
use log::error;
use std::rc::Rc;
use yew::prelude::*;

/// What the countdown card currently shows.
#[derive(Clone, Debug, PartialEq)]
pub struct CardView {
    pub seconds_remaining: u32,
    pub fill_percent: f64,
    pub percent_label: u32,
    pub ring_offset: f64,
    /// Opacity of the whole card; lowered while a redirect is underway.
    pub opacity: f64,
}

impl CardView {
    /// The view before the first tick.
    pub fn initial(config: &CountdownConfig) -> Self {
        let frame = ProgressFrame::at(0.0, config.countdown_duration_ms, config.circle_circumference);
        Self {
            seconds_remaining: frame.seconds_remaining,
            fill_percent: frame.fill_percent,
            percent_label: frame.percent_label,
            ring_offset: frame.ring_offset,
            opacity: 1.0,
        }
    }

    pub fn is_fading(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Single-field updates, so consecutive writes within one tick compose.
#[derive(Clone, Debug, PartialEq)]
pub enum CardAction {
    SecondsRemaining(u32),
    FillPercent(f64),
    PercentLabel(u32),
    RingOffset(f64),
    FadeOut,
}

impl Reducible for CardView {
    type Action = CardAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            CardAction::SecondsRemaining(s) => next.seconds_remaining = s,
            CardAction::FillPercent(p) => next.fill_percent = p,
            CardAction::PercentLabel(p) => next.percent_label = p,
            CardAction::RingOffset(o) => next.ring_offset = o,
            CardAction::FadeOut => next.opacity = FADED_OPACITY,
        }
        if next == *self {
            return self;
        }
        Rc::new(next)
    }
}

/// [`DisplaySurface`] backed by a Yew reducer.
pub struct ReducerDisplay {
    view: UseReducerHandle<CardView>,
}

impl ReducerDisplay {
    pub fn new(view: UseReducerHandle<CardView>) -> Self {
        Self { view }
    }
}

impl DisplaySurface for ReducerDisplay {
    fn show_seconds_remaining(&mut self, seconds: u32) {
        self.view.dispatch(CardAction::SecondsRemaining(seconds));
    }

    fn show_fill_percent(&mut self, percent: f64) {
        self.view.dispatch(CardAction::FillPercent(percent));
    }

    fn show_percent_label(&mut self, percent: u32) {
        self.view.dispatch(CardAction::PercentLabel(percent));
    }

    fn show_ring_offset(&mut self, offset: f64) {
        self.view.dispatch(CardAction::RingOffset(offset));
    }

    fn fade_out(&mut self) {
        self.view.dispatch(CardAction::FadeOut);
    }
}

/// Current view and the trigger callback returned by [`use_countdown`].
#[derive(Clone)]
pub struct CountdownHandle {
    pub view: CardView,
    /// Immediate redirect, bypassing the remaining countdown.
    pub trigger: Callback<()>,
}

/// Custom hook running a countdown session for the lifetime of the component.
#[hook]
pub fn use_countdown(config: &CountdownConfig) -> CountdownHandle {
    let view = {
        let config = config.clone();
        use_reducer(move || CardView::initial(&config))
    };
    let session = use_mut_ref(|| None::<CountdownSession<ReducerDisplay>>);

    {
        // Mount once; later config changes do not restart a running countdown.
        let view = view.clone();
        let session = session.clone();
        let config = config.clone();
        use_effect_with((), move |_| {
            match CountdownSession::mount(config, ReducerDisplay::new(view)) {
                Ok(s) => *session.borrow_mut() = Some(s),
                Err(e) => error!("Failed to mount countdown: {:?}", e),
            }
            move || {
                session.borrow_mut().take();
            }
        });
    }

    let trigger = {
        let session = session.clone();
        Callback::from(move |_: ()| {
            if let Some(s) = &*session.borrow() {
                s.trigger();
            }
        })
    };

    CountdownHandle {
        view: (*view).clone(),
        trigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_view_matches_first_frame() {
        let view = CardView::initial(&CountdownConfig::default());
        assert_eq!(view.seconds_remaining, 5);
        assert_eq!(view.fill_percent, 5.0);
        assert_eq!(view.percent_label, 0);
        assert_eq!(view.ring_offset, 283.0);
        assert!(!view.is_fading());
    }

    #[test]
    fn actions_update_single_fields() {
        let view = Rc::new(CardView::initial(&CountdownConfig::default()));
        let view = view.reduce(CardAction::SecondsRemaining(3));
        let view = view.reduce(CardAction::PercentLabel(88));
        assert_eq!(view.seconds_remaining, 3);
        assert_eq!(view.percent_label, 88);
        assert_eq!(view.fill_percent, 5.0);

        let faded = view.clone().reduce(CardAction::FadeOut);
        assert!(faded.is_fading());
        assert_eq!(faded.opacity, FADED_OPACITY);
    }

    #[test]
    fn unchanged_state_is_reused() {
        let view = Rc::new(CardView::initial(&CountdownConfig::default()));
        let same = view.clone().reduce(CardAction::SecondsRemaining(5));
        assert!(Rc::ptr_eq(&view, &same));
    }
}
