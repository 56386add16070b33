//! Browser host for the countdown.
//!
//! [`WebHost`] schedules frames with `requestAnimationFrame`, the deadline and
//! the delayed navigation with [`gloo_timers`] and navigates through
//! `location.href`. [`CountdownSession`] ties a controller to the page: it
//! owns the shared controller, the document/window listeners and the startup
//! timer, and stops everything when dropped.

use crate::config::{CountdownConfig, CONFIG_ELEMENT_ID, STARTUP_DELAY_MS};
use crate::controller::CountdownController;
use crate::host::{DeadlineHandle, DisplaySurface, FrameHandle, Navigator, Scheduler};
use gloo_timers::callback::Timeout;
use log::{debug, error, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{BeforeUnloadEvent, Document, KeyboardEvent, Window};

type FrameClosure = Closure<dyn FnMut(f64)>;

pub type SharedController<D> = Rc<RefCell<CountdownController<WebHost, D>>>;

/// Browser implementation of [`Scheduler`] and [`Navigator`].
///
/// Callbacks are bound after construction with [`WebHost::bind`], since they
/// need a reference to the controller that owns this host.
pub struct WebHost {
    window: Window,
    on_frame: Option<FrameClosure>,
    on_deadline: Option<Rc<dyn Fn()>>,
    /// Kept after firing; dropping a timer from inside its own callback is not allowed.
    deadline: Option<(DeadlineHandle, Timeout)>,
    navigation: Option<Timeout>,
    deadline_seq: u32,
}

impl WebHost {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            on_frame: None,
            on_deadline: None,
            deadline: None,
            navigation: None,
            deadline_seq: 0,
        }
    }

    pub fn bind(&mut self, on_frame: FrameClosure, on_deadline: Rc<dyn Fn()>) {
        self.on_frame = Some(on_frame);
        self.on_deadline = Some(on_deadline);
    }
}

impl Scheduler for WebHost {
    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        let callback: &js_sys::Function = self.on_frame.as_ref()?.as_ref().unchecked_ref();
        match self.window.request_animation_frame(callback) {
            Ok(id) => Some(FrameHandle(id)),
            Err(e) => {
                warn!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }

    fn schedule_deadline(&mut self, delay_ms: u32) -> Option<DeadlineHandle> {
        let fire = Rc::clone(self.on_deadline.as_ref()?);
        self.deadline_seq = self.deadline_seq.wrapping_add(1);
        let handle = DeadlineHandle(self.deadline_seq);
        let timer = Timeout::new(delay_ms, move || fire());
        self.deadline = Some((handle, timer));
        Some(handle)
    }

    fn cancel_deadline(&mut self, handle: DeadlineHandle) {
        match self.deadline.take() {
            Some((pending, timer)) if pending == handle => drop(timer),
            other => self.deadline = other,
        }
    }
}

impl Navigator for WebHost {
    fn navigate_after(&mut self, delay_ms: u32, url: &str) {
        let location = self.window.location();
        let url = url.to_string();
        self.navigation = Some(Timeout::new(delay_ms, move || {
            if let Err(e) = location.set_href(&url) {
                error!("Navigation to {} failed: {:?}", url, e);
            }
        }));
    }
}

/// A listener attached to an event target, removed on drop.
struct Listener<E: ?Sized + WasmClosure> {
    target: web_sys::EventTarget,
    event: &'static str,
    closure: Closure<E>,
}

impl<E: ?Sized + WasmClosure> Listener<E> {
    fn attach(
        target: &web_sys::EventTarget,
        event: &'static str,
        closure: Closure<E>,
    ) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl<E: ?Sized + WasmClosure> Drop for Listener<E> {
    fn drop(&mut self) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            warn!("Removing {} listener failed: {:?}", self.event, e);
        }
    }
}

/// Visibility, keyboard and unload-guard listeners for one session.
struct PageListeners {
    _visibility: Listener<dyn FnMut()>,
    _keydown: Listener<dyn FnMut(KeyboardEvent)>,
    _before_unload: Listener<dyn FnMut(BeforeUnloadEvent)>,
}

impl PageListeners {
    fn attach<D: DisplaySurface + 'static>(
        window: &Window,
        document: &Document,
        controller: &SharedController<D>,
    ) -> Result<Self, JsValue> {
        let visibility = {
            let weak = Rc::downgrade(controller);
            let doc = document.clone();
            Closure::wrap(Box::new(move || {
                if let Some(c) = weak.upgrade() {
                    c.borrow_mut().on_visibility_change(doc.hidden());
                }
            }) as Box<dyn FnMut()>)
        };

        let keydown = {
            let weak = Rc::downgrade(controller);
            Closure::wrap(Box::new(move |e: KeyboardEvent| {
                if let Some(c) = weak.upgrade() {
                    if c.borrow_mut().on_key(&e.key()) {
                        e.prevent_default();
                    }
                }
            }) as Box<dyn FnMut(KeyboardEvent)>)
        };

        let before_unload = {
            let weak = Rc::downgrade(controller);
            Closure::wrap(Box::new(move |e: BeforeUnloadEvent| {
                let guard = match weak.upgrade() {
                    Some(c) => c
                        .try_borrow()
                        .map(|c| c.should_confirm_unload())
                        .unwrap_or(false),
                    None => false,
                };
                if guard {
                    e.prevent_default();
                    e.set_return_value("");
                }
            }) as Box<dyn FnMut(BeforeUnloadEvent)>)
        };

        Ok(Self {
            _visibility: Listener::attach(document, "visibilitychange", visibility)?,
            _keydown: Listener::attach(document, "keydown", keydown)?,
            _before_unload: Listener::attach(window, "beforeunload", before_unload)?,
        })
    }
}

/// A running countdown bound to the current page.
pub struct CountdownSession<D: DisplaySurface + 'static> {
    controller: SharedController<D>,
    _listeners: PageListeners,
    _startup: Timeout,
}

impl<D: DisplaySurface + 'static> CountdownSession<D> {
    /// Wire a controller to the page and start it after the startup delay.
    pub fn mount(config: CountdownConfig, display: D) -> Result<Self, JsValue> {
        let window = gloo_utils::window();
        let document = gloo_utils::document();

        let controller: SharedController<D> = Rc::new(RefCell::new(CountdownController::new(
            config,
            WebHost::new(window.clone()),
            display,
        )));
        bind_host(&controller);

        // Pick up a page that was already hidden when we mounted.
        controller
            .borrow_mut()
            .on_visibility_change(document.hidden());

        let listeners = PageListeners::attach(&window, &document, &controller)?;

        let startup = {
            let weak = Rc::downgrade(&controller);
            Timeout::new(STARTUP_DELAY_MS, move || {
                if let Some(c) = weak.upgrade() {
                    c.borrow_mut().start();
                }
            })
        };

        debug!("Countdown session mounted");
        Ok(Self {
            controller,
            _listeners: listeners,
            _startup: startup,
        })
    }

    /// Immediate redirect, as from the activation button.
    pub fn trigger(&self) {
        match self.controller.try_borrow_mut() {
            Ok(mut c) => c.trigger(),
            Err(_) => warn!("Countdown busy, trigger dropped"),
        }
    }

    pub fn controller(&self) -> &SharedController<D> {
        &self.controller
    }
}

impl<D: DisplaySurface + 'static> Drop for CountdownSession<D> {
    fn drop(&mut self) {
        if let Ok(mut c) = self.controller.try_borrow_mut() {
            c.stop();
        }
        debug!("Countdown session dropped");
    }
}

fn bind_host<D: DisplaySurface + 'static>(controller: &SharedController<D>) {
    let on_frame = {
        let weak: Weak<RefCell<CountdownController<WebHost, D>>> = Rc::downgrade(controller);
        Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if let Some(c) = weak.upgrade() {
                c.borrow_mut().tick(timestamp_ms);
            }
        }) as Box<dyn FnMut(f64)>)
    };
    let on_deadline: Rc<dyn Fn()> = {
        let weak = Rc::downgrade(controller);
        Rc::new(move || {
            if let Some(c) = weak.upgrade() {
                c.borrow_mut().on_deadline();
            }
        })
    };
    controller.borrow_mut().host_mut().bind(on_frame, on_deadline);
}

/// Read configuration overrides embedded in the page.
///
/// Looks for `<script id="countdown-config" type="application/json">`. A
/// missing element yields the defaults; invalid overrides are logged and
/// ignored.
pub fn page_config() -> CountdownConfig {
    let json = gloo_utils::document()
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());

    match json {
        Some(json) => CountdownConfig::from_json(&json).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            CountdownConfig::default()
        }),
        None => CountdownConfig::default(),
    }
}
