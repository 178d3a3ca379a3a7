use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use web_sys::Window;

use crate::config::LandingConfig;
use crate::dom::{self, ListenerHandle, Throttle};
use crate::error::DomResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewportMode {
    Mobile,
    Tablet,
    Desktop,
}

impl ViewportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewportMode::Mobile => "mobile",
            ViewportMode::Tablet => "tablet",
            ViewportMode::Desktop => "desktop",
        }
    }

    pub fn is_mobile(&self) -> bool {
        *self == ViewportMode::Mobile
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakpoints {
    pub mobile_max: u32,
    pub tablet_max: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile_max: 430,
            tablet_max: 768,
        }
    }
}

impl Breakpoints {
    pub fn classify(&self, width: u32) -> ViewportMode {
        if width <= self.mobile_max {
            ViewportMode::Mobile
        } else if width <= self.tablet_max {
            ViewportMode::Tablet
        } else {
            ViewportMode::Desktop
        }
    }
}

#[cfg(test)]
pub fn classify(width: u32) -> ViewportMode {
    Breakpoints::default().classify(width)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Notify on every throttled resize, even if the mode is unchanged.
    EveryResize,
    ModeChangeOnly,
}

/// Remembers the last mode and decides whether listeners should run.
#[derive(Debug)]
struct ModeTracker {
    current: ViewportMode,
    policy: ResizePolicy,
}

impl ModeTracker {
    fn observe(&mut self, mode: ViewportMode) -> bool {
        let changed = mode != self.current;
        self.current = mode;
        changed || self.policy == ResizePolicy::EveryResize
    }
}

type ModeListener = Rc<dyn Fn(ViewportMode)>;

struct ClassifierInner {
    window: Window,
    breakpoints: Breakpoints,
    tracker: RefCell<ModeTracker>,
    listeners: RefCell<Vec<ModeListener>>,
    throttle: Throttle,
    resize: RefCell<Option<ListenerHandle>>,
}

#[derive(Clone)]
pub struct ViewportClassifier {
    inner: Rc<ClassifierInner>,
}

impl ViewportClassifier {
    pub fn new(window: &Window, config: &LandingConfig) -> Self {
        let breakpoints = Breakpoints {
            mobile_max: config.mobile_max_width,
            tablet_max: config.tablet_max_width,
        };
        let policy = if config.layout_on_mode_change_only {
            ResizePolicy::ModeChangeOnly
        } else {
            ResizePolicy::EveryResize
        };
        let width = dom::viewport_width(window).max(0.0) as u32;

        Self {
            inner: Rc::new(ClassifierInner {
                window: window.clone(),
                breakpoints,
                tracker: RefCell::new(ModeTracker {
                    current: breakpoints.classify(width),
                    policy,
                }),
                listeners: RefCell::new(Vec::new()),
                throttle: Throttle::new(config.resize_throttle_ms),
                resize: RefCell::new(None),
            }),
        }
    }

    pub fn mode(&self) -> ViewportMode {
        self.inner.tracker.borrow().current
    }

    pub fn subscribe(&self, listener: impl Fn(ViewportMode) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Classifies `width` and notifies listeners according to the resize policy.
    pub fn recompute(&self, width: u32) {
        let mode = self.inner.breakpoints.classify(width);
        let notify = self.inner.tracker.borrow_mut().observe(mode);
        debug!("Viewport {}px -> {}", width, mode.as_str());
        if !notify {
            return;
        }
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(mode);
        }
    }

    pub fn attach(&self) -> DomResult<()> {
        let weak = Rc::downgrade(&self.inner);
        let handle = ListenerHandle::new(&self.inner.window, "resize", move |_| {
            let Some(inner) = weak.upgrade() else { return };
            let classifier = ViewportClassifier { inner };
            classifier.inner.throttle.run(|| {
                let width = dom::viewport_width(&classifier.inner.window).max(0.0) as u32;
                classifier.recompute(width);
            });
        })?;
        *self.inner.resize.borrow_mut() = Some(handle);
        Ok(())
    }

    pub fn detach(&self) {
        self.inner.resize.borrow_mut().take();
        self.inner.throttle.cancel();
        self.inner.listeners.borrow_mut().clear();
    }
}
