use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use web_sys::{Document, Element, Window};

use crate::animator::{Animator, Easing, Props, Tween};
use crate::dom::{self, ListenerHandle, Observer, ObserverOptions, Throttle};

pub const REVEAL_TARGETS: &str = ".block-item, .faq-block, .legal-block";

/// Indices whose one-time action already ran. Never shrinks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OneShotSet {
    done: BTreeSet<usize>,
}

impl OneShotSet {
    /// Returns true the first time `index` is marked.
    pub fn mark(&mut self, index: usize) -> bool {
        self.done.insert(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.done.contains(&index)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.done.len()
    }
}

/// Scroll-fallback visibility: top inside 90% of the viewport, bottom not above it.
pub fn in_reveal_band(top: f64, bottom: f64, viewport_height: f64) -> bool {
    top <= viewport_height * 0.9 && bottom >= 0.0
}

type Action = Box<dyn Fn(&Element) -> bool>;

struct TriggerInner {
    window: Window,
    elements: Vec<Element>,
    fired: RefCell<OneShotSet>,
    action: Action,
    observer: RefCell<Option<Observer>>,
    scroll: RefCell<Option<ListenerHandle>>,
    throttle: Throttle,
}

/// Runs `action` once per element, the first time it becomes visible.
/// `action` returns false to leave the element pending.
#[derive(Clone)]
pub struct OneShotTrigger {
    inner: Rc<TriggerInner>,
}

impl OneShotTrigger {
    pub fn attach(
        window: &Window,
        elements: Vec<Element>,
        already_done: impl Fn(&Element) -> bool,
        options: &ObserverOptions,
        scroll_throttle_ms: u32,
        action: impl Fn(&Element) -> bool + 'static,
    ) -> Self {
        let mut fired = OneShotSet::default();
        for (index, element) in elements.iter().enumerate() {
            if already_done(element) {
                fired.mark(index);
            }
        }

        let trigger = Self {
            inner: Rc::new(TriggerInner {
                window: window.clone(),
                elements,
                fired: RefCell::new(fired),
                action: Box::new(action),
                observer: RefCell::new(None),
                scroll: RefCell::new(None),
                throttle: Throttle::new(scroll_throttle_ms),
            }),
        };

        if dom::observers_supported(window) {
            trigger.observe(options);
        } else {
            trigger.poll_on_scroll();
        }
        trigger
    }

    fn from_weak(weak: &Weak<TriggerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn observe(&self, options: &ObserverOptions) {
        let weak = Rc::downgrade(&self.inner);
        let observer = Observer::new(options, move |entry| {
            if !entry.is_intersecting() {
                return;
            }
            let Some(trigger) = Self::from_weak(&weak) else { return };
            let target = entry.target();
            if let Some(index) = trigger.inner.elements.iter().position(|el| *el == target) {
                trigger.trigger(index);
            }
        });
        match observer {
            Ok(observer) => {
                for (index, element) in self.inner.elements.iter().enumerate() {
                    if !self.inner.fired.borrow().contains(index) {
                        observer.observe(element);
                    }
                }
                *self.inner.observer.borrow_mut() = Some(observer);
            }
            Err(e) => {
                warn!("IntersectionObserver failed ({}), falling back to scroll checks", e);
                self.poll_on_scroll();
            }
        }
    }

    fn poll_on_scroll(&self) {
        let weak = Rc::downgrade(&self.inner);
        let handle = ListenerHandle::new(&self.inner.window, "scroll", move |_| {
            let Some(trigger) = Self::from_weak(&weak) else { return };
            trigger.inner.throttle.run(|| trigger.check_visibility());
        });
        match handle {
            Ok(handle) => *self.inner.scroll.borrow_mut() = Some(handle),
            Err(e) => warn!("Scroll listener failed: {}", e),
        }
        self.check_visibility();
    }

    pub fn check_visibility(&self) {
        let height = dom::viewport_height(&self.inner.window);
        for (index, element) in self.inner.elements.iter().enumerate() {
            if self.inner.fired.borrow().contains(index) {
                continue;
            }
            let rect = element.get_bounding_client_rect();
            if in_reveal_band(rect.top(), rect.bottom(), height) {
                self.trigger(index);
            }
        }
    }

    /// Performs the action for `index` unless it already ran. Returns whether it ran now.
    pub fn trigger(&self, index: usize) -> bool {
        let Some(element) = self.inner.elements.get(index) else { return false };
        if self.inner.fired.borrow().contains(index) {
            return false;
        }
        if !(self.inner.action)(element) {
            return false;
        }
        self.inner.fired.borrow_mut().mark(index);
        if let Some(observer) = self.inner.observer.borrow().as_ref() {
            observer.unobserve(element);
        }
        true
    }

    #[cfg(test)]
    pub fn fired_count(&self) -> usize {
        self.inner.fired.borrow().len()
    }

    pub fn disconnect(&self) {
        if let Some(observer) = self.inner.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.inner.scroll.borrow_mut().take();
        self.inner.throttle.cancel();
    }
}

pub struct RevealOnScroll {
    trigger: OneShotTrigger,
}

impl RevealOnScroll {
    pub fn attach(
        window: &Window,
        document: &Document,
        animator: Rc<dyn Animator>,
        options: &ObserverOptions,
        scroll_throttle_ms: u32,
    ) -> Self {
        let elements = dom::select_all(document, REVEAL_TARGETS);
        debug!("Watching {} elements for reveal", elements.len());
        let trigger = OneShotTrigger::attach(
            window,
            elements,
            |el| dom::has_class(el, "animated"),
            options,
            scroll_throttle_ms,
            move |el| {
                dom::add_class(el, "animated");
                animator.animate(
                    el,
                    Tween::from_to(
                        Props::default().opacity(0.0).y(30.0),
                        Props::default().opacity(1.0).y(0.0),
                    )
                    .duration(600)
                    .ease(Easing::Out),
                    None,
                );
                true
            },
        );
        Self { trigger }
    }

    pub fn disconnect(&self) {
        self.trigger.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_once() {
        let mut set = OneShotSet::default();
        assert!(set.mark(3));
        assert!(!set.mark(3));
        assert!(set.mark(1));
        assert_eq!(set.len(), 2);
        assert!(set.contains(3));
        assert!(!set.contains(0));
    }

    #[test]
    fn band_edges() {
        assert!(in_reveal_band(900.0, 1100.0, 1000.0));
        assert!(!in_reveal_band(901.0, 1100.0, 1000.0));
        assert!(in_reveal_band(-200.0, 0.0, 1000.0));
        assert!(!in_reveal_band(-200.0, -1.0, 1000.0));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn second_intersection_does_nothing() {
        let window = dom::window().unwrap();
        let document = dom::document().unwrap();
        let element = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&element).unwrap();

        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let trigger = OneShotTrigger::attach(
            &window,
            vec![element.clone()],
            |_| false,
            &ObserverOptions {
                threshold: 0.1,
                root_margin: "50px".to_string(),
            },
            100,
            move |_| {
                counter.set(counter.get() + 1);
                true
            },
        );

        trigger.trigger(0);
        trigger.trigger(0);
        assert_eq!(runs.get(), 1);
        assert_eq!(trigger.fired_count(), 1);

        trigger.disconnect();
        element.remove();
    }
}
