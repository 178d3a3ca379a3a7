use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use web_sys::{Document, Element, Window};

use crate::animator::{Animator, Easing, Props, Tween};
use crate::config::LandingConfig;
use crate::countdown::{self, CountdownTimer};
use crate::dom::{self, ListenerHandle, Observer, ObserverOptions, Throttle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderVisibility {
    Shown,
    Hidden,
}

/// Scroll-position check against the primary timer region. Between the two
/// thresholds the header keeps whatever state it has.
pub fn scroll_decision(scroll_top: f64, region_top: f64, show_offset: f64) -> Option<HeaderVisibility> {
    if scroll_top > region_top + show_offset {
        Some(HeaderVisibility::Shown)
    } else if scroll_top < region_top {
        Some(HeaderVisibility::Hidden)
    } else {
        None
    }
}

struct StickyInner {
    window: Window,
    header: Element,
    mirror: Option<Element>,
    region: Element,
    timer: CountdownTimer,
    animator: Rc<dyn Animator>,
    show_offset: f64,
    throttle: Throttle,
    observer: RefCell<Option<Observer>>,
    scroll: RefCell<Option<ListenerHandle>>,
}

#[derive(Clone)]
pub struct StickyHeaderController {
    inner: Rc<StickyInner>,
}

impl StickyHeaderController {
    /// Wires the header to `timer`. Returns `None` if the markup is missing.
    pub fn mount(
        window: &Window,
        document: &Document,
        timer: &CountdownTimer,
        animator: Rc<dyn Animator>,
        config: &LandingConfig,
    ) -> Option<Self> {
        let lookup = dom::require(document, "#fixedHeader")
            .and_then(|header| Ok((header, dom::require(document, ".timer-container")?)));
        let (header, region) = match lookup {
            Ok(found) => found,
            Err(e) => {
                warn!("Sticky header disabled: {}", e);
                return None;
            }
        };

        let controller = Self {
            inner: Rc::new(StickyInner {
                window: window.clone(),
                mirror: dom::select_one_within(&header, ".fixed-timer-value")
                    .or_else(|| dom::select_one(document, ".fixed-timer-value")),
                header,
                region,
                timer: timer.clone(),
                animator,
                show_offset: config.sticky_show_offset,
                throttle: Throttle::new(config.scroll_throttle_ms),
                observer: RefCell::new(None),
                scroll: RefCell::new(None),
            }),
        };

        controller.sync_mirror();
        controller.follow_timer();
        controller.watch_region(config);
        controller.watch_scroll();
        Some(controller)
    }

    fn from_weak(weak: &Weak<StickyInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn follow_timer(&self) {
        let Some(mirror) = self.inner.mirror.clone() else { return };
        let animator = self.inner.animator.clone();
        self.inner.timer.subscribe(move |snapshot| {
            mirror.set_text_content(Some(&snapshot.formatted));
            if snapshot.just_expired {
                countdown::flash(animator.as_ref(), &mirror);
            }
        });
    }

    fn watch_region(&self, config: &LandingConfig) {
        if !dom::observers_supported(&self.inner.window) {
            return;
        }
        let options = ObserverOptions {
            threshold: config.sticky_threshold,
            root_margin: config.sticky_root_margin.clone(),
        };
        let weak = Rc::downgrade(&self.inner);
        let observer = Observer::new(&options, move |entry| {
            if let Some(controller) = Self::from_weak(&weak) {
                if entry.is_intersecting() {
                    controller.hide();
                } else {
                    controller.show();
                }
            }
        });
        match observer {
            Ok(observer) => {
                observer.observe(&self.inner.region);
                *self.inner.observer.borrow_mut() = Some(observer);
            }
            Err(e) => warn!("Sticky header observer unavailable: {}", e),
        }
    }

    fn watch_scroll(&self) {
        let weak = Rc::downgrade(&self.inner);
        let handle = ListenerHandle::new(&self.inner.window, "scroll", move |_| {
            let Some(controller) = Self::from_weak(&weak) else { return };
            controller.inner.throttle.run(|| controller.check_scroll());
        });
        match handle {
            Ok(handle) => *self.inner.scroll.borrow_mut() = Some(handle),
            Err(e) => warn!("Sticky header scroll listener failed: {}", e),
        }
    }

    pub fn check_scroll(&self) {
        let scroll_top = self.inner.window.scroll_y().unwrap_or(0.0);
        let region_top = dom::page_top(&self.inner.window, &self.inner.region);
        match scroll_decision(scroll_top, region_top, self.inner.show_offset) {
            Some(HeaderVisibility::Shown) => self.show(),
            Some(HeaderVisibility::Hidden) => self.hide(),
            None => {}
        }
    }

    pub fn is_visible(&self) -> bool {
        dom::has_class(&self.inner.header, "visible")
    }

    fn sync_mirror(&self) {
        if let Some(mirror) = &self.inner.mirror {
            mirror.set_text_content(Some(&self.inner.timer.formatted()));
        }
    }

    pub fn show(&self) {
        if self.is_visible() {
            return;
        }
        debug!("Showing sticky header");
        dom::add_class(&self.inner.header, "visible");
        let _ = self.inner.header.set_attribute("aria-hidden", "false");
        self.sync_mirror();
        self.inner.animator.animate(
            &self.inner.header,
            Tween::from_to(
                Props::default().y(-20.0).opacity(0.0),
                Props::default().y(0.0).opacity(1.0),
            )
            .duration(300)
            .ease(Easing::Out),
            None,
        );
    }

    pub fn hide(&self) {
        if !self.is_visible() {
            return;
        }
        debug!("Hiding sticky header");
        dom::remove_class(&self.inner.header, "visible");
        let _ = self.inner.header.set_attribute("aria-hidden", "true");
        self.inner.animator.animate(
            &self.inner.header,
            Tween::to(Props::default().y(-20.0).opacity(0.0))
                .duration(200)
                .ease(Easing::In),
            None,
        );
    }

    pub fn disconnect(&self) {
        if let Some(observer) = self.inner.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.inner.scroll.borrow_mut().take();
        self.inner.throttle.cancel();
    }
}
