//! Typed helpers over `web_sys` used by every controller on the landing page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Array, Reflect};
use web_sys::{
    CssStyleDeclaration, Document, Element, Event, EventTarget, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, NodeList, SvgElement, Window,
};

use crate::error::{DomError, DomResult};

pub const FOCUSABLE: &str =
    r#"a[href], button, textarea, input, select, [tabindex]:not([tabindex="-1"])"#;

pub fn window() -> DomResult<Window> {
    web_sys::window().ok_or(DomError::NoWindow)
}

pub fn document() -> DomResult<Document> {
    window()?.document().ok_or(DomError::NoDocument)
}

fn collect(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn select_all(document: &Document, selector: &str) -> Vec<Element> {
    document
        .query_selector_all(selector)
        .map(collect)
        .unwrap_or_default()
}

pub fn select_within(root: &Element, selector: &str) -> Vec<Element> {
    root.query_selector_all(selector)
        .map(collect)
        .unwrap_or_default()
}

pub fn select_one(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}

pub fn select_one_within(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn require(document: &Document, selector: &str) -> DomResult<Element> {
    select_one(document, selector).ok_or_else(|| DomError::MissingElement(selector.to_string()))
}

/// Inline style of an HTML or SVG element.
pub fn style_of(element: &Element) -> Option<CssStyleDeclaration> {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        Some(html.style())
    } else {
        element.dyn_ref::<SvgElement>().map(|svg| svg.style())
    }
}

pub fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(style) = style_of(element) {
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        if let Err(e) = result {
            log::debug!("Failed to set {}: {:?}", property, e);
        }
    }
}

pub fn set_styles(element: &Element, declarations: &[(&str, &str)]) {
    for (property, value) in declarations {
        set_style(element, property, value);
    }
}

#[cfg(test)]
pub fn style_value(element: &Element, property: &str) -> String {
    style_of(element)
        .and_then(|style| style.get_property_value(property).ok())
        .unwrap_or_default()
}

/// Hiding writes `display: none`; showing drops the inline value again.
pub fn set_visible(element: &Element, visible: bool) {
    set_style(element, "display", if visible { "" } else { "none" });
}

pub fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

pub fn add_class(element: &Element, class: &str) {
    let _ = element.class_list().add_1(class);
}

pub fn remove_class(element: &Element, class: &str) {
    let _ = element.class_list().remove_1(class);
}

pub fn focus(element: &Element) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let _ = html.focus();
    }
}

pub fn focusable_within(root: &Element) -> Vec<Element> {
    select_within(root, FOCUSABLE)
}

pub fn viewport_height(window: &Window) -> f64 {
    window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0)
}

pub fn viewport_width(window: &Window) -> f64 {
    window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .unwrap_or(0.0)
}

/// Document-relative top of an element, like `$(el).offset().top`.
pub fn page_top(window: &Window, element: &Element) -> f64 {
    element.get_bounding_client_rect().top() + window.scroll_y().unwrap_or(0.0)
}

pub fn has_global(window: &Window, name: &str) -> bool {
    Reflect::get(window, &JsValue::from_str(name))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false)
}

pub fn prefers_reduced_motion(window: &Window) -> bool {
    window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// An event listener that is removed from its target when dropped.
pub struct ListenerHandle {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl ListenerHandle {
    pub fn new<F>(target: &EventTarget, event: &'static str, callback: F) -> DomResult<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Leading-edge throttle: runs immediately, then ignores calls for `window_ms`.
#[derive(Clone)]
pub struct Throttle {
    window_ms: u32,
    blocked: Rc<Cell<bool>>,
    reset: Rc<RefCell<Option<Timeout>>>,
}

impl Throttle {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            blocked: Rc::new(Cell::new(false)),
            reset: Rc::new(RefCell::new(None)),
        }
    }

    pub fn run(&self, f: impl FnOnce()) {
        if self.blocked.get() {
            return;
        }
        f();
        self.blocked.set(true);
        let blocked = self.blocked.clone();
        let timeout = Timeout::new(self.window_ms, move || blocked.set(false));
        *self.reset.borrow_mut() = Some(timeout);
    }

    pub fn cancel(&self) {
        self.reset.borrow_mut().take();
        self.blocked.set(false);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: String,
}

pub fn observers_supported(window: &Window) -> bool {
    has_global(window, "IntersectionObserver")
}

/// IntersectionObserver together with the closure it calls back into.
pub struct Observer {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl Observer {
    pub fn new<F>(options: &ObserverOptions, mut on_entry: F) -> DomResult<Self>
    where
        F: FnMut(&IntersectionObserverEntry) + 'static,
    {
        let callback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                    on_entry(&entry);
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn observe(&self, element: &Element) {
        self.observer.observe(element);
    }

    pub fn unobserve(&self, element: &Element) {
        self.observer.unobserve(element);
    }

    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
