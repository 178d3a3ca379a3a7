//! Prize popups: one open at a time, focus kept inside, page scroll locked.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use serde::Serialize;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::animator::{Animator, Easing, Props, Tween};
use crate::config::LandingConfig;
use crate::dom::{self, ListenerHandle};
use crate::toast::Toaster;
use crate::viewport::ViewportClassifier;

pub type PopupId = u8;

pub const PRESSED_CLASS: &str = "pressed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    /// No popup is registered under this id.
    Ignored,
    AlreadyOpen,
    /// `evicted` is the previously active popup that now has to play its exit.
    Opened { evicted: Option<PopupId> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopupState {
    registered: BTreeSet<PopupId>,
    active: Option<PopupId>,
    closing: BTreeSet<PopupId>,
    submitted: BTreeSet<PopupId>,
}

impl PopupState {
    pub fn new(registered: impl IntoIterator<Item = PopupId>) -> Self {
        Self {
            registered: registered.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn active(&self) -> Option<PopupId> {
        self.active
    }

    #[cfg(test)]
    pub fn is_closing(&self, id: PopupId) -> bool {
        self.closing.contains(&id)
    }

    pub fn open(&mut self, id: PopupId) -> OpenOutcome {
        if !self.registered.contains(&id) {
            return OpenOutcome::Ignored;
        }
        if self.active == Some(id) && !self.closing.contains(&id) {
            return OpenOutcome::AlreadyOpen;
        }

        let evicted = self
            .active
            .take()
            .filter(|prev| *prev != id && self.closing.insert(*prev));
        if let Some(prev) = evicted {
            self.submitted.remove(&prev);
        }
        self.closing.remove(&id);
        // A popup reopened during its exit starts a fresh submission.
        self.submitted.remove(&id);
        self.active = Some(id);
        OpenOutcome::Opened { evicted }
    }

    /// Starts closing `id`. Returns false if it is not open or already closing.
    pub fn begin_close(&mut self, id: PopupId) -> bool {
        if self.active != Some(id) || self.closing.contains(&id) {
            return false;
        }
        self.closing.insert(id);
        true
    }

    /// Completes an exit animation. Returns whether scroll can be unlocked, or
    /// `None` when the popup was reopened in the meantime.
    pub fn finish_close(&mut self, id: PopupId) -> Option<bool> {
        if !self.closing.remove(&id) {
            return None;
        }
        self.submitted.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.active.is_none())
    }

    /// Marks an accepted submit. A second submit before the popup closes is refused.
    pub fn begin_submit(&mut self, id: PopupId) -> bool {
        self.active == Some(id) && !self.closing.contains(&id) && self.submitted.insert(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub prize_id: PopupId,
    pub accepted_terms: bool,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitVerdict {
    Rejected,
    Accepted(SubmissionPayload),
}

/// `checkbox` is `None` when the popup has no terms checkbox at all.
pub fn validate_submit(prize_id: PopupId, checkbox: Option<bool>, timestamp: i64) -> SubmitVerdict {
    match checkbox {
        Some(false) => SubmitVerdict::Rejected,
        checked => SubmitVerdict::Accepted(SubmissionPayload {
            prize_id,
            accepted_terms: checked.unwrap_or(false),
            timestamp,
        }),
    }
}

/// Index to move focus to when Tab would leave the popup, if any.
pub fn trap_focus_target(current: Option<usize>, count: usize, backwards: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let last = count - 1;
    match current {
        None => Some(if backwards { last } else { 0 }),
        Some(0) if backwards => Some(last),
        Some(i) if !backwards && i == last => Some(0),
        _ => None,
    }
}

pub fn prize_of(element: &Element) -> Option<PopupId> {
    element.get_attribute("data-prize")?.trim().parse().ok()
}

struct PopupView {
    root: Element,
    container: Option<Element>,
    close: Option<Element>,
    submit: Option<Element>,
    checkbox: Option<HtmlInputElement>,
    rules_link: Option<Element>,
}

impl PopupView {
    fn find(document: &Document, id: PopupId) -> Option<Self> {
        let root = document.get_element_by_id(&format!("popup-{}", id))?;
        Some(Self {
            container: dom::select_one_within(&root, ".popup-container"),
            close: dom::select_one_within(&root, ".popup-close"),
            submit: dom::select_one_within(&root, ".popup-submit"),
            checkbox: dom::select_one_within(&root, r#"input[type="checkbox"]"#)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok()),
            rules_link: dom::select_one_within(&root, ".popup-rules-link"),
            root,
        })
    }
}

struct PopupInner {
    document: Document,
    config: LandingConfig,
    views: BTreeMap<PopupId, PopupView>,
    state: RefCell<PopupState>,
    animator: Rc<dyn Animator>,
    viewport: ViewportClassifier,
    toaster: Toaster,
    openers: RefCell<BTreeMap<PopupId, Element>>,
    pending_closes: RefCell<BTreeMap<PopupId, Timeout>>,
    before_open: RefCell<Option<Box<dyn Fn()>>>,
    listeners: RefCell<Vec<ListenerHandle>>,
}

#[derive(Clone)]
pub struct PopupController {
    inner: Rc<PopupInner>,
}

impl PopupController {
    pub fn mount(
        document: &Document,
        config: &LandingConfig,
        animator: Rc<dyn Animator>,
        viewport: ViewportClassifier,
        toaster: Toaster,
    ) -> Self {
        let views: BTreeMap<PopupId, PopupView> = (1..=config.prize_count)
            .filter_map(|id| PopupView::find(document, id).map(|view| (id, view)))
            .collect();
        if views.is_empty() {
            warn!("No #popup-N elements found");
        } else {
            debug!("Registered {} popups", views.len());
        }

        let controller = Self {
            inner: Rc::new(PopupInner {
                document: document.clone(),
                config: config.clone(),
                state: RefCell::new(PopupState::new(views.keys().copied())),
                views,
                animator,
                viewport,
                toaster,
                openers: RefCell::new(BTreeMap::new()),
                pending_closes: RefCell::new(BTreeMap::new()),
                before_open: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        };

        let mut listeners = Vec::new();
        controller.bind_popups(&mut listeners);
        controller.bind_global(&mut listeners);
        controller.bind_prize_triggers(&mut listeners);
        *controller.inner.listeners.borrow_mut() = listeners;
        controller
    }

    fn from_weak(weak: &Weak<PopupInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn listen(
        &self,
        listeners: &mut Vec<ListenerHandle>,
        target: &EventTarget,
        event: &'static str,
        handler: impl Fn(&Self, Event) + 'static,
    ) {
        let weak = Rc::downgrade(&self.inner);
        let handle = ListenerHandle::new(target, event, move |e| {
            if let Some(controller) = Self::from_weak(&weak) {
                handler(&controller, e);
            }
        });
        match handle {
            Ok(handle) => listeners.push(handle),
            Err(e) => warn!("Popup {} listener failed: {}", event, e),
        }
    }

    fn bind_popups(&self, listeners: &mut Vec<ListenerHandle>) {
        for (&id, view) in &self.inner.views {
            if let Some(close) = &view.close {
                self.listen(listeners, close, "click", move |c, e| {
                    e.prevent_default();
                    e.stop_propagation();
                    c.close(id);
                });
            }
            if let Some(submit) = &view.submit {
                self.listen(listeners, submit, "click", move |c, _| c.submit(id));
            }
            if let Some(link) = &view.rules_link {
                self.listen(listeners, link, "click", move |c, e| {
                    e.prevent_default();
                    c.inner.toaster.show(&c.inner.config.messages.rules_opening);
                    c.close(id);
                });
            }
            if let Some(checkbox) = &view.checkbox {
                let input = checkbox.clone();
                self.listen(listeners, checkbox, "keydown", move |_, e| {
                    if is_activation_key(&e) {
                        e.prevent_default();
                        input.set_checked(!input.checked());
                    }
                });
            }
        }
    }

    fn bind_global(&self, listeners: &mut Vec<ListenerHandle>) {
        let document = self.inner.document.clone();
        self.listen(listeners, &document, "keydown", |c, e| {
            let Some(key_event) = e.dyn_ref::<KeyboardEvent>() else { return };
            let Some(id) = c.active() else { return };
            match key_event.key().as_str() {
                "Escape" => c.close(id),
                "Tab" => c.trap_focus(id, key_event),
                _ => {}
            }
        });
        self.listen(listeners, &document, "click", |c, e| {
            let on_overlay = e
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map_or(false, |el| dom::has_class(&el, "popup-overlay"));
            if let (true, Some(id)) = (on_overlay, c.active()) {
                c.close(id);
            }
        });
    }

    fn bind_prize_triggers(&self, listeners: &mut Vec<ListenerHandle>) {
        for block in dom::select_all(&self.inner.document, ".block-item") {
            let opener = block.clone();
            self.listen(listeners, &block, "click", move |c, e| {
                e.prevent_default();
                if !c.inner.viewport.mode().is_mobile() {
                    return;
                }
                if let Some(id) = prize_of(&opener) {
                    c.open(id, Some(opener.clone()));
                }
            });

            // A class, so tweens that own inline opacity are left alone.
            let pressed = block.clone();
            self.listen(listeners, &block, "touchstart", move |c, _| {
                if c.inner.viewport.mode().is_mobile() {
                    dom::add_class(&pressed, PRESSED_CLASS);
                }
            });
            for event in ["touchend", "touchcancel"] {
                let pressed = block.clone();
                self.listen(listeners, &block, event, move |_, _| {
                    dom::remove_class(&pressed, PRESSED_CLASS);
                });
            }
        }

        for button in dom::select_all(&self.inner.document, ".block-btn") {
            let opener = button.clone();
            self.listen(listeners, &button, "click", move |c, e| {
                e.prevent_default();
                e.stop_propagation();
                if c.inner.viewport.mode().is_mobile() {
                    return;
                }
                if let Some(id) = prize_of(&opener) {
                    c.open(id, Some(opener.clone()));
                }
            });

            let pressed = button.clone();
            self.listen(listeners, &button, "keydown", move |_, e| {
                if is_activation_key(&e) {
                    e.prevent_default();
                    if let Some(html) = pressed.dyn_ref::<HtmlElement>() {
                        html.click();
                    }
                }
            });
        }
    }

    /// Runs right before a popup becomes active.
    pub fn on_before_open(&self, hook: impl Fn() + 'static) {
        *self.inner.before_open.borrow_mut() = Some(Box::new(hook));
    }

    pub fn active(&self) -> Option<PopupId> {
        self.inner.state.borrow().active()
    }

    #[cfg(test)]
    pub fn is_open(&self, id: PopupId) -> bool {
        self.inner
            .views
            .get(&id)
            .map_or(false, |view| dom::has_class(&view.root, "active"))
    }

    pub fn open(&self, id: PopupId, opener: Option<Element>) {
        if !self.inner.config.is_valid_prize(id) {
            debug!("Ignoring prize id {}", id);
            return;
        }
        let outcome = self.inner.state.borrow_mut().open(id);
        let evicted = match outcome {
            OpenOutcome::Opened { evicted } => evicted,
            OpenOutcome::Ignored | OpenOutcome::AlreadyOpen => return,
        };
        let Some(view) = self.inner.views.get(&id) else { return };

        if let Some(prev) = evicted {
            self.inner.pending_closes.borrow_mut().remove(&prev);
            self.play_exit(prev);
        }
        if let Some(hook) = self.inner.before_open.borrow().as_ref() {
            hook();
        }

        self.lock_scroll(true);
        dom::add_class(&view.root, "active");
        if let Some(opener) = opener {
            self.inner.openers.borrow_mut().insert(id, opener);
        }
        self.play_entrance(view);
        self.focus_primary(view);
        info!("Opened popup {}", id);
    }

    pub fn close(&self, id: PopupId) {
        if !self.inner.state.borrow_mut().begin_close(id) {
            return;
        }
        self.inner.pending_closes.borrow_mut().remove(&id);
        self.play_exit(id);
    }

    pub fn submit(&self, id: PopupId) {
        let Some(view) = self.inner.views.get(&id) else { return };
        if self.active() != Some(id) {
            return;
        }
        let checked = view.checkbox.as_ref().map(|c| c.checked());
        let timestamp = chrono::Utc::now().timestamp_millis();

        match validate_submit(id, checked, timestamp) {
            SubmitVerdict::Rejected => {
                debug!("Popup {} submitted without accepting the terms", id);
                if let Some(checkbox) = &view.checkbox {
                    self.shake(checkbox);
                }
                self.inner.toaster.show(&self.inner.config.messages.terms_required);
            }
            SubmitVerdict::Accepted(payload) => {
                if !self.inner.state.borrow_mut().begin_submit(id) {
                    return;
                }
                info!("Submitting form: {:?}", payload);
                match serde_wasm_bindgen::to_value(&payload) {
                    Ok(value) => gloo_console::log!("Form submission:", value),
                    Err(e) => warn!("Could not serialize submission: {}", e),
                }
                self.inner.toaster.show(&self.inner.config.messages.submit_success);

                let weak = Rc::downgrade(&self.inner);
                let timeout = Timeout::new(self.inner.config.submit_close_delay_ms, move || {
                    if let Some(controller) = Self::from_weak(&weak) {
                        controller.close(id);
                    }
                });
                self.inner.pending_closes.borrow_mut().insert(id, timeout);
            }
        }
    }

    fn trap_focus(&self, id: PopupId, event: &KeyboardEvent) {
        let Some(view) = self.inner.views.get(&id) else { return };
        let focusables = dom::focusable_within(&view.root);
        let current = self
            .inner
            .document
            .active_element()
            .and_then(|active| focusables.iter().position(|el| *el == active));
        if let Some(target) = trap_focus_target(current, focusables.len(), event.shift_key()) {
            event.prevent_default();
            dom::focus(&focusables[target]);
        }
    }

    fn focus_primary(&self, view: &PopupView) {
        let primary = view
            .close
            .clone()
            .or_else(|| dom::focusable_within(&view.root).into_iter().next());
        if let Some(primary) = primary {
            dom::focus(&primary);
        }
    }

    fn lock_scroll(&self, locked: bool) {
        let Some(body) = self.inner.document.body() else { return };
        if locked {
            dom::set_style(&body, "overflow", "hidden");
            dom::add_class(&body, "popup-open");
        } else {
            dom::set_style(&body, "overflow", "");
            dom::remove_class(&body, "popup-open");
        }
    }

    fn play_entrance(&self, view: &PopupView) {
        let Some(container) = &view.container else { return };
        let tween = if self.inner.viewport.mode().is_mobile() {
            Tween::from_to(
                Props::default().y_percent(100.0).opacity(0.0),
                Props::default().y(0.0).opacity(1.0),
            )
            .duration(300)
            .ease(Easing::Out)
        } else {
            Tween::from_to(
                Props::default().opacity(0.0).y(30.0).scale(0.95),
                Props::default().opacity(1.0).y(0.0).scale(1.0),
            )
            .duration(400)
            .ease(Easing::BackOut(1.2))
        };
        self.inner.animator.animate(container, tween, None);
    }

    fn play_exit(&self, id: PopupId) {
        let Some(view) = self.inner.views.get(&id) else { return };
        let weak = Rc::downgrade(&self.inner);
        let done = move || {
            if let Some(controller) = Self::from_weak(&weak) {
                controller.finish_close(id);
            }
        };

        let Some(container) = &view.container else {
            done();
            return;
        };
        let props = if self.inner.viewport.mode().is_mobile() {
            Props::default().y_percent(100.0).opacity(0.0)
        } else {
            Props::default().opacity(0.0).y(20.0).scale(0.98)
        };
        self.inner.animator.animate(
            container,
            Tween::to(props).duration(300).ease(Easing::In),
            Some(Box::new(done)),
        );
    }

    fn finish_close(&self, id: PopupId) {
        let Some(unlock) = self.inner.state.borrow_mut().finish_close(id) else {
            debug!("Popup {} reopened before its exit finished", id);
            return;
        };
        if let Some(view) = self.inner.views.get(&id) {
            dom::remove_class(&view.root, "active");
        }
        let opener = self.inner.openers.borrow_mut().remove(&id).or_else(|| {
            dom::select_one(&self.inner.document, &format!(r#".block-item[data-prize="{}"]"#, id))
        });
        if unlock {
            self.lock_scroll(false);
            if let Some(opener) = opener {
                dom::focus(&opener);
            }
        }
        info!("Closed popup {}", id);
    }

    fn shake(&self, checkbox: &HtmlInputElement) {
        let animator = self.inner.animator.clone();
        let target: Element = checkbox.clone().into();
        let settle = target.clone();
        animator.animate(
            &target,
            Tween::from_to(Props::default().x(-5.0), Props::default().x(5.0))
                .duration(80)
                .yoyo(3),
            Some(Box::new({
                let animator = animator.clone();
                move || animator.animate(&settle, Tween::to(Props::default().x(0.0)).duration(80), None)
            })),
        );

        if let Ok(Some(row)) = checkbox.closest(".popup-checkbox") {
            animator.animate(
                &row,
                Tween::to(Props::default().background_color("rgba(255, 59, 48, 0.1)"))
                    .duration(300)
                    .yoyo(1),
                None,
            );
        }
    }

    /// Drops every listener, cancels scheduled auto-closes and clears the toast.
    pub fn detach(&self) {
        self.inner.listeners.borrow_mut().clear();
        self.inner.pending_closes.borrow_mut().clear();
        self.inner.before_open.borrow_mut().take();
        self.inner.toaster.dismiss();
    }
}

fn is_activation_key(event: &Event) -> bool {
    event
        .dyn_ref::<KeyboardEvent>()
        .map_or(false, |e| e.key() == "Enter" || e.key() == " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PopupState {
        PopupState::new(1..=7)
    }

    #[test]
    fn unknown_id_is_ignored() {
        let mut state = registry();
        assert_eq!(state.open(9), OpenOutcome::Ignored);
        assert_eq!(state.active(), None);
    }

    #[test]
    fn opening_another_evicts_the_first() {
        let mut state = registry();
        assert_eq!(state.open(3), OpenOutcome::Opened { evicted: None });
        assert_eq!(state.open(5), OpenOutcome::Opened { evicted: Some(3) });
        assert_eq!(state.active(), Some(5));
        assert!(state.is_closing(3));

        // The evicted popup finishing its exit must not touch the new one.
        assert_eq!(state.finish_close(3), Some(false));
        assert_eq!(state.active(), Some(5));
    }

    #[test]
    fn reopening_same_popup_is_noop() {
        let mut state = registry();
        state.open(2);
        assert_eq!(state.open(2), OpenOutcome::AlreadyOpen);
    }

    #[test]
    fn close_is_idempotent() {
        let mut state = registry();
        assert!(!state.begin_close(4));
        state.open(4);
        assert!(state.begin_close(4));
        assert!(!state.begin_close(4));
        assert_eq!(state.active(), Some(4), "active until the exit completes");
        assert_eq!(state.finish_close(4), Some(true));
        assert_eq!(state.active(), None);
        assert!(!state.begin_close(4));
        assert_eq!(state.finish_close(4), None);
    }

    #[test]
    fn reopen_during_exit_survives_the_late_completion() {
        let mut state = registry();
        state.open(1);
        state.begin_close(1);
        assert_eq!(state.open(1), OpenOutcome::Opened { evicted: None });
        assert_eq!(state.finish_close(1), None);
        assert_eq!(state.active(), Some(1));
    }

    #[test]
    fn reopen_during_auto_close_accepts_a_new_submit() {
        let mut state = registry();
        state.open(1);
        assert!(state.begin_submit(1));
        assert!(state.begin_close(1));
        assert_eq!(state.open(1), OpenOutcome::Opened { evicted: None });
        assert!(state.begin_submit(1), "reopened popup must take a new submit");
        assert!(!state.begin_submit(1));
    }

    #[test]
    fn evicting_a_closing_popup_does_not_replay_its_exit() {
        let mut state = registry();
        state.open(1);
        state.begin_close(1);
        assert_eq!(state.open(2), OpenOutcome::Opened { evicted: None });
        assert_eq!(state.finish_close(1), Some(false));
        assert_eq!(state.active(), Some(2));
    }

    #[test]
    fn submit_accepted_once_per_open() {
        let mut state = registry();
        assert!(!state.begin_submit(6));
        state.open(6);
        assert!(state.begin_submit(6));
        assert!(!state.begin_submit(6));
        state.begin_close(6);
        state.finish_close(6);
        state.open(6);
        assert!(state.begin_submit(6));
    }

    #[test]
    fn unchecked_terms_are_rejected() {
        assert_eq!(validate_submit(2, Some(false), 10), SubmitVerdict::Rejected);
        assert_eq!(
            validate_submit(2, Some(true), 10),
            SubmitVerdict::Accepted(SubmissionPayload {
                prize_id: 2,
                accepted_terms: true,
                timestamp: 10
            })
        );
        assert_eq!(
            validate_submit(2, None, 10),
            SubmitVerdict::Accepted(SubmissionPayload {
                prize_id: 2,
                accepted_terms: false,
                timestamp: 10
            })
        );
    }

    #[test]
    fn payload_field_names() {
        let payload = SubmissionPayload {
            prize_id: 4,
            accepted_terms: true,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["prize_id"], 4);
        assert_eq!(json["accepted_terms"], true);
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn focus_wraps_at_edges() {
        assert_eq!(trap_focus_target(Some(2), 3, false), Some(0));
        assert_eq!(trap_focus_target(Some(0), 3, true), Some(2));
        assert_eq!(trap_focus_target(Some(1), 3, false), None);
        assert_eq!(trap_focus_target(Some(1), 3, true), None);
        assert_eq!(trap_focus_target(None, 3, false), Some(0));
        assert_eq!(trap_focus_target(None, 3, true), Some(2));
        assert_eq!(trap_focus_target(Some(0), 1, false), Some(0));
        assert_eq!(trap_focus_target(None, 0, false), None);
    }
}
