use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, KeyboardEvent};

use crate::animator::{Animator, Easing, Props, Tween};
use crate::dom::{self, ListenerHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupPolicy {
    /// Opening an item closes every other one.
    SingleOpen,
    Independent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccordionChange {
    Open(usize),
    Close(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccordionState {
    policy: GroupPolicy,
    open: BTreeSet<usize>,
}

impl AccordionState {
    pub fn new(policy: GroupPolicy) -> Self {
        Self {
            policy,
            open: BTreeSet::new(),
        }
    }

    /// Seeds items that start expanded. A single-open group keeps only the first.
    pub fn with_open(policy: GroupPolicy, initially_open: impl IntoIterator<Item = usize>) -> Self {
        let mut state = Self::new(policy);
        for id in initially_open {
            if policy == GroupPolicy::SingleOpen && !state.open.is_empty() {
                break;
            }
            state.open.insert(id);
        }
        state
    }

    pub fn is_open(&self, id: usize) -> bool {
        self.open.contains(&id)
    }

    #[cfg(test)]
    pub fn open_items(&self) -> impl Iterator<Item = usize> + '_ {
        self.open.iter().copied()
    }

    /// Applies a toggle and returns the changes in the order they must be rendered.
    pub fn toggle(&mut self, id: usize) -> Vec<AccordionChange> {
        let mut changes = Vec::new();
        if self.policy == GroupPolicy::SingleOpen {
            let others: Vec<usize> = self.open.iter().copied().filter(|other| *other != id).collect();
            for other in others {
                self.open.remove(&other);
                changes.push(AccordionChange::Close(other));
            }
        }
        if self.open.remove(&id) {
            changes.push(AccordionChange::Close(id));
        } else {
            self.open.insert(id);
            changes.push(AccordionChange::Open(id));
        }
        changes
    }
}

/// Selectors and cosmetic constants for one accordion flavour.
#[derive(Clone, Debug, PartialEq)]
pub struct AccordionStyle {
    pub name: &'static str,
    pub item: &'static str,
    pub trigger: &'static str,
    pub panel: &'static str,
    pub content: &'static str,
    pub toggle: &'static str,
    pub padding: f64,
    pub open_rotation: f64,
    pub closed_rotation: f64,
}

impl AccordionStyle {
    pub fn faq(padding: f64) -> Self {
        Self {
            name: "faq",
            item: ".faq-item",
            trigger: ".faq-question",
            panel: ".faq-answer",
            content: ".faq-answer-content",
            toggle: ".faq-toggle",
            padding,
            open_rotation: 45.0,
            closed_rotation: 0.0,
        }
    }

    pub fn legal(padding: f64) -> Self {
        Self {
            name: "legal",
            item: ".legal-item",
            trigger: ".legal-question",
            panel: ".legal-answer",
            content: ".legal-content",
            toggle: ".legal-toggle",
            padding,
            open_rotation: 270.0,
            closed_rotation: 90.0,
        }
    }
}

struct AccordionItem {
    root: Element,
    trigger: Option<Element>,
    panel: Option<Element>,
    content: Option<Element>,
    toggle: Option<Element>,
}

struct AccordionInner {
    style: AccordionStyle,
    items: Vec<AccordionItem>,
    state: RefCell<AccordionState>,
    animator: Rc<dyn Animator>,
    listeners: RefCell<Vec<ListenerHandle>>,
}

#[derive(Clone)]
pub struct AccordionGroup {
    inner: Rc<AccordionInner>,
}

impl AccordionGroup {
    pub fn mount(
        document: &Document,
        style: AccordionStyle,
        policy: GroupPolicy,
        animator: Rc<dyn Animator>,
    ) -> Self {
        let items: Vec<AccordionItem> = dom::select_all(document, style.item)
            .into_iter()
            .map(|root| AccordionItem {
                trigger: dom::select_one_within(&root, style.trigger),
                panel: dom::select_one_within(&root, style.panel),
                content: dom::select_one_within(&root, style.content),
                toggle: dom::select_one_within(&root, style.toggle),
                root,
            })
            .collect();
        if items.is_empty() {
            warn!("No {} accordion items ({}) found", style.name, style.item);
        }

        let initially_open = items
            .iter()
            .enumerate()
            .filter(|(_, item)| dom::has_class(&item.root, "active"))
            .map(|(id, _)| id)
            .collect::<Vec<_>>();

        let group = Self {
            inner: Rc::new(AccordionInner {
                state: RefCell::new(AccordionState::with_open(policy, initially_open)),
                style,
                items,
                animator,
                listeners: RefCell::new(Vec::new()),
            }),
        };
        group.bind();
        group
    }

    fn from_weak(weak: &Weak<AccordionInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn bind(&self) {
        let mut listeners = Vec::new();
        for (id, item) in self.inner.items.iter().enumerate() {
            let Some(trigger) = &item.trigger else { continue };

            let weak = Rc::downgrade(&self.inner);
            let click = ListenerHandle::new(trigger, "click", move |event| {
                event.prevent_default();
                if let Some(group) = Self::from_weak(&weak) {
                    group.toggle(id);
                }
            });

            let weak = Rc::downgrade(&self.inner);
            let keydown = ListenerHandle::new(trigger, "keydown", move |event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|e| e.key()) else { return };
                if key == "Enter" || key == " " {
                    event.prevent_default();
                    if let Some(group) = Self::from_weak(&weak) {
                        group.toggle(id);
                    }
                }
            });

            for handle in [click, keydown] {
                match handle {
                    Ok(handle) => listeners.push(handle),
                    Err(e) => warn!("{} accordion listener failed: {}", self.inner.style.name, e),
                }
            }
        }
        *self.inner.listeners.borrow_mut() = listeners;
    }

    pub fn is_open(&self, id: usize) -> bool {
        self.inner.state.borrow().is_open(id)
    }

    pub fn toggle(&self, id: usize) {
        if id >= self.inner.items.len() {
            return;
        }
        let changes = self.inner.state.borrow_mut().toggle(id);
        for change in changes {
            match change {
                AccordionChange::Open(id) => self.render_open(id),
                AccordionChange::Close(id) => self.render_close(id),
            }
        }
    }

    fn render_open(&self, id: usize) {
        let style = &self.inner.style;
        let item = &self.inner.items[id];
        debug!("Opening {} item {}", style.name, id);

        dom::add_class(&item.root, "active");
        let _ = item.root.set_attribute("aria-expanded", "true");

        if let Some(toggle) = &item.toggle {
            self.rotate(toggle, style.open_rotation);
        }
        if let Some(panel) = &item.panel {
            let content_height = item
                .content
                .as_ref()
                .and_then(|c| c.dyn_ref::<web_sys::HtmlElement>().map(|h| h.offset_height()))
                .unwrap_or(0);
            self.inner.animator.animate(
                panel,
                Tween::to(Props::default().max_height(f64::from(content_height) + style.padding))
                    .duration(400)
                    .ease(Easing::Out),
                None,
            );
        }
    }

    fn render_close(&self, id: usize) {
        let style = &self.inner.style;
        let item = &self.inner.items[id];
        debug!("Closing {} item {}", style.name, id);

        if let Some(toggle) = &item.toggle {
            self.rotate(toggle, style.closed_rotation);
        }

        let weak = Rc::downgrade(&self.inner);
        let finish = move || {
            let Some(group) = Self::from_weak(&weak) else { return };
            // Reopened while collapsing.
            if group.is_open(id) {
                return;
            }
            let root = &group.inner.items[id].root;
            dom::remove_class(root, "active");
            let _ = root.set_attribute("aria-expanded", "false");
        };

        match &item.panel {
            Some(panel) => self.inner.animator.animate(
                panel,
                Tween::to(Props::default().max_height(0.0))
                    .duration(400)
                    .ease(Easing::Out),
                Some(Box::new(finish)),
            ),
            None => finish(),
        }
    }

    fn rotate(&self, toggle: &Element, degrees: f64) {
        self.inner.animator.animate(
            toggle,
            Tween::to(Props::default().rotation(degrees))
                .duration(300)
                .ease(Easing::InOut),
            None,
        );
    }

    pub fn detach(&self) {
        self.inner.listeners.borrow_mut().clear();
    }
}
