use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::warn;
use web_sys::Document;

use crate::animator::{Animator, Easing, Props, Tween};
use crate::dom;
use crate::viewport::ViewportClassifier;

/// Transient `.prize-message` notice. Only one is on screen at a time.
#[derive(Clone)]
pub struct Toaster {
    document: Document,
    animator: Rc<dyn Animator>,
    viewport: ViewportClassifier,
    lifetime_ms: u32,
    /// Lifetime of the message on screen; replaced by every `show`.
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Toaster {
    pub fn new(
        document: &Document,
        animator: Rc<dyn Animator>,
        viewport: ViewportClassifier,
        lifetime_ms: u32,
    ) -> Self {
        Self {
            document: document.clone(),
            animator,
            viewport,
            lifetime_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn show(&self, text: &str) {
        self.pending.borrow_mut().take();
        for previous in dom::select_all(&self.document, ".prize-message") {
            previous.remove();
        }
        let Some(body) = self.document.body() else {
            warn!("Cannot show message without <body>");
            return;
        };
        let message = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                warn!("Failed to create message element: {:?}", e);
                return;
            }
        };
        message.set_class_name("prize-message");
        let _ = message.set_attribute("role", "alert");
        let _ = message.set_attribute("aria-live", "polite");
        message.set_text_content(Some(text));

        let mobile = self.viewport.mode().is_mobile();
        dom::set_styles(
            &message,
            &[
                ("position", "fixed"),
                ("top", if mobile { "10px" } else { "20px" }),
                ("right", if mobile { "10px" } else { "20px" }),
                ("left", if mobile { "10px" } else { "auto" }),
                ("background", "linear-gradient(133.66deg, #04D903 0%, #0FA8E0 97.76%)"),
                ("color", "white"),
                ("padding", if mobile { "8px 12px" } else { "12px 24px" }),
                ("border-radius", "8px"),
                ("font-size", if mobile { "12px" } else { "15px" }),
                ("box-shadow", "0 4px 12px rgba(0, 80, 255, 0.3)"),
                ("z-index", "10001"),
                ("max-width", if mobile { "calc(100% - 20px)" } else { "350px" }),
                ("pointer-events", "none"),
                ("text-align", "center"),
            ],
        );
        if let Err(e) = body.append_child(&message) {
            warn!("Failed to attach message: {:?}", e);
            return;
        }

        let animator = self.animator.clone();
        let lifetime_ms = self.lifetime_ms;
        let pending = Rc::clone(&self.pending);
        let target = message.clone();
        self.animator.animate(
            &target,
            Tween::from_to(
                Props::default().opacity(0.0).y(-20.0).scale(0.8),
                Props::default().opacity(1.0).y(0.0).scale(1.0),
            )
            .duration(300)
            .ease(Easing::BackOut(1.7)),
            Some(Box::new(move || {
                // Replaced or dismissed while animating in.
                if !message.is_connected() {
                    return;
                }
                let timeout = Timeout::new(lifetime_ms, move || {
                    let fading = message.clone();
                    animator.animate(
                        &fading,
                        Tween::to(Props::default().opacity(0.0).y(-20.0))
                            .duration(300)
                            .ease(Easing::In),
                        Some(Box::new(move || message.remove())),
                    );
                });
                *pending.borrow_mut() = Some(timeout);
            })),
        );
    }

    /// Removes the message on screen and cancels its scheduled fade-out.
    pub fn dismiss(&self) {
        self.pending.borrow_mut().take();
        for message in dom::select_all(&self.document, ".prize-message") {
            message.remove();
        }
    }

    #[cfg(test)]
    fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use crate::animator::TransitionAnimator;
    use crate::config::LandingConfig;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn toaster(lifetime_ms: u32) -> (Document, Toaster) {
        let window = dom::window().unwrap();
        let document = dom::document().unwrap();
        let viewport = ViewportClassifier::new(&window, &LandingConfig::default());
        let toaster = Toaster::new(&document, Rc::new(TransitionAnimator::new(true)), viewport, lifetime_ms);
        (document, toaster)
    }

    #[wasm_bindgen_test]
    async fn newer_message_replaces_older_and_expires() {
        let (document, toaster) = toaster(50);
        toaster.show("first");
        toaster.show("second");

        let shown = dom::select_all(&document, ".prize-message");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].text_content().unwrap(), "second");
        assert_eq!(shown[0].get_attribute("role").as_deref(), Some("alert"));

        TimeoutFuture::new(300).await;
        assert!(dom::select_one(&document, ".prize-message").is_none());
    }

    #[wasm_bindgen_test]
    async fn dismiss_drops_the_scheduled_fade() {
        let (document, toaster) = toaster(10_000);
        toaster.show("hello");
        TimeoutFuture::new(50).await;
        assert!(toaster.has_pending());

        toaster.dismiss();
        assert!(!toaster.has_pending());
        assert!(dom::select_one(&document, ".prize-message").is_none());
    }

    #[wasm_bindgen_test]
    async fn dismiss_during_entrance_schedules_nothing() {
        let (_, toaster) = toaster(10_000);
        toaster.show("hello");
        toaster.dismiss();
        TimeoutFuture::new(50).await;
        assert!(!toaster.has_pending());
    }
}
