//! The landing page's application context: builds every controller over the
//! rendered markup and tears them all down together.

use std::rc::Rc;

use log::info;
use web_sys::{Document, Window};

use crate::accordion::{AccordionGroup, AccordionStyle, GroupPolicy};
use crate::animator;
use crate::config::LandingConfig;
use crate::countdown::CountdownTimer;
use crate::dom::{self, ListenerHandle, ObserverOptions};
use crate::error::DomResult;
use crate::images::{self, LazyImageLoader};
use crate::intro;
use crate::layout::LayoutPresenter;
use crate::popup::PopupController;
use crate::reveal::RevealOnScroll;
use crate::sticky_header::StickyHeaderController;
use crate::toast::Toaster;
use crate::viewport::ViewportClassifier;

pub struct LandingApp {
    config: LandingConfig,
    viewport: ViewportClassifier,
    timer: CountdownTimer,
    sticky: Option<StickyHeaderController>,
    faq: AccordionGroup,
    legal: AccordionGroup,
    popups: PopupController,
    reveal: RevealOnScroll,
    lazy: LazyImageLoader,
    placeholders: Vec<ListenerHandle>,
}

impl LandingApp {
    pub fn start() -> DomResult<Self> {
        let window = dom::window()?;
        let document = dom::document()?;
        let config = LandingConfig::load(&document);
        Ok(Self::start_with(&window, &document, config))
    }

    pub fn start_with(window: &Window, document: &Document, config: LandingConfig) -> Self {
        let animator = animator::select(window, dom::prefers_reduced_motion(window));

        let viewport = ViewportClassifier::new(window, &config);
        let layout = Rc::new(LayoutPresenter::new(document));
        layout.apply(viewport.mode());
        viewport.subscribe({
            let layout = layout.clone();
            move |mode| layout.apply(mode)
        });
        if let Err(e) = viewport.attach() {
            log::warn!("Resize tracking disabled: {}", e);
        }

        let timer = CountdownTimer::new(document, &config, animator.clone());
        let sticky = StickyHeaderController::mount(window, document, &timer, animator.clone(), &config);
        timer.start();

        intro::play(document, animator.as_ref(), viewport.mode());

        let faq = AccordionGroup::mount(
            document,
            AccordionStyle::faq(config.faq_padding),
            GroupPolicy::SingleOpen,
            animator.clone(),
        );
        let legal = AccordionGroup::mount(
            document,
            AccordionStyle::legal(config.legal_padding),
            GroupPolicy::Independent,
            animator.clone(),
        );

        let toaster = Toaster::new(document, animator.clone(), viewport.clone(), config.toast_duration_ms);
        let popups = PopupController::mount(document, &config, animator.clone(), viewport.clone(), toaster);
        if let Some(sticky) = &sticky {
            let sticky = sticky.clone();
            popups.on_before_open(move || sticky.hide());
        }

        let reveal = RevealOnScroll::attach(
            window,
            document,
            animator.clone(),
            &ObserverOptions {
                threshold: config.reveal_threshold,
                root_margin: config.reveal_root_margin.clone(),
            },
            config.scroll_throttle_ms,
        );
        let lazy = LazyImageLoader::attach(
            window,
            document,
            &ObserverOptions {
                threshold: config.reveal_threshold,
                root_margin: config.lazy_root_margin.clone(),
            },
            config.scroll_throttle_ms,
        );
        let placeholders = images::install_placeholders(document, &config.messages.image_fallback);

        info!(
            "Landing page initialized ({} animator, {} mode)",
            animator.name(),
            viewport.mode().as_str()
        );
        Self {
            config,
            viewport,
            timer,
            sticky,
            faq,
            legal,
            popups,
            reveal,
            lazy,
            placeholders,
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &LandingConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn viewport(&self) -> &ViewportClassifier {
        &self.viewport
    }

    #[cfg(test)]
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[cfg(test)]
    pub fn popups(&self) -> &PopupController {
        &self.popups
    }

    /// Cancels the countdown, disconnects observers and detaches listeners.
    pub fn cleanup(mut self) {
        self.timer.cancel();
        self.viewport.detach();
        if let Some(sticky) = &self.sticky {
            sticky.disconnect();
        }
        self.faq.detach();
        self.legal.detach();
        self.popups.detach();
        self.reveal.disconnect();
        self.lazy.disconnect();
        self.placeholders.clear();
        info!("Landing page torn down");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use crate::popup::PRESSED_CLASS;
    use web_sys::{Event, HtmlElement, KeyboardEvent, KeyboardEventInit};

    wasm_bindgen_test_configure!(run_in_browser);

    const PAGE: &str = r#"
        <div class="timer-container"><span class="timer-value">05:00</span>
            <svg><circle class="progress-ring-circle" r="71"></circle></svg></div>
        <header id="fixedHeader" aria-hidden="true"><span class="fixed-timer-value"></span></header>
        <h1 class="desktop-text">Pick a prize</h1>
        <h1 class="mobile-title-text">Tap a prize</h1>
        <div class="block-item" data-prize="4" tabindex="0">Prize 4
            <button class="block-btn" data-prize="4">Get</button></div>
        <div class="popup-overlay" id="popup-4">
            <div class="popup-container">
                <button class="popup-close">x</button>
                <label class="popup-checkbox"><input type="checkbox"> I agree</label>
                <button class="popup-submit">Send</button>
            </div>
        </div>"#;

    fn mount_page() -> (Document, web_sys::Element) {
        let document = dom::document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(PAGE);
        document.body().unwrap().append_child(&root).unwrap();
        (document, root)
    }

    fn unlock_body(document: &Document) {
        let body = document.body().unwrap();
        dom::set_style(&body, "overflow", "");
        dom::remove_class(&body, "popup-open");
    }

    fn press(document: &Document, key: &str) {
        let init = KeyboardEventInit::new();
        init.set_key(key);
        let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
        document.dispatch_event(&event).unwrap();
    }

    #[wasm_bindgen_test]
    async fn mobile_block_opens_popup_and_escape_returns_focus() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());

        app.viewport().recompute(400);
        let mobile_title = dom::select_one_within(&root, ".mobile-title-text").unwrap();
        let button = dom::select_one_within(&root, ".block-btn").unwrap();
        assert_eq!(dom::style_value(&mobile_title, "display"), "");
        assert_eq!(dom::style_value(&button, "display"), "none");

        let block = dom::select_one_within(&root, r#".block-item[data-prize="4"]"#).unwrap();
        block.dyn_ref::<HtmlElement>().unwrap().focus().unwrap();
        block.dyn_ref::<HtmlElement>().unwrap().click();

        let popup = document.get_element_by_id("popup-4").unwrap();
        assert_eq!(app.popups().active(), Some(4));
        assert!(dom::has_class(&popup, "active"));
        let focused = document.active_element().unwrap();
        assert!(popup.contains(Some(focused.as_ref())));

        press(&document, "Escape");
        TimeoutFuture::new(500).await;
        assert_eq!(app.popups().active(), None);
        assert!(!dom::has_class(&popup, "active"));
        assert_eq!(document.active_element().unwrap(), block);

        app.cleanup();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn unchecked_submit_keeps_popup_open() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());

        app.popups().open(4, None);
        let submit = dom::select_one_within(&root, ".popup-submit").unwrap();
        submit.dyn_ref::<HtmlElement>().unwrap().click();
        TimeoutFuture::new(50).await;
        assert_eq!(app.popups().active(), Some(4));
        let toast = dom::select_one(&document, ".prize-message").unwrap();
        assert_eq!(toast.text_content().unwrap(), app.config().messages.terms_required);

        let checkbox = dom::select_one_within(&root, r#"input[type="checkbox"]"#).unwrap();
        checkbox.dyn_ref::<web_sys::HtmlInputElement>().unwrap().set_checked(true);
        submit.dyn_ref::<HtmlElement>().unwrap().click();
        submit.dyn_ref::<HtmlElement>().unwrap().click();
        assert_eq!(dom::select_all(&document, ".prize-message").len(), 1);
        let toast = dom::select_one(&document, ".prize-message").unwrap();
        assert_eq!(toast.text_content().unwrap(), app.config().messages.submit_success);

        TimeoutFuture::new(2500).await;
        assert_eq!(app.popups().active(), None);

        app.cleanup();
        for toast in dom::select_all(&document, ".prize-message") {
            toast.remove();
        }
        root.remove();
    }

    #[wasm_bindgen_test]
    fn countdown_mirrors_into_sticky_header() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());

        let mirror = dom::select_one_within(&root, ".fixed-timer-value").unwrap();
        assert_eq!(app.timer().formatted(), "05:00");
        assert_eq!(mirror.text_content().unwrap(), "05:00");

        app.cleanup();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn cleanup_stops_the_countdown_and_detaches_listeners() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());
        app.viewport().recompute(400);
        let popups = app.popups().clone();
        let timer_value = dom::select_one_within(&root, ".timer-value").unwrap();
        let block = dom::select_one_within(&root, ".block-item").unwrap();

        app.cleanup();
        TimeoutFuture::new(1100).await;
        assert_eq!(timer_value.text_content().unwrap(), "05:00");

        block.dyn_ref::<HtmlElement>().unwrap().click();
        assert_eq!(popups.active(), None);

        popups.open(4, None);
        press(&document, "Escape");
        TimeoutFuture::new(400).await;
        assert_eq!(popups.active(), Some(4));
        assert!(popups.is_open(4));

        unlock_body(&document);
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn cleanup_cancels_a_scheduled_auto_close() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());
        let popups = app.popups().clone();

        popups.open(4, None);
        let checkbox = dom::select_one_within(&root, r#"input[type="checkbox"]"#).unwrap();
        checkbox.dyn_ref::<web_sys::HtmlInputElement>().unwrap().set_checked(true);
        popups.submit(4);
        assert!(dom::select_one(&document, ".prize-message").is_some());

        app.cleanup();
        assert!(dom::select_one(&document, ".prize-message").is_none());

        TimeoutFuture::new(2500).await;
        assert_eq!(popups.active(), Some(4));
        assert!(popups.is_open(4));

        unlock_body(&document);
        root.remove();
    }

    #[wasm_bindgen_test]
    fn touch_feedback_uses_a_class_not_inline_opacity() {
        let (document, root) = mount_page();
        let window = dom::window().unwrap();
        let app = LandingApp::start_with(&window, &document, LandingConfig::default());
        app.viewport().recompute(400);

        let block = dom::select_one_within(&root, ".block-item").unwrap();
        let opacity = dom::style_value(&block, "opacity");

        block.dispatch_event(&Event::new("touchstart").unwrap()).unwrap();
        assert!(dom::has_class(&block, PRESSED_CLASS));
        assert_eq!(dom::style_value(&block, "opacity"), opacity);

        block.dispatch_event(&Event::new("touchend").unwrap()).unwrap();
        assert!(!dom::has_class(&block, PRESSED_CLASS));

        app.cleanup();
        root.remove();
    }
}
