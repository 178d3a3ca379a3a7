use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlImageElement, Window};

use crate::dom::{self, ListenerHandle, ObserverOptions};
use crate::reveal::OneShotTrigger;

/// Moves `data-src` into `src`. Returns false when there is nothing to load.
pub fn load_image(element: &Element) -> bool {
    let Some(src) = element.get_attribute("data-src").filter(|s| !s.is_empty()) else {
        return false;
    };
    match element.dyn_ref::<HtmlImageElement>() {
        Some(img) => img.set_src(&src),
        None => {
            let _ = element.set_attribute("src", &src);
        }
    }
    dom::remove_class(element, "lazy-load");
    dom::add_class(element, "loaded");
    debug!("Loaded {}", src);
    true
}

pub struct LazyImageLoader {
    trigger: OneShotTrigger,
}

impl LazyImageLoader {
    pub fn attach(
        window: &Window,
        document: &Document,
        options: &ObserverOptions,
        scroll_throttle_ms: u32,
    ) -> Self {
        let images = dom::select_all(document, "img.lazy-load");
        debug!("Lazy loading {} images", images.len());
        let trigger = OneShotTrigger::attach(
            window,
            images,
            |el| dom::has_class(el, "loaded"),
            options,
            scroll_throttle_ms,
            load_image,
        );
        Self { trigger }
    }

    pub fn disconnect(&self) {
        self.trigger.disconnect();
    }
}

/// Swaps broken images for a styled box carrying their alt text.
pub fn install_placeholders(document: &Document, fallback_text: &str) -> Vec<ListenerHandle> {
    let mut handles = Vec::new();
    for img in dom::select_all(document, "img") {
        let broken = img.clone();
        let doc = document.clone();
        let fallback = fallback_text.to_string();
        let handle = ListenerHandle::new(&img, "error", move |_| {
            replace_with_placeholder(&doc, &broken, &fallback);
        });
        match handle {
            Ok(handle) => handles.push(handle),
            Err(e) => warn!("Image error listener failed: {}", e),
        }
    }
    handles
}

fn replace_with_placeholder(document: &Document, img: &Element, fallback: &str) {
    let Ok(placeholder) = document.create_element("div") else { return };
    placeholder.set_class_name("image-placeholder");
    let alt = img
        .get_attribute("alt")
        .filter(|alt| !alt.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    placeholder.set_text_content(Some(&alt));
    dom::set_styles(
        &placeholder,
        &[
            ("background", "linear-gradient(135deg, #f5f5f5 0%, #e0e0e0 100%)"),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("color", "#666"),
            ("font-size", "14px"),
            ("text-align", "center"),
            ("padding", "20px"),
            ("border-radius", "4px"),
        ],
    );
    if img.replace_with_with_node_1(&placeholder).is_err() {
        warn!("Could not replace broken image");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn swaps_source_once() {
        let document = dom::document().unwrap();
        let img = document.create_element("img").unwrap();
        img.set_class_name("lazy-load");
        img.set_attribute("data-src", "/assets/prize-1.png").unwrap();

        assert!(load_image(&img));
        assert!(dom::has_class(&img, "loaded"));
        assert!(!dom::has_class(&img, "lazy-load"));
        assert!(img.dyn_ref::<HtmlImageElement>().unwrap().src().ends_with("/assets/prize-1.png"));
    }

    #[wasm_bindgen_test]
    fn missing_data_src_stays_pending() {
        let document = dom::document().unwrap();
        let img = document.create_element("img").unwrap();
        img.set_class_name("lazy-load");
        assert!(!load_image(&img));
        assert!(dom::has_class(&img, "lazy-load"));
    }
}
