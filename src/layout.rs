use log::debug;
use web_sys::Document;

use crate::dom;
use crate::viewport::ViewportMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseImages {
    Optimized,
    Shown,
}

/// Visibility and affordances for one device mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutRules {
    pub desktop_text: bool,
    pub mobile_title_text: bool,
    pub block_btn: bool,
    pub clickable_blocks: bool,
    pub case_images: CaseImages,
}

impl LayoutRules {
    pub const fn for_mode(mode: ViewportMode) -> Self {
        match mode {
            ViewportMode::Mobile => Self {
                desktop_text: false,
                mobile_title_text: true,
                block_btn: false,
                clickable_blocks: true,
                case_images: CaseImages::Optimized,
            },
            ViewportMode::Tablet | ViewportMode::Desktop => Self {
                desktop_text: true,
                mobile_title_text: false,
                block_btn: true,
                clickable_blocks: false,
                case_images: CaseImages::Shown,
            },
        }
    }
}

pub struct LayoutPresenter {
    document: Document,
}

impl LayoutPresenter {
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
        }
    }

    fn each(&self, selector: &str, f: impl Fn(&web_sys::Element)) {
        for element in dom::select_all(&self.document, selector) {
            f(&element);
        }
    }

    pub fn apply(&self, mode: ViewportMode) {
        let rules = LayoutRules::for_mode(mode);
        debug!("Applying {} layout", mode.as_str());

        self.each(".desktop-text", |el| dom::set_visible(el, rules.desktop_text));
        self.each(".mobile-title-text", |el| dom::set_visible(el, rules.mobile_title_text));
        self.each(".block-btn", |el| dom::set_visible(el, rules.block_btn));
        self.each(".block-item", |el| {
            if rules.clickable_blocks {
                dom::set_style(el, "cursor", "pointer");
                let _ = el.set_attribute("role", "button");
            } else {
                dom::set_style(el, "cursor", "");
                let _ = el.remove_attribute("role");
            }
        });

        match rules.case_images {
            CaseImages::Optimized => self.optimize_mobile_images(),
            CaseImages::Shown => self.each(".case-image", |el| dom::set_visible(el, true)),
        }
    }

    fn optimize_mobile_images(&self) {
        self.each(".block-item .case-image", |el| {
            dom::set_styles(
                el,
                &[("max-width", "100%"), ("height", "auto"), ("object-fit", "contain")],
            );
        });
        self.each(".case-images", |el| {
            dom::set_styles(
                el,
                &[
                    ("width", "120px"),
                    ("height", "85px"),
                    ("display", "flex"),
                    ("justify-content", "center"),
                    ("align-items", "center"),
                ],
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_hides_desktop_affordances() {
        let rules = LayoutRules::for_mode(ViewportMode::Mobile);
        assert!(!rules.desktop_text);
        assert!(rules.mobile_title_text);
        assert!(!rules.block_btn);
        assert!(rules.clickable_blocks);
        assert_eq!(rules.case_images, CaseImages::Optimized);
    }

    #[test]
    fn tablet_and_desktop_share_rules() {
        let tablet = LayoutRules::for_mode(ViewportMode::Tablet);
        assert_eq!(tablet, LayoutRules::for_mode(ViewportMode::Desktop));
        assert!(tablet.desktop_text);
        assert!(!tablet.mobile_title_text);
        assert!(tablet.block_btn);
        assert!(!tablet.clickable_blocks);
        assert_eq!(tablet.case_images, CaseImages::Shown);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture() -> web_sys::Element {
        let document = dom::document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(
            r#"<p class="desktop-text">desktop</p>
               <p class="mobile-title-text">mobile</p>
               <div class="block-item"><div class="case-images"><img class="case-image"></div>
               <button class="block-btn">open</button></div>"#,
        );
        document.body().unwrap().append_child(&root).unwrap();
        root
    }

    #[wasm_bindgen_test]
    fn apply_is_idempotent_and_switches_back() {
        let root = fixture();
        let presenter = LayoutPresenter::new(&dom::document().unwrap());
        let block = dom::select_one_within(&root, ".block-item").unwrap();
        let button = dom::select_one_within(&root, ".block-btn").unwrap();

        presenter.apply(ViewportMode::Mobile);
        presenter.apply(ViewportMode::Mobile);
        assert_eq!(dom::style_value(&button, "display"), "none");
        assert_eq!(block.get_attribute("role").as_deref(), Some("button"));
        assert_eq!(dom::style_value(&block, "cursor"), "pointer");

        presenter.apply(ViewportMode::Desktop);
        assert_eq!(dom::style_value(&button, "display"), "");
        assert!(block.get_attribute("role").is_none());
        root.remove();
    }
}
