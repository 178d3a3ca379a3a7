//! Tweening over DOM elements. GSAP is used when the page loaded it,
//! otherwise CSS transitions produce the same end states.

use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::info;
use serde::{Serialize, Serializer};
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Reflect;
use web_sys::{CssStyleDeclaration, Element, Window};

use crate::dom;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = gsap, js_name = to)]
    fn gsap_to(target: &JsValue, vars: &JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = gsap, js_name = fromTo)]
    fn gsap_from_to(target: &JsValue, from: &JsValue, to: &JsValue) -> JsValue;
}

pub type OnComplete = Box<dyn FnOnce()>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    Out,
    In,
    InOut,
    BackOut(f64),
}

impl Easing {
    pub fn gsap_name(&self) -> String {
        match self {
            Easing::Linear => "linear".to_string(),
            Easing::Out => "power2.out".to_string(),
            Easing::In => "power2.in".to_string(),
            Easing::InOut => "power2.inOut".to_string(),
            Easing::BackOut(overshoot) => format!("back.out({})", overshoot),
        }
    }

    pub fn css_name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Out => "ease-out",
            Easing::In => "ease-in",
            Easing::InOut => "ease-in-out",
            Easing::BackOut(_) => "cubic-bezier(0.34, 1.56, 0.64, 1)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Offset {
    Px(f64),
    Percent(f64),
}

impl Offset {
    fn css(&self) -> String {
        match self {
            Offset::Px(v) => format!("{}px", v),
            Offset::Percent(v) => format!("{}%", v),
        }
    }
}

impl Serialize for Offset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Offset::Px(v) => serializer.serialize_f64(*v),
            Offset::Percent(v) => serializer.serialize_str(&format!("{}%", v)),
        }
    }
}

/// Animatable properties. Unset fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Props {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Offset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Offset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dashoffset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl Props {
    pub fn opacity(mut self, value: f64) -> Self {
        self.opacity = Some(value);
        self
    }

    pub fn x(mut self, px: f64) -> Self {
        self.x = Some(Offset::Px(px));
        self
    }

    pub fn y(mut self, px: f64) -> Self {
        self.y = Some(Offset::Px(px));
        self
    }

    pub fn y_percent(mut self, percent: f64) -> Self {
        self.y = Some(Offset::Percent(percent));
        self
    }

    pub fn scale(mut self, value: f64) -> Self {
        self.scale = Some(value);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn max_height(mut self, px: f64) -> Self {
        self.max_height = Some(px);
        self
    }

    pub fn stroke_dashoffset(mut self, value: f64) -> Self {
        self.stroke_dashoffset = Some(value);
        self
    }

    pub fn color(mut self, value: &str) -> Self {
        self.color = Some(value.to_string());
        self
    }

    pub fn background_color(mut self, value: &str) -> Self {
        self.background_color = Some(value.to_string());
        self
    }

    fn transform(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.x.is_some() || self.y.is_some() {
            let x = self.x.unwrap_or(Offset::Px(0.0)).css();
            let y = self.y.unwrap_or(Offset::Px(0.0)).css();
            parts.push(format!("translate({}, {})", x, y));
        }
        if let Some(scale) = self.scale {
            parts.push(format!("scale({})", scale));
        }
        if let Some(rotation) = self.rotation {
            parts.push(format!("rotate({}deg)", rotation));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Inline CSS equivalent of these properties.
    pub fn css_declarations(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(opacity) = self.opacity {
            out.push(("opacity", opacity.to_string()));
        }
        if let Some(transform) = self.transform() {
            out.push(("transform", transform));
        }
        if let Some(height) = self.max_height {
            out.push(("max-height", format!("{}px", height)));
        }
        if let Some(offset) = self.stroke_dashoffset {
            out.push(("stroke-dashoffset", offset.to_string()));
        }
        if let Some(color) = &self.color {
            out.push(("color", color.clone()));
        }
        if let Some(color) = &self.background_color {
            out.push(("background-color", color.clone()));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub from: Option<Props>,
    pub to: Props,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub easing: Easing,
    pub repeat: u32,
    pub yoyo: bool,
}

impl Tween {
    pub fn to(props: Props) -> Self {
        Self {
            from: None,
            to: props,
            duration_ms: 300,
            delay_ms: 0,
            easing: Easing::Out,
            repeat: 0,
            yoyo: false,
        }
    }

    pub fn from_to(from: Props, to: Props) -> Self {
        Self {
            from: Some(from),
            ..Self::to(to)
        }
    }

    pub fn duration(mut self, ms: u32) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn delay(mut self, ms: u32) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn yoyo(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self.yoyo = true;
        self
    }

    /// Wall-clock length including delay and repeats.
    #[cfg(test)]
    pub fn total_ms(&self) -> u32 {
        self.delay_ms + self.duration_ms * (self.repeat + 1)
    }
}

pub trait Animator {
    fn animate(&self, target: &Element, tween: Tween, on_complete: Option<OnComplete>);

    fn name(&self) -> &'static str;
}

/// Picks the animator once for the lifetime of the page.
pub fn select(window: &Window, reduced_motion: bool) -> Rc<dyn Animator> {
    let animator: Rc<dyn Animator> = if !reduced_motion && dom::has_global(window, "gsap") {
        Rc::new(GsapAnimator)
    } else {
        Rc::new(TransitionAnimator::new(reduced_motion))
    };
    info!("Using {} animator", animator.name());
    animator
}

#[derive(Serialize)]
struct GsapVars<'a> {
    #[serde(flatten)]
    props: &'a Props,
    duration: f64,
    delay: f64,
    ease: String,
    repeat: u32,
    yoyo: bool,
}

pub struct GsapAnimator;

impl GsapAnimator {
    fn to_js<T: Serialize>(value: &T) -> Option<JsValue> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        value.serialize(&serializer).ok()
    }
}

impl Animator for GsapAnimator {
    fn animate(&self, target: &Element, tween: Tween, on_complete: Option<OnComplete>) {
        let vars = GsapVars {
            props: &tween.to,
            duration: f64::from(tween.duration_ms) / 1000.0,
            delay: f64::from(tween.delay_ms) / 1000.0,
            ease: tween.easing.gsap_name(),
            repeat: tween.repeat,
            yoyo: tween.yoyo,
        };
        let Some(vars) = Self::to_js(&vars) else {
            log::warn!("Could not build tween vars, skipping animation");
            if let Some(done) = on_complete {
                done();
            }
            return;
        };
        if let Some(done) = on_complete {
            let _ = Reflect::set(&vars, &JsValue::from_str("onComplete"), &Closure::once_into_js(done));
        }

        let target: &JsValue = target.as_ref();
        match tween.from.as_ref().and_then(Self::to_js) {
            Some(from) => {
                gsap_from_to(target, &from, &vars);
            }
            None => {
                gsap_to(target, &vars);
            }
        }
    }

    fn name(&self) -> &'static str {
        "gsap"
    }
}

type Frame = Vec<(&'static str, String)>;

/// CSS-transition fallback. With reduced motion every transition is instant.
pub struct TransitionAnimator {
    reduced_motion: bool,
}

impl TransitionAnimator {
    pub fn new(reduced_motion: bool) -> Self {
        Self { reduced_motion }
    }

    fn apply(style: &CssStyleDeclaration, frame: &Frame) {
        for (property, value) in frame {
            let _ = style.set_property(property, value);
        }
    }

    fn current(style: &CssStyleDeclaration, frame: &Frame) -> Frame {
        frame
            .iter()
            .map(|(property, _)| (*property, style.get_property_value(property).unwrap_or_default()))
            .collect()
    }

    /// Plays one leg per cycle, alternating between frames when yoyo is set.
    fn play(
        style: CssStyleDeclaration,
        frames: Rc<(Frame, Frame)>,
        step: u32,
        tween: Rc<Tween>,
        duration_ms: u32,
        on_complete: Option<OnComplete>,
    ) {
        let frame = if tween.yoyo && step % 2 == 1 { &frames.0 } else { &frames.1 };
        Self::apply(&style, frame);

        let wait = if step == 0 { duration_ms + tween.delay_ms } else { duration_ms };
        Timeout::new(wait, move || {
            if step < tween.repeat {
                if step == 0 {
                    let _ = style.set_property("transition-delay", "0ms");
                }
                Self::play(style, frames, step + 1, tween, duration_ms, on_complete);
            } else if let Some(done) = on_complete {
                done();
            }
        })
        .forget();
    }
}

impl Animator for TransitionAnimator {
    fn animate(&self, target: &Element, tween: Tween, on_complete: Option<OnComplete>) {
        let Some(style) = dom::style_of(target) else {
            if let Some(done) = on_complete {
                done();
            }
            return;
        };

        let duration_ms = if self.reduced_motion { 0 } else { tween.duration_ms };
        let end = tween.to.css_declarations();
        let start = match &tween.from {
            Some(from) => {
                let start = from.css_declarations();
                let _ = style.set_property("transition", "none");
                Self::apply(&style, &start);
                // Flush styles so the transition starts from `start`.
                let _ = target.get_bounding_client_rect();
                start
            }
            None => Self::current(&style, &end),
        };

        let delay_ms = if self.reduced_motion { 0 } else { tween.delay_ms };
        let _ = style.set_property(
            "transition",
            &format!("all {}ms {} {}ms", duration_ms, tween.easing.css_name(), delay_ms),
        );

        let tween = Rc::new(Tween { delay_ms, ..tween });
        Self::play(style, Rc::new((start, end)), 0, tween, duration_ms, on_complete);
    }

    fn name(&self) -> &'static str {
        "css-transition"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_combines_parts_in_order() {
        let props = Props::default().y(30.0).scale(0.95).rotation(-10.0);
        assert_eq!(
            props.css_declarations(),
            vec![("transform", "translate(0px, 30px) scale(0.95) rotate(-10deg)".to_string())]
        );
    }

    #[test]
    fn percent_offsets_and_plain_values() {
        let props = Props::default()
            .opacity(0.0)
            .y_percent(100.0)
            .max_height(120.0)
            .stroke_dashoffset(12.5);
        assert_eq!(
            props.css_declarations(),
            vec![
                ("opacity", "0".to_string()),
                ("transform", "translate(0px, 100%)".to_string()),
                ("max-height", "120px".to_string()),
                ("stroke-dashoffset", "12.5".to_string()),
            ]
        );
    }

    #[test]
    fn empty_props_produce_nothing() {
        assert!(Props::default().css_declarations().is_empty());
    }

    #[test]
    fn gsap_vars_use_seconds_and_camel_case() {
        let props = Props::default().y_percent(100.0).stroke_dashoffset(3.0);
        let vars = GsapVars {
            props: &props,
            duration: 0.3,
            delay: 0.0,
            ease: Easing::BackOut(1.7).gsap_name(),
            repeat: 0,
            yoyo: false,
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["y"], "100%");
        assert_eq!(json["strokeDashoffset"], 3.0);
        assert_eq!(json["ease"], "back.out(1.7)");
        assert!(json.get("opacity").is_none());
    }

    #[test]
    fn total_time_counts_repeats() {
        let tween = Tween::to(Props::default().color("#ff3333")).duration(300).yoyo(3);
        assert_eq!(tween.total_ms(), 1200);
        assert_eq!(tween.delay(100).total_ms(), 1300);
    }
}
