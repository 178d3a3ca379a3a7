use std::rc::Rc;

use yew::prelude::*;
use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::config::LandingConfig;
use crate::dom;

const SEGMENTS: u32 = 8;
const FULL_TURNS: u32 = 5;

/// Final rotation in degrees for landing on `prize` (1..=8).
pub fn wheel_angle(prize: u8) -> u32 {
    let index = u32::from(prize.clamp(1, SEGMENTS as u8)) - 1;
    360 * FULL_TURNS + (180 + (360 / SEGMENTS) * index) % 360
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpinPhase {
    Idle,
    Spinning,
    Finished,
}

fn restart_spin(image: &HtmlElement, angle: u32, spin_ms: u32) {
    let style = image.style();
    let _ = style.set_property("animation", "none");
    // Reading layout flushes the reset so the keyframes start over.
    let _ = image.offset_height();

    let root = dom::document()
        .ok()
        .and_then(|doc| doc.document_element())
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    match root {
        Some(root) => {
            let _ = root.style().set_property("--angle", &format!("{}deg", angle));
        }
        None => warn!("No root element to carry --angle"),
    }

    let seconds = f64::from(spin_ms) / 1000.0;
    let _ = style.set_property("animation", &format!("wheelFortune {}s ease-out forwards", seconds));
}

#[function_component(Wheel)]
pub fn wheel() -> Html {
    let config = use_memo(
        |_| {
            dom::document()
                .map(|doc| LandingConfig::load(&doc))
                .unwrap_or_default()
        },
        (),
    );
    let phase = use_state(|| SpinPhase::Idle);
    let spinning = use_mut_ref(|| false);
    let pending = use_mut_ref(|| None::<Timeout>);
    let wheel_image = use_node_ref();

    let on_spin = {
        let config = Rc::clone(&config);
        let phase = phase.clone();
        let wheel_image = wheel_image.clone();
        Callback::from(move |_: MouseEvent| {
            if *spinning.borrow() {
                debug!("Wheel already spinning");
                return;
            }
            let Some(image) = wheel_image.cast::<HtmlElement>() else {
                warn!("Wheel image not rendered");
                return;
            };
            *spinning.borrow_mut() = true;

            let angle = wheel_angle(config.wheel_prize);
            info!("Spinning wheel to {} degrees", angle);
            phase.set(SpinPhase::Spinning);
            restart_spin(&image, angle, config.wheel_spin_ms);

            let phase = phase.clone();
            let spinning = spinning.clone();
            *pending.borrow_mut() = Some(Timeout::new(config.wheel_spin_ms, move || {
                phase.set(SpinPhase::Finished);
                *spinning.borrow_mut() = false;
            }));
        })
    };

    let on_result = {
        let config = Rc::clone(&config);
        Callback::from(move |_: MouseEvent| {
            let Ok(window) = dom::window() else { return };
            if let Err(e) = window.open_with_url_and_target_and_features(
                &config.results_url,
                "_blank",
                "noopener,noreferrer,width=800,height=600",
            ) {
                warn!("Could not open results window: {:?}", e);
            }
        })
    };

    html! {
        <div class="wheel-page">
            <div id="wheelFortune" class="wheel" onclick={on_spin}>
                <img ref={wheel_image} class="wheel-image" src="/assets/wheel.png" alt="Prize wheel" />
                <div class="wheel-pointer"></div>
            </div>
            <p id="spinningText" class={classes!("spinning-text", (*phase == SpinPhase::Spinning).then_some("active"))}>
                {"Spinning..."}
            </p>
            <div id="resultContent" class={classes!("result-content", (*phase == SpinPhase::Finished).then_some("active"))}>
                <h2>{"You won!"}</h2>
                <button id="resultButton" onclick={on_result}>{"See your prize"}</button>
            </div>
            <style>
                {r#"
                .wheel {
                    cursor: pointer;
                    width: 320px;
                    margin: 40px auto;
                    position: relative;
                }
                .wheel-image {
                    width: 100%;
                }
                @keyframes wheelFortune {
                    from { transform: rotate(0deg); }
                    to { transform: rotate(var(--angle)); }
                }
                .spinning-text, .result-content {
                    display: none;
                    text-align: center;
                }
                .spinning-text.active, .result-content.active {
                    display: block;
                }
                "#}
            </style>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_for_every_segment() {
        let expected = [1980, 2025, 2070, 2115, 1800, 1845, 1890, 1935];
        for (prize, angle) in (1..=8u8).zip(expected) {
            assert_eq!(wheel_angle(prize), angle, "prize {}", prize);
        }
    }

    #[test]
    fn default_prize_lands_on_fifth_segment() {
        assert_eq!(wheel_angle(LandingConfig::default().wheel_prize), 1800);
    }

    #[test]
    fn out_of_range_prizes_clamp() {
        assert_eq!(wheel_angle(0), wheel_angle(1));
        assert_eq!(wheel_angle(12), wheel_angle(8));
    }
}
