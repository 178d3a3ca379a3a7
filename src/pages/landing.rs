use yew::prelude::*;
use log::{error, info};

use crate::app::LandingApp;

struct Prize {
    id: u8,
    title: &'static str,
    short: &'static str,
    image: &'static str,
}

const PRIZES: [Prize; 7] = [
    Prize { id: 1, title: "Wireless headphones", short: "Headphones", image: "/assets/prize-1.png" },
    Prize { id: 2, title: "Smart watch", short: "Watch", image: "/assets/prize-2.png" },
    Prize { id: 3, title: "Portable speaker", short: "Speaker", image: "/assets/prize-3.png" },
    Prize { id: 4, title: "Coffee machine", short: "Coffee", image: "/assets/prize-4.png" },
    Prize { id: 5, title: "Fitness tracker", short: "Tracker", image: "/assets/prize-5.png" },
    Prize { id: 6, title: "E-book reader", short: "Reader", image: "/assets/prize-6.png" },
    Prize { id: 7, title: "Gift card", short: "Gift card", image: "/assets/prize-7.png" },
];

const FAQ: [(&str, &str); 4] = [
    ("How do I claim a prize?", "Pick a prize, accept the rules and press the button in the window that opens."),
    ("How long is the offer valid?", "Until the timer at the top of the page runs out."),
    ("Can I pick more than one prize?", "Only one prize can be claimed per visit."),
    ("Is there any cost?", "No. Claiming a prize is free."),
];

const LEGAL: [(&str, &str); 2] = [
    ("Promotion rules", "The promotion is open to adult residents. One prize per participant. Prizes cannot be exchanged for cash."),
    ("Personal data", "Data entered on this page is only used to deliver the selected prize."),
];

fn prize_block(prize: &Prize) -> Html {
    html! {
        <div class="block-item" data-prize={prize.id.to_string()} tabindex="0">
            <div class="case-images">
                <img
                    class="case-image lazy-load"
                    data-src={prize.image}
                    alt={prize.title}
                />
            </div>
            <h3 class="desktop-text">{prize.title}</h3>
            <h3 class="mobile-title-text">{prize.short}</h3>
            <button class="block-btn" data-prize={prize.id.to_string()}>
                {"Get prize"}
            </button>
        </div>
    }
}

fn prize_popup(prize: &Prize) -> Html {
    html! {
        <div class="popup-overlay" id={format!("popup-{}", prize.id)}>
            <div class="popup-container" role="dialog" aria-modal="true">
                <button class="popup-close" aria-label="Close">{"×"}</button>
                <h2>{format!("Your prize: {}", prize.title)}</h2>
                <label class="popup-checkbox">
                    <input type="checkbox" />
                    {" I accept the "}
                    <a href="#rules" class="popup-rules-link">{"promotion rules"}</a>
                </label>
                <button class="popup-submit">{"Claim"}</button>
            </div>
        </div>
    }
}

#[function_component(Landing)]
pub fn landing() -> Html {
    use_effect_with_deps(
        move |_| {
            let app = match LandingApp::start() {
                Ok(app) => Some(app),
                Err(e) => {
                    error!("Landing page failed to start: {}", e);
                    None
                }
            };
            move || {
                if let Some(app) = app {
                    info!("Leaving landing page");
                    app.cleanup();
                }
            }
        },
        (),
    );

    html! {
        <div class="landing-page">
            <header id="fixedHeader" class="fixed-header" aria-hidden="true">
                <span class="fixed-header-label">{"Offer ends in"}</span>
                <span class="fixed-timer-value">{"05:00"}</span>
            </header>

            <section class="top-section">
                <div class="header-center">
                    <h1>{"Choose your prize"}</h1>
                    <p>{"Every visitor gets one. Pick before the timer runs out."}</p>
                </div>
                <div class="timer-container">
                    <div class="timer-circle">
                        <svg class="progress-ring" width="160" height="160">
                            <circle
                                class="progress-ring-circle"
                                r="71"
                                cx="80"
                                cy="80"
                                fill="transparent"
                                stroke="#04D903"
                                stroke-width="6"
                            />
                        </svg>
                        <span class="timer-value">{"05:00"}</span>
                    </div>
                </div>
            </section>

            <section class="blocks">
                { for PRIZES.iter().map(prize_block) }
            </section>

            <section class="faq-block">
                <h2>{"Questions"}</h2>
                { for FAQ.iter().map(|(question, answer)| html! {
                    <div class="faq-item" aria-expanded="false">
                        <div class="faq-question" tabindex="0" role="button">
                            <span>{*question}</span>
                            <span class="faq-toggle">{"+"}</span>
                        </div>
                        <div class="faq-answer">
                            <div class="faq-answer-content">{*answer}</div>
                        </div>
                    </div>
                }) }
            </section>

            <section class="legal-block" id="rules">
                { for LEGAL.iter().map(|(question, text)| html! {
                    <div class="legal-item" aria-expanded="false">
                        <div class="legal-question" tabindex="0" role="button">
                            <span>{*question}</span>
                            <span class="legal-toggle">{"›"}</span>
                        </div>
                        <div class="legal-answer">
                            <div class="legal-content">{*text}</div>
                        </div>
                    </div>
                }) }
            </section>

            { for PRIZES.iter().map(prize_popup) }

            <style>
                {r#"
                .fixed-header {
                    position: fixed;
                    top: 0;
                    left: 0;
                    right: 0;
                    display: none;
                    justify-content: center;
                    gap: 12px;
                    padding: 10px;
                    background: #111;
                    color: white;
                    z-index: 1000;
                }
                .fixed-header.visible {
                    display: flex;
                }
                .timer-circle {
                    position: relative;
                    width: 160px;
                    height: 160px;
                    margin: 0 auto;
                }
                .progress-ring-circle {
                    transform: rotate(-90deg);
                    transform-origin: 50% 50%;
                }
                .timer-value {
                    position: absolute;
                    inset: 0;
                    display: flex;
                    align-items: center;
                    justify-content: center;
                    font-size: 32px;
                }
                .blocks {
                    display: grid;
                    grid-template-columns: repeat(auto-fill, minmax(140px, 1fr));
                    gap: 16px;
                }
                .block-item.pressed {
                    filter: brightness(0.92);
                }
                .faq-answer, .legal-answer {
                    max-height: 0;
                    overflow: hidden;
                }
                .popup-overlay {
                    position: fixed;
                    inset: 0;
                    display: none;
                    align-items: center;
                    justify-content: center;
                    background: rgba(0, 0, 0, 0.6);
                    z-index: 2000;
                }
                .popup-overlay.active {
                    display: flex;
                }
                .popup-container {
                    background: white;
                    border-radius: 12px;
                    padding: 24px;
                    max-width: 420px;
                    width: 100%;
                }
                @media (max-width: 430px) {
                    .popup-overlay {
                        align-items: flex-end;
                    }
                    .popup-container {
                        border-radius: 12px 12px 0 0;
                    }
                }
                "#}
            </style>
        </div>
    }
}
