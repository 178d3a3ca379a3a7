use log::{warn, Level};
use serde::Deserialize;
use web_sys::Document;

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug // Verbose interaction traces when running locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Id of the optional `<script type="application/json">` holding overrides.
pub const CONFIG_ELEMENT_ID: &str = "landing-config";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub terms_required: String,
    pub submit_success: String,
    pub rules_opening: String,
    pub image_fallback: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            terms_required: "Please accept the terms of the promotion".to_string(),
            submit_success: "Your request has been sent!".to_string(),
            rules_opening: "Opening the promotion rules...".to_string(),
            image_fallback: "Image".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub mobile_max_width: u32,
    pub tablet_max_width: u32,
    /// Re-apply the layout only when the device mode changes.
    pub layout_on_mode_change_only: bool,
    pub resize_throttle_ms: u32,
    pub scroll_throttle_ms: u32,

    pub countdown_seconds: u32,
    pub ring_radius: f64,

    pub sticky_threshold: f64,
    pub sticky_root_margin: String,
    pub sticky_show_offset: f64,

    pub reveal_threshold: f64,
    pub reveal_root_margin: String,
    pub lazy_root_margin: String,

    pub faq_padding: f64,
    pub legal_padding: f64,

    pub prize_count: u8,
    pub submit_close_delay_ms: u32,
    pub toast_duration_ms: u32,

    pub wheel_prize: u8,
    pub wheel_spin_ms: u32,
    pub results_url: String,

    pub messages: Messages,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 430,
            tablet_max_width: 768,
            layout_on_mode_change_only: false,
            resize_throttle_ms: 250,
            scroll_throttle_ms: 100,
            countdown_seconds: 300,
            ring_radius: 71.0,
            sticky_threshold: 0.1,
            sticky_root_margin: "-50px 0px 0px 0px".to_string(),
            sticky_show_offset: 100.0,
            reveal_threshold: 0.1,
            reveal_root_margin: "50px".to_string(),
            lazy_root_margin: "50px 0px".to_string(),
            faq_padding: 40.0,
            legal_padding: 50.0,
            prize_count: 7,
            submit_close_delay_ms: 1500,
            toast_duration_ms: 2000,
            wheel_prize: 5,
            wheel_spin_ms: 5000,
            results_url: "/content".to_string(),
            messages: Messages::default(),
        }
    }
}

impl LandingConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Reads overrides embedded in the page, falling back to defaults.
    pub fn load(document: &Document) -> Self {
        let raw = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
            .filter(|text| !text.trim().is_empty());

        match raw {
            Some(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid #{}: {}", CONFIG_ELEMENT_ID, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn is_valid_prize(&self, id: u8) -> bool {
        (1..=self.prize_count).contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LandingConfig::from_json(r#"{"countdown_seconds": 60, "messages": {"submit_success": "ok"}}"#)
            .unwrap();
        assert_eq!(config.countdown_seconds, 60);
        assert_eq!(config.mobile_max_width, 430);
        assert_eq!(config.messages.submit_success, "ok");
        assert_eq!(config.messages.terms_required, Messages::default().terms_required);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(LandingConfig::from_json("{countdown_seconds: }").is_err());
    }

    #[test]
    fn prize_range() {
        let config = LandingConfig::default();
        assert!(!config.is_valid_prize(0));
        assert!(config.is_valid_prize(1));
        assert!(config.is_valid_prize(7));
        assert!(!config.is_valid_prize(8));
    }
}
