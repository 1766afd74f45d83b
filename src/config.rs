use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGIN: &str = "https://yandex.ru";
pub const DEFAULT_STORE_PATH: &str = "data/companies.json";

const CAPTCHA_WAIT_SECS: u64 = 20;
const PHONE_RETRY_PAUSE_MS: u64 = 1000;
const SCROLL_STEP: u32 = 500;
const LARGE_REVIEW_COUNT: u32 = 150;
const LARGE_SCROLL_BUDGET: u32 = 100;
const SMALL_SCROLL_BUDGET: u32 = 30;

/// Everything tunable about a grab run. Every level is `#[serde(default)]`,
/// so a JSON override file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Scheme + host prepended to relative listing links.
    pub origin: String,
    pub selectors: SelectorConfig,
    pub captcha: CaptchaConfig,
    pub reviews: ReviewConfig,
    pub phone_retry_pause_ms: u64,
    /// External command for the challenge alert (program + args).
    /// `None` rings the terminal bell.
    pub alert_command: Option<Vec<String>>,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            selectors: SelectorConfig::default(),
            captcha: CaptchaConfig::default(),
            reviews: ReviewConfig::default(),
            phone_retry_pause_ms: PHONE_RETRY_PAUSE_MS,
            alert_command: None,
        }
    }
}

impl GrabConfig {
    /// Built-in defaults, overlaid with a JSON file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config JSON in {}", path.display()))
    }
}

/// Ordered selector fallbacks per field: the first selector that matches wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub name: Vec<String>,
    pub address: Vec<String>,
    pub url: Vec<String>,
    pub id: Vec<String>,
    pub id_attr: String,
    pub website_text: Vec<String>,
    pub website_link: Vec<String>,
    pub opening_hours: Vec<String>,
    pub showcase_names: String,
    pub showcase_prices: String,
    pub list_names: String,
    pub list_prices: String,
    pub phones: Vec<String>,
    pub phone_text_containers: String,
    pub categories: Vec<String>,
    pub rating: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            name: strings(&["h1.orgpage-header-view__header", "h1.card-title-view__title"]),
            address: strings(&[
                "div.business-contacts-view__address-link",
                "a.business-contacts-view__address-link",
                "div.orgpage-header-view__address",
            ]),
            url: strings(&["a.card-title-view__title-link", "a.orgpage-header-view__header-link"]),
            id: strings(&["div.business-card-view[data-id]", "div.orgpage-header-view[data-id]"]),
            id_attr: "data-id".to_string(),
            website_text: strings(&["span.business-urls-view__text"]),
            website_link: strings(&["a.business-urls-view__link"]),
            opening_hours: strings(&["meta[itemprop=\"openingHours\"]"]),
            showcase_names: "div.related-item-photo-view__title".to_string(),
            showcase_prices: "span.related-product-view__price".to_string(),
            list_names: "div.related-item-list-view__title".to_string(),
            list_prices: "div.related-item-list-view__price".to_string(),
            phones: strings(&[
                "span[itemprop=\"telephone\"]",
                "div[itemprop=\"telephone\"]",
                "a[itemprop=\"telephone\"]",
            ]),
            phone_text_containers: "span, div, a, p".to_string(),
            categories: strings(&[
                "a.business-categories-view__category",
                "a.orgpage-categories-info-view__link",
            ]),
            rating: strings(&[
                "div.business-card-title-view__header-rating span.business-rating-badge-view__rating-text",
                "div.orgpage-header-view span.business-rating-badge-view__rating-text",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Checkbox-style and advanced interactive challenge markers.
    pub markers: Vec<String>,
    pub wait_secs: u64,
    /// `None` keeps retrying until a human clears the challenge.
    pub max_attempts: Option<u32>,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            markers: strings(&[".CheckboxCaptcha", ".AdvancedCaptcha"]),
            wait_secs: CAPTCHA_WAIT_SECS,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub count: Vec<String>,
    pub body: String,
    pub tab: String,
    pub scroll_container: String,
    /// Which match of `scroll_container` holds the reviews; the first one is
    /// the outer sidebar.
    pub scroll_container_index: usize,
    pub scroll_step: u32,
    pub large_count: u32,
    pub large_budget: u32,
    pub small_budget: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            count: strings(&[
                "div.tabs-select-view__title._name_reviews div.tabs-select-view__counter",
                "span.business-header-rating-view__text",
            ]),
            body: "span.business-review-view__body-text".to_string(),
            tab: "div.tabs-select-view__title._name_reviews".to_string(),
            scroll_container: ".scroll__container".to_string(),
            scroll_container_index: 1,
            scroll_step: SCROLL_STEP,
            large_count: LARGE_REVIEW_COUNT,
            large_budget: LARGE_SCROLL_BUDGET,
            small_budget: SMALL_SCROLL_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = GrabConfig::load(None).unwrap();
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.captcha.wait_secs, 20);
        assert_eq!(config.reviews.large_budget, 100);
        assert_eq!(config.reviews.small_budget, 30);
        assert_eq!(config.reviews.scroll_container_index, 1);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: GrabConfig = serde_json::from_str(
            r#"{"origin": "https://example.org", "captcha": {"wait_secs": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.origin, "https://example.org");
        assert_eq!(config.captcha.wait_secs, 1);
        assert_eq!(config.captcha.markers.len(), 2);
        assert_eq!(config.reviews.scroll_step, 500);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = GrabConfig::load(Some(Path::new("tests/fixtures/does-not-exist.json")));
        assert!(err.is_err());
    }
}
