use anyhow::Result;
use scraper::{Html, Selector};

use crate::config::SelectorConfig;
use crate::parser::dom::{all_matches, compile_all, element_text, first_attr, first_text};
use crate::parser::{or_default, ExtractError};

/// Single-valued listing fields: name, address, url, id, website, rating.
pub struct CompanyFields {
    origin: String,
    name: Vec<Selector>,
    address: Vec<Selector>,
    url: Vec<Selector>,
    id: Vec<Selector>,
    id_attr: String,
    website_text: Vec<Selector>,
    website_link: Vec<Selector>,
    rating: Vec<Selector>,
}

impl CompanyFields {
    pub fn new(sel: &SelectorConfig, origin: &str) -> Result<Self> {
        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            name: compile_all(&sel.name)?,
            address: compile_all(&sel.address)?,
            url: compile_all(&sel.url)?,
            id: compile_all(&sel.id)?,
            id_attr: sel.id_attr.clone(),
            website_text: compile_all(&sel.website_text)?,
            website_link: compile_all(&sel.website_link)?,
            rating: compile_all(&sel.rating)?,
        })
    }

    pub fn name(&self, doc: &Html) -> String {
        or_default("name", first_text(doc, &self.name, "name"))
    }

    pub fn address(&self, doc: &Html) -> String {
        or_default("address", first_text(doc, &self.address, "address"))
    }

    pub fn url(&self, doc: &Html) -> String {
        or_default("url", self.try_url(doc))
    }

    pub fn id(&self, doc: &Html) -> String {
        or_default("id", self.try_id(doc))
    }

    pub fn website(&self, doc: &Html) -> String {
        let result = first_text(doc, &self.website_text, "website")
            .and_then(non_empty("website"))
            .or_else(|_| first_attr(doc, &self.website_link, "href", "website"));
        or_default("website", result)
    }

    /// The badge splits the score into fragments ("4", ",", "8"); glue them back.
    pub fn rating(&self, doc: &Html) -> String {
        let fragments = all_matches(doc, &self.rating);
        let result = if fragments.is_empty() {
            Err(ExtractError::Missing("rating"))
        } else {
            Ok(fragments.into_iter().map(element_text).collect())
        };
        or_default("rating", result)
    }

    fn try_url(&self, doc: &Html) -> Result<String, ExtractError> {
        let href = first_attr(doc, &self.url, "href", "url")?;
        Ok(absolutize(&self.origin, &href))
    }

    /// Card attribute first, then the numeric segment of the listing url.
    fn try_id(&self, doc: &Html) -> Result<String, ExtractError> {
        first_attr(doc, &self.id, &self.id_attr, "id")
            .and_then(non_empty("id"))
            .or_else(|_| {
                let url = self.try_url(doc)?;
                id_from_url(&url).ok_or(ExtractError::Parse {
                    what: "id",
                    text: url,
                })
            })
    }
}

fn non_empty(field: &'static str) -> impl Fn(String) -> Result<String, ExtractError> {
    move |s| {
        if s.trim().is_empty() {
            Err(ExtractError::Missing(field))
        } else {
            Ok(s)
        }
    }
}

pub fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        format!("{}://{}", scheme, rest)
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}

/// `/maps/org/<slug>/<digits>/` → `<digits>`
fn id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/')
        .rev()
        .find(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GrabConfig, DEFAULT_ORIGIN};

    fn fields() -> CompanyFields {
        CompanyFields::new(&GrabConfig::default().selectors, DEFAULT_ORIGIN).unwrap()
    }

    #[test]
    fn listing_fixture() {
        let doc = Html::parse_document(
            &std::fs::read_to_string("tests/fixtures/listing.html").unwrap(),
        );
        let f = fields();
        assert_eq!(f.name(&doc), "Кафе «Пушкинъ»");
        assert_eq!(f.url(&doc), "https://yandex.ru/maps/org/pushkin/1018907821/");
        assert_eq!(f.id(&doc), "1018907821");
        assert_eq!(f.rating(&doc), "4,8");
    }

    #[test]
    fn rating_ignores_badges_outside_the_header() {
        let doc = Html::parse_document(
            r#"<div class="business-card-title-view__header-rating">
                 <span class="business-rating-badge-view__rating-text">4</span><span class="business-rating-badge-view__rating-text">,</span><span class="business-rating-badge-view__rating-text">8</span>
               </div>
               <div class="business-review-view">
                 <span class="business-rating-badge-view__rating-text">4,2</span>
               </div>"#,
        );
        assert_eq!(fields().rating(&doc), "4,8");
    }

    #[test]
    fn name_falls_back_to_card_title() {
        let doc = Html::parse_document(r#"<h1 class="card-title-view__title">  Бар   Ромашка </h1>"#);
        assert_eq!(fields().name(&doc), "Бар Ромашка");
    }

    #[test]
    fn website_falls_back_to_link() {
        let doc = Html::parse_document(
            r#"<a class="business-urls-view__link" href="https://example.ru/">site</a>"#,
        );
        assert_eq!(fields().website(&doc), "https://example.ru/");
    }

    #[test]
    fn id_from_card_attribute_wins() {
        let doc = Html::parse_document(
            r#"<div class="business-card-view" data-id="77"></div>
               <a class="card-title-view__title-link" href="/maps/org/x/123/">x</a>"#,
        );
        assert_eq!(fields().id(&doc), "77");
    }

    #[test]
    fn id_falls_back_to_url_segment() {
        let doc = Html::parse_document(
            r#"<a class="card-title-view__title-link" href="/maps/org/x/123/?ll=1">x</a>"#,
        );
        assert_eq!(fields().id(&doc), "123");
    }

    #[test]
    fn link_without_href_gives_empty_url() {
        let doc = Html::parse_document(r#"<a class="card-title-view__title-link">x</a>"#);
        assert_eq!(fields().url(&doc), "");
    }

    #[test]
    fn absolutize_variants() {
        assert_eq!(absolutize("https://yandex.ru", "/maps/org/1/"), "https://yandex.ru/maps/org/1/");
        assert_eq!(absolutize("https://yandex.ru", "maps"), "https://yandex.ru/maps");
        assert_eq!(absolutize("https://yandex.ru", "//ya.ru/x"), "https://ya.ru/x");
        assert_eq!(absolutize("https://yandex.ru", "http://a.b/c"), "http://a.b/c");
    }

    #[test]
    fn id_segment_needs_digits() {
        assert_eq!(id_from_url("https://yandex.ru/maps/org/slug/"), None);
    }
}
