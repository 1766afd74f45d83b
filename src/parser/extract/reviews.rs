use anyhow::Result;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::config::ReviewConfig;
use crate::parser::dom::{all_texts, compile, compile_all, first_text};
use crate::parser::{or_default, ExtractError};
use crate::session::{snapshot, Session, SessionError};

/// Loads lazily rendered reviews by scrolling their container, then reads
/// every review body.
pub struct ReviewPager {
    count: Vec<Selector>,
    body: Selector,
    tab: String,
    container: String,
    container_index: usize,
    step: u32,
    large_count: u32,
    large_budget: u32,
    small_budget: u32,
}

impl ReviewPager {
    pub fn new(config: &ReviewConfig) -> Result<Self> {
        Ok(Self {
            count: compile_all(&config.count)?,
            body: compile(&config.body)?,
            tab: config.tab.clone(),
            container: config.scroll_container.clone(),
            container_index: config.scroll_container_index,
            step: config.scroll_step,
            large_count: config.large_count,
            large_budget: config.large_budget,
            small_budget: config.small_budget,
        })
    }

    /// Displayed review count; anything missing or unreadable is zero.
    pub fn review_count(&self, doc: &Html) -> u32 {
        or_default("reviewCount", self.try_count(doc))
    }

    fn try_count(&self, doc: &Html) -> Result<u32, ExtractError> {
        let text = first_text(doc, &self.count, "reviewCount")?;
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        digits.parse().map_err(|_| ExtractError::Parse {
            what: "review count",
            text,
        })
    }

    pub fn scroll_budget(&self, count: u32) -> u32 {
        if count > self.large_count {
            self.large_budget
        } else {
            self.small_budget
        }
    }

    pub fn load(&self, doc: &Html, session: &mut dyn Session) -> Vec<String> {
        or_default("reviews", self.try_load(doc, session))
    }

    fn try_load(&self, doc: &Html, session: &mut dyn Session) -> Result<Vec<String>, ExtractError> {
        let count = self.review_count(doc);
        if count > 0 {
            self.open_tab(session);
            self.scroll(session, self.scroll_budget(count))?;
        }
        let fresh = snapshot(session)?;
        Ok(all_texts(&fresh, &self.body)
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect())
    }

    fn open_tab(&self, session: &mut dyn Session) {
        let script = format!(
            "var tab = document.querySelector({}); if (tab) {{ tab.click(); }}",
            js_string(&self.tab)
        );
        if let Err(e) = session.execute_script(&script) {
            warn!("[reviews] could not open reviews tab: {}", e);
        }
    }

    /// Running past the end of the container is how scrolling normally stops.
    fn scroll(&self, session: &mut dyn Session, budget: u32) -> Result<(), ExtractError> {
        info!("[reviews] scrolling up to {} times", budget);
        for i in 0..budget {
            let offset = u64::from(i) * u64::from(self.step);
            let script = format!(
                "document.querySelectorAll({})[{}].scrollTop = {};",
                js_string(&self.container),
                self.container_index,
                offset
            );
            match session.execute_script(&script) {
                Ok(_) => {}
                Err(SessionError::OutOfBounds) => {
                    debug!("[reviews] end of scrollable content after {} steps", i);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Quote a selector as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrabConfig;
    use crate::session::StaticSession;
    use serde_json::Value;

    /// Serves one page before scrolling and another after; fails scrolls
    /// past `out_of_bounds_after` the way a driver does.
    struct ScrollSession {
        before: String,
        after: String,
        scrolls: usize,
        clicked: bool,
        out_of_bounds_after: Option<usize>,
        broken_scroll: bool,
    }

    impl ScrollSession {
        fn new(before: &str, after: &str) -> Self {
            Self {
                before: before.to_string(),
                after: after.to_string(),
                scrolls: 0,
                clicked: false,
                out_of_bounds_after: None,
                broken_scroll: false,
            }
        }
    }

    impl Session for ScrollSession {
        fn page_source(&mut self) -> Result<String, SessionError> {
            if self.scrolls > 0 {
                Ok(self.after.clone())
            } else {
                Ok(self.before.clone())
            }
        }

        fn execute_script(&mut self, script: &str) -> Result<Value, SessionError> {
            if script.contains("click()") {
                self.clicked = true;
                return Ok(Value::Null);
            }
            if self.broken_scroll {
                return Err(SessionError::Script {
                    code: "javascript error".into(),
                    message: "container is null".into(),
                });
            }
            if self.out_of_bounds_after.is_some_and(|n| self.scrolls >= n) {
                return Err(SessionError::OutOfBounds);
            }
            assert!(script.ends_with(&format!("scrollTop = {};", self.scrolls * 500)));
            self.scrolls += 1;
            Ok(Value::Null)
        }
    }

    fn pager() -> ReviewPager {
        ReviewPager::new(&GrabConfig::default().reviews).unwrap()
    }

    fn page_with_count(count: &str, bodies: &[&str]) -> String {
        let mut html = format!(
            r#"<div class="tabs-select-view__title _name_reviews">Отзывы <div class="tabs-select-view__counter">{}</div></div>"#,
            count
        );
        for b in bodies {
            html.push_str(&format!(r#"<span class="business-review-view__body-text">{}</span>"#, b));
        }
        html
    }

    #[test]
    fn count_parsing() {
        let p = pager();
        assert_eq!(p.review_count(&Html::parse_document(&page_with_count("1 234", &[]))), 1234);
        assert_eq!(p.review_count(&Html::parse_document(&page_with_count("—", &[]))), 0);
        assert_eq!(p.review_count(&Html::parse_document("<p>nothing</p>")), 0);
    }

    #[test]
    fn budget_thresholds() {
        let p = pager();
        assert_eq!(p.scroll_budget(151), 100);
        assert_eq!(p.scroll_budget(150), 30);
        assert_eq!(p.scroll_budget(1), 30);
    }

    #[test]
    fn small_count_scrolls_thirty_times_and_rereads() {
        let before = page_with_count("12", &["первый"]);
        let after = page_with_count("12", &["первый", "второй", "третий"]);
        let mut session = ScrollSession::new(&before, &after);
        let doc = Html::parse_document(&before);
        let reviews = pager().load(&doc, &mut session);
        assert!(session.clicked);
        assert_eq!(session.scrolls, 30);
        assert_eq!(reviews, vec!["первый", "второй", "третий"]);
    }

    #[test]
    fn large_count_uses_large_budget() {
        let before = page_with_count("151", &[]);
        let mut session = ScrollSession::new(&before, &before);
        pager().load(&Html::parse_document(&before), &mut session);
        assert_eq!(session.scrolls, 100);
    }

    #[test]
    fn out_of_bounds_ends_scrolling_quietly() {
        let before = page_with_count("500", &[]);
        let after = page_with_count("500", &["a", "b"]);
        let mut session = ScrollSession::new(&before, &after);
        session.out_of_bounds_after = Some(4);
        let reviews = pager().load(&Html::parse_document(&before), &mut session);
        assert_eq!(session.scrolls, 4);
        assert_eq!(reviews, vec!["a", "b"]);
    }

    #[test]
    fn zero_count_skips_pagination() {
        let page = page_with_count("0", &["единственный"]);
        let mut session = ScrollSession::new(&page, &page);
        let reviews = pager().load(&Html::parse_document(&page), &mut session);
        assert!(!session.clicked);
        assert_eq!(session.scrolls, 0);
        assert_eq!(reviews, vec!["единственный"]);
    }

    #[test]
    fn script_failure_gives_empty_reviews() {
        let page = page_with_count("20", &["x"]);
        let mut session = ScrollSession::new(&page, &page);
        session.broken_scroll = true;
        assert!(pager().load(&Html::parse_document(&page), &mut session).is_empty());
    }

    #[test]
    fn scrolls_the_inner_container() {
        let page = page_with_count("5", &["ok"]);
        let mut session = StaticSession::new(page.as_str());
        pager().load(&Html::parse_document(&page), &mut session);
        let scripts = session.scripts();
        assert!(scripts[0].contains("click()"));
        assert_eq!(
            scripts[1],
            r#"document.querySelectorAll(".scroll__container")[1].scrollTop = 0;"#
        );
        assert_eq!(
            scripts[2],
            r#"document.querySelectorAll(".scroll__container")[1].scrollTop = 500;"#
        );
    }

    #[test]
    fn container_index_is_configurable() {
        let mut config = GrabConfig::default().reviews;
        config.scroll_container_index = 0;
        let page = page_with_count("5", &[]);
        let mut session = StaticSession::new(page.as_str());
        ReviewPager::new(&config).unwrap().load(&Html::parse_document(&page), &mut session);
        assert!(session.scripts()[1].contains(r#"querySelectorAll(".scroll__container")[0]"#));
    }

    #[test]
    fn js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a[b="c"]"#), r#""a[b=\"c\"]""#);
    }
}
