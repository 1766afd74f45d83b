use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::SelectorConfig;
use crate::parser::dom::{compile, compile_all, element_text};
use crate::phone::PhoneCandidate;
use crate::session::{snapshot, Session};

/// Loose phone shape: seven or more of digits, `+`, `-`, parentheses, spaces.
static PHONE_SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d+\-() ]{7,}").unwrap());
static OUTSIDE_SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d+\-() ]").unwrap());

const MIN_NODE_LEN: usize = 5;
const MIN_MATCH_LEN: usize = 7;

/// Permissive phone harvest. Nothing here decides validity; candidates are
/// meant to go through [`crate::phone::is_valid_phone`] downstream.
pub struct PhoneHarvester {
    marked: Vec<Selector>,
    containers: Selector,
    retry_pause: Duration,
}

impl PhoneHarvester {
    pub fn new(sel: &SelectorConfig, retry_pause_ms: u64) -> Result<Self> {
        Ok(Self {
            marked: compile_all(&sel.phones)?,
            containers: compile(&sel.phone_text_containers)?,
            retry_pause: Duration::from_millis(retry_pause_ms),
        })
    }

    pub fn harvest(&self, doc: &Html, session: &mut dyn Session) -> BTreeSet<PhoneCandidate> {
        let mut found = self.marked_elements(doc);
        found.extend(self.text_scan(doc));

        // Contact blocks are sometimes rendered late: give the page a moment.
        if found.is_empty() {
            debug!("[phones] nothing found, retrying after {:?}", self.retry_pause);
            std::thread::sleep(self.retry_pause);
            match snapshot(session) {
                Ok(fresh) => found.extend(self.marked_elements(&fresh)),
                Err(e) => warn!("[phones] re-snapshot failed: {}", e),
            }
        }

        found.into_iter().map(PhoneCandidate::new).collect()
    }

    /// Elements explicitly marked as telephone fields, across all tag kinds.
    /// Blank ones are dropped so they never suppress the retry.
    fn marked_elements(&self, doc: &Html) -> Vec<String> {
        self.marked
            .iter()
            .flat_map(|s| doc.select(s))
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Pattern scan over text nodes directly inside the container tags.
    fn text_scan(&self, doc: &Html) -> Vec<String> {
        let mut found = Vec::new();
        for el in doc.select(&self.containers) {
            for child in el.children() {
                let Some(text) = child.value().as_text() else {
                    continue;
                };
                let text = text.trim();
                if text.chars().count() <= MIN_NODE_LEN {
                    continue;
                }
                let matches = PHONE_SHAPE_RE
                    .find_iter(text)
                    .map(|m| sanitize(m.as_str()))
                    .filter(|p| p.chars().count() >= MIN_MATCH_LEN);
                found.extend(matches);
            }
        }
        found
    }
}

fn sanitize(raw: &str) -> String {
    OUTSIDE_SHAPE_RE.replace_all(raw, "").trim().to_string()
}
