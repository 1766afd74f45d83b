use anyhow::Result;
use scraper::{Html, Selector};

use crate::config::SelectorConfig;
use crate::parser::dom::{all_matches, compile_all};
use crate::parser::{or_default, ExtractError};

/// Machine-readable schedule tokens from `<meta itemprop="openingHours" content="...">`.
pub struct OpeningHours {
    selectors: Vec<Selector>,
}

impl OpeningHours {
    pub fn new(sel: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            selectors: compile_all(&sel.opening_hours)?,
        })
    }

    pub fn extract(&self, doc: &Html) -> Vec<String> {
        or_default("openingHours", self.try_extract(doc))
    }

    fn try_extract(&self, doc: &Html) -> Result<Vec<String>, ExtractError> {
        let found = all_matches(doc, &self.selectors);
        if found.is_empty() {
            return Err(ExtractError::Missing("openingHours"));
        }
        Ok(found
            .into_iter()
            .filter_map(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect())
    }
}
