use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use super::ExtractError;

pub fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector '{}': {}", selector, e))
}

pub fn compile_all(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Visible text of an element with whitespace runs collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element matched by the earliest selector in the list that matches anything.
pub fn first_match<'a>(doc: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| doc.select(s).next())
}

/// All elements of the earliest selector in the list that matches anything.
pub fn all_matches<'a>(doc: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .map(|s| doc.select(s).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

pub fn first_text(
    doc: &Html,
    selectors: &[Selector],
    field: &'static str,
) -> Result<String, ExtractError> {
    first_match(doc, selectors)
        .map(element_text)
        .ok_or(ExtractError::Missing(field))
}

pub fn first_attr(
    doc: &Html,
    selectors: &[Selector],
    attr: &str,
    field: &'static str,
) -> Result<String, ExtractError> {
    let el = first_match(doc, selectors).ok_or(ExtractError::Missing(field))?;
    el.value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ExtractError::MissingAttr(attr.to_string()))
}

/// Texts of every element matched by a single selector, in document order.
pub fn all_texts(doc: &Html, selector: &Selector) -> Vec<String> {
    doc.select(selector).map(element_text).collect()
}
