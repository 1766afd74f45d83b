use std::collections::BTreeSet;

use anyhow::Result;
use scraper::{Html, Selector};

use crate::config::SelectorConfig;
use crate::parser::dom::{all_matches, compile_all, element_text};

pub struct Categories {
    selectors: Vec<Selector>,
}

impl Categories {
    pub fn new(sel: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            selectors: compile_all(&sel.categories)?,
        })
    }

    /// A listing without category links is normal, so no match is just an empty set.
    pub fn extract(&self, doc: &Html) -> BTreeSet<String> {
        all_matches(doc, &self.selectors)
            .into_iter()
            .map(element_text)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrabConfig;

    #[test]
    fn deduplicates() {
        let doc = Html::parse_document(
            r#"<a class="business-categories-view__category">Кафе</a>
               <a class="business-categories-view__category">Бар</a>
               <a class="business-categories-view__category"> Кафе </a>
               <a class="business-categories-view__category"></a>"#,
        );
        let got = Categories::new(&GrabConfig::default().selectors).unwrap().extract(&doc);
        assert_eq!(got.into_iter().collect::<Vec<_>>(), vec!["Бар", "Кафе"]);
    }
}
